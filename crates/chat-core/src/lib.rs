pub mod bot_flow;
pub mod context;
pub mod conversation;
pub mod directory;
pub mod display;
pub mod event_bus;
pub mod ports;
pub mod profiles;
pub mod resolver;
pub mod subscription;
pub mod translation;
pub mod translation_cache;
