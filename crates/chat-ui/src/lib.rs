//! egui panels for the live chat client, plus the view-side state they
//! render from. Nothing in here performs I/O: the app layer runs the async
//! work and feeds results back through the state types.

pub mod panels;
pub mod state;
pub mod theme;

#[cfg(test)]
mod tests;
