pub mod chat_store;
pub mod identity;
pub mod profile_store;
pub mod storage;
pub mod translate;

#[cfg(test)]
mod tests;
