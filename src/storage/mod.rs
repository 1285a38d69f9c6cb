//! Storage module - Trade store and price mirror implementations

mod memory;
mod postgres;

pub use memory::{InMemoryPriceMirror, InMemoryTradeStore};
pub use postgres::PgStore;
