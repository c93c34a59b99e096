//! Append-only durable store boundary.
//!
//! The durable store is the history of every accepted submission. It is
//! written before the cache and the bus, and nothing ever updates or deletes
//! a row.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryDurableStore;
pub use postgres::PostgresDurableStore;
pub use r#trait::{DurableStore, StoreError};
