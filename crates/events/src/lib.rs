//! Job announcement mechanics: pub/sub bus abstraction and the job wire format.

pub mod bus;
pub mod in_memory_bus;
pub mod job;

pub use bus::{BusError, MessageBus, Subscription};
pub use in_memory_bus::InMemoryMessageBus;
pub use job::{JobMessage, DEFAULT_JOB_CHANNEL};
