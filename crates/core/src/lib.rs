//! `fibcalc-core` : domain building blocks for the index computation pipeline.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod compute;
pub mod error;
pub mod index;
pub mod value;
pub mod value_object;

pub use compute::{Computation, ComputeError, RecursiveFibonacci};
pub use error::{DomainError, DomainResult};
pub use index::{Index, IndexLimit, MAX_COMPUTABLE_INDEX};
pub use value::CacheValue;
pub use value_object::ValueObject;
