//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. An `Index` of 7
/// is the same index no matter which submission produced it, which is why the
/// durable log can hold duplicates while the cache holds one entry per index.
///
/// The trait requires:
/// - **Clone**: value objects are cheap to copy
/// - **PartialEq**: compared by their attribute values
/// - **Debug**: helpful for logging and tests
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

impl ValueObject for crate::Index {}
impl ValueObject for crate::IndexLimit {}
impl ValueObject for crate::CacheValue {}
