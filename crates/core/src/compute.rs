//! The CPU-bound function the worker evaluates for each index.

use thiserror::Error;

use crate::index::{Index, MAX_COMPUTABLE_INDEX};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ComputeError {
    #[error("result for index {0} does not fit in 64 bits")]
    Overflow(Index),

    #[error("computation failed: {0}")]
    Failed(String),
}

/// A pure, deterministic function of an index.
///
/// The worker calls this on the blocking pool, one index at a time.
/// Implementations must not cache results across calls.
pub trait Computation: Send + Sync {
    fn compute(&self, index: Index) -> Result<u64, ComputeError>;
}

impl<C> Computation for std::sync::Arc<C>
where
    C: Computation + ?Sized,
{
    fn compute(&self, index: Index) -> Result<u64, ComputeError> {
        (**self).compute(index)
    }
}

/// Naive doubly-recursive Fibonacci (`fib(0) = 0`, `fib(1) = 1`).
///
/// Exponential in the index on purpose: large indices keep the single worker
/// busy, which is the load profile this pipeline exists to demonstrate.
#[derive(Debug, Default, Clone, Copy)]
pub struct RecursiveFibonacci;

impl Computation for RecursiveFibonacci {
    fn compute(&self, index: Index) -> Result<u64, ComputeError> {
        if index.value() > MAX_COMPUTABLE_INDEX {
            return Err(ComputeError::Overflow(index));
        }
        fib(index.value()).ok_or(ComputeError::Overflow(index))
    }
}

fn fib(n: u32) -> Option<u64> {
    if n < 2 {
        return Some(u64::from(n));
    }
    fib(n - 1)?.checked_add(fib(n - 2)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idx(v: u32) -> Index {
        Index::from_stored(v)
    }

    #[test]
    fn known_values() {
        let f = RecursiveFibonacci;
        let expected = [0u64, 1, 1, 2, 3, 5, 8, 13, 21, 34, 55];
        for (n, want) in expected.iter().enumerate() {
            assert_eq!(f.compute(idx(n as u32)).unwrap(), *want, "fib({n})");
        }
        assert_eq!(f.compute(idx(20)).unwrap(), 6765);
    }

    #[test]
    fn indices_past_u64_range_fail_without_recursing() {
        let f = RecursiveFibonacci;
        assert_eq!(f.compute(idx(94)), Err(ComputeError::Overflow(idx(94))));
        assert_eq!(f.compute(idx(1_000_000)), Err(ComputeError::Overflow(idx(1_000_000))));
    }

    #[test]
    fn deterministic() {
        let f = RecursiveFibonacci;
        assert_eq!(f.compute(idx(15)).unwrap(), f.compute(idx(15)).unwrap());
    }
}
