//! Single-value memoization for description identities.

use once_cell::unsync::OnceCell;

/// A single-value cache with first-call-wins semantics.
///
/// The first `get_or_compute` call runs the closure and stores the result;
/// every later call returns the stored value and ignores its closure. This is
/// deliberately not a map: a node's identity is computed for whichever host
/// key is seen first and must stay stable for the rest of the run.
#[derive(Debug, Default)]
pub struct Memoized<T> {
    cell: OnceCell<T>,
}

impl<T> Memoized<T> {
    pub fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// The cached value, if one has been computed.
    pub fn get(&self) -> Option<&T> {
        self.cell.get()
    }

    /// Return the cached value, computing it on first access.
    pub fn get_or_compute(&self, compute: impl FnOnce() -> T) -> &T {
        self.cell.get_or_init(compute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn computes_once() {
        let memo = Memoized::new();
        let mut calls = 0;
        let first = *memo.get_or_compute(|| {
            calls += 1;
            41
        });
        let second = *memo.get_or_compute(|| {
            calls += 1;
            99
        });
        assert_eq!(first, 41);
        assert_eq!(second, 41);
        assert_eq!(calls, 1);
    }

    #[test]
    fn get_before_compute_is_none() {
        let memo: Memoized<u32> = Memoized::new();
        assert!(memo.get().is_none());
        memo.get_or_compute(|| 7);
        assert_eq!(memo.get(), Some(&7));
    }
}
