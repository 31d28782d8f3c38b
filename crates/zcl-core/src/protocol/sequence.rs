//! Transaction sequence numbers for ZCL frames.
//!
//! Every ZCL frame carries an 8-bit *transaction sequence number*.  A device
//! echoes the number of a request in its response, which is the only thing
//! that ties the two together on an otherwise unordered radio link.
//!
//! # Thread safety
//!
//! The counter uses `AtomicU8` internally, so allocating a number is a single
//! read-modify-write step.  Two tasks calling [`SequenceCounter::next`] on the
//! same counter can never observe the same value until the counter has gone
//! all the way around the 0–255 range.

use std::sync::atomic::{AtomicU8, Ordering};

/// A lock-free, wrapping counter for ZCL transaction sequence numbers.
///
/// Numbers start at 0, increment by 1 with each call to [`next`](Self::next),
/// and wrap from 255 back to 0 without panicking.
///
/// # Examples
///
/// ```rust
/// use zcl_core::protocol::SequenceCounter;
///
/// let counter = SequenceCounter::new();
/// assert_eq!(counter.next(), 0);
/// assert_eq!(counter.next(), 1);
/// ```
#[derive(Debug)]
pub struct SequenceCounter {
    inner: AtomicU8,
}

impl SequenceCounter {
    /// Creates a new counter starting at 0.
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// Creates a counter whose first allocated number is `first`.
    pub fn starting_at(first: u8) -> Self {
        Self {
            inner: AtomicU8::new(first),
        }
    }

    /// Returns the next sequence number and atomically advances the counter.
    ///
    /// `fetch_add` on an 8-bit atomic wraps 255 → 0.  `Relaxed` ordering is
    /// enough: the value only has to be unique, it does not publish memory.
    pub fn next(&self) -> u8 {
        self.inner.fetch_add(1, Ordering::Relaxed)
    }

    /// Returns the number the next call to [`next`](Self::next) would allocate.
    pub fn current(&self) -> u8 {
        self.inner.load(Ordering::Relaxed)
    }
}

impl Default for SequenceCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_sequence_counter_starts_at_zero() {
        // Arrange
        let counter = SequenceCounter::new();

        // Act
        let first = counter.next();

        // Assert
        assert_eq!(first, 0);
    }

    #[test]
    fn test_sequence_counter_wraps_after_255() {
        // Arrange
        let counter = SequenceCounter::starting_at(u8::MAX);

        // Act
        let before_wrap = counter.next();
        let after_wrap = counter.next();

        // Assert
        assert_eq!(before_wrap, 255);
        assert_eq!(after_wrap, 0, "counter must wrap to 0 after 255");
    }

    #[test]
    fn test_three_hundred_allocations_cycle_through_the_full_range() {
        // Arrange
        let counter = SequenceCounter::new();

        // Act
        let values: Vec<u8> = (0..300).map(|_| counter.next()).collect();

        // Assert – the first 256 values are exactly 0..=255, then the cycle restarts
        let expected: Vec<u8> = (0..=255u8).chain(0..44u8).collect();
        assert_eq!(values, expected);
    }

    #[test]
    fn test_sequence_counter_is_unique_across_threads_within_one_cycle() {
        // Arrange – 4 threads × 64 allocations = exactly one full cycle
        let counter = Arc::new(SequenceCounter::new());

        // Act
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let c = Arc::clone(&counter);
                thread::spawn(move || (0..64).map(|_| c.next()).collect::<Vec<_>>())
            })
            .collect();
        let all: HashSet<u8> = handles
            .into_iter()
            .flat_map(|h| h.join().expect("thread panicked"))
            .collect();

        // Assert
        assert_eq!(all.len(), 256, "no number may be handed out twice in one cycle");
    }

    #[test]
    fn test_current_does_not_increment() {
        // Arrange
        let counter = SequenceCounter::new();
        counter.next();

        // Act
        let current = counter.current();
        let next = counter.next();

        // Assert
        assert_eq!(current, 1);
        assert_eq!(next, 1);
    }
}
