// Bounded history window for recent samples
use std::collections::VecDeque;

/// Number of samples kept for display and baseline computation.
pub const DEFAULT_CAPACITY: usize = 20;

/// Fixed-capacity ordered sequence, oldest first.
///
/// Updates are expressed as pure functions returning the next state, so a
/// holder can read-then-replace the buffer within a single critical section.
#[derive(Debug, Clone, PartialEq)]
pub struct RingBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T: Clone> RingBuffer<T> {
    /// `capacity` is clamped to at least one slot.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Returns this buffer with `item` appended, evicting from the head when full.
    #[must_use]
    pub fn push(&self, item: T) -> Self {
        let mut items = self.items.clone();
        if items.len() >= self.capacity {
            items.pop_front();
        }
        items.push_back(item);
        Self {
            items,
            capacity: self.capacity,
        }
    }

    /// Returns an empty buffer with the same capacity.
    #[must_use]
    pub fn clear(&self) -> Self {
        Self::new(self.capacity)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }
}

impl<T: Clone> Default for RingBuffer<T> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(capacity: usize, values: impl IntoIterator<Item = u32>) -> RingBuffer<u32> {
        values
            .into_iter()
            .fold(RingBuffer::new(capacity), |buffer, v| buffer.push(v))
    }

    #[test]
    fn test_push_preserves_order() {
        let buffer = fill(3, ['A' as u32, 'B' as u32, 'C' as u32]);
        assert_eq!(buffer.to_vec(), vec!['A' as u32, 'B' as u32, 'C' as u32]);
    }

    #[test]
    fn test_overflow_evicts_head() {
        let buffer = fill(3, 1..=4);
        assert_eq!(buffer.to_vec(), vec![2, 3, 4]);
        assert_eq!(buffer.iter().last(), Some(&4));
    }

    #[test]
    fn test_length_never_exceeds_capacity() {
        let mut buffer = RingBuffer::new(DEFAULT_CAPACITY);
        for n in 0..100u32 {
            buffer = buffer.push(n);
            assert!(buffer.len() <= DEFAULT_CAPACITY);
            let expected: Vec<u32> = (n.saturating_sub(19)..=n).collect();
            assert_eq!(buffer.to_vec(), expected);
        }
    }

    #[test]
    fn test_push_does_not_mutate_previous_state() {
        let before = fill(2, [1, 2]);
        let after = before.push(3);
        assert_eq!(before.to_vec(), vec![1, 2]);
        assert_eq!(after.to_vec(), vec![2, 3]);
    }

    #[test]
    fn test_clear_keeps_capacity() {
        let buffer = fill(5, 1..=5).clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), 5);
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let buffer = fill(0, [7, 8]);
        assert_eq!(buffer.to_vec(), vec![8]);
    }

    #[test]
    fn test_default_capacity() {
        let buffer: RingBuffer<u32> = RingBuffer::default();
        assert_eq!(buffer.capacity(), 20);
    }
}
