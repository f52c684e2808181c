//! Fixed-capacity, newest-first ring buffer.

/// A bounded history where index 0 is always the most recently pushed item.
///
/// Pushing into a full ring evicts the oldest item. Capacity is fixed at
/// construction and is never zero.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    slots: Vec<Option<T>>,
    /// Slot holding the newest item.
    head: usize,
    len: usize,
}

impl<T> RingBuffer<T> {
    /// Create an empty ring. A capacity of zero is rounded up to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            head: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert `item` at index 0, returning the evicted oldest item if the
    /// ring was full.
    pub fn push_front(&mut self, item: T) -> Option<T> {
        let capacity = self.capacity();
        self.head = (self.head + capacity - 1) % capacity;
        let evicted = self.slots[self.head].replace(item);
        if self.len < capacity {
            self.len += 1;
        }
        evicted
    }

    /// Item at `index`, counting from the newest (0) towards the oldest.
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.len {
            return None;
        }
        let slot = (self.head + index) % self.capacity();
        self.slots[slot].as_ref()
    }

    /// Iterate newest to oldest.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        (0..self.len).filter_map(move |i| self.get(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_orders_newest_first() {
        let mut ring = RingBuffer::with_capacity(3);
        ring.push_front(1);
        ring.push_front(2);
        ring.push_front(3);

        assert_eq!(ring.iter().copied().collect::<Vec<_>>(), vec![3, 2, 1]);
        assert_eq!(ring.get(0), Some(&3));
        assert_eq!(ring.get(2), Some(&1));
        assert_eq!(ring.get(3), None);
    }

    #[test]
    fn test_full_ring_evicts_oldest() {
        let mut ring = RingBuffer::with_capacity(2);
        assert_eq!(ring.push_front("a"), None);
        assert_eq!(ring.push_front("b"), None);
        assert_eq!(ring.push_front("c"), Some("a"));
        assert_eq!(ring.push_front("d"), Some("b"));

        assert_eq!(ring.len(), 2);
        assert_eq!(ring.iter().copied().collect::<Vec<_>>(), vec!["d", "c"]);
    }

    #[test]
    fn test_len_never_exceeds_capacity() {
        for capacity in 1..6 {
            let mut ring = RingBuffer::with_capacity(capacity);
            for n in 0..50 {
                ring.push_front(n);
                assert!(ring.len() <= capacity);
                assert_eq!(ring.get(0), Some(&n));
            }
            assert_eq!(ring.len(), capacity);
        }
    }

    #[test]
    fn test_zero_capacity_rounds_up() {
        let mut ring = RingBuffer::with_capacity(0);
        assert_eq!(ring.capacity(), 1);
        ring.push_front(7);
        ring.push_front(8);
        assert_eq!(ring.iter().copied().collect::<Vec<_>>(), vec![8]);
    }

    #[test]
    fn test_empty_ring() {
        let ring: RingBuffer<u8> = RingBuffer::with_capacity(4);
        assert!(ring.is_empty());
        assert_eq!(ring.get(0), None);
        assert_eq!(ring.iter().count(), 0);
    }
}
