/// A fixed-capacity FIFO of slots. A full ring refuses new items rather than growing.
pub struct RingBuffer<T> {
    storage: Vec<Option<T>>,
    front: usize,
    len: usize,
}

impl<T> RingBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        let mut storage = Vec::with_capacity(capacity);
        storage.resize_with(capacity, || None);
        Self {
            storage,
            front: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len >= self.storage.len()
    }

    // Hands the item back if there is no room for it.
    pub fn push(&mut self, item: T) -> Result<(), T> {
        if self.is_full() {
            return Err(item);
        }
        let slot = (self.front + self.len) % self.storage.len();
        self.storage[slot] = Some(item);
        self.len += 1;
        Ok(())
    }

    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let item = self.storage[self.front].take();
        self.front = (self.front + 1) % self.storage.len();
        self.len -= 1;
        item
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        let cap = self.storage.len();
        (0..self.len).filter_map(move |i| self.storage[(self.front + i) % cap].as_ref())
    }

    pub fn clear(&mut self) {
        while self.pop().is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::RingBuffer;

    #[test]
    fn test_wraparound() {
        let mut ring = RingBuffer::new(3);
        assert!(ring.is_empty());
        assert_eq!(ring.pop(), None);

        assert_eq!(ring.push(1), Ok(()));
        assert_eq!(ring.push(2), Ok(()));
        assert_eq!(ring.push(3), Ok(()));
        assert!(ring.is_full());
        assert_eq!(ring.push(4), Err(4));

        assert_eq!(ring.pop(), Some(1));
        assert_eq!(ring.push(5), Ok(()));
        assert_eq!(ring.iter().copied().collect::<Vec<_>>(), vec![2, 3, 5]);

        assert_eq!(ring.pop(), Some(2));
        assert_eq!(ring.pop(), Some(3));
        assert_eq!(ring.pop(), Some(5));
        assert_eq!(ring.pop(), None);
        assert_eq!(ring.len(), 0);
        assert_eq!(ring.capacity(), 3);
    }

    #[test]
    fn test_zero_capacity() {
        let mut ring = RingBuffer::new(0);
        assert!(ring.is_full());
        assert_eq!(ring.push(1), Err(1));
        assert_eq!(ring.pop(), None);
    }
}
