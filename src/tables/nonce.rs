use alloc::collections::VecDeque;

/// The most recently seen Interest nonces, oldest first.
#[derive(Debug)]
pub struct NonceSet {
    nonces: VecDeque<Vec<u8>>,
    capacity: usize,
}

impl NonceSet {
    pub fn new(capacity: usize) -> Self {
        Self {
            nonces: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Returns true if the nonce was seen before. Otherwise remembers it,
    /// forgetting the oldest one when full.
    pub fn find_or_append(&mut self, nonce: &[u8]) -> bool {
        if self.nonces.iter().any(|n| n.as_slice() == nonce) {
            return true;
        }
        if self.capacity == 0 {
            return false;
        }
        while self.nonces.len() >= self.capacity {
            self.nonces.pop_front();
        }
        self.nonces.push_back(nonce.to_vec());
        false
    }

    pub fn len(&self) -> usize {
        self.nonces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nonces.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.nonces.clear();
    }
}
