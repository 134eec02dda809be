use core::ops::Range;

use crate::{
    buffer::Buffer,
    clock::Timestamp,
    hash::Sha256Digest,
    name::{MatchMode, Name},
    packet::ParsedPacket,
};

// The cache is a plain list in admission order. Lookups are linear scans, which
//  is what a relay with a few hundred cached objects can afford; eviction picks
//  the least recently used entry that is not pinned.

#[derive(Clone, Debug)]
pub struct ContentEntry {
    pub(crate) name: Name,
    pub(crate) publisher_digest: Option<Vec<u8>>,
    pub(crate) pkt: Buffer,
    pub(crate) payload: Range<usize>,
    pub(crate) digest: Sha256Digest,
    pub(crate) last_used: Timestamp,
    pub(crate) served_cnt: u64,
    pub(crate) is_static: bool,
}

impl ContentEntry {
    /// `pkt` holds exactly the wire bytes `packet` was parsed from.
    pub fn new(packet: &ParsedPacket, pkt: Buffer, now: Timestamp) -> Self {
        let digest = Sha256Digest::of(&pkt);
        let payload = packet.payload.start.min(pkt.len())..packet.payload.end.min(pkt.len());
        Self {
            name: packet.name.clone(),
            publisher_digest: packet.publisher_digest.clone(),
            pkt,
            payload,
            digest,
            last_used: now,
            served_cnt: 0,
            is_static: false,
        }
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn publisher_digest(&self) -> Option<&[u8]> {
        self.publisher_digest.as_deref()
    }

    pub fn pkt(&self) -> &Buffer {
        &self.pkt
    }

    pub fn payload(&self) -> &[u8] {
        &self.pkt[self.payload.clone()]
    }

    pub fn digest(&self) -> &Sha256Digest {
        &self.digest
    }

    pub fn last_used(&self) -> Timestamp {
        self.last_used
    }

    pub fn served_cnt(&self) -> u64 {
        self.served_cnt
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub(crate) fn set_static(&mut self) {
        self.is_static = true;
    }

    fn is_named(&self, name: &Name, publisher_digest: Option<&[u8]>) -> bool {
        self.name.compare(name, MatchMode::Exact).is_full()
            && publisher_digest.map_or(true, |d| self.publisher_digest.as_deref() == Some(d))
    }
}

#[derive(Debug, Default)]
pub struct ContentStore {
    entries: Vec<ContentEntry>,
}

impl ContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContentEntry> + '_ {
        self.entries.iter()
    }

    /// Content with exactly this name. A publisher digest, if given, must match too.
    pub fn lookup_exact(&self, name: &Name, publisher_digest: Option<&[u8]>) -> Option<&ContentEntry> {
        self.entries.iter().find(|e| e.is_named(name, publisher_digest))
    }

    pub(crate) fn lookup_exact_mut(
        &mut self,
        name: &Name,
        publisher_digest: Option<&[u8]>,
    ) -> Option<&mut ContentEntry> {
        self.entries
            .iter_mut()
            .find(|e| e.is_named(name, publisher_digest))
    }

    /// True if this exact packet is already cached.
    pub fn find_duplicate(&self, name: &Name, digest: &Sha256Digest) -> bool {
        self.entries
            .iter()
            .any(|e| e.digest == *digest && e.name.compare(name, MatchMode::Exact).is_full())
    }

    /// Admits an entry. With a positive `bound` and a full store, the least
    /// recently used entry that is not static makes room and is returned.
    /// If every entry is static the store grows past the bound.
    pub(crate) fn add(&mut self, entry: ContentEntry, bound: i64) -> Option<ContentEntry> {
        let mut evicted = None;
        if bound > 0 && self.entries.len() as u64 >= bound as u64 {
            let oldest = self
                .entries
                .iter()
                .enumerate()
                .filter(|(_, e)| !e.is_static)
                .min_by_key(|(_, e)| e.last_used)
                .map(|(idx, _)| idx);
            if let Some(idx) = oldest {
                evicted = Some(self.entries.remove(idx));
            }
        }
        self.entries.push(entry);
        evicted
    }

    /// Removes every entry that is not static and has not been used for `timeout_ms`.
    pub(crate) fn age(&mut self, timeout_ms: u64, now: Timestamp) -> Vec<ContentEntry> {
        let mut removed = Vec::new();
        let mut idx = 0;
        while idx < self.entries.len() {
            let entry = &self.entries[idx];
            if !entry.is_static && entry.last_used.expired(timeout_ms, now) {
                removed.push(self.entries.remove(idx));
            } else {
                idx += 1;
            }
        }
        removed
    }

    pub fn remove(&mut self, name: &Name) -> Option<ContentEntry> {
        let idx = self
            .entries
            .iter()
            .position(|e| e.name.compare(name, MatchMode::Exact).is_full())?;
        Some(self.entries.remove(idx))
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}
