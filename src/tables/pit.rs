use crate::{
    buffer::Buffer,
    clock::Timestamp,
    face::FaceId,
    name::{MatchMode, Name},
    packet::ParsedPacket,
};

/// One face waiting for an answer to a pending Interest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pending {
    pub face: FaceId,
    pub last_used: Timestamp,
}

/// A pending Interest, kept so it can be re-sent verbatim and answered later.
#[derive(Clone, Debug)]
pub struct PitEntry {
    pub(crate) name: Name,
    pub(crate) publisher_digest: Option<Vec<u8>>,
    pub(crate) min_suffix: usize,
    pub(crate) max_suffix: usize,
    pub(crate) pkt: Buffer,
    pub(crate) from: Option<FaceId>,
    pub(crate) retries: u32,
    pub(crate) last_used: Timestamp,
    // False for Interests whose scope keeps them on this node
    pub(crate) propagate: bool,
    pub(crate) pending: Vec<Pending>,
}

impl PitEntry {
    pub(crate) fn new(
        packet: &ParsedPacket,
        pkt: Buffer,
        from: FaceId,
        propagate: bool,
        now: Timestamp,
    ) -> Self {
        Self {
            name: packet.name.clone(),
            publisher_digest: packet.publisher_digest.clone(),
            min_suffix: packet.min_suffix,
            max_suffix: packet.max_suffix,
            pkt,
            from: Some(from),
            retries: 0,
            last_used: now,
            propagate,
            pending: Vec::new(),
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

    pub fn from(&self) -> Option<FaceId> {
        self.from
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn last_used(&self) -> Timestamp {
        self.last_used
    }

    pub fn pending(&self) -> &[Pending] {
        &self.pending
    }

    pub fn is_pending_on(&self, face: FaceId) -> bool {
        self.pending.iter().any(|p| p.face == face)
    }

    // Same name, same publisher constraint and same suffix selectors.
    fn is_same_interest(&self, packet: &ParsedPacket) -> bool {
        self.min_suffix == packet.min_suffix
            && self.max_suffix == packet.max_suffix
            && self.publisher_digest == packet.publisher_digest
            && self.name.compare(&packet.name, MatchMode::Exact).is_full()
    }

    /// Records `face` as waiting, or refreshes it if it already is.
    pub(crate) fn append_pending(&mut self, face: FaceId, now: Timestamp) {
        match self.pending.iter_mut().find(|p| p.face == face) {
            Some(existing) => existing.last_used = now,
            None => self.pending.push(Pending {
                face,
                last_used: now,
            }),
        }
    }
}

/// The Pending Interest Table, in arrival order.
#[derive(Debug, Default)]
pub struct Pit {
    entries: Vec<PitEntry>,
}

impl Pit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PitEntry> + '_ {
        self.entries.iter()
    }

    pub fn get(&self, idx: usize) -> Option<&PitEntry> {
        self.entries.get(idx)
    }

    pub(crate) fn get_mut(&mut self, idx: usize) -> Option<&mut PitEntry> {
        self.entries.get_mut(idx)
    }

    pub fn find_exact(&self, packet: &ParsedPacket) -> Option<usize> {
        self.entries.iter().position(|e| e.is_same_interest(packet))
    }

    /// Finds an entry by name alone.
    pub fn find_name(&self, name: &Name) -> Option<&PitEntry> {
        self.entries
            .iter()
            .find(|e| e.name.compare(name, MatchMode::Exact).is_full())
    }

    pub(crate) fn insert(&mut self, entry: PitEntry) -> usize {
        self.entries.push(entry);
        self.entries.len() - 1
    }

    pub(crate) fn remove(&mut self, idx: usize) -> Option<PitEntry> {
        if idx < self.entries.len() {
            Some(self.entries.remove(idx))
        } else {
            None
        }
    }

    // Removes matching entries, keeping the order of the rest.
    pub(crate) fn remove_where<F>(&mut self, mut predicate: F) -> Vec<PitEntry>
    where
        F: FnMut(&PitEntry) -> bool,
    {
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.entries.len());
        for entry in self.entries.drain(..) {
            if predicate(&entry) {
                removed.push(entry);
            } else {
                kept.push(entry);
            }
        }
        self.entries = kept;
        removed
    }

    /// Detaches a face from every entry. Entries left with nobody waiting are
    /// removed and returned.
    pub(crate) fn remove_face(&mut self, face: FaceId) -> Vec<PitEntry> {
        for entry in self.entries.iter_mut() {
            if entry.from == Some(face) {
                entry.from = None;
            }
            entry.pending.retain(|p| p.face != face);
        }
        self.remove_where(|e| e.pending.is_empty())
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}
