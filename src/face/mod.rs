mod interface;
pub use interface::*;

pub mod local;
pub mod memory;
pub mod ringbuffer;

use alloc::collections::VecDeque;
use core::{fmt, ops};

use crate::{
    addr::FaceAddr,
    buffer::Buffer,
    clock::Timestamp,
    error::Result,
    frag::{Fragmenter, LpReassembler},
    sched::Scheduler,
};

// A Face is one peer we exchange packets with: a remote address reached through
//  one of the interfaces, or the local application.
// Faces are identified by increasing ids which are never reused, so a stale id
//  held by a table entry simply fails to resolve once the face is gone.

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FaceId(pub(crate) u32);

impl FaceId {
    pub fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for FaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "face#{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FaceFlags(u8);

impl FaceFlags {
    pub const NONE: FaceFlags = FaceFlags(0);
    /// Never removed for being idle.
    pub const STATIC: FaceFlags = FaceFlags(0x01);
    /// Interests may be sent back out on the face they came from.
    pub const REFLECT: FaceFlags = FaceFlags(0x02);
    /// Already handed the content currently being delivered.
    pub const SERVED: FaceFlags = FaceFlags(0x04);
    /// Interests already pending are propagated again when they arrive here.
    pub const FWD_ALL_INTERESTS: FaceFlags = FaceFlags(0x08);

    pub fn contains(&self, other: FaceFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: FaceFlags) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: FaceFlags) {
        self.0 &= !other.0;
    }

    pub fn bits(&self) -> u8 {
        self.0
    }
}

impl ops::BitOr for FaceFlags {
    type Output = FaceFlags;

    fn bitor(self, rhs: FaceFlags) -> FaceFlags {
        FaceFlags(self.0 | rhs.0)
    }
}

/// The transport-send collaborator used to drain interface rings.
pub trait Transport {
    fn send(&mut self, interface: usize, dest: &FaceAddr, bytes: &[u8]) -> Result<()>;
}

pub struct Face {
    pub(crate) id: FaceId,
    pub(crate) interface: Option<usize>,
    pub(crate) peer: Option<FaceAddr>,
    pub(crate) flags: FaceFlags,
    pub(crate) last_used: Timestamp,
    pub(crate) outq: VecDeque<Buffer>,
    pub(crate) sched: Option<Box<dyn Scheduler>>,
    pub(crate) frag: Option<Box<dyn Fragmenter>>,
    pub(crate) reassembly: Option<LpReassembler>,
}

impl Face {
    pub(crate) fn new(
        id: FaceId,
        interface: Option<usize>,
        peer: Option<FaceAddr>,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            interface,
            peer,
            flags: FaceFlags::NONE,
            last_used: now,
            outq: VecDeque::new(),
            sched: None,
            frag: None,
            reassembly: None,
        }
    }

    pub fn id(&self) -> FaceId {
        self.id
    }

    /// Interface index, or `None` for the local application face.
    pub fn interface(&self) -> Option<usize> {
        self.interface
    }

    pub fn peer(&self) -> Option<&FaceAddr> {
        self.peer.as_ref()
    }

    pub fn flags(&self) -> FaceFlags {
        self.flags
    }

    pub fn last_used(&self) -> Timestamp {
        self.last_used
    }

    pub fn is_local(&self) -> bool {
        self.interface.is_none()
    }

    pub fn queued(&self) -> usize {
        self.outq.len()
    }

    pub fn has_scheduler(&self) -> bool {
        self.sched.is_some()
    }

    // Appends unless a byte-identical packet is already waiting.
    pub(crate) fn enqueue(&mut self, buf: Buffer) -> bool {
        if self.outq.iter().any(|queued| *queued == buf) {
            return false;
        }
        self.outq.push_back(buf);
        true
    }
}

impl fmt::Debug for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Face")
            .field("id", &self.id)
            .field("interface", &self.interface)
            .field("peer", &self.peer)
            .field("flags", &self.flags)
            .field("last_used", &self.last_used)
            .field("queued", &self.outq.len())
            .finish()
    }
}

/// All faces of a relay, kept sorted by id.
pub(crate) struct Faces {
    faces: Vec<Face>,
    latest_face_id: u32,
}

impl Faces {
    pub(crate) fn new() -> Self {
        Self {
            faces: Vec::new(),
            latest_face_id: 0,
        }
    }

    pub(crate) fn next_id(&mut self) -> Option<FaceId> {
        self.latest_face_id = self.latest_face_id.checked_add(1)?;
        Some(FaceId(self.latest_face_id))
    }

    // Ids only ever grow, so pushing keeps the vector sorted.
    pub(crate) fn insert(&mut self, face: Face) {
        debug_assert!(self.faces.last().map_or(true, |f| f.id < face.id));
        self.faces.push(face);
    }

    pub(crate) fn remove(&mut self, id: FaceId) -> Option<Face> {
        let idx = self.find(id)?;
        Some(self.faces.remove(idx))
    }

    pub(crate) fn get(&self, id: FaceId) -> Option<&Face> {
        self.find(id).map(|idx| &self.faces[idx])
    }

    pub(crate) fn get_mut(&mut self, id: FaceId) -> Option<&mut Face> {
        self.find(id).map(move |idx| &mut self.faces[idx])
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Face> + '_ {
        self.faces.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Face> + '_ {
        self.faces.iter_mut()
    }

    pub(crate) fn len(&self) -> usize {
        self.faces.len()
    }

    pub(crate) fn ids(&self) -> Vec<FaceId> {
        self.faces.iter().map(|f| f.id).collect()
    }

    fn find(&self, id: FaceId) -> Option<usize> {
        self.faces.binary_search_by_key(&id, |f| f.id).ok()
    }
}
