use crate::{addr::FaceAddr, buffer::Buffer, error::Result, face::Transport};

/// A packet handed to the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sent {
    pub interface: usize,
    pub dest: FaceAddr,
    pub buf: Buffer,
}

/// A transport that records what it is asked to send instead of putting it on a wire.
///
/// Simulations move the recorded packets into other relays; tests inspect them.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    sent: Vec<Sent>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> &[Sent] {
        &self.sent
    }

    pub fn take_sent(&mut self) -> Vec<Sent> {
        core::mem::take(&mut self.sent)
    }

    pub fn sent_to(&self, dest: &FaceAddr) -> impl Iterator<Item = &Sent> + '_ {
        let dest = dest.clone();
        self.sent.iter().filter(move |s| s.dest == dest)
    }
}

impl Transport for MemoryTransport {
    fn send(&mut self, interface: usize, dest: &FaceAddr, bytes: &[u8]) -> Result<()> {
        self.sent.push(Sent {
            interface,
            dest: dest.clone(),
            buf: Buffer::from_slice(bytes),
        });
        Ok(())
    }
}
