use core::fmt;

use crate::{
    addr::FaceAddr, buffer::Buffer, config::InterfaceConfig, face::ringbuffer::RingBuffer,
    face::FaceId, sched::Scheduler,
};

/// One packet waiting for its turn on an interface.
#[derive(Debug)]
pub struct TxRequest {
    pub buf: Buffer,
    pub dest: FaceAddr,
    /// The face to notify once the packet is out, if any.
    pub face: Option<FaceId>,
}

/// A transport binding with a bounded transmit ring.
pub struct Interface {
    pub(crate) config: InterfaceConfig,
    pub(crate) queue: RingBuffer<TxRequest>,
    pub(crate) sched: Option<Box<dyn Scheduler>>,
}

impl Interface {
    pub(crate) fn new(config: InterfaceConfig, queue_len: usize) -> Self {
        Self {
            config,
            queue: RingBuffer::new(queue_len),
            sched: None,
        }
    }

    pub fn addr(&self) -> &FaceAddr {
        &self.config.addr
    }

    pub fn config(&self) -> &InterfaceConfig {
        &self.config
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }
}

impl fmt::Debug for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interface")
            .field("addr", &self.config.addr)
            .field("mtu", &self.config.mtu)
            .field("queued", &self.queue.len())
            .field("paced", &self.sched.is_some())
            .finish()
    }
}
