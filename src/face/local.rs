use alloc::rc::Rc;
use core::cell::RefCell;

use crate::{buffer::Buffer, name::Name, store::ContentEntry};

/// The up-call side of the local application face.
pub trait AppHandler {
    /// Content that satisfied an Interest the application expressed.
    fn on_content(&mut self, content: &ContentEntry);

    /// Any other packet the relay routed to the application, such as an
    /// Interest matching a prefix the application registered.
    fn on_packet(&mut self, _packet: &[u8]) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivered {
    pub name: Name,
    pub payload: Vec<u8>,
}

#[derive(Default)]
struct Inbox {
    content: Vec<Delivered>,
    packets: Vec<Buffer>,
}

/// An application handler that queues what it receives for later inspection.
///
/// The relay owns the `LocalApp`; the matching [`LocalInbox`] stays with the
/// application, both sharing one queue.
pub struct LocalApp {
    inner: Rc<RefCell<Inbox>>,
}

#[derive(Clone)]
pub struct LocalInbox {
    inner: Rc<RefCell<Inbox>>,
}

pub fn local_app() -> (LocalApp, LocalInbox) {
    let inner = Rc::new(RefCell::new(Inbox::default()));
    let app = LocalApp {
        inner: Rc::clone(&inner),
    };
    (app, LocalInbox { inner })
}

impl AppHandler for LocalApp {
    fn on_content(&mut self, content: &ContentEntry) {
        self.inner.borrow_mut().content.push(Delivered {
            name: content.name().clone(),
            payload: content.payload().to_vec(),
        });
    }

    fn on_packet(&mut self, packet: &[u8]) {
        self.inner
            .borrow_mut()
            .packets
            .push(Buffer::from_slice(packet));
    }
}

impl LocalInbox {
    pub fn take_content(&self) -> Vec<Delivered> {
        core::mem::take(&mut self.inner.borrow_mut().content)
    }

    pub fn take_packets(&self) -> Vec<Buffer> {
        core::mem::take(&mut self.inner.borrow_mut().packets)
    }

    pub fn content_len(&self) -> usize {
        self.inner.borrow().content.len()
    }

    pub fn packets_len(&self) -> usize {
        self.inner.borrow().packets.len()
    }
}
