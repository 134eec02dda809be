use std::{io::ErrorKind, time::Duration};

use log::{debug, info, trace, warn};
use polling::{Event, Events, PollMode, Poller};

use crate::{
    addr::FaceAddr,
    clock::{Clock, Timestamp},
    error::Result,
    platform::native::{MonotonicClock, UdpTransport},
    relay::Relay,
};

/// Drives a UDP relay from a single thread: waits for readable sockets or the
/// next timer, feeds datagrams to the relay, and runs the periodic ageing.
///
/// Every socket of the transport must be bound before the host is created.
pub struct UdpHost {
    relay: Relay<UdpTransport>,
    clock: MonotonicClock,
    poller: Poller,
    events: Events,
    should_re_add: bool,
    buffer: Vec<u8>,
    next_ageing: Timestamp,
}

impl UdpHost {
    pub fn new(relay: Relay<UdpTransport>) -> Result<Self> {
        let poller = Poller::new()?;
        let should_re_add = !poller.supports_level();
        let mode = if should_re_add {
            PollMode::Oneshot
        } else {
            PollMode::Level
        };

        for (ifndx, socket) in relay.transport().sockets().iter().enumerate() {
            // We remove every socket from the poller in UdpHost::drop(), and
            //  the relay owning the sockets lives exactly as long as we do.
            unsafe {
                poller.add_with_mode(socket, Event::readable(ifndx), mode)?;
            }
        }

        let mut clock = MonotonicClock::new();
        let next_ageing = clock.now().adding(relay.config().ageing_interval_ms);
        let buffer = vec![0u8; relay.config().max_packet_size];
        info!(
            "udp host started with {} interfaces",
            relay.transport().sockets().len()
        );
        Ok(Self {
            relay,
            clock,
            poller,
            events: Events::new(),
            should_re_add,
            buffer,
            next_ageing,
        })
    }

    pub fn relay(&self) -> &Relay<UdpTransport> {
        &self.relay
    }

    pub fn relay_mut(&mut self) -> &mut Relay<UdpTransport> {
        &mut self.relay
    }

    pub fn now(&mut self) -> Timestamp {
        self.clock.now()
    }

    /// Runs forever, or until polling fails.
    pub fn run(&mut self) -> Result<()> {
        loop {
            self.run_once(None)?;
        }
    }

    /// Waits at most `max_wait` (or until the next timer) for traffic and
    /// processes whatever became due.
    pub fn run_once(&mut self, max_wait: Option<Duration>) -> Result<()> {
        let now = self.clock.now();
        let wake = match self.relay.next_deadline() {
            Some(deadline) => deadline.min(self.next_ageing),
            None => self.next_ageing,
        };
        let mut timeout = Duration::from_millis(wake.difference(&now).unwrap_or(0));
        if let Some(max_wait) = max_wait {
            timeout = timeout.min(max_wait);
        }

        self.events.clear();
        match self.poller.wait(&mut self.events, Some(timeout)) {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }

        let readable: Vec<usize> = self
            .events
            .iter()
            .filter(|e| e.readable)
            .map(|e| e.key)
            .collect();
        for ifndx in readable {
            self.drain(ifndx);
            if self.should_re_add {
                if let Some(socket) = self.relay.transport().sockets().get(ifndx) {
                    if let Err(e) = self.poller.modify(socket, Event::readable(ifndx)) {
                        warn!("could not re-arm interface {}: {}", ifndx, e);
                    }
                }
            }
        }

        let now = self.clock.now();
        self.relay.on_timers(now);
        if self.next_ageing <= now {
            self.relay.do_ageing(now);
            self.next_ageing = now.adding(self.relay.config().ageing_interval_ms);
        }
        Ok(())
    }

    fn drain(&mut self, ifndx: usize) {
        loop {
            let (len, from) = match self.relay.transport().recv(ifndx, &mut self.buffer) {
                Ok(Some(received)) => received,
                Ok(None) => return,
                Err(e) => {
                    warn!("receive failed on interface {}: {}", ifndx, e);
                    return;
                }
            };
            let now = self.clock.now();
            let peer = FaceAddr::Udp(from);
            match self
                .relay
                .core_rx(Some(ifndx), Some(&peer), &self.buffer[..len], now)
            {
                Ok(outcome) => trace!("{} bytes from {}: {:?}", len, peer, outcome),
                Err(e) => debug!("dropping {} bytes from {}: {}", len, peer, e),
            }
        }
    }
}

impl Drop for UdpHost {
    fn drop(&mut self) {
        for socket in self.relay.transport().sockets() {
            let _ = self.poller.delete(socket);
        }
        self.relay.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use std::net::UdpSocket;

    use super::*;
    use crate::{
        config::{InterfaceConfig, RelayConfig},
        name::Name,
        packet::{Codec, NdnTlv},
    };

    fn host() -> (UdpHost, std::net::SocketAddr) {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut transport = UdpTransport::new();
        transport.bind("127.0.0.1:0").unwrap();
        let local = transport.local_addr(0).unwrap();

        let mut relay = Relay::new(RelayConfig::default(), transport).unwrap();
        relay
            .add_interface(InterfaceConfig::new(FaceAddr::Udp(local)))
            .unwrap();
        (UdpHost::new(relay).unwrap(), local)
    }

    #[test]
    fn test_serves_static_content() {
        let (mut host, local) = host();
        let name = Name::from_path("/hello/world").unwrap();
        let now = host.now();
        host.relay_mut()
            .add_static_content(&NdnTlv.make_content(&name, b"hi"), now)
            .unwrap();

        let client = UdpSocket::bind("127.0.0.1:0").unwrap();
        client.set_nonblocking(true).unwrap();
        client
            .send_to(&NdnTlv.make_interest(&name, Some([1, 2, 3, 4])), local)
            .unwrap();

        let mut buf = [0u8; 512];
        let mut reply = None;
        for _ in 0..100 {
            host.run_once(Some(Duration::from_millis(20))).unwrap();
            if let Ok((len, _)) = client.recv_from(&mut buf) {
                reply = Some(len);
                break;
            }
        }
        let len = reply.unwrap();
        let pkt = NdnTlv.parse(&buf[..len]).unwrap();
        assert_eq!(pkt.name, name);
        assert_eq!(&buf[pkt.payload], b"hi");
        assert_eq!(host.relay().faces().filter(|f| !f.is_local()).count(), 1);
    }

    #[test]
    fn test_garbage_is_dropped() {
        let (mut host, local) = host();
        let client = UdpSocket::bind("127.0.0.1:0").unwrap();
        client.send_to(&[0xff, 0x00, 0x01], local).unwrap();
        for _ in 0..5 {
            host.run_once(Some(Duration::from_millis(20))).unwrap();
        }
        assert_eq!(host.relay().pit_len(), 0);
    }
}
