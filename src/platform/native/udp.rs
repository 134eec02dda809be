use std::{
    io::{self, ErrorKind},
    net::{SocketAddr, ToSocketAddrs, UdpSocket},
};

use log::{info, trace};

use crate::{
    addr::FaceAddr,
    error::{Error, Result},
    face::Transport,
};

/// One non-blocking UDP socket per relay interface.
///
/// Sockets are numbered in the order they are bound, and that number is the
/// interface index the relay uses. Bind a socket, then add the interface with
/// the socket's local address, so that both sides agree.
#[derive(Debug, Default)]
pub struct UdpTransport {
    sockets: Vec<UdpSocket>,
    dropped: u64,
}

impl UdpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, addr: impl ToSocketAddrs) -> io::Result<usize> {
        let socket = UdpSocket::bind(addr)?;
        socket.set_nonblocking(true)?;
        info!("bound udp interface {} to {}", self.sockets.len(), socket.local_addr()?);
        self.sockets.push(socket);
        Ok(self.sockets.len() - 1)
    }

    pub fn local_addr(&self, ifndx: usize) -> Option<SocketAddr> {
        self.sockets.get(ifndx)?.local_addr().ok()
    }

    pub fn sockets(&self) -> &[UdpSocket] {
        &self.sockets
    }

    /// Datagrams the kernel refused because its send buffer was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// The next waiting datagram on `ifndx`, or `None` once the socket is drained.
    pub fn recv(&self, ifndx: usize, buf: &mut [u8]) -> io::Result<Option<(usize, SocketAddr)>> {
        let socket = self
            .sockets
            .get(ifndx)
            .ok_or_else(|| io::Error::new(ErrorKind::NotFound, "no such interface"))?;
        match socket.recv_from(buf) {
            Ok(received) => Ok(Some(received)),
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl Transport for UdpTransport {
    fn send(&mut self, interface: usize, dest: &FaceAddr, bytes: &[u8]) -> Result<()> {
        let socket = self
            .sockets
            .get(interface)
            .ok_or_else(|| Error::Transport(format!("no socket for interface {}", interface)))?;
        let FaceAddr::Udp(dest) = dest else {
            return Err(Error::Transport(format!("{} is not a udp address", dest)));
        };
        match socket.send_to(bytes, dest) {
            Ok(_) => Ok(()),
            // Datagrams are lossy anyway
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                trace!("send buffer full, dropping {} bytes to {}", bytes.len(), dest);
                self.dropped += 1;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_send_and_recv() {
        let mut transport = UdpTransport::new();
        let ifndx = transport.bind("127.0.0.1:0").unwrap();
        assert_eq!(ifndx, 0);
        let local = transport.local_addr(0).unwrap();

        let peer = UdpSocket::bind("127.0.0.1:0").unwrap();
        peer.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        let peer_addr = peer.local_addr().unwrap();

        transport.send(0, &FaceAddr::Udp(peer_addr), b"hello").unwrap();
        let mut buf = [0u8; 16];
        let (len, from) = peer.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..len], b"hello");
        assert_eq!(from, local);

        let mut buf = [0u8; 16];
        assert!(transport.recv(0, &mut buf).unwrap().is_none());
        peer.send_to(b"back", local).unwrap();
        let mut received = None;
        for _ in 0..200 {
            received = transport.recv(0, &mut buf).unwrap();
            if received.is_some() {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(received, Some((4, peer_addr)));
        assert_eq!(&buf[..4], b"back");
    }

    #[test]
    fn test_send_errors() {
        let mut transport = UdpTransport::new();
        assert!(matches!(
            transport.send(0, &FaceAddr::Sim(1), b"x"),
            Err(Error::Transport(_))
        ));
        transport.bind("127.0.0.1:0").unwrap();
        assert!(matches!(
            transport.send(0, &FaceAddr::Sim(1), b"x"),
            Err(Error::Transport(_))
        ));
        assert!(transport.recv(3, &mut [0u8; 4]).is_err());
    }
}
