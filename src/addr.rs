use core::fmt;
use std::{net::SocketAddr, path::PathBuf};

/// Where a face's peer lives. Each transport family carries only its own fields.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FaceAddr {
    Udp(SocketAddr),
    Ethernet { mac: [u8; 6], ethertype: u16 },
    Unix(PathBuf),
    /// Node identifier inside a discrete-event simulation.
    Sim(u32),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum AddrFamily {
    Inet,
    Inet6,
    Ethernet,
    Unix,
    Sim,
}

impl FaceAddr {
    pub fn family(&self) -> AddrFamily {
        match self {
            FaceAddr::Udp(SocketAddr::V4(_)) => AddrFamily::Inet,
            FaceAddr::Udp(SocketAddr::V6(_)) => AddrFamily::Inet6,
            FaceAddr::Ethernet { .. } => AddrFamily::Ethernet,
            FaceAddr::Unix(_) => AddrFamily::Unix,
            FaceAddr::Sim(_) => AddrFamily::Sim,
        }
    }
}

impl From<SocketAddr> for FaceAddr {
    fn from(value: SocketAddr) -> Self {
        FaceAddr::Udp(value)
    }
}

impl fmt::Display for FaceAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaceAddr::Udp(sa) => write!(f, "udp/{}", sa),
            FaceAddr::Ethernet { mac, ethertype } => write!(
                f,
                "eth/{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}/0x{:04x}",
                mac[0], mac[1], mac[2], mac[3], mac[4], mac[5], ethertype
            ),
            FaceAddr::Unix(path) => write!(f, "unix/{}", path.display()),
            FaceAddr::Sim(node) => write!(f, "sim/{}", node),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_and_display() {
        let v4: FaceAddr = "127.0.0.1:6363".parse::<SocketAddr>().unwrap().into();
        let v6: FaceAddr = "[::1]:6363".parse::<SocketAddr>().unwrap().into();
        assert_eq!(v4.family(), AddrFamily::Inet);
        assert_eq!(v6.family(), AddrFamily::Inet6);
        assert_eq!(format!("{}", v4), "udp/127.0.0.1:6363");

        let eth = FaceAddr::Ethernet {
            mac: [0, 0x1b, 0x21, 0xaa, 0xbb, 0x0c],
            ethertype: 0x0801,
        };
        assert_eq!(eth.family(), AddrFamily::Ethernet);
        assert_eq!(format!("{}", eth), "eth/00:1b:21:aa:bb:0c/0x0801");
        assert_eq!(format!("{}", FaceAddr::Sim(7)), "sim/7");
        assert_ne!(FaceAddr::Sim(7), FaceAddr::Sim(8));
    }
}
