mod clock;
mod udp;

#[cfg(feature = "poller")]
mod host;

pub use clock::MonotonicClock;
pub use udp::UdpTransport;

#[cfg(feature = "poller")]
pub use host::UdpHost;
