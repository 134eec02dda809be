use crate::{
    addr::FaceAddr,
    error::{Error, Result},
    name::MAX_NAME_COMPONENTS,
};

pub const NDN_UDP_PORT: u16 = 6363;

pub const DEFAULT_CONTENT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_INTEREST_TIMEOUT_MS: u64 = 4_000;
pub const DEFAULT_FACE_TIMEOUT_MS: u64 = 15_000;
pub const DEFAULT_AGEING_INTERVAL_MS: u64 = 1_000;
pub const DEFAULT_MAX_INTEREST_RETRANSMIT: u32 = 2;
pub const DEFAULT_MAX_NONCES: usize = 256;
pub const DEFAULT_MAX_INTERFACES: usize = 10;
pub const DEFAULT_INTERFACE_QUEUE_LEN: usize = 64;
pub const MAX_PACKET_SIZE: usize = 8096;

/// Limits and timeouts of one relay instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelayConfig {
    pub content_timeout_ms: u64,
    pub interest_timeout_ms: u64,
    pub face_timeout_ms: u64,
    pub ageing_interval_ms: u64,
    pub max_interest_retransmit: u32,
    /// 0 disables caching, a negative value leaves the store unbounded.
    pub max_cache_entries: i64,
    pub max_nonces: usize,
    pub max_interfaces: usize,
    pub interface_queue_len: usize,
    pub max_name_components: usize,
    pub max_packet_size: usize,
    /// Attach a pacing scheduler with this inter-packet gap to every new remote face.
    pub face_packet_interval_ms: Option<u64>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            content_timeout_ms: DEFAULT_CONTENT_TIMEOUT_MS,
            interest_timeout_ms: DEFAULT_INTEREST_TIMEOUT_MS,
            face_timeout_ms: DEFAULT_FACE_TIMEOUT_MS,
            ageing_interval_ms: DEFAULT_AGEING_INTERVAL_MS,
            max_interest_retransmit: DEFAULT_MAX_INTEREST_RETRANSMIT,
            max_cache_entries: 0,
            max_nonces: DEFAULT_MAX_NONCES,
            max_interfaces: DEFAULT_MAX_INTERFACES,
            interface_queue_len: DEFAULT_INTERFACE_QUEUE_LEN,
            max_name_components: MAX_NAME_COMPONENTS,
            max_packet_size: MAX_PACKET_SIZE,
            face_packet_interval_ms: None,
        }
    }
}

impl RelayConfig {
    pub fn with_cache(mut self, max_cache_entries: i64) -> Self {
        self.max_cache_entries = max_cache_entries;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            (self.ageing_interval_ms as usize, "ageing_interval_ms"),
            (self.max_nonces, "max_nonces"),
            (self.max_interfaces, "max_interfaces"),
            (self.interface_queue_len, "interface_queue_len"),
            (self.max_name_components, "max_name_components"),
            (self.max_packet_size, "max_packet_size"),
        ];
        for (value, field) in positive {
            if value == 0 {
                return Err(Error::Config(format!("{} must be greater than zero", field)));
            }
        }
        if self.max_name_components > MAX_NAME_COMPONENTS {
            return Err(Error::Config(format!(
                "max_name_components cannot exceed {}",
                MAX_NAME_COMPONENTS
            )));
        }
        Ok(())
    }
}

/// One network endpoint the relay sends and receives on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InterfaceConfig {
    pub addr: FaceAddr,
    pub mtu: usize,
    /// Faces on this interface may echo Interests back to their origin.
    pub reflect: bool,
    /// Faces on this interface re-propagate Interests already in the PIT.
    pub fwd_all_interests: bool,
    /// Pace the transmit ring with this inter-packet gap.
    pub packet_interval_ms: Option<u64>,
    /// Fragment packets larger than the MTU for faces on this interface.
    pub fragment: bool,
}

impl InterfaceConfig {
    pub fn new(addr: FaceAddr) -> Self {
        Self {
            addr,
            mtu: 1500,
            reflect: false,
            fwd_all_interests: false,
            packet_interval_ms: None,
            fragment: false,
        }
    }

    pub fn mtu(mut self, mtu: usize) -> Self {
        self.mtu = mtu;
        self
    }

    pub fn reflect(mut self, reflect: bool) -> Self {
        self.reflect = reflect;
        self
    }

    pub fn fwd_all_interests(mut self, fwd_all_interests: bool) -> Self {
        self.fwd_all_interests = fwd_all_interests;
        self
    }

    pub fn packet_interval_ms(mut self, ms: u64) -> Self {
        self.packet_interval_ms = Some(ms);
        self
    }

    pub fn fragment(mut self, fragment: bool) -> Self {
        self.fragment = fragment;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RelayConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_cache_entries, 0);
        assert_eq!(config.interest_timeout_ms, 4000);
        assert_eq!(config.max_interfaces, 10);
        assert_eq!(RelayConfig::default().with_cache(-1).max_cache_entries, -1);
    }

    #[test]
    fn test_validate() {
        let config = RelayConfig {
            interface_queue_len: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = RelayConfig {
            max_name_components: MAX_NAME_COMPONENTS + 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
