use log::{debug, info};

use crate::{
    error::Result,
    face::{FaceId, Transport},
    name::Name,
    packet::{DataBuilder, ParsedPacket},
    relay::Relay,
};

/// Receives Interests addressed to `/ccnx/<relay>/<command>/<param>`.
///
/// The handler runs inside the relay's receive path and may reconfigure the
/// relay through the `relay` reference.
pub trait ManagementHandler<T: Transport> {
    fn handle(&mut self, relay: &mut Relay<T>, request: &ParsedPacket, from: FaceId) -> Result<()>;
}

const REPLY_OK: &str = "ok";

/// Serves the basic management commands and answers each request with a Data
/// packet named after it, carrying `ok` or an error message.
///
/// * `prefixreg` routes the prefix in `param` to the requesting face
/// * `prefixunreg` removes such a route
/// * `destroyface` destroys the face whose number is in `param`
/// * `debug` logs the relay state
#[derive(Clone, Debug, Default)]
pub struct LocalManagement {
    relay_id: Option<Vec<u8>>,
}

impl LocalManagement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only accept requests whose second component is `id`.
    pub fn with_relay_id(id: &str) -> Self {
        Self {
            relay_id: Some(id.as_bytes().to_vec()),
        }
    }

    fn execute<T: Transport>(
        &self,
        relay: &mut Relay<T>,
        command: &[u8],
        param: &[u8],
        from: FaceId,
    ) -> core::result::Result<Option<FaceId>, String> {
        match command {
            b"prefixreg" => {
                let prefix = parse_prefix(param)?;
                relay
                    .add_fib_rule(prefix, from)
                    .map_err(|e| e.to_string())?;
                Ok(None)
            }
            b"prefixunreg" => {
                let prefix = parse_prefix(param)?;
                if relay.remove_fib_rule(&prefix, from) {
                    Ok(None)
                } else {
                    Err(format!("no route for {}", prefix))
                }
            }
            b"destroyface" => {
                let id = core::str::from_utf8(param)
                    .ok()
                    .and_then(|s| s.parse::<u32>().ok())
                    .map(FaceId)
                    .ok_or_else(|| "bad face number".to_string())?;
                if relay.face(id).is_none() {
                    return Err(format!("no such face {}", id));
                }
                Ok(Some(id))
            }
            b"debug" => {
                info!("{}", relay.dump());
                Ok(None)
            }
            other => Err(format!(
                "unknown command {}",
                String::from_utf8_lossy(other)
            )),
        }
    }
}

impl<T: Transport> ManagementHandler<T> for LocalManagement {
    fn handle(&mut self, relay: &mut Relay<T>, request: &ParsedPacket, from: FaceId) -> Result<()> {
        let component = |idx| request.name.component(idx).unwrap_or_default();

        let outcome = match &self.relay_id {
            Some(id) if component(1) != id.as_slice() => Err("not addressed to this relay".to_string()),
            _ => self.execute(relay, component(2), component(3), from),
        };

        let (reply, destroy) = match outcome {
            Ok(destroy) => (REPLY_OK.to_string(), destroy),
            Err(message) => (message, None),
        };
        debug!("management {} from {}: {}", request.name, from, reply);

        // We answer before a destroyed face takes the reply with it
        let data = DataBuilder::new(request.name.clone(), reply.into_bytes()).build();
        relay.send(from, data)?;
        if let Some(id) = destroy {
            relay.destroy_face(id);
        }
        Ok(())
    }
}

// The parameter is a path such as "/a/b", carried in a single component.
fn parse_prefix(param: &[u8]) -> core::result::Result<Name, String> {
    let path = core::str::from_utf8(param).map_err(|_| "prefix is not text".to_string())?;
    Name::from_path(path).map_err(|_| "prefix has too many components".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        addr::FaceAddr,
        clock::Timestamp,
        config::{InterfaceConfig, RelayConfig},
        face::memory::MemoryTransport,
        packet::{Codec, NdnTlv},
        relay::RxOutcome,
    };

    fn relay(mgmt: LocalManagement) -> Relay<MemoryTransport> {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut relay = Relay::new(RelayConfig::default(), MemoryTransport::new()).unwrap();
        relay.add_interface(InterfaceConfig::new(FaceAddr::Sim(0))).unwrap();
        relay.set_management(mgmt);
        relay
    }

    fn request(relay: &mut Relay<MemoryTransport>, node: u32, parts: [&str; 4], nonce: u8) -> String {
        let name = Name::from_components(parts).unwrap();
        let bytes = NdnTlv.make_interest(&name, Some([nonce; 4]));
        let outcome = relay
            .core_rx(Some(0), Some(&FaceAddr::Sim(node)), &bytes, Timestamp::ZERO)
            .unwrap();
        assert_eq!(outcome, RxOutcome::Management);

        let sent = relay.transport_mut().take_sent();
        let reply = sent.last().unwrap();
        assert_eq!(reply.dest, FaceAddr::Sim(node));
        let pkt = NdnTlv.parse(&reply.buf).unwrap();
        assert_eq!(pkt.name, name);
        String::from_utf8(reply.buf[pkt.payload].to_vec()).unwrap()
    }

    #[test]
    fn test_prefix_registration() {
        let mut relay = relay(LocalManagement::new());
        assert_eq!(request(&mut relay, 1, ["ccnx", "r", "prefixreg", "/a/b"], 1), "ok");

        let f1 = relay.face_for(Some(0), Some(&FaceAddr::Sim(1)), Timestamp::ZERO).unwrap();
        let rules: Vec<(String, FaceId)> = relay
            .fib_rules()
            .map(|r| (r.prefix.to_string(), r.face))
            .collect();
        assert_eq!(rules, vec![("/a/b".to_string(), f1)]);
        assert_eq!(relay.pit_len(), 0);

        assert_eq!(request(&mut relay, 1, ["ccnx", "r", "prefixunreg", "/a/b"], 2), "ok");
        assert_eq!(relay.fib_rules().count(), 0);
        assert_eq!(
            request(&mut relay, 1, ["ccnx", "r", "prefixunreg", "/a/b"], 3),
            "no route for /a/b"
        );
    }

    #[test]
    fn test_destroy_face() {
        let mut relay = relay(LocalManagement::new());
        let f2 = relay.face_for(Some(0), Some(&FaceAddr::Sim(2)), Timestamp::ZERO).unwrap();
        let param = f2.get().to_string();
        assert_eq!(request(&mut relay, 1, ["ccnx", "r", "destroyface", &param], 1), "ok");
        assert!(relay.face(f2).is_none());

        assert_eq!(
            request(&mut relay, 1, ["ccnx", "r", "destroyface", "x"], 2),
            "bad face number"
        );
        assert!(request(&mut relay, 1, ["ccnx", "r", "destroyface", &param], 3).starts_with("no such face"));
    }

    #[test]
    fn test_errors() {
        let mut relay = relay(LocalManagement::with_relay_id("r1"));
        assert_eq!(
            request(&mut relay, 1, ["ccnx", "r2", "prefixreg", "/a"], 1),
            "not addressed to this relay"
        );
        assert_eq!(
            request(&mut relay, 1, ["ccnx", "r1", "reboot", "now"], 2),
            "unknown command reboot"
        );
        assert_eq!(request(&mut relay, 1, ["ccnx", "r1", "debug", "-"], 3), "ok");
        assert_eq!(relay.fib_rules().count(), 0);
    }
}
