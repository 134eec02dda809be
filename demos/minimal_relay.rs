use std::net::SocketAddr;

use clap::Parser;
use log::info;

use ccn_relay::{
    config::NDN_UDP_PORT,
    platform::{UdpHost, UdpTransport},
    FaceAddr, FaceFlags, InterfaceConfig, LocalManagement, Name, Relay, RelayConfig,
};

/// A relay listening on one UDP port, with optional static routes.
#[derive(Parser, Debug)]
struct Args {
    /// Local UDP port
    #[arg(short, long, default_value_t = NDN_UDP_PORT)]
    port: u16,

    /// Content store size: 0 disables caching, negative is unbounded
    #[arg(short, long, default_value_t = 100, allow_negative_numbers = true)]
    cache: i64,

    /// Static route, as PREFIX=HOST:PORT. May be repeated.
    #[arg(short, long = "route", value_name = "PREFIX=HOST:PORT")]
    routes: Vec<String>,

    /// Only answer management requests addressed to this relay name
    #[arg(long)]
    relay_id: Option<String>,
}

fn parse_route(route: &str) -> Option<(Name, SocketAddr)> {
    let (prefix, peer) = route.split_once('=')?;
    Some((Name::from_path(prefix).ok()?, peer.parse().ok()?))
}

fn main() -> ccn_relay::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut transport = UdpTransport::new();
    transport.bind(("0.0.0.0", args.port))?;
    let local = transport
        .local_addr(0)
        .ok_or(ccn_relay::Error::NoInterface)?;

    let config = RelayConfig::default().with_cache(args.cache);
    let mut relay = Relay::new(config, transport)?;
    relay.add_interface(InterfaceConfig::new(FaceAddr::Udp(local)))?;
    relay.set_management(match &args.relay_id {
        Some(id) => LocalManagement::with_relay_id(id),
        None => LocalManagement::new(),
    });

    let mut host = UdpHost::new(relay)?;
    let now = host.now();
    for route in &args.routes {
        let Some((prefix, peer)) = parse_route(route) else {
            eprintln!("Ignoring malformed route {route}");
            continue;
        };
        let relay = host.relay_mut();
        let face = relay
            .face_for(None, Some(&FaceAddr::Udp(peer)), now)
            .ok_or(ccn_relay::Error::NoInterface)?;
        // Routed peers stay even when idle
        relay.set_face_flags(face, FaceFlags::STATIC)?;
        relay.add_fib_rule(prefix.clone(), face)?;
        info!("route {} via {} ({})", prefix, peer, face);
    }

    info!("relay listening on {}", local);
    host.run()
}
