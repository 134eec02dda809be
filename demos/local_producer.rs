use ccn_relay::{
    face::{local::local_app, memory::MemoryTransport},
    Codec, DataBuilder, FaceAddr, InterfaceConfig, Name, NdnTlv, Relay, RelayConfig, RxOutcome,
    Timestamp,
};

// One relay with a simulated neighbour (node 1) and a producer application
//  attached to the local face. The neighbour asks for /demo/hello; the relay
//  routes the Interest to the application, which answers with Data that
//  flows back to the neighbour and into the cache.
fn main() -> ccn_relay::Result<()> {
    env_logger::init();

    let config = RelayConfig::default().with_cache(16);
    let mut relay = Relay::new(config, MemoryTransport::new())?;
    relay.add_interface(InterfaceConfig::new(FaceAddr::Sim(0)))?;

    let (app, inbox) = local_app();
    relay.set_app_handler(app);

    let mut now = Timestamp::from_ms(1000);
    let producer = relay
        .local_face(now)
        .ok_or(ccn_relay::Error::NoInterface)?;
    relay.add_fib_rule(Name::from_path("/demo").unwrap(), producer)?;

    let neighbour = FaceAddr::Sim(1);
    let name = Name::from_path("/demo/hello").unwrap();
    let interest = NdnTlv.make_interest(&name, Some([1, 2, 3, 4]));
    let outcome = relay.core_rx(Some(0), Some(&neighbour), &interest, now)?;
    println!("Interest from {neighbour}: {outcome:?}");

    for packet in inbox.take_packets() {
        let request = NdnTlv.parse(&packet)?;
        println!("Producer got interest for {}", request.name);
        let data = DataBuilder::new(request.name, b"Hello from the producer".to_vec()).build();
        now = now.adding(5);
        let outcome = relay.core_rx(None, None, &data, now)?;
        println!("Producer answered: {outcome:?}");
    }

    for sent in relay.transport_mut().take_sent() {
        let pkt = NdnTlv.parse(&sent.buf)?;
        println!(
            "Sent to {}: {} \"{}\"",
            sent.dest,
            pkt.name,
            String::from_utf8_lossy(&sent.buf[pkt.payload])
        );
    }

    // A second neighbour is served from the cache without bothering the producer
    now = now.adding(5);
    let interest = NdnTlv.make_interest(&name, Some([5, 6, 7, 8]));
    let outcome = relay.core_rx(Some(0), Some(&FaceAddr::Sim(2)), &interest, now)?;
    assert_eq!(outcome, RxOutcome::FromCache);
    println!("Second interest: {outcome:?}, producer saw {} packets", inbox.packets_len());

    println!("{}", relay.dump());
    Ok(())
}
