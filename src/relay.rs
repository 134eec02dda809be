use alloc::collections::VecDeque;
use core::fmt;

use log::{debug, info, trace, warn};

use crate::{
    addr::FaceAddr,
    buffer::Buffer,
    clock::Timestamp,
    config::{InterfaceConfig, RelayConfig},
    error::{Error, Result},
    face::{
        local::AppHandler, Face, FaceFlags, FaceId, Faces, Interface, Transport, TxRequest,
    },
    frag::{LpFragmenter, LpReassembler, DEFAULT_MAX_PARTIAL_PACKETS},
    mgmt::ManagementHandler,
    name::Name,
    packet::{suite_of, Codec, NdnTlv, PacketKind, ParseError, ParsedPacket, Suite, TLV_TYPE_INTEREST},
    sched::{Clearance, PacketRateScheduler},
    store::{ContentEntry, ContentStore},
    tables::{Fib, FibRule, NonceSet, Pit, PitEntry},
    timer::TimerQueue,
};

// The forwarding engine. Everything happens synchronously inside one of the
//  entry points (core_rx, do_ageing, on_timers and the management calls);
//  each of them finishes by running whatever transmissions were cleared along
//  the way, so the tables are consistent again when control returns to the host.

const MGMT_COMPONENT: &[u8] = b"ccnx";

/// What happened to a received packet. For a datagram carrying several
/// packets this describes the last one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RxOutcome {
    /// No face could be found or created for the sender.
    NoFace,
    DuplicateNonce,
    /// Handed to the management handler.
    Management,
    /// A management request with no handler configured, or one the handler refused.
    ManagementDropped,
    /// Answered from the content store.
    FromCache,
    InterestCreated { forwarded: usize },
    InterestKnown { forwarded: usize },
    DuplicateContent,
    Unsolicited,
    ContentServed { faces: usize, cached: bool },
    /// A link fragment was stored; the packet is not complete yet.
    FragmentPending,
}

// Whose turn it is to transmit once a scheduler clears it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum CtsTarget {
    Face(FaceId),
    Interface(usize),
}

pub struct Relay<T: Transport> {
    config: RelayConfig,
    transport: T,
    interfaces: Vec<Interface>,
    faces: Faces,
    pit: Pit,
    store: ContentStore,
    fib: Fib,
    nonces: NonceSet,
    codec: NdnTlv,
    timers: TimerQueue<CtsTarget>,
    ready: VecDeque<CtsTarget>,
    app: Option<Box<dyn AppHandler>>,
    mgmt: Option<Box<dyn ManagementHandler<T>>>,
    now: Timestamp,
}

impl<T: Transport> Relay<T> {
    pub fn new(config: RelayConfig, transport: T) -> Result<Self> {
        config.validate()?;
        let nonces = NonceSet::new(config.max_nonces);
        Ok(Self {
            config,
            transport,
            interfaces: Vec::new(),
            faces: Faces::new(),
            pit: Pit::new(),
            store: ContentStore::new(),
            fib: Fib::new(),
            nonces,
            codec: NdnTlv,
            timers: TimerQueue::new(),
            ready: VecDeque::new(),
            app: None,
            mgmt: None,
            now: Timestamp::ZERO,
        })
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn set_app_handler(&mut self, app: impl AppHandler + 'static) {
        self.app = Some(Box::new(app));
    }

    pub fn set_management(&mut self, mgmt: impl ManagementHandler<T> + 'static) {
        self.mgmt = Some(Box::new(mgmt));
    }

    pub fn add_interface(&mut self, config: InterfaceConfig) -> Result<usize> {
        if self.interfaces.len() >= self.config.max_interfaces {
            return Err(Error::ResourceExhausted("interfaces"));
        }
        let mut iface = Interface::new(config, self.config.interface_queue_len);
        if let Some(ms) = iface.config.packet_interval_ms {
            iface.sched = Some(Box::new(PacketRateScheduler::new(ms)));
        }
        info!(
            "interface {} on {} (mtu {})",
            self.interfaces.len(),
            iface.config.addr,
            iface.config.mtu
        );
        self.interfaces.push(iface);
        Ok(self.interfaces.len() - 1)
    }

    pub fn interfaces(&self) -> &[Interface] {
        &self.interfaces
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn now(&self) -> Timestamp {
        self.now
    }

    pub fn pit(&self) -> &Pit {
        &self.pit
    }

    pub fn pit_len(&self) -> usize {
        self.pit.len()
    }

    pub fn pit_entries(&self) -> impl Iterator<Item = &PitEntry> + '_ {
        self.pit.iter()
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    pub fn fib_rules(&self) -> impl Iterator<Item = &FibRule> + '_ {
        self.fib.iter()
    }

    pub fn face(&self, id: FaceId) -> Option<&Face> {
        self.faces.get(id)
    }

    pub fn faces(&self) -> impl Iterator<Item = &Face> + '_ {
        self.faces.iter()
    }

    /// Finds the face for a peer, creating it if needed.
    ///
    /// Without a peer this is the local application face. With an interface
    /// index the search is limited to faces on that interface; without one the
    /// first interface of the peer's address family is used for a new face.
    pub fn face_for(
        &mut self,
        ifndx: Option<usize>,
        peer: Option<&FaceAddr>,
        now: Timestamp,
    ) -> Option<FaceId> {
        self.now = now;
        self.lookup_face(ifndx, peer)
    }

    pub fn local_face(&mut self, now: Timestamp) -> Option<FaceId> {
        self.face_for(None, None, now)
    }

    pub fn set_face_flags(&mut self, id: FaceId, flags: FaceFlags) -> Result<()> {
        let face = self.faces.get_mut(id).ok_or(Error::UnknownFace(id))?;
        // SERVED is bookkeeping of the relay, not something callers set
        let served = face.flags.contains(FaceFlags::SERVED);
        face.flags = flags;
        if served {
            face.flags.insert(FaceFlags::SERVED);
        } else {
            face.flags.remove(FaceFlags::SERVED);
        }
        Ok(())
    }

    /// Removes a face along with its PIT waiters and FIB rules.
    pub fn destroy_face(&mut self, id: FaceId) -> bool {
        let removed = self.remove_face(id);
        self.run_ready();
        removed
    }

    /// Routes Interests under `prefix` to `face`. Returns false if the rule
    /// already existed.
    pub fn add_fib_rule(&mut self, prefix: Name, face: FaceId) -> Result<bool> {
        if self.faces.get(face).is_none() {
            return Err(Error::UnknownFace(face));
        }
        debug!("fib {} -> {}", prefix, face);
        Ok(self.fib.add(prefix, face))
    }

    pub fn remove_fib_rule(&mut self, prefix: &Name, face: FaceId) -> bool {
        self.fib.remove(prefix, face)
    }

    /// Queues a packet on a face, as if the relay had decided to forward it there.
    pub fn send(&mut self, face: FaceId, buf: Buffer) -> Result<()> {
        if self.faces.get(face).is_none() {
            return Err(Error::UnknownFace(face));
        }
        self.face_enqueue(face, buf);
        self.run_ready();
        Ok(())
    }

    /// Pins a Data packet in the content store; it is never aged out.
    pub fn add_static_content(&mut self, bytes: &[u8], now: Timestamp) -> Result<()> {
        self.now = now;
        let pkt = self.codec.parse(bytes)?;
        if pkt.kind != PacketKind::Content {
            return Err(ParseError::UnexpectedType(TLV_TYPE_INTEREST).into());
        }
        let raw = Buffer::from_slice(&bytes[..pkt.length]);
        let mut entry = ContentEntry::new(&pkt, raw, now);
        entry.set_static();
        debug!("static content {}", entry.name);
        if let Some(evicted) = self.store.add(entry, self.config.max_cache_entries) {
            debug!("evicted {} from the content store", evicted.name);
        }
        Ok(())
    }

    /// Processes one received datagram: `ifndx` and `peer` identify where it
    /// came from, both `None` for the local application.
    ///
    /// Only undecodable input is an error; every other outcome, including
    /// dropped duplicates, is reported through [`RxOutcome`].
    pub fn core_rx(
        &mut self,
        ifndx: Option<usize>,
        peer: Option<&FaceAddr>,
        bytes: &[u8],
        now: Timestamp,
    ) -> Result<RxOutcome> {
        self.now = now;
        let result = self.rx_datagram(ifndx, peer, bytes);
        self.run_ready();
        result
    }

    /// The periodic sweep: expire content, then retransmit or expire
    /// Interests, then remove idle faces.
    pub fn do_ageing(&mut self, now: Timestamp) {
        self.now = now;

        for entry in self.store.age(self.config.content_timeout_ms, now) {
            debug!("aged out content {}", entry.name);
        }

        let mut idx = 0;
        while let Some(entry) = self.pit.get(idx) {
            if entry.last_used.expired(self.config.interest_timeout_ms, now)
                || entry.retries > self.config.max_interest_retransmit
            {
                if let Some(entry) = self.pit.remove(idx) {
                    debug!("interest {} expired after {} retries", entry.name, entry.retries);
                }
                continue;
            }
            if entry.propagate {
                trace!("retransmitting interest {}", entry.name);
                self.propagate_interest(idx);
            }
            if let Some(entry) = self.pit.get_mut(idx) {
                entry.retries += 1;
            }
            idx += 1;
        }

        let idle: Vec<FaceId> = self
            .faces
            .iter()
            .filter(|f| {
                !f.flags.contains(FaceFlags::STATIC)
                    && f.last_used.expired(self.config.face_timeout_ms, now)
            })
            .map(|f| f.id)
            .collect();
        for id in idle {
            debug!("{} idle, removing", id);
            self.remove_face(id);
        }

        self.run_ready();
    }

    /// Earliest time a paced transmission is waiting for.
    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.timers.next_deadline()
    }

    /// Runs the transmissions whose scheduled time has come.
    pub fn on_timers(&mut self, now: Timestamp) {
        self.now = now;
        while let Some(target) = self.timers.pop_due(now) {
            self.ready.push_back(target);
        }
        self.run_ready();
    }

    /// Destroys every face and empties all tables.
    pub fn shutdown(&mut self) {
        for id in self.faces.ids() {
            self.remove_face(id);
        }
        self.pit.clear();
        self.store.clear();
        self.fib.clear();
        self.nonces.clear();
        self.timers.clear();
        self.ready.clear();
        for iface in self.interfaces.iter_mut() {
            iface.queue.clear();
        }
        info!("relay shut down");
    }

    pub fn dump(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail
        let _ = self.write_state(&mut out);
        out
    }

    fn write_state(&self, out: &mut impl fmt::Write) -> fmt::Result {
        writeln!(out, "relay state at {}, {} faces", self.now, self.faces.len())?;
        for (idx, iface) in self.interfaces.iter().enumerate() {
            writeln!(
                out,
                "  interface {} {} mtu={} queued={}",
                idx,
                iface.config.addr,
                iface.config.mtu,
                iface.queue.len()
            )?;
        }
        for face in self.faces.iter() {
            match &face.peer {
                Some(peer) => write!(out, "  {} {}", face.id, peer)?,
                None => write!(out, "  {} local", face.id)?,
            }
            writeln!(
                out,
                " flags=0x{:02x} last_used={} queued={}",
                face.flags.bits(),
                face.last_used,
                face.outq.len()
            )?;
        }
        for rule in self.fib.iter() {
            writeln!(out, "  fib {} -> {}", rule.prefix, rule.face)?;
        }
        for entry in self.pit.iter() {
            write!(out, "  pit {} retries={} pending=", entry.name, entry.retries)?;
            for p in entry.pending.iter() {
                write!(out, "{} ", p.face)?;
            }
            writeln!(out)?;
        }
        for entry in self.store.iter() {
            writeln!(
                out,
                "  cs {} {}B served={}{}",
                entry.name,
                entry.pkt.len(),
                entry.served_cnt,
                if entry.is_static { " static" } else { "" }
            )?;
        }
        Ok(())
    }

    fn lookup_face(&mut self, ifndx: Option<usize>, peer: Option<&FaceAddr>) -> Option<FaceId> {
        let now = self.now;
        let found = self.faces.iter_mut().find(|f| match peer {
            None => f.interface.is_none() && f.peer.is_none(),
            Some(peer) => {
                f.peer.as_ref() == Some(peer) && (ifndx.is_none() || f.interface == ifndx)
            }
        });
        if let Some(face) = found {
            face.last_used = now;
            return Some(face.id);
        }

        let Some(peer) = peer else {
            return self.create_face(None, None);
        };
        let ifndx = match ifndx {
            Some(idx) if idx < self.interfaces.len() => idx,
            Some(_) => return None,
            None => self
                .interfaces
                .iter()
                .position(|i| i.config.addr.family() == peer.family())?,
        };
        self.create_face(Some(ifndx), Some(peer.clone()))
    }

    fn create_face(&mut self, ifndx: Option<usize>, peer: Option<FaceAddr>) -> Option<FaceId> {
        let id = self.faces.next_id()?;
        let mut face = Face::new(id, ifndx, peer, self.now);
        match ifndx.and_then(|idx| self.interfaces.get(idx)) {
            None => face.flags.insert(FaceFlags::STATIC),
            Some(iface) => {
                if iface.config.reflect {
                    face.flags.insert(FaceFlags::REFLECT);
                }
                if iface.config.fwd_all_interests {
                    face.flags.insert(FaceFlags::FWD_ALL_INTERESTS);
                }
                if iface.config.fragment {
                    face.frag = Some(Box::new(LpFragmenter::new(iface.config.mtu)));
                }
                if let Some(ms) = self.config.face_packet_interval_ms {
                    face.sched = Some(Box::new(PacketRateScheduler::new(ms)));
                }
            }
        }
        match &face.peer {
            Some(peer) => debug!("created {} for {}", id, peer),
            None => debug!("created local {}", id),
        }
        self.faces.insert(face);
        Some(id)
    }

    fn remove_face(&mut self, id: FaceId) -> bool {
        let Some(face) = self.faces.remove(id) else {
            return false;
        };
        let dropped = self.pit.remove_face(id);
        let rules = self.fib.remove_face(id);
        debug!(
            "destroyed {}: {} queued packets, {} interests, {} fib rules",
            id,
            face.outq.len(),
            dropped.len(),
            rules
        );
        true
    }

    fn rx_datagram(
        &mut self,
        ifndx: Option<usize>,
        peer: Option<&FaceAddr>,
        bytes: &[u8],
    ) -> Result<RxOutcome> {
        let Some(from) = self.lookup_face(ifndx, peer) else {
            match peer {
                Some(peer) => warn!("no interface for {}, dropping {} bytes", peer, bytes.len()),
                None => warn!("no local face, dropping {} bytes", bytes.len()),
            }
            return Ok(RxOutcome::NoFace);
        };
        if bytes.is_empty() {
            return Err(ParseError::Empty.into());
        }

        let mut outcome = RxOutcome::FragmentPending;
        let mut rest = bytes;
        while !rest.is_empty() {
            let used = match suite_of(rest)? {
                Suite::NdnTlv => {
                    let pkt = self.codec.parse(rest)?;
                    let used = pkt.length;
                    outcome = self.dispatch(from, pkt, &rest[..used])?;
                    used
                }
                Suite::LinkFragment => {
                    let max_bytes = self.config.max_packet_size;
                    let face = self.faces.get_mut(from).ok_or(Error::UnknownFace(from))?;
                    let (whole, used) = face
                        .reassembly
                        .get_or_insert_with(|| {
                            LpReassembler::new(DEFAULT_MAX_PARTIAL_PACKETS, max_bytes)
                        })
                        .receive(rest)?;
                    outcome = match whole {
                        None => RxOutcome::FragmentPending,
                        Some(whole) => self.rx_reassembled(from, &whole)?,
                    };
                    used
                }
            };
            rest = &rest[used..];
        }
        Ok(outcome)
    }

    // A reassembled link payload holds exactly one network packet.
    fn rx_reassembled(&mut self, from: FaceId, bytes: &[u8]) -> Result<RxOutcome> {
        if suite_of(bytes)? != Suite::NdnTlv {
            return Err(ParseError::BadFragment.into());
        }
        let pkt = self.codec.parse(bytes)?;
        let used = pkt.length;
        self.dispatch(from, pkt, &bytes[..used])
    }

    fn dispatch(&mut self, from: FaceId, pkt: ParsedPacket, raw: &[u8]) -> Result<RxOutcome> {
        if pkt.name.component_count() > self.config.max_name_components {
            return Err(ParseError::TooManyComponents.into());
        }
        match pkt.kind {
            PacketKind::Interest => Ok(self.rx_interest(from, pkt, raw)),
            PacketKind::Content => Ok(self.rx_content(from, pkt, raw)),
        }
    }

    fn rx_interest(&mut self, from: FaceId, pkt: ParsedPacket, raw: &[u8]) -> RxOutcome {
        trace!("{} interest {}", from, pkt.name);
        if is_management(&pkt.name) {
            return self.rx_management(from, &pkt);
        }
        if let Some(nonce) = &pkt.nonce {
            if self.nonces.find_or_append(nonce) {
                trace!("{} duplicate nonce for {}, dropped", from, pkt.name);
                return RxOutcome::DuplicateNonce;
            }
        }

        let now = self.now;
        let hit = match self
            .store
            .lookup_exact_mut(&pkt.name, pkt.publisher_digest.as_deref())
        {
            Some(entry) => {
                entry.last_used = now;
                entry.served_cnt += 1;
                Some(entry.clone())
            }
            None => None,
        };
        if let Some(entry) = hit {
            trace!("{} served {} from the content store", from, pkt.name);
            self.deliver(from, &entry);
            return RxOutcome::FromCache;
        }

        let propagate = pkt.scope.map_or(true, |scope| scope > 2);
        let (idx, created) = match self.pit.find_exact(&pkt) {
            Some(idx) => (idx, false),
            None => {
                debug!("new pending interest {} from {}", pkt.name, from);
                let entry = PitEntry::new(&pkt, Buffer::from_slice(raw), from, propagate, now);
                (self.pit.insert(entry), true)
            }
        };

        let fwd_all = self
            .faces
            .get(from)
            .map_or(false, |f| f.flags.contains(FaceFlags::FWD_ALL_INTERESTS));
        let forwarded = if propagate && (created || fwd_all) {
            self.propagate_interest(idx)
        } else {
            0
        };
        if let Some(entry) = self.pit.get_mut(idx) {
            entry.append_pending(from, now);
        }

        if created {
            RxOutcome::InterestCreated { forwarded }
        } else {
            RxOutcome::InterestKnown { forwarded }
        }
    }

    fn rx_management(&mut self, from: FaceId, pkt: &ParsedPacket) -> RxOutcome {
        let Some(mut mgmt) = self.mgmt.take() else {
            debug!("no management handler, dropping {}", pkt.name);
            return RxOutcome::ManagementDropped;
        };
        let result = mgmt.handle(self, pkt, from);
        if self.mgmt.is_none() {
            self.mgmt = Some(mgmt);
        }
        match result {
            Ok(()) => RxOutcome::Management,
            Err(e) => {
                warn!("management request {} from {} failed: {}", pkt.name, from, e);
                RxOutcome::ManagementDropped
            }
        }
    }

    fn rx_content(&mut self, from: FaceId, pkt: ParsedPacket, raw: &[u8]) -> RxOutcome {
        trace!("{} content {}", from, pkt.name);
        let mut entry = ContentEntry::new(&pkt, Buffer::from_slice(raw), self.now);
        if self.store.find_duplicate(&entry.name, &entry.digest) {
            trace!("{} already cached, dropped", entry.name);
            return RxOutcome::DuplicateContent;
        }

        let served = self.serve_pending(&entry);
        if served == 0 {
            debug!("unsolicited content {} from {}, dropped", entry.name, from);
            return RxOutcome::Unsolicited;
        }
        entry.served_cnt = served as u64;

        let cached = self.config.max_cache_entries != 0;
        if cached {
            debug!("caching {}", entry.name);
            if let Some(evicted) = self.store.add(entry, self.config.max_cache_entries) {
                debug!("evicted {} from the content store", evicted.name);
            }
        }
        RxOutcome::ContentServed {
            faces: served,
            cached,
        }
    }

    // Hands the content to every face waiting on a matching Interest, at most
    //  once per face, and removes the satisfied entries. Returns the number of
    //  faces served.
    fn serve_pending(&mut self, content: &ContentEntry) -> usize {
        for face in self.faces.iter_mut() {
            face.flags.remove(FaceFlags::SERVED);
        }

        let satisfied = self.pit.remove_where(|interest| satisfies(interest, content));
        let mut served = 0;
        for interest in satisfied {
            debug!("{} satisfies pending interest {}", content.name, interest.name);
            for pending in interest.pending.iter() {
                let Some(face) = self.faces.get_mut(pending.face) else {
                    continue;
                };
                if face.flags.contains(FaceFlags::SERVED) {
                    continue;
                }
                face.flags.insert(FaceFlags::SERVED);
                served += 1;
                self.deliver(pending.face, content);
            }
        }
        served
    }

    fn deliver(&mut self, to: FaceId, content: &ContentEntry) {
        let Some(face) = self.faces.get(to) else {
            return;
        };
        if !face.is_local() {
            self.face_enqueue(to, content.pkt.clone());
            return;
        }
        match self.app.as_mut() {
            Some(app) => app.on_content(content),
            None => trace!("no application for {}, dropped", content.name),
        }
    }

    // Sends the Interest of the given PIT entry to the faces of the longest
    //  matching FIB rules. Returns how many faces it was queued on.
    fn propagate_interest(&mut self, idx: usize) -> usize {
        let Some(entry) = self.pit.get(idx) else {
            return 0;
        };
        let targets = self.fib.best_matches(&entry.name);
        let origin = entry.from;
        let pkt = entry.pkt.clone();
        let reflect = origin
            .and_then(|id| self.faces.get(id))
            .map_or(false, |f| f.flags.contains(FaceFlags::REFLECT));

        let mut forwarded = 0;
        for face in targets {
            if Some(face) == origin && !reflect {
                continue;
            }
            if self.face_enqueue(face, pkt.clone()) {
                forwarded += 1;
            }
        }
        forwarded
    }

    fn face_enqueue(&mut self, id: FaceId, buf: Buffer) -> bool {
        let now = self.now;
        let Some(face) = self.faces.get_mut(id) else {
            return false;
        };
        let len = buf.len();
        let count = face.frag.as_ref().map_or(1, |f| f.fragment_count(len));
        if !face.enqueue(buf) {
            trace!("{} already has this packet queued", id);
            return false;
        }
        match face.sched.as_mut() {
            Some(sched) => {
                let clearance = sched.request_to_send(count, len, now);
                self.on_clearance(clearance, CtsTarget::Face(id));
            }
            None => self.face_cts(id),
        }
        true
    }

    // Clear-to-send for a face: moves queued packets (or fragments of them) to
    //  the interface. A paced face moves one unit per clearance.
    fn face_cts(&mut self, id: FaceId) {
        let Some(face) = self.faces.get_mut(id) else {
            return;
        };
        let (Some(ifndx), Some(dest)) = (face.interface, face.peer.clone()) else {
            let queued: Vec<Buffer> = face.outq.drain(..).collect();
            for buf in queued {
                match self.app.as_mut() {
                    Some(app) => app.on_packet(&buf),
                    None => trace!("no application, dropped {} bytes", buf.len()),
                }
            }
            return;
        };
        let paced = face.sched.is_some();

        loop {
            let Some(face) = self.faces.get_mut(id) else {
                return;
            };
            let next = match face.frag.as_mut() {
                None => face.outq.pop_front(),
                Some(frag) => match frag.next_fragment() {
                    Some(piece) => Some(piece),
                    None => face.outq.pop_front().and_then(|buf| {
                        frag.start(buf);
                        frag.next_fragment()
                    }),
                },
            };
            let Some(buf) = next else {
                return;
            };
            self.interface_enqueue(ifndx, buf, dest.clone(), Some(id));
            if paced {
                return;
            }
        }
    }

    fn interface_enqueue(&mut self, ifndx: usize, buf: Buffer, dest: FaceAddr, face: Option<FaceId>) {
        let now = self.now;
        let Some(iface) = self.interfaces.get_mut(ifndx) else {
            return;
        };
        let len = buf.len();
        if let Err(req) = iface.queue.push(TxRequest { buf, dest, face }) {
            warn!(
                "interface {} transmit ring full, dropping {} bytes to {}",
                ifndx,
                req.buf.len(),
                req.dest
            );
            return;
        }
        match iface.sched.as_mut() {
            Some(sched) => {
                let clearance = sched.request_to_send(1, len, now);
                self.on_clearance(clearance, CtsTarget::Interface(ifndx));
            }
            None => self.interface_cts(ifndx),
        }
    }

    // Clear-to-send for an interface: hands the oldest request to the
    //  transport and tells both schedulers it went out.
    fn interface_cts(&mut self, ifndx: usize) {
        let now = self.now;
        let Some(req) = self.interfaces.get_mut(ifndx).and_then(|i| i.queue.pop()) else {
            return;
        };
        let len = req.buf.len();
        match self.transport.send(ifndx, &req.dest, &req.buf) {
            Ok(()) => trace!("sent {} bytes to {} on interface {}", len, req.dest, ifndx),
            Err(e) => warn!("sending to {} on interface {} failed: {}", req.dest, ifndx, e),
        }

        let clearance = self
            .interfaces
            .get_mut(ifndx)
            .and_then(|i| i.sched.as_mut())
            .map(|s| s.transmitted(1, len, now));
        if let Some(clearance) = clearance {
            self.on_clearance(clearance, CtsTarget::Interface(ifndx));
        }

        if let Some(id) = req.face {
            let clearance = self
                .faces
                .get_mut(id)
                .and_then(|f| f.sched.as_mut())
                .map(|s| s.transmitted(1, len, now));
            if let Some(clearance) = clearance {
                self.on_clearance(clearance, CtsTarget::Face(id));
            }
        }
    }

    fn on_clearance(&mut self, clearance: Clearance, target: CtsTarget) {
        match clearance {
            Clearance::Now => self.ready.push_back(target),
            Clearance::At(at) => {
                self.timers.set_timer(at, target);
            }
            Clearance::Wait => {}
        }
    }

    fn run_ready(&mut self) {
        while let Some(target) = self.ready.pop_front() {
            match target {
                CtsTarget::Face(id) => self.face_cts(id),
                CtsTarget::Interface(ifndx) => self.interface_cts(ifndx),
            }
        }
    }
}

fn is_management(name: &Name) -> bool {
    name.component_count() == 4 && name.component(0) == Some(MGMT_COMPONENT)
}

// Whether content answers a pending Interest: the Interest name is a prefix of
//  the content name within the suffix selectors, or names the content exactly
//  plus its implicit digest.
fn satisfies(interest: &PitEntry, content: &ContentEntry) -> bool {
    let p = interest.name.component_count();
    let c = content.name.component_count();
    if p.saturating_add(interest.min_suffix) > c + 1 || p.saturating_add(interest.max_suffix) < c + 1 {
        return false;
    }
    if let Some(digest) = &interest.publisher_digest {
        if content.publisher_digest.as_deref() != Some(digest.as_slice()) {
            return false;
        }
    }
    if p == c + 1 {
        return interest.name.matched_components(&content.name) == c
            && interest.name.component(c) == Some(content.digest.as_bytes());
    }
    interest.name.is_prefix_of(&content.name)
}
