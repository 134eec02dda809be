use alloc::collections::BTreeMap;

use crate::{
    buffer::Buffer,
    config::MAX_PACKET_SIZE,
    packet::{ParseError, TLV_TYPE_LP_PACKET},
    tlv::{non_negative_bytes, parse_tlvs, push_tlv, TLV},
};

const TLV_TYPE_LP_FRAGMENT: u32 = 0x50;
const TLV_TYPE_LP_SEQUENCE: u32 = 0x51;
const TLV_TYPE_LP_FRAG_INDEX: u32 = 0x52;
const TLV_TYPE_LP_FRAG_COUNT: u32 = 0x53;

// Worst-case bytes spent on link headers around one fragment.
const LP_OVERHEAD: usize = 4 + 10 + 4 + 4 + 4;

pub const DEFAULT_MAX_PARTIAL_PACKETS: usize = 16;

/// Splits outgoing packets into link-sized pieces.
pub trait Fragmenter {
    fn start(&mut self, buf: Buffer);
    fn next_fragment(&mut self) -> Option<Buffer>;
    /// How many frames a packet of `len` bytes will turn into.
    fn fragment_count(&self, len: usize) -> usize;
}

pub struct LpFragmenter {
    mtu: usize,
    next_seq: u64,
    current: Option<InFlight>,
}

struct InFlight {
    buf: Buffer,
    base_seq: u64,
    index: usize,
    count: usize,
    chunk: usize,
}

impl LpFragmenter {
    pub fn new(mtu: usize) -> Self {
        Self {
            mtu,
            next_seq: 0,
            current: None,
        }
    }

    fn chunk_size(&self) -> usize {
        self.mtu.saturating_sub(LP_OVERHEAD).max(1)
    }
}

impl Fragmenter for LpFragmenter {
    fn start(&mut self, buf: Buffer) {
        let count = self.fragment_count(buf.len());
        let base_seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(count as u64);
        self.current = Some(InFlight {
            buf,
            base_seq,
            index: 0,
            count,
            chunk: self.chunk_size(),
        });
    }

    fn next_fragment(&mut self) -> Option<Buffer> {
        let flight = self.current.as_mut()?;
        if flight.index >= flight.count {
            self.current = None;
            return None;
        }

        // Small packets travel as they are
        if flight.count == 1 {
            let buf = flight.buf.clone();
            self.current = None;
            return Some(buf);
        }

        let start = flight.index * flight.chunk;
        let end = (start + flight.chunk).min(flight.buf.len());
        let mut inner = Vec::with_capacity(end - start + LP_OVERHEAD);
        push_tlv(
            &mut inner,
            TLV_TYPE_LP_SEQUENCE,
            &(flight.base_seq.wrapping_add(flight.index as u64)).to_be_bytes(),
        );
        push_tlv(
            &mut inner,
            TLV_TYPE_LP_FRAG_INDEX,
            &non_negative_bytes(flight.index as u64),
        );
        push_tlv(
            &mut inner,
            TLV_TYPE_LP_FRAG_COUNT,
            &non_negative_bytes(flight.count as u64),
        );
        push_tlv(&mut inner, TLV_TYPE_LP_FRAGMENT, &flight.buf[start..end]);
        flight.index += 1;

        let mut out = Vec::with_capacity(inner.len() + 4);
        push_tlv(&mut out, TLV_TYPE_LP_PACKET, &inner);
        Some(Buffer::new(out))
    }

    fn fragment_count(&self, len: usize) -> usize {
        if len <= self.mtu {
            1
        } else {
            len.div_ceil(self.chunk_size())
        }
    }
}

struct Partial {
    count: usize,
    bytes: usize,
    pieces: BTreeMap<usize, Vec<u8>>,
}

/// Collects link fragments arriving on one face back into whole packets.
///
/// At most `max_partial` packets are reassembled at a time, and none may grow
/// past `max_bytes`.
pub struct LpReassembler {
    partial: BTreeMap<u64, Partial>,
    max_partial: usize,
    max_bytes: usize,
}

impl Default for LpReassembler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PARTIAL_PACKETS, MAX_PACKET_SIZE)
    }
}

impl LpReassembler {
    pub fn new(max_partial: usize, max_bytes: usize) -> Self {
        Self {
            partial: BTreeMap::new(),
            max_partial: max_partial.max(1),
            max_bytes,
        }
    }

    pub fn pending(&self) -> usize {
        self.partial.len()
    }

    /// Takes one link frame; returns the completed packet, if any, and the frame length.
    pub fn receive(&mut self, frame: &[u8]) -> Result<(Option<Buffer>, usize), ParseError> {
        let (outer, length) = TLV::try_decode(frame)?;
        if outer.typ.get() != TLV_TYPE_LP_PACKET {
            return Err(ParseError::UnexpectedType(outer.typ.get()));
        }

        let (mut seq, mut index, mut count, mut fragment) = (None, 0usize, 1usize, None);
        for element in parse_tlvs(outer.val) {
            let (_, tlv) = element?;
            let typ = tlv.typ.get();
            match typ {
                TLV_TYPE_LP_SEQUENCE => seq = tlv.val_as_u64(),
                TLV_TYPE_LP_FRAG_INDEX => {
                    index = tlv.val_as_u64().ok_or(ParseError::InvalidValue(typ))? as usize
                }
                TLV_TYPE_LP_FRAG_COUNT => {
                    count = tlv.val_as_u64().ok_or(ParseError::InvalidValue(typ))? as usize
                }
                TLV_TYPE_LP_FRAGMENT => fragment = Some(tlv.val),
                _ => {}
            }
        }

        let fragment = fragment.ok_or(ParseError::BadFragment)?;
        if count == 0 || index >= count {
            return Err(ParseError::BadFragment);
        }
        // Every fragment carries at least one byte
        if count > self.max_bytes || fragment.len() > self.max_bytes {
            return Err(ParseError::TooLarge(self.max_bytes));
        }
        if count == 1 {
            return Ok((Some(Buffer::from_slice(fragment)), length));
        }
        if fragment.is_empty() {
            return Err(ParseError::BadFragment);
        }

        let seq = seq.ok_or(ParseError::BadFragment)?;
        let base = seq.checked_sub(index as u64).ok_or(ParseError::BadFragment)?;

        if !self.partial.contains_key(&base) && self.partial.len() >= self.max_partial {
            // Give up on the oldest partially received packet
            if let Some(oldest) = self.partial.keys().next().copied() {
                self.partial.remove(&oldest);
            }
        }

        let entry = self.partial.entry(base).or_insert_with(|| Partial {
            count,
            bytes: 0,
            pieces: BTreeMap::new(),
        });
        if entry.count != count {
            self.partial.remove(&base);
            return Err(ParseError::BadFragment);
        }
        if !entry.pieces.contains_key(&index) {
            if entry.bytes + fragment.len() > self.max_bytes {
                self.partial.remove(&base);
                return Err(ParseError::TooLarge(self.max_bytes));
            }
            entry.bytes += fragment.len();
            entry.pieces.insert(index, fragment.to_vec());
        }
        if entry.pieces.len() < entry.count {
            return Ok((None, length));
        }

        let done = self.partial.remove(&base).ok_or(ParseError::BadFragment)?;
        let whole: Vec<u8> = done.pieces.into_values().flatten().collect();
        Ok((Some(Buffer::new(whole)), length))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragments(frag: &mut LpFragmenter, buf: &Buffer) -> Vec<Buffer> {
        frag.start(buf.clone());
        let mut out = Vec::new();
        while let Some(f) = frag.next_fragment() {
            out.push(f);
        }
        out
    }

    #[test]
    fn test_small_packet_unwrapped() {
        let mut frag = LpFragmenter::new(100);
        let buf = Buffer::from_slice(&[6, 2, 7, 0]);
        assert_eq!(frag.fragment_count(buf.len()), 1);
        assert_eq!(fragments(&mut frag, &buf), vec![buf]);
        assert!(frag.next_fragment().is_none());
    }

    #[test]
    fn test_split_and_reassemble() {
        let mut frag = LpFragmenter::new(60);
        let data: Vec<u8> = (0..250u32).map(|x| x as u8).collect();
        let buf = Buffer::new(data.clone());

        let pieces = fragments(&mut frag, &buf);
        assert_eq!(pieces.len(), frag.fragment_count(250));
        assert!(pieces.len() > 1);
        assert!(pieces.iter().all(|p| p.len() <= 60));

        // Delivered out of order, with a duplicate
        let mut re = LpReassembler::default();
        let mut order: Vec<&Buffer> = pieces.iter().rev().collect();
        order.insert(1, &pieces[pieces.len() - 1]);
        let mut result = None;
        for p in order {
            let (done, len) = re.receive(p).unwrap();
            assert_eq!(len, p.len());
            if done.is_some() {
                result = done;
            }
        }
        assert_eq!(result.map(|b| b.into_vec()), Some(data));
        assert_eq!(re.pending(), 0);

        // Sequence numbers keep increasing across packets
        let again = fragments(&mut frag, &buf);
        assert_ne!(again[0], pieces[0]);
    }

    #[test]
    fn test_bounded_partials() {
        let mut frag = LpFragmenter::new(40);
        let mut re = LpReassembler::new(2, MAX_PACKET_SIZE);
        for _ in 0..3 {
            let pieces = fragments(&mut frag, &Buffer::new(vec![1u8; 100]));
            assert!(re.receive(&pieces[0]).unwrap().0.is_none());
        }
        assert_eq!(re.pending(), 2);
    }

    fn frame(seq: u64, index: u64, count: u64, payload: &[u8]) -> Vec<u8> {
        let mut inner = Vec::new();
        push_tlv(&mut inner, TLV_TYPE_LP_SEQUENCE, &seq.to_be_bytes());
        push_tlv(&mut inner, TLV_TYPE_LP_FRAG_INDEX, &non_negative_bytes(index));
        push_tlv(&mut inner, TLV_TYPE_LP_FRAG_COUNT, &non_negative_bytes(count));
        push_tlv(&mut inner, TLV_TYPE_LP_FRAGMENT, payload);
        let mut frame = Vec::new();
        push_tlv(&mut frame, TLV_TYPE_LP_PACKET, &inner);
        frame
    }

    #[test]
    fn test_fragment_count_limited() {
        let mut re = LpReassembler::new(4, 100);
        assert_eq!(
            re.receive(&frame(0, 0, 65535, &[1])),
            Err(ParseError::TooLarge(100))
        );
        assert_eq!(re.receive(&frame(0, 0, 101, &[1])), Err(ParseError::TooLarge(100)));
        assert_eq!(re.pending(), 0);

        // A lone fragment is a whole packet and obeys the same limit
        assert_eq!(re.receive(&frame(0, 0, 1, &[0; 101])), Err(ParseError::TooLarge(100)));
        assert!(re.receive(&frame(0, 0, 1, &[0; 100])).unwrap().0.is_some());

        assert_eq!(re.receive(&frame(7, 0, 3, &[])), Err(ParseError::BadFragment));
    }

    #[test]
    fn test_reassembly_size_limited() {
        let mut re = LpReassembler::new(4, 100);
        assert!(re.receive(&frame(10, 0, 3, &[1; 60])).unwrap().0.is_none());
        assert_eq!(re.receive(&frame(11, 1, 3, &[2; 41])), Err(ParseError::TooLarge(100)));
        // The oversized packet is forgotten entirely
        assert_eq!(re.pending(), 0);
        assert!(re.receive(&frame(12, 2, 3, &[3; 10])).unwrap().0.is_none());

        let mut re = LpReassembler::new(4, 100);
        assert!(re.receive(&frame(20, 0, 2, &[1; 60])).unwrap().0.is_none());
        let (whole, _) = re.receive(&frame(21, 1, 2, &[2; 40])).unwrap();
        assert_eq!(whole.map(|b| b.len()), Some(100));
    }

    #[test]
    fn test_bad_fragments() {
        let mut re = LpReassembler::default();
        // Index out of range
        let mut inner = Vec::new();
        push_tlv(&mut inner, TLV_TYPE_LP_SEQUENCE, &5u64.to_be_bytes());
        push_tlv(&mut inner, TLV_TYPE_LP_FRAG_INDEX, &[3]);
        push_tlv(&mut inner, TLV_TYPE_LP_FRAG_COUNT, &[2]);
        push_tlv(&mut inner, TLV_TYPE_LP_FRAGMENT, &[1, 2]);
        let mut frame = Vec::new();
        push_tlv(&mut frame, TLV_TYPE_LP_PACKET, &inner);
        assert_eq!(re.receive(&frame), Err(ParseError::BadFragment));

        // Missing fragment payload
        let mut frame = Vec::new();
        push_tlv(&mut frame, TLV_TYPE_LP_PACKET, &[]);
        assert_eq!(re.receive(&frame), Err(ParseError::BadFragment));
    }
}
