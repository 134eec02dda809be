use core::ops::Range;

use thiserror::Error;

use crate::{
    buffer::Buffer,
    name::{Name, MAX_NAME_COMPONENTS, TLV_TYPE_NAME, TLV_TYPE_NAME_COMPONENT},
    tlv::{non_negative_bytes, parse_tlvs, push_tlv, DecodingError, TLV},
};

pub(crate) const TLV_TYPE_INTEREST: u32 = 0x05;
pub(crate) const TLV_TYPE_DATA: u32 = 0x06;
const TLV_TYPE_SELECTORS: u32 = 0x09;
const TLV_TYPE_NONCE: u32 = 0x0a;
const TLV_TYPE_SCOPE: u32 = 0x0b;
const TLV_TYPE_INTEREST_LIFETIME: u32 = 0x0c;
const TLV_TYPE_MIN_SUFFIX: u32 = 0x0d;
const TLV_TYPE_MAX_SUFFIX: u32 = 0x0e;
const TLV_TYPE_PUBLISHER_KEY_LOCATOR: u32 = 0x0f;
const TLV_TYPE_EXCLUDE: u32 = 0x10;
const TLV_TYPE_CHILD_SELECTOR: u32 = 0x11;
const TLV_TYPE_MUST_BE_FRESH: u32 = 0x12;
const TLV_TYPE_META_INFO: u32 = 0x14;
const TLV_TYPE_CONTENT: u32 = 0x15;
const TLV_TYPE_SIGNATURE_INFO: u32 = 0x16;
const TLV_TYPE_SIGNATURE_VALUE: u32 = 0x17;
const TLV_TYPE_FRESHNESS_PERIOD: u32 = 0x19;
const TLV_TYPE_SIGNATURE_TYPE: u32 = 0x1b;
const TLV_TYPE_KEY_LOCATOR: u32 = 0x1c;
const TLV_TYPE_KEY_LOCATOR_DIGEST: u32 = 0x1d;
const NAME_COMPONENT_TYPE_IMPLICIT_SHA256: u32 = 1;

pub(crate) const TLV_TYPE_LP_PACKET: u32 = 0x64;

pub const DEFAULT_INTEREST_LIFETIME_MS: u64 = 4000;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty packet")]
    Empty,
    #[error("unknown wire format (first byte 0x{0:02x})")]
    UnknownSuite(u8),
    #[error("{0}")]
    Tlv(DecodingError),
    #[error("unexpected top-level type 0x{0:x}")]
    UnexpectedType(u32),
    #[error("packet has no name")]
    MissingName,
    #[error("name exceeds the component limit")]
    TooManyComponents,
    #[error("unknown critical element 0x{0:x}")]
    UnknownCritical(u32),
    #[error("invalid value in element 0x{0:x}")]
    InvalidValue(u32),
    #[error("incomplete or inconsistent fragment")]
    BadFragment,
    #[error("reassembled packet would exceed {0} bytes")]
    TooLarge(usize),
}

impl From<DecodingError> for ParseError {
    fn from(value: DecodingError) -> Self {
        ParseError::Tlv(value)
    }
}

/// The wire dialect a frame is written in, decided by its first byte.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Suite {
    NdnTlv,
    /// A link-protocol frame carrying (a fragment of) another packet.
    LinkFragment,
}

pub fn suite_of(bytes: &[u8]) -> Result<Suite, ParseError> {
    match bytes.first() {
        None => Err(ParseError::Empty),
        Some(&b) if b as u32 == TLV_TYPE_INTEREST || b as u32 == TLV_TYPE_DATA => {
            Ok(Suite::NdnTlv)
        }
        Some(&b) if b as u32 == TLV_TYPE_LP_PACKET => Ok(Suite::LinkFragment),
        Some(&b) => Err(ParseError::UnknownSuite(b)),
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PacketKind {
    Interest,
    Content,
}

/// The dialect-independent view of one packet that the relay works with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedPacket {
    pub kind: PacketKind,
    pub name: Name,
    pub nonce: Option<Vec<u8>>,
    pub publisher_digest: Option<Vec<u8>>,
    pub scope: Option<u8>,
    pub min_suffix: usize,
    pub max_suffix: usize,
    pub must_be_fresh: bool,
    pub lifetime_ms: Option<u64>,
    /// Content bytes, as a range into the packet.
    pub payload: Range<usize>,
    /// Bytes of the frame this packet occupied.
    pub length: usize,
}

pub trait Codec {
    fn parse(&self, bytes: &[u8]) -> Result<ParsedPacket, ParseError>;
    fn make_interest(&self, name: &Name, nonce: Option<[u8; 4]>) -> Buffer;
    fn make_content(&self, name: &Name, payload: &[u8]) -> Buffer;
}

/// The 2014 NDN-TLV wire format.
#[derive(Copy, Clone, Debug, Default)]
pub struct NdnTlv;

impl Codec for NdnTlv {
    fn parse(&self, bytes: &[u8]) -> Result<ParsedPacket, ParseError> {
        let (outer, length) = TLV::try_decode(bytes)?;
        let value_offset = length - outer.val.len();
        let kind = match outer.typ.get() {
            TLV_TYPE_INTEREST => PacketKind::Interest,
            TLV_TYPE_DATA => PacketKind::Content,
            other => return Err(ParseError::UnexpectedType(other)),
        };

        let mut pkt = ParsedPacket {
            kind,
            name: Name::new(),
            nonce: None,
            publisher_digest: None,
            scope: None,
            min_suffix: 0,
            max_suffix: MAX_NAME_COMPONENTS,
            must_be_fresh: false,
            lifetime_ms: None,
            payload: length..length,
            length,
        };

        let mut have_name = false;
        for element in parse_tlvs(outer.val) {
            let (offset, tlv) = element?;
            let typ = tlv.typ.get();
            match (kind, typ) {
                (_, TLV_TYPE_NAME) if !have_name => {
                    pkt.name = decode_name(tlv.val)?;
                    have_name = true;
                }
                (PacketKind::Interest, TLV_TYPE_SELECTORS) => decode_selectors(tlv.val, &mut pkt)?,
                (PacketKind::Interest, TLV_TYPE_NONCE) => pkt.nonce = Some(tlv.val.to_vec()),
                (PacketKind::Interest, TLV_TYPE_SCOPE) => {
                    let scope = tlv.val_as_u64().ok_or(ParseError::InvalidValue(typ))?;
                    pkt.scope = Some(scope.min(u8::MAX as u64) as u8);
                }
                (PacketKind::Interest, TLV_TYPE_INTEREST_LIFETIME) => {
                    pkt.lifetime_ms = Some(tlv.val_as_u64().ok_or(ParseError::InvalidValue(typ))?);
                }
                (PacketKind::Content, TLV_TYPE_CONTENT) => {
                    // The value sits after this element's own type and length
                    let start = value_offset + offset + (tlv_header_len(&tlv));
                    pkt.payload = start..(start + tlv.val.len());
                }
                (PacketKind::Content, TLV_TYPE_SIGNATURE_INFO) => {
                    pkt.publisher_digest = find_key_locator(tlv.val)?;
                }
                (PacketKind::Content, TLV_TYPE_META_INFO)
                | (PacketKind::Content, TLV_TYPE_SIGNATURE_VALUE) => {}
                _ if tlv.is_critical() => return Err(ParseError::UnknownCritical(typ)),
                _ => {}
            }
        }

        if !have_name {
            return Err(ParseError::MissingName);
        }
        Ok(pkt)
    }

    fn make_interest(&self, name: &Name, nonce: Option<[u8; 4]>) -> Buffer {
        InterestBuilder::new(name.clone()).nonce(nonce).build()
    }

    fn make_content(&self, name: &Name, payload: &[u8]) -> Buffer {
        DataBuilder::new(name.clone(), payload.to_vec()).build()
    }
}

fn tlv_header_len(tlv: &TLV<'_>) -> usize {
    use crate::tlv::Encode;
    tlv.encoded_length() - tlv.val.len()
}

fn decode_name(bytes: &[u8]) -> Result<Name, ParseError> {
    let mut name = Name::new();
    for element in parse_tlvs(bytes) {
        let (_, tlv) = element?;
        match tlv.typ.get() {
            TLV_TYPE_NAME_COMPONENT | NAME_COMPONENT_TYPE_IMPLICIT_SHA256 => name
                .push(tlv.val)
                .map_err(|_| ParseError::TooManyComponents)?,
            // Other component types are not part of the 2014 format
            _ => {}
        }
    }
    Ok(name)
}

fn decode_selectors(bytes: &[u8], pkt: &mut ParsedPacket) -> Result<(), ParseError> {
    for element in parse_tlvs(bytes) {
        let (_, tlv) = element?;
        let typ = tlv.typ.get();
        match typ {
            TLV_TYPE_MIN_SUFFIX => {
                pkt.min_suffix = tlv.val_as_u64().ok_or(ParseError::InvalidValue(typ))? as usize
            }
            TLV_TYPE_MAX_SUFFIX => {
                pkt.max_suffix = tlv.val_as_u64().ok_or(ParseError::InvalidValue(typ))? as usize
            }
            TLV_TYPE_PUBLISHER_KEY_LOCATOR => {
                // Either a wrapped KeyLocator or its bare contents
                pkt.publisher_digest = match find_key_locator(tlv.val)? {
                    Some(found) => Some(found),
                    None => Some(key_locator_value(tlv.val)?),
                };
            }
            TLV_TYPE_MUST_BE_FRESH => pkt.must_be_fresh = true,
            TLV_TYPE_EXCLUDE | TLV_TYPE_CHILD_SELECTOR => {}
            _ if tlv.is_critical() => return Err(ParseError::UnknownCritical(typ)),
            _ => {}
        }
    }
    Ok(())
}

// Looks for a KeyLocator among sibling elements.
fn find_key_locator(bytes: &[u8]) -> Result<Option<Vec<u8>>, ParseError> {
    for element in parse_tlvs(bytes) {
        let (_, tlv) = element?;
        if tlv.typ.get() == TLV_TYPE_KEY_LOCATOR {
            return Ok(Some(key_locator_value(tlv.val)?));
        }
    }
    Ok(None)
}

// A KeyLocatorDigest is reduced to its digest bytes; a name locator is kept verbatim.
fn key_locator_value(bytes: &[u8]) -> Result<Vec<u8>, ParseError> {
    for element in parse_tlvs(bytes) {
        let (_, tlv) = element?;
        if tlv.typ.get() == TLV_TYPE_KEY_LOCATOR_DIGEST {
            return Ok(tlv.val.to_vec());
        }
    }
    Ok(bytes.to_vec())
}

/// Builds an Interest in NDN-TLV.
#[derive(Clone, Debug)]
pub struct InterestBuilder {
    name: Name,
    nonce: Option<[u8; 4]>,
    scope: Option<u8>,
    lifetime_ms: u64,
    min_suffix: Option<usize>,
    max_suffix: Option<usize>,
    must_be_fresh: bool,
    publisher_digest: Option<Vec<u8>>,
}

impl InterestBuilder {
    pub fn new(name: Name) -> Self {
        Self {
            name,
            nonce: None,
            scope: None,
            lifetime_ms: DEFAULT_INTEREST_LIFETIME_MS,
            min_suffix: None,
            max_suffix: None,
            must_be_fresh: false,
            publisher_digest: None,
        }
    }

    pub fn nonce(mut self, nonce: Option<[u8; 4]>) -> Self {
        self.nonce = nonce;
        self
    }

    pub fn scope(mut self, scope: u8) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn lifetime_ms(mut self, ms: u64) -> Self {
        self.lifetime_ms = ms;
        self
    }

    pub fn suffix_range(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        self.min_suffix = min;
        self.max_suffix = max;
        self
    }

    pub fn must_be_fresh(mut self, must_be_fresh: bool) -> Self {
        self.must_be_fresh = must_be_fresh;
        self
    }

    pub fn publisher_digest(mut self, digest: &[u8]) -> Self {
        self.publisher_digest = Some(digest.to_vec());
        self
    }

    pub fn build(&self) -> Buffer {
        let mut inner = Vec::new();
        self.name.encode_into(&mut inner);

        let mut selectors = Vec::new();
        if let Some(min) = self.min_suffix {
            push_tlv(&mut selectors, TLV_TYPE_MIN_SUFFIX, &non_negative_bytes(min as u64));
        }
        if let Some(max) = self.max_suffix {
            push_tlv(&mut selectors, TLV_TYPE_MAX_SUFFIX, &non_negative_bytes(max as u64));
        }
        if let Some(digest) = &self.publisher_digest {
            push_tlv(
                &mut selectors,
                TLV_TYPE_PUBLISHER_KEY_LOCATOR,
                &key_locator_digest(digest),
            );
        }
        if self.must_be_fresh {
            push_tlv(&mut selectors, TLV_TYPE_MUST_BE_FRESH, &[]);
        }
        if !selectors.is_empty() {
            push_tlv(&mut inner, TLV_TYPE_SELECTORS, &selectors);
        }

        if let Some(nonce) = &self.nonce {
            push_tlv(&mut inner, TLV_TYPE_NONCE, nonce);
        }
        if let Some(scope) = self.scope {
            push_tlv(&mut inner, TLV_TYPE_SCOPE, &[scope]);
        }
        push_tlv(
            &mut inner,
            TLV_TYPE_INTEREST_LIFETIME,
            &non_negative_bytes(self.lifetime_ms),
        );

        let mut out = Vec::with_capacity(inner.len() + 4);
        push_tlv(&mut out, TLV_TYPE_INTEREST, &inner);
        Buffer::new(out)
    }
}

/// Builds a Data packet in NDN-TLV. The signature is left empty.
#[derive(Clone, Debug)]
pub struct DataBuilder {
    name: Name,
    payload: Vec<u8>,
    freshness_ms: Option<u64>,
    key_digest: Option<Vec<u8>>,
}

impl DataBuilder {
    pub fn new(name: Name, payload: Vec<u8>) -> Self {
        Self {
            name,
            payload,
            freshness_ms: None,
            key_digest: None,
        }
    }

    pub fn freshness_ms(mut self, ms: u64) -> Self {
        self.freshness_ms = Some(ms);
        self
    }

    pub fn key_digest(mut self, digest: &[u8]) -> Self {
        self.key_digest = Some(digest.to_vec());
        self
    }

    pub fn build(&self) -> Buffer {
        let mut inner = Vec::new();
        self.name.encode_into(&mut inner);
        if let Some(ms) = self.freshness_ms {
            let mut meta = Vec::new();
            push_tlv(&mut meta, TLV_TYPE_FRESHNESS_PERIOD, &non_negative_bytes(ms));
            push_tlv(&mut inner, TLV_TYPE_META_INFO, &meta);
        }
        push_tlv(&mut inner, TLV_TYPE_CONTENT, &self.payload);
        if let Some(digest) = &self.key_digest {
            let mut sig_info = Vec::new();
            // DigestSha256 keeps the packet self-describing without a key
            push_tlv(&mut sig_info, TLV_TYPE_SIGNATURE_TYPE, &[0]);
            sig_info.extend_from_slice(&key_locator_digest(digest));
            push_tlv(&mut inner, TLV_TYPE_SIGNATURE_INFO, &sig_info);
            push_tlv(&mut inner, TLV_TYPE_SIGNATURE_VALUE, &[]);
        }

        let mut out = Vec::with_capacity(inner.len() + 4);
        push_tlv(&mut out, TLV_TYPE_DATA, &inner);
        Buffer::new(out)
    }
}

// KeyLocator { KeyLocatorDigest { digest } }
fn key_locator_digest(digest: &[u8]) -> Vec<u8> {
    let mut kld = Vec::new();
    push_tlv(&mut kld, TLV_TYPE_KEY_LOCATOR_DIGEST, digest);
    let mut kl = Vec::new();
    push_tlv(&mut kl, TLV_TYPE_KEY_LOCATOR, &kld);
    kl
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(p: &str) -> Name {
        Name::from_path(p).unwrap()
    }

    #[test]
    fn test_interest() {
        let bytes = NdnTlv.make_interest(&n("/hello/world"), Some([1, 2, 3, 4]));
        assert_eq!(
            bytes.as_slice(),
            &[
                5, 26, 7, 14, 8, 5, b'h', b'e', b'l', b'l', b'o', 8, 5, b'w', b'o', b'r', b'l',
                b'd', 10, 4, 1, 2, 3, 4, 12, 2, 0x0f, 0xa0
            ][..]
        );
        assert_eq!(suite_of(&bytes), Ok(Suite::NdnTlv));

        let pkt = NdnTlv.parse(&bytes).unwrap();
        assert_eq!(pkt.kind, PacketKind::Interest);
        assert_eq!(pkt.name, n("/hello/world"));
        assert_eq!(pkt.nonce.as_deref(), Some(&[1u8, 2, 3, 4][..]));
        assert_eq!(pkt.lifetime_ms, Some(4000));
        assert_eq!(pkt.scope, None);
        assert_eq!(pkt.max_suffix, MAX_NAME_COMPONENTS);
        assert_eq!(pkt.length, bytes.len());
        assert!(pkt.payload.is_empty());
    }

    #[test]
    fn test_interest_selectors() {
        let bytes = InterestBuilder::new(n("/a"))
            .scope(2)
            .suffix_range(Some(1), Some(3))
            .must_be_fresh(true)
            .publisher_digest(&[9; 32])
            .build();
        let pkt = NdnTlv.parse(&bytes).unwrap();
        assert_eq!(pkt.scope, Some(2));
        assert_eq!((pkt.min_suffix, pkt.max_suffix), (1, 3));
        assert!(pkt.must_be_fresh);
        assert_eq!(pkt.publisher_digest, Some(vec![9; 32]));
        assert_eq!(pkt.nonce, None);
    }

    #[test]
    fn test_data() {
        let bytes = NdnTlv.make_content(&n("/a/b"), b"payload");
        let pkt = NdnTlv.parse(&bytes).unwrap();
        assert_eq!(pkt.kind, PacketKind::Content);
        assert_eq!(pkt.name, n("/a/b"));
        assert_eq!(&bytes[pkt.payload.clone()], b"payload");
        assert_eq!(pkt.publisher_digest, None);

        let bytes = DataBuilder::new(n("/a/b"), vec![0; 300])
            .freshness_ms(1000)
            .key_digest(&[7; 32])
            .build();
        let pkt = NdnTlv.parse(&bytes).unwrap();
        assert_eq!(pkt.payload.len(), 300);
        assert!(bytes[pkt.payload.clone()].iter().all(|b| *b == 0));
        assert_eq!(pkt.publisher_digest, Some(vec![7; 32]));
    }

    #[test]
    fn test_malformed() {
        assert_eq!(suite_of(&[]), Err(ParseError::Empty));
        assert_eq!(suite_of(&[0x42, 0]), Err(ParseError::UnknownSuite(0x42)));
        assert_eq!(suite_of(&[0x64, 0]), Ok(Suite::LinkFragment));

        // Truncated
        let bytes = NdnTlv.make_interest(&n("/a"), None);
        assert!(NdnTlv.parse(&bytes[..bytes.len() - 1]).is_err());

        // No name
        assert_eq!(
            NdnTlv.parse(&[5, 3, 10, 1, 0]),
            Err(ParseError::MissingName)
        );

        // Unknown critical element inside an Interest
        assert_eq!(
            NdnTlv.parse(&[5, 4, 7, 0, 3, 0]),
            Err(ParseError::UnknownCritical(3))
        );

        // Unknown non-critical elements are skipped
        assert!(NdnTlv.parse(&[5, 6, 7, 0, 0xfd, 0x01, 0x00, 0]).is_ok());
        assert!(NdnTlv.parse(&[5, 4, 7, 0, 100, 0]).is_ok());

        // Too many components
        let mut comps = Vec::new();
        for _ in 0..(MAX_NAME_COMPONENTS + 1) {
            push_tlv(&mut comps, 8, b"x");
        }
        let mut inner = Vec::new();
        push_tlv(&mut inner, 7, &comps);
        let mut pkt = Vec::new();
        push_tlv(&mut pkt, 5, &inner);
        assert_eq!(NdnTlv.parse(&pkt), Err(ParseError::TooManyComponents));
    }
}
