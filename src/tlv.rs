use core::{fmt, num::NonZeroU32};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VarintDecodingError {
    BufferTooShort,
    NonMinimalIntegerEncoding,
    InvalidValue,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DecodingError {
    CannotDecodeType {
        err: VarintDecodingError,
    },
    CannotDecodeLength {
        typ: NonZeroU32,
        err: VarintDecodingError,
    },
    CannotDecodeValue {
        typ: NonZeroU32,
        len: usize,
    },
}

impl fmt::Display for DecodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodingError::CannotDecodeType { err } => write!(f, "bad TLV type ({:?})", err),
            DecodingError::CannotDecodeLength { typ, err } => {
                write!(f, "bad TLV length for type {} ({:?})", typ, err)
            }
            DecodingError::CannotDecodeValue { typ, len } => {
                write!(f, "TLV type {} claims {} bytes past the buffer end", typ, len)
            }
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EncodingError {
    BufferTooShort,
}

pub trait Write {
    fn write(&mut self, bytes: &[u8]) -> Result<(), EncodingError>;
}

impl Write for Vec<u8> {
    fn write(&mut self, bytes: &[u8]) -> Result<(), EncodingError> {
        self.extend_from_slice(bytes);
        Ok(())
    }
}

// Writing into a fixed slice, advancing it past what was written.
impl Write for &mut [u8] {
    fn write(&mut self, bytes: &[u8]) -> Result<(), EncodingError> {
        if bytes.len() > self.len() {
            return Err(EncodingError::BufferTooShort);
        }
        let (head, tail) = core::mem::take(self).split_at_mut(bytes.len());
        head.copy_from_slice(bytes);
        *self = tail;
        Ok(())
    }
}

pub trait Encode {
    fn encoded_length(&self) -> usize;
    fn encode<W: Write>(&self, writer: &mut W) -> Result<(), EncodingError>;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TLV<'a> {
    pub typ: NonZeroU32,
    pub val: &'a [u8],
}

impl<'a> TLV<'a> {
    // This matters when the evolution of the protocol requires adding new types.
    // When an unknown type is critical we must signal error, otherwise we can ignore it.
    pub fn is_critical(&self) -> bool {
        let typ = self.typ.get();
        typ < 32 || typ & 1 == 1
    }

    pub fn val_as_u64(&self) -> Option<u64> {
        match self.val.len() {
            1 => Some(self.val[0] as u64),
            2 => Some(u16::from_be_bytes(self.val.try_into().ok()?) as u64),
            4 => Some(u32::from_be_bytes(self.val.try_into().ok()?) as u64),
            8 => Some(u64::from_be_bytes(self.val.try_into().ok()?)),
            _ => None,
        }
    }

    pub fn try_decode(bytes: &'a [u8]) -> Result<(TLV<'a>, usize), DecodingError> {
        let mut cursor = 0;
        let typ: u32 = parse_varint(bytes, &mut cursor)
            .map_err(|err| DecodingError::CannotDecodeType { err })?
            .try_into()
            .map_err(|_| DecodingError::CannotDecodeType {
                err: VarintDecodingError::InvalidValue,
            })?;
        let typ = NonZeroU32::new(typ).ok_or(DecodingError::CannotDecodeType {
            err: VarintDecodingError::InvalidValue,
        })?;

        let len: usize = parse_varint(bytes, &mut cursor)
            .map_err(|err| DecodingError::CannotDecodeLength { typ, err })?
            .try_into()
            .map_err(|_| DecodingError::CannotDecodeLength {
                typ,
                err: VarintDecodingError::InvalidValue,
            })?;

        if len > bytes.len() - cursor {
            return Err(DecodingError::CannotDecodeValue { typ, len });
        }

        let val = &bytes[cursor..(cursor + len)];
        Ok((TLV { typ, val }, cursor + len))
    }
}

fn parse_varint(bytes: &[u8], cursor: &mut usize) -> Result<u64, VarintDecodingError> {
    let first = *bytes
        .get(*cursor)
        .ok_or(VarintDecodingError::BufferTooShort)?;
    *cursor += 1;
    let width = match first {
        0..=252 => return Ok(first as u64),
        253 => 2,
        254 => 4,
        255 => 8,
    };
    let next = bytes
        .get(*cursor..(*cursor + width))
        .ok_or(VarintDecodingError::BufferTooShort)?;
    *cursor += width;
    let (val, min) = match width {
        2 => (u16::from_be_bytes([next[0], next[1]]) as u64, 253),
        4 => (
            u32::from_be_bytes([next[0], next[1], next[2], next[3]]) as u64,
            65536,
        ),
        _ => {
            let mut arr = [0u8; 8];
            arr.copy_from_slice(next);
            (u64::from_be_bytes(arr), 4294967296)
        }
    };
    if val >= min {
        Ok(val)
    } else {
        Err(VarintDecodingError::NonMinimalIntegerEncoding)
    }
}

/// Iterates over consecutive TLVs in a buffer, yielding each with its offset.
pub struct TlvIter<'a> {
    bytes: &'a [u8],
    offset: usize,
    failed: bool,
}

impl<'a> Iterator for TlvIter<'a> {
    type Item = Result<(usize, TLV<'a>), DecodingError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.bytes.len() {
            return None;
        }
        match TLV::try_decode(&self.bytes[self.offset..]) {
            Ok((tlv, len)) => {
                let start = self.offset;
                self.offset += len;
                Some(Ok((start, tlv)))
            }
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

pub fn parse_tlvs(bytes: &[u8]) -> TlvIter<'_> {
    TlvIter {
        bytes,
        offset: 0,
        failed: false,
    }
}

impl Encode for u64 {
    fn encoded_length(&self) -> usize {
        if *self <= 252 {
            1
        } else if *self <= 65535 {
            3
        } else if *self <= 4294967295 {
            5
        } else {
            9
        }
    }

    fn encode<W: Write>(&self, writer: &mut W) -> Result<(), EncodingError> {
        if *self <= 252 {
            writer.write(&[*self as u8])
        } else if *self <= 65535 {
            writer.write(&[253])?;
            writer.write(&(*self as u16).to_be_bytes())
        } else if *self <= 4294967295 {
            writer.write(&[254])?;
            writer.write(&(*self as u32).to_be_bytes())
        } else {
            writer.write(&[255])?;
            writer.write(&self.to_be_bytes())
        }
    }
}

impl<'a> Encode for TLV<'a> {
    fn encoded_length(&self) -> usize {
        let l = self.val.len();
        (self.typ.get() as u64).encoded_length() + (l as u64).encoded_length() + l
    }

    fn encode<W: Write>(&self, writer: &mut W) -> Result<(), EncodingError> {
        (self.typ.get() as u64).encode(writer)?;
        (self.val.len() as u64).encode(writer)?;
        writer.write(self.val)
    }
}

// Appends one type-length-value triple. Type 0 is reserved and never written.
pub(crate) fn push_tlv(out: &mut Vec<u8>, typ: u32, val: &[u8]) {
    if let Some(typ) = NonZeroU32::new(typ) {
        let _ = TLV { typ, val }.encode(out);
    }
}

// Non-negative integers use the shortest of 1, 2, 4 or 8 bytes.
pub(crate) fn non_negative_bytes(val: u64) -> Vec<u8> {
    if val <= u8::MAX as u64 {
        vec![val as u8]
    } else if val <= u16::MAX as u64 {
        (val as u16).to_be_bytes().to_vec()
    } else if val <= u32::MAX as u64 {
        (val as u32).to_be_bytes().to_vec()
    } else {
        val.to_be_bytes().to_vec()
    }
}
