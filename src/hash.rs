use core::fmt;

use sha2::{Digest, Sha256};

#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Sha256Digest(pub [u8; 32]);

impl Sha256Digest {
    pub fn of(bytes: &[u8]) -> Self {
        Sha256Digest(Sha256::digest(bytes).into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Sha256Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0[..4] {
            write!(f, "{:02x}", b)?;
        }
        f.write_str("..")
    }
}

#[cfg(test)]
mod tests {
    use super::Sha256Digest;

    #[test]
    fn test_known_digest() {
        let d = Sha256Digest::of(b"abc");
        assert_eq!(
            &d.0[..8],
            &[0xba, 0x78, 0x16, 0xbf, 0x8f, 0x01, 0xcf, 0xea]
        );
        assert_eq!(format!("{:?}", d), "ba7816bf..");
        assert_ne!(d, Sha256Digest::of(b"abd"));
    }
}
