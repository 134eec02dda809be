use core::fmt;

use crate::tlv::push_tlv;

/// Upper bound on the number of components a name may carry.
pub const MAX_NAME_COMPONENTS: usize = 64;

pub(crate) const TLV_TYPE_NAME: u32 = 7;
pub(crate) const TLV_TYPE_NAME_COMPONENT: u32 = 8;

/// An owned, ordered sequence of opaque byte components.
///
/// All component bytes live in one contiguous allocation; `ends[i]` is the
/// offset one past the last byte of component `i`.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Name {
    bytes: Vec<u8>,
    ends: Vec<usize>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MatchMode {
    /// Same component count and every component byte-equal.
    Exact,
    /// Count of leading components that match, up to the shorter name.
    Longest,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PrefixMatch {
    None,
    /// This many leading components matched, but the names differ in length
    ///  or diverge afterwards.
    Partial(usize),
    Full,
}

impl PrefixMatch {
    pub fn is_full(&self) -> bool {
        matches!(self, PrefixMatch::Full)
    }

    // Number of matched components, given the length of the shorter name
    //  for the full case.
    pub fn matched(&self, full_len: usize) -> usize {
        match self {
            PrefixMatch::None => 0,
            PrefixMatch::Partial(n) => *n,
            PrefixMatch::Full => full_len,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TooManyComponents;

impl Name {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_components<I, C>(components: I) -> Result<Self, TooManyComponents>
    where
        I: IntoIterator<Item = C>,
        C: AsRef<[u8]>,
    {
        let mut name = Name::new();
        for c in components {
            name.push(c.as_ref())?;
        }
        Ok(name)
    }

    // Parses "/a/b/c". Empty segments are skipped, so "/" and "" are the empty name.
    pub fn from_path(path: &str) -> Result<Self, TooManyComponents> {
        Self::from_components(path.split('/').filter(|s| !s.is_empty()))
    }

    pub fn push(&mut self, component: &[u8]) -> Result<(), TooManyComponents> {
        if self.ends.len() >= MAX_NAME_COMPONENTS {
            return Err(TooManyComponents);
        }
        self.bytes.extend_from_slice(component);
        self.ends.push(self.bytes.len());
        Ok(())
    }

    pub fn component_count(&self) -> usize {
        self.ends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }

    pub fn component(&self, idx: usize) -> Option<&[u8]> {
        let end = *self.ends.get(idx)?;
        let start = if idx == 0 { 0 } else { self.ends[idx - 1] };
        Some(&self.bytes[start..end])
    }

    pub fn components(&self) -> impl Iterator<Item = &[u8]> + '_ {
        (0..self.ends.len()).filter_map(move |i| self.component(i))
    }

    pub fn compare(&self, other: &Name, mode: MatchMode) -> PrefixMatch {
        let (a, b) = (self.component_count(), other.component_count());
        if mode == MatchMode::Exact && a != b {
            return PrefixMatch::None;
        }
        let matched = self.matched_components(other);
        if matched == a && a == b {
            return PrefixMatch::Full;
        }
        match mode {
            MatchMode::Exact => PrefixMatch::None,
            MatchMode::Longest if matched == 0 => PrefixMatch::None,
            MatchMode::Longest => PrefixMatch::Partial(matched),
        }
    }

    /// Number of leading components equal in both names.
    pub fn matched_components(&self, other: &Name) -> usize {
        self.components()
            .zip(other.components())
            .take_while(|(x, y)| x == y)
            .count()
    }

    pub fn is_prefix_of(&self, other: &Name) -> bool {
        self.component_count() <= other.component_count()
            && self.matched_components(other) == self.component_count()
    }

    pub(crate) fn encoded_value(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.bytes.len() + 2 * self.ends.len());
        for c in self.components() {
            push_tlv(&mut out, TLV_TYPE_NAME_COMPONENT, c);
        }
        out
    }

    pub(crate) fn encode_into(&self, out: &mut Vec<u8>) {
        push_tlv(out, TLV_TYPE_NAME, &self.encoded_value());
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("/");
        }
        for c in self.components() {
            f.write_str("/")?;
            for &b in c {
                if b.is_ascii_graphic() && b != b'/' && b != b'%' {
                    write!(f, "{}", b as char)?;
                } else {
                    write!(f, "%{:02X}", b)?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(p: &str) -> Name {
        Name::from_path(p).unwrap()
    }

    #[test]
    fn test_exact() {
        assert_eq!(n("/a/b").compare(&n("/a/b"), MatchMode::Exact), PrefixMatch::Full);
        assert_eq!(n("/a/b").compare(&n("/a/b/c"), MatchMode::Exact), PrefixMatch::None);
        assert_eq!(n("/a/b/c").compare(&n("/a/b"), MatchMode::Exact), PrefixMatch::None);
        assert_eq!(n("/a/x").compare(&n("/a/b"), MatchMode::Exact), PrefixMatch::None);
        assert_eq!(n("/").compare(&n(""), MatchMode::Exact), PrefixMatch::Full);
    }

    #[test]
    fn test_longest() {
        assert_eq!(
            n("/a/b").compare(&n("/a/b/c"), MatchMode::Longest),
            PrefixMatch::Partial(2)
        );
        assert_eq!(
            n("/a/b/c").compare(&n("/a/b"), MatchMode::Longest),
            PrefixMatch::Partial(2)
        );
        assert_eq!(
            n("/a/x/c").compare(&n("/a/b/c"), MatchMode::Longest),
            PrefixMatch::Partial(1)
        );
        assert_eq!(n("/x").compare(&n("/a/b"), MatchMode::Longest), PrefixMatch::None);
        assert_eq!(n("/a/b").compare(&n("/a/b"), MatchMode::Longest), PrefixMatch::Full);
    }

    #[test]
    fn test_compare_properties() {
        let names = ["/", "/a", "/a/b", "/a/c", "/a/b/c", "/b", "/a/b/c/d"];
        for p in names.iter() {
            for q in names.iter() {
                let (p, q) = (n(p), n(q));
                let exact = p.compare(&q, MatchMode::Exact);
                // Exact is symmetric and never full for differing lengths
                assert_eq!(exact, q.compare(&p, MatchMode::Exact));
                if p.component_count() != q.component_count() {
                    assert_eq!(exact, PrefixMatch::None);
                }
                let shorter = p.component_count().min(q.component_count());
                let longest = p.compare(&q, MatchMode::Longest);
                assert!(longest.matched(shorter) <= shorter);
            }
        }
    }

    #[test]
    fn test_prefix_of() {
        assert!(n("/").is_prefix_of(&n("/a")));
        assert!(n("/a").is_prefix_of(&n("/a/b")));
        assert!(n("/a/b").is_prefix_of(&n("/a/b")));
        assert!(!n("/a/b/c").is_prefix_of(&n("/a/b")));
        assert!(!n("/a/c").is_prefix_of(&n("/a/b/c")));
    }

    #[test]
    fn test_components_and_display() {
        let name = Name::from_components([&b"hello"[..], &[0u8, 0x2f][..], &b""[..]]).unwrap();
        assert_eq!(name.component_count(), 3);
        assert_eq!(name.component(0), Some(&b"hello"[..]));
        assert_eq!(name.component(2), Some(&b""[..]));
        assert_eq!(name.component(3), None);
        assert_eq!(format!("{}", name), "/hello/%00%2F/");
        assert_eq!(format!("{}", Name::new()), "/");
        assert_eq!(
            name.encoded_value(),
            vec![8, 5, b'h', b'e', b'l', b'l', b'o', 8, 2, 0, 0x2f, 8, 0]
        );
    }

    #[test]
    fn test_component_limit() {
        let mut name = Name::new();
        for _ in 0..MAX_NAME_COMPONENTS {
            assert!(name.push(b"x").is_ok());
        }
        assert_eq!(name.push(b"x"), Err(TooManyComponents));
        assert_eq!(name.component_count(), MAX_NAME_COMPONENTS);
    }
}
