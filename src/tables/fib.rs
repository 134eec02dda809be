use crate::{face::FaceId, name::Name};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FibRule {
    pub prefix: Name,
    pub face: FaceId,
}

/// Static and managed forwarding rules, in the order they were added.
#[derive(Debug, Default)]
pub struct Fib {
    rules: Vec<FibRule>,
}

impl Fib {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule, unless the same prefix already points at the same face.
    pub fn add(&mut self, prefix: Name, face: FaceId) -> bool {
        if self
            .rules
            .iter()
            .any(|r| r.face == face && r.prefix == prefix)
        {
            return false;
        }
        self.rules.push(FibRule { prefix, face });
        true
    }

    pub fn remove(&mut self, prefix: &Name, face: FaceId) -> bool {
        let before = self.rules.len();
        self.rules.retain(|r| !(r.face == face && &r.prefix == prefix));
        self.rules.len() != before
    }

    pub fn remove_face(&mut self, face: FaceId) -> usize {
        let before = self.rules.len();
        self.rules.retain(|r| r.face != face);
        before - self.rules.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FibRule> + '_ {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.rules.clear();
    }

    /// Faces of every rule sharing the longest prefix that covers `name`.
    ///
    /// A rule only applies when its whole prefix is a prefix of `name`; the
    /// empty prefix is a default route. Faces appear once, in rule order.
    pub fn best_matches(&self, name: &Name) -> Vec<FaceId> {
        let mut best_len = None;
        let mut faces: Vec<FaceId> = Vec::new();
        for rule in self.rules.iter() {
            if !rule.prefix.is_prefix_of(name) {
                continue;
            }
            let len = rule.prefix.component_count();
            match best_len {
                Some(best) if len < best => continue,
                Some(best) if len == best => {}
                _ => {
                    best_len = Some(len);
                    faces.clear();
                }
            }
            if !faces.contains(&rule.face) {
                faces.push(rule.face);
            }
        }
        faces
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(p: &str) -> Name {
        Name::from_path(p).unwrap()
    }

    #[test]
    fn test_longest_match_wins() {
        let mut fib = Fib::new();
        fib.add(n("/"), FaceId(9));
        fib.add(n("/a"), FaceId(1));
        fib.add(n("/a/b"), FaceId(2));
        fib.add(n("/a/b"), FaceId(3));
        fib.add(n("/a/c"), FaceId(4));

        assert_eq!(fib.best_matches(&n("/a/b/c")), vec![FaceId(2), FaceId(3)]);
        assert_eq!(fib.best_matches(&n("/a/x")), vec![FaceId(1)]);
        assert_eq!(fib.best_matches(&n("/z")), vec![FaceId(9)]);
        // A longer rule does not cover a shorter name
        assert_eq!(fib.best_matches(&n("/a")), vec![FaceId(1)]);
    }

    #[test]
    fn test_partial_overlap_is_no_match() {
        let mut fib = Fib::new();
        fib.add(n("/a/x"), FaceId(2));
        // Sharing only the first component does not make /a/x a route for /a/b
        assert!(fib.best_matches(&n("/a/b")).is_empty());
        fib.add(n("/a"), FaceId(1));
        assert_eq!(fib.best_matches(&n("/a/b")), vec![FaceId(1)]);
        assert_eq!(fib.best_matches(&n("/a/x/y")), vec![FaceId(2)]);
    }

    #[test]
    fn test_no_route() {
        let mut fib = Fib::new();
        fib.add(n("/a"), FaceId(1));
        assert!(fib.best_matches(&n("/b/a")).is_empty());
        assert!(fib.best_matches(&n("/")).is_empty());
    }

    #[test]
    fn test_add_remove() {
        let mut fib = Fib::new();
        assert!(fib.add(n("/a"), FaceId(1)));
        assert!(!fib.add(n("/a"), FaceId(1)));
        assert!(fib.add(n("/a"), FaceId(2)));
        assert!(fib.add(n("/b"), FaceId(1)));
        // Trailing slashes do not make a different prefix
        assert!(!fib.add(n("/a/"), FaceId(2)));
        assert_eq!(fib.best_matches(&n("/a/q")), vec![FaceId(1), FaceId(2)]);

        assert!(fib.remove(&n("/a"), FaceId(2)));
        assert!(!fib.remove(&n("/a"), FaceId(2)));
        assert_eq!(fib.remove_face(FaceId(1)), 2);
        assert!(fib.is_empty());
    }
}
