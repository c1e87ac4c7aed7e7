use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

/// Two-way lookup table.
///
/// Pairs added with [`BiMap::insert`] round-trip in both directions. Pairs
/// added with [`BiMap::insert_forward`] / [`BiMap::insert_backward`] only map
/// one way, which is how lossy merges (several source names to one target
/// name) are expressed without breaking the round-trip of the canonical pair.
#[derive(Debug, Clone)]
pub struct BiMap<A, B> {
    forward: HashMap<A, B>,
    backward: HashMap<B, A>,
}

impl<A, B> Default for BiMap<A, B> {
    fn default() -> Self {
        Self {
            forward: HashMap::new(),
            backward: HashMap::new(),
        }
    }
}

impl<A, B> BiMap<A, B>
where
    A: Eq + Hash + Clone,
    B: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, a: A, b: B) {
        self.forward.insert(a.clone(), b.clone());
        self.backward.insert(b, a);
    }

    /// Maps `a` to `b` without making `b` resolve back to `a`.
    pub fn insert_forward(&mut self, a: A, b: B) {
        self.forward.insert(a, b);
    }

    /// Maps `b` back to `a` without making `a` resolve forward to `b`.
    pub fn insert_backward(&mut self, b: B, a: A) {
        self.backward.insert(b, a);
    }

    pub fn forward<Q>(&self, a: &Q) -> Option<&B>
    where
        A: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.forward.get(a)
    }

    pub fn backward<Q>(&self, b: &Q) -> Option<&A>
    where
        B: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.backward.get(b)
    }

    /// Forward lookup with a caller-supplied fallback for absent keys.
    pub fn forward_or<Q>(&self, a: &Q, fallback: B) -> B
    where
        A: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.forward.get(a).cloned().unwrap_or(fallback)
    }

    pub fn backward_or<Q>(&self, b: &Q, fallback: A) -> A
    where
        B: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.backward.get(b).cloned().unwrap_or(fallback)
    }

    /// Pairs that round-trip in both directions.
    pub fn pairs(&self) -> impl Iterator<Item = (&A, &B)> {
        self.forward
            .iter()
            .filter(|(a, b)| self.backward.get(*b) == Some(*a))
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}

impl<A, B> FromIterator<(A, B)> for BiMap<A, B>
where
    A: Eq + Hash + Clone,
    B: Eq + Hash + Clone,
{
    fn from_iter<T: IntoIterator<Item = (A, B)>>(iter: T) -> Self {
        let mut map = BiMap::new();
        for (a, b) in iter {
            map.insert(a, b);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_for_listed_keys() {
        let map: BiMap<&str, u32> = [("plains", 1), ("desert", 2)].into_iter().collect();
        for (a, b) in map.pairs() {
            assert_eq!(map.backward(b), Some(a));
            assert_eq!(map.forward(map.backward(b).unwrap()), Some(b));
        }
        assert_eq!(map.pairs().count(), 2);
    }

    #[test]
    fn test_absent_keys_use_fallback() {
        let map: BiMap<&str, u32> = [("plains", 1)].into_iter().collect();
        assert_eq!(map.forward_or("nowhere", 0), 0);
        assert_eq!(map.backward_or(&99, "plains"), "plains");
    }

    #[test]
    fn test_one_way_entries_do_not_break_pairs() {
        let mut map: BiMap<&str, &str> = BiMap::new();
        map.insert("air", "air");
        map.insert_forward("cave_air", "air");
        assert_eq!(map.forward("cave_air"), Some(&"air"));
        assert_eq!(map.backward("air"), Some(&"air"));
        assert_eq!(map.pairs().count(), 1);
    }
}
