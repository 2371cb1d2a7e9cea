use std::{
    fmt::{self, Display},
    hash::Hash,
};

use derive_where::derive_where;

use crate::FxIndexMap;

/// Observation counts per bin. Merging adds counts per bin, so the result of
/// any sequence of merges is independent of their order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[derive_where(Default)]
pub struct Histogram<K: Hash + Eq> {
    bins: FxIndexMap<K, usize>,
}

impl<K: Hash + Eq> Histogram<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, obs: K) {
        *self.bins.entry(obs).or_default() += 1;
    }

    pub fn merge(&mut self, other: &Histogram<K>)
    where
        K: Clone,
    {
        for (bin, count) in &other.bins {
            *self.bins.entry(bin.clone()).or_default() += count;
        }
    }

    pub fn count(&self, bin: &K) -> usize {
        self.bins.get(bin).copied().unwrap_or_default()
    }

    /// Number of distinct bins.
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> usize {
        self.bins.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, usize)> + '_ {
        self.bins.iter().map(|(bin, count)| (bin, *count))
    }

    /// Bins in ascending key order.
    pub fn sorted(&self) -> Vec<(&K, usize)>
    where
        K: Ord,
    {
        let mut bins = self.iter().collect::<Vec<_>>();
        bins.sort_by(|(a, _), (b, _)| a.cmp(b));
        bins
    }
}

impl<K: Hash + Eq> FromIterator<K> for Histogram<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut hist = Self::new();
        for obs in iter {
            hist.add(obs);
        }
        hist
    }
}

impl<K: Hash + Eq + Ord + Display> Display for Histogram<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, (bin, count)) in self.sorted().into_iter().enumerate() {
            if idx != 0 {
                writeln!(f)?;
            }
            write!(f, "{bin}: {count}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add() {
        let hist = ["b", "a", "a", "c", "a"].into_iter().collect::<Histogram<_>>();

        assert_eq!(hist.count(&"a"), 3);
        assert_eq!(hist.count(&"z"), 0);
        assert_eq!(hist.len(), 3);
        assert_eq!(hist.total(), 5);
        assert_eq!(hist.to_string(), "a: 3\nb: 1\nc: 1");
    }

    #[test]
    fn bins_need_no_default() {
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        struct Bin(&'static str);

        let mut hist = Histogram::new();
        hist.add(Bin("x"));
        let copy = hist.clone();

        assert_eq!(copy, hist);
        assert_eq!(hist.count(&Bin("x")), 1);
        assert_ne!(hist, Histogram::default());
    }

    #[test]
    fn merge() {
        let mut h = [1, 1, 2, 2, 3].into_iter().collect::<Histogram<_>>();
        let w = [2, 4].into_iter().collect::<Histogram<_>>();

        h.merge(&w);

        assert_eq!(h.to_string(), "1: 2\n2: 3\n3: 1\n4: 1");
    }

    #[test]
    fn merge_order_is_immaterial() {
        let a = ["x", "y"].into_iter().collect::<Histogram<_>>();
        let b = ["y", "z", "z"].into_iter().collect::<Histogram<_>>();
        let c = ["x"].into_iter().collect::<Histogram<_>>();

        let mut abc = Histogram::new();
        abc.merge(&a);
        abc.merge(&b);
        abc.merge(&c);

        let mut cba = c.clone();
        let mut ba = b.clone();
        ba.merge(&a);
        cba.merge(&ba);

        assert_eq!(abc.sorted(), cba.sorted());
    }
}
