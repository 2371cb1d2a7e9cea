use std::{
    marker::PhantomData,
    ops::{Index, IndexMut},
    slice,
};

use crate::index::IndexType;

/// Append-only arena addressed by a typed index.
#[derive(Debug, Clone)]
pub struct IndexStorage<I: IndexType, T> {
    raw: Vec<T>,
    _idx: PhantomData<I>,
}

impl<I: IndexType, T> IndexStorage<I, T> {
    #[inline]
    pub fn new() -> Self {
        Self {
            raw: Vec::new(),
            _idx: PhantomData,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            raw: Vec::with_capacity(capacity),
            _idx: PhantomData,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// The index the next `push` will return.
    #[inline]
    pub fn next_idx(&self) -> I {
        I::from_usize(self.raw.len())
    }

    pub fn push(&mut self, value: T) -> I {
        let idx = self.next_idx();
        self.raw.push(value);
        idx
    }

    #[inline]
    pub fn get(&self, idx: I) -> Option<&T> {
        self.raw.get(idx.as_usize())
    }

    #[inline]
    pub fn get_mut(&mut self, idx: I) -> Option<&mut T> {
        self.raw.get_mut(idx.as_usize())
    }

    pub fn ids(&self) -> impl DoubleEndedIterator<Item = I> + ExactSizeIterator {
        (0 .. self.raw.len()).map(I::from_usize)
    }

    pub fn iter_with_id(&self) -> impl DoubleEndedIterator<Item = (I, &T)> + '_ {
        self.raw
            .iter()
            .enumerate()
            .map(|(idx, inner)| (I::from_usize(idx), inner))
    }

    pub fn iter_mut_with_id(
        &mut self,
    ) -> impl DoubleEndedIterator<Item = (I, &mut T)> + '_ {
        self.raw
            .iter_mut()
            .enumerate()
            .map(|(idx, inner)| (I::from_usize(idx), inner))
    }

    #[inline]
    pub fn values(&self) -> slice::Iter<'_, T> {
        self.raw.iter()
    }

    #[inline]
    pub fn values_mut(&mut self) -> slice::IterMut<'_, T> {
        self.raw.iter_mut()
    }
}

impl<I: IndexType, T> Default for IndexStorage<I, T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<I: IndexType, T> Index<I> for IndexStorage<I, T> {
    type Output = T;

    #[inline]
    fn index(&self, idx: I) -> &Self::Output {
        &self.raw[idx.as_usize()]
    }
}

impl<I: IndexType, T> IndexMut<I> for IndexStorage<I, T> {
    #[inline]
    fn index_mut(&mut self, idx: I) -> &mut Self::Output {
        &mut self.raw[idx.as_usize()]
    }
}

impl<I: IndexType, T> FromIterator<T> for IndexStorage<I, T> {
    fn from_iter<It: IntoIterator<Item = T>>(iter: It) -> Self {
        Self {
            raw: iter.into_iter().collect(),
            _idx: PhantomData,
        }
    }
}

impl<'a, I: IndexType, T> IntoIterator for &'a IndexStorage<I, T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.raw.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::idx_ty;

    idx_ty!(ItemId);

    #[test]
    fn push_returns_sequential_ids() {
        let mut storage = IndexStorage::<ItemId, &str>::new();
        let a = storage.push("a");
        let b = storage.push("b");

        assert_eq!(a.as_u32(), 0);
        assert_eq!(b.as_u32(), 1);
        assert_eq!(storage[b], "b");
        assert_eq!(storage.next_idx().as_u32(), 2);
        assert_eq!(
            storage.iter_with_id().map(|(id, v)| (id.as_u32(), *v)).collect::<Vec<_>>(),
            vec![(0, "a"), (1, "b")]
        );
    }
}
