use std::ops::{Index, IndexMut};

use super::Indexable;

/// A `Vec` whose positions are addressed by a dedicated index type `I`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct IndexVec<I: Idx, T: Indexable<I>> {
    data: Vec<T>,
    // contravariant in `I`
    _marker: std::marker::PhantomData<fn(&I) -> T>,
}

impl<I: Idx, T: Indexable<I>> IndexVec<I, T> {
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            _marker: std::marker::PhantomData,
        }
    }

    pub fn from_raw_vec(data: Vec<T>) -> Self {
        Self {
            data,
            _marker: std::marker::PhantomData,
        }
    }

    /// The index the next pushed element will receive.
    pub fn next_index(&self) -> I {
        I::new(self.data.len())
    }

    pub fn push(&mut self, value: T) -> I {
        let idx = self.next_index();
        self.data.push(value);
        idx
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }
}

impl<I: Idx, T: Indexable<I>> Default for IndexVec<I, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Idx, T: Indexable<I>> FromIterator<T> for IndexVec<I, T> {
    fn from_iter<Iter: IntoIterator<Item = T>>(iter: Iter) -> Self {
        Self::from_raw_vec(Vec::from_iter(iter))
    }
}

impl<I: Idx, T: Indexable<I>> IntoIterator for IndexVec<I, T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

impl<'a, I: Idx, T: Indexable<I>> IntoIterator for &'a IndexVec<I, T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

impl<I: Idx, T: Indexable<I>> Index<I> for IndexVec<I, T> {
    type Output = T;

    fn index(&self, index: I) -> &Self::Output {
        &self.data[index.index()]
    }
}

impl<I: Idx, T: Indexable<I>> IndexMut<I> for IndexVec<I, T> {
    fn index_mut(&mut self, index: I) -> &mut Self::Output {
        &mut self.data[index.index()]
    }
}

pub trait Idx: Copy + Eq + std::fmt::Debug + std::hash::Hash {
    fn new(idx: usize) -> Self;
    fn index(self) -> usize;
}

impl Idx for usize {
    fn new(idx: usize) -> Self {
        idx
    }

    fn index(self) -> usize {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::define_index!(TestIdx);
    impl Indexable<TestIdx> for &str {}

    #[test]
    fn push_returns_consecutive_indices() {
        let mut v: IndexVec<TestIdx, &str> = IndexVec::new();
        let a = v.push("a");
        let b = v.push("b");
        assert_eq!(a.unwrap_idx(), 0);
        assert_eq!(b.unwrap_idx(), 1);
        assert_eq!(v[b], "b");
        assert_eq!(v.next_index().unwrap_idx(), 2);
    }
}
