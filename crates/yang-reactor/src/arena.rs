//! Handle-indexed storage for build contexts and actions

use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// A type usable as an index into an [`IndexVec`]
pub trait Idx: Copy + Eq {
    fn new(raw: u32) -> Self;
    fn index(self) -> usize;
}

/// A `Vec` addressed by a typed handle
#[derive(Debug, Clone)]
pub struct IndexVec<I: Idx, T> {
    raw: Vec<T>,
    _marker: PhantomData<fn(I) -> I>,
}

impl<I: Idx, T> Default for IndexVec<I, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Idx, T> IndexVec<I, T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            raw: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Push a value and return its handle.
    #[allow(clippy::cast_possible_truncation)]
    pub fn push(&mut self, value: T) -> I {
        let idx = I::new(self.raw.len() as u32);
        self.raw.push(value);
        idx
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    #[must_use]
    pub fn get(&self, idx: I) -> Option<&T> {
        self.raw.get(idx.index())
    }

    pub fn get_mut(&mut self, idx: I) -> Option<&mut T> {
        self.raw.get_mut(idx.index())
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.raw.iter()
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn iter_enumerated(&self) -> impl Iterator<Item = (I, &T)> {
        self.raw
            .iter()
            .enumerate()
            .map(|(i, v)| (I::new(i as u32), v))
    }

    /// Handle the next pushed value will get
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn next_idx(&self) -> I {
        I::new(self.raw.len() as u32)
    }

    /// All handles in insertion order
    #[allow(clippy::cast_possible_truncation)]
    pub fn indices(&self) -> impl DoubleEndedIterator<Item = I> + use<I, T> {
        (0..self.raw.len()).map(|i| I::new(i as u32))
    }
}

impl<I: Idx, T> Index<I> for IndexVec<I, T> {
    type Output = T;

    fn index(&self, idx: I) -> &T {
        &self.raw[idx.index()]
    }
}

impl<I: Idx, T> IndexMut<I> for IndexVec<I, T> {
    fn index_mut(&mut self, idx: I) -> &mut T {
        &mut self.raw[idx.index()]
    }
}

macro_rules! define_idx {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl Idx for $name {
            fn new(raw: u32) -> Self {
                Self(raw)
            }
            fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

define_idx!(
    /// Handle of a statement context within one build
    CtxId,
    "ctx#"
);
define_idx!(
    /// Handle of a compiled source within one build
    SourceId,
    "src#"
);
define_idx!(
    /// Handle of an inference action; also its registration order
    ActionId,
    "action#"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_index() {
        let mut vec: IndexVec<CtxId, &str> = IndexVec::new();
        let a = vec.push("a");
        let b = vec.push("b");

        assert_eq!(a, CtxId::new(0));
        assert_eq!(vec[b], "b");
        vec[a] = "z";
        assert_eq!(vec.get(a), Some(&"z"));
        assert_eq!(vec.len(), 2);
        assert_eq!(b.to_string(), "ctx#1");
    }

    #[test]
    fn test_indices_reverse() {
        let mut vec: IndexVec<ActionId, u8> = IndexVec::new();
        vec.push(1);
        vec.push(2);
        vec.push(3);
        let rev: Vec<_> = vec.indices().rev().map(Idx::index).collect();
        assert_eq!(rev, vec![2, 1, 0]);
        let pairs: Vec<_> = vec.iter_enumerated().map(|(i, v)| (i.index(), *v)).collect();
        assert_eq!(pairs, vec![(0, 1), (1, 2), (2, 3)]);
    }
}
