// Copyright 2026 the Morpha Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The fixed-capacity, append-only word store.
//!
//! Every entity the runtime knows about lives in one [`Arena`] and is addressed by its
//! [`Offset`]. The only mutation is [`Arena::append`], which either writes all of its words or
//! none of them.

use alloc::vec;
use alloc::vec::Vec;
use core::fmt;
use core::num::NonZeroUsize;

use crate::status::{Fault, TotalityReason};

/// The sole unit of storage.
pub type Word = u64;

/// An index into the arena's word sequence.
pub type Offset = usize;

/// An arena construction error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// The supplied backing store has no room for any word.
    ZeroCapacity,
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroCapacity => write!(f, "backing store capacity must be non-zero"),
        }
    }
}

impl core::error::Error for ArenaError {}

/// A fixed-capacity, append-only sequence of words with an allocation cursor.
///
/// Words below the cursor are immutable once written. Words at or beyond the cursor are free
/// space and are never observable through the public API.
#[derive(Clone, PartialEq, Eq)]
pub struct Arena {
    store: Vec<Word>,
    cursor: usize,
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("capacity", &self.capacity())
            .field("cursor", &self.cursor)
            .finish_non_exhaustive()
    }
}

impl Arena {
    /// Binds `store` as the backing store and resets the cursor to zero.
    ///
    /// The capacity is `store.len()`. Existing contents of `store` are treated as free space.
    pub fn new(store: Vec<Word>) -> Result<Self, ArenaError> {
        if store.is_empty() {
            return Err(ArenaError::ZeroCapacity);
        }
        Ok(Self { store, cursor: 0 })
    }

    /// Creates an arena over a freshly zeroed store of `capacity` words.
    #[must_use]
    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            store: vec![0; capacity.get()],
            cursor: 0,
        }
    }

    /// Returns the declared capacity in words.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.store.len()
    }

    /// Returns the allocation cursor: the offset of the next free word.
    #[must_use]
    pub fn cursor(&self) -> Offset {
        self.cursor
    }

    /// Returns the number of allocated words (same as [`Arena::cursor`]).
    #[must_use]
    pub fn len(&self) -> usize {
        self.cursor
    }

    /// Returns `true` if nothing has been appended yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    /// Returns the number of free words.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.store.len() - self.cursor
    }

    /// Returns the word at `offset`, if it has been allocated.
    #[must_use]
    pub fn get(&self, offset: Offset) -> Option<Word> {
        self.words().get(offset).copied()
    }

    /// Returns the allocated prefix of the store.
    #[must_use]
    pub fn words(&self) -> &[Word] {
        &self.store[..self.cursor]
    }

    /// Appends `words` atomically, returning the offset of the first one.
    ///
    /// If fewer than `words.len()` words are free, nothing is written and the fault carries the
    /// shortfall.
    pub fn append(&mut self, words: &[Word]) -> Result<Offset, Fault> {
        let remaining = self.remaining();
        if words.len() > remaining {
            return Err(Fault::MemLow {
                needed: words.len() - remaining,
            });
        }
        let start = self.cursor;
        let end = start + words.len();
        self.store[start..end].copy_from_slice(words);
        self.cursor = end;
        Ok(start)
    }

    /// Moves the allocated prefix into a larger caller-supplied `store`.
    ///
    /// This is the caller's half of the MEM_LOW protocol. A store that is not strictly larger
    /// than the current capacity is handed back untouched.
    pub fn rebind(&mut self, mut store: Vec<Word>) -> Result<(), Vec<Word>> {
        if store.len() <= self.store.len() {
            return Err(store);
        }
        store[..self.cursor].copy_from_slice(self.words());
        self.store = store;
        Ok(())
    }

    /// Releases the backing store.
    #[must_use]
    pub fn into_store(self) -> Vec<Word> {
        self.store
    }

    /// Reads an allocated word, faulting on unresolved offsets.
    pub(crate) fn read(&self, offset: Offset) -> Result<Word, Fault> {
        self.get(offset)
            .ok_or(Fault::totality(offset, TotalityReason::Unresolved))
    }
}

/// Converts a stored word into an offset, saturating on targets that cannot exist.
pub(crate) fn word_to_offset(w: Word) -> Offset {
    usize::try_from(w).unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn arena(cap: usize) -> Arena {
        Arena::new(vec![0; cap]).unwrap()
    }

    #[test]
    fn new_arena_is_empty_with_declared_capacity() {
        for cap in [1, 2, 17, 512] {
            let a = arena(cap);
            assert_eq!(a.cursor(), 0);
            assert_eq!(a.capacity(), cap);
            assert_eq!(a.remaining(), cap);
            assert!(a.words().is_empty());
        }
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert_eq!(Arena::new(vec![]), Err(ArenaError::ZeroCapacity));
    }

    #[test]
    fn stale_store_contents_are_not_visible() {
        let a = Arena::new(vec![9, 9, 9]).unwrap();
        assert_eq!(a.get(0), None);
    }

    #[test]
    fn append_advances_by_exact_length() {
        let mut a = arena(8);
        assert_eq!(a.append(&[1, 2, 3]), Ok(0));
        assert_eq!(a.append(&[4]), Ok(3));
        assert_eq!(a.cursor(), 4);
        assert_eq!(a.words(), &[1, 2, 3, 4]);
    }

    #[test]
    fn short_append_is_atomic() {
        let mut a = arena(4);
        a.append(&[1, 2, 3]).unwrap();
        let before = a.clone();
        assert_eq!(a.append(&[7, 7, 7]), Err(Fault::MemLow { needed: 2 }));
        assert_eq!(a, before);
        assert_eq!(a.append(&[7]), Ok(3));
        assert_eq!(a.append(&[]), Ok(4));
        assert_eq!(a.append(&[8]), Err(Fault::MemLow { needed: 1 }));
    }

    #[test]
    fn rebind_requires_a_larger_store() {
        let mut a = arena(2);
        a.append(&[5, 6]).unwrap();
        let same = a.rebind(vec![0; 2]).unwrap_err();
        assert_eq!(same.len(), 2);

        a.rebind(vec![0; 5]).unwrap();
        assert_eq!(a.capacity(), 5);
        assert_eq!(a.words(), &[5, 6]);
        assert_eq!(a.append(&[7, 8, 9]), Ok(2));
    }

    #[test]
    fn read_faults_beyond_cursor() {
        let mut a = arena(4);
        a.append(&[1]).unwrap();
        assert_eq!(a.read(0), Ok(1));
        assert_eq!(
            a.read(1),
            Err(Fault::Totality {
                offset: 1,
                reason: TotalityReason::Unresolved
            })
        );
    }
}
