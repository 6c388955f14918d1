// Copyright 2026 the Morpha Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cells: definition-time descriptors of composite values.

use alloc::vec::Vec;

use crate::arena::Offset;
use crate::morph::Operand;

/// A count plus the offsets of its members.
///
/// Cells only exist while building morphs and rules. Nothing about them is written to the arena;
/// their members are ordinary words that were appended earlier (usually by [`Runtime::alloc`]).
///
/// [`Runtime::alloc`]: crate::runtime::Runtime::alloc
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Cell {
    members: Vec<Offset>,
}

impl Cell {
    /// Describes a cell whose members live at `members`.
    #[must_use]
    pub fn new(members: Vec<Offset>) -> Self {
        Self { members }
    }

    /// Describes `count` consecutive members starting at `first`.
    #[must_use]
    pub fn contiguous(first: Offset, count: usize) -> Self {
        Self {
            members: (first..first + count).collect(),
        }
    }

    /// Number of members.
    #[must_use]
    pub fn count(&self) -> usize {
        self.members.len()
    }

    /// Offset of member `i`.
    #[must_use]
    pub fn member(&self, i: usize) -> Option<Offset> {
        self.members.get(i).copied()
    }

    /// A reference operand to member `i`.
    #[must_use]
    pub fn operand(&self, i: usize) -> Option<Operand> {
        self.member(i).map(Operand::Ref)
    }

    /// All member offsets, in order.
    #[must_use]
    pub fn offsets(&self) -> &[Offset] {
        &self.members
    }
}
