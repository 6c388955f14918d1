// Copyright 2026 the Morpha Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Disassembler for `morpha` arenas.
//!
//! This module provides:
//! - A structured view ([`Disassembly`], [`Entry`]) for tooling and tests.
//! - A stable, human-readable text format via [`core::fmt::Display`].
//!
//! Words at entity boundaries are decoded as morphs, rules or halts. Every other allocated word
//! is listed as data. A boundary that fails to decode is listed as `.bad` rather than aborting
//! the listing.

#![allow(clippy::module_name_repetitions, reason = "public API module")]

use alloc::vec::Vec;
use core::fmt;

use crate::arena::{Offset, Word};
use crate::codec::Entity;
use crate::morph::{MorphView, Operand};
use crate::rule::RuleView;
use crate::runtime::Runtime;
use crate::status::Fault;

/// Disassembles every allocated word of `runtime`'s arena.
#[must_use]
pub fn disassemble(runtime: &Runtime) -> Disassembly {
    let arena = runtime.arena();
    let mut entries = Vec::new();
    let mut at = 0;
    while let Some(word) = arena.get(at) {
        if !runtime.is_entity(at) {
            entries.push(Entry::Data { at, word });
            at += 1;
            continue;
        }
        match Entity::decode(arena, at) {
            Ok(entity) => {
                at += entity.width();
                entries.push(match entity {
                    Entity::Morph(m) => Entry::Morph(m),
                    Entity::Rule(r) => Entry::Rule(r),
                    Entity::Halt { at, operand } => Entry::Halt { at, operand },
                });
            }
            Err(fault) => {
                entries.push(Entry::Bad { at, word, fault });
                at += 1;
            }
        }
    }
    Disassembly { entries }
}

/// A disassembled arena.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Disassembly {
    entries: Vec<Entry>,
}

impl Disassembly {
    /// All entries in offset order.
    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// The entry starting at `at`, if any.
    #[must_use]
    pub fn entry_at(&self, at: Offset) -> Option<&Entry> {
        self.entries
            .binary_search_by_key(&at, Entry::at)
            .ok()
            .map(|i| &self.entries[i])
    }
}

/// One line (or block, for rules) of a disassembly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Entry {
    /// A top-level morph.
    Morph(MorphView),
    /// A rule with its arms.
    Rule(RuleView),
    /// A terminal marker.
    Halt {
        /// Offset of the header word.
        at: Offset,
        /// The return location.
        operand: Operand,
    },
    /// A word that is not part of any top-level entity: a cell member, a result cell or a
    /// continuation record.
    Data {
        /// Offset of the word.
        at: Offset,
        /// The stored word.
        word: Word,
    },
    /// An entity boundary whose header could not be decoded.
    Bad {
        /// Offset of the header word.
        at: Offset,
        /// The stored word.
        word: Word,
        /// Why decoding failed.
        fault: Fault,
    },
}

impl Entry {
    /// Offset of the first word of this entry.
    #[must_use]
    pub fn at(&self) -> Offset {
        match self {
            Self::Morph(m) => m.at(),
            Self::Rule(r) => r.at(),
            Self::Halt { at, .. } | Self::Data { at, .. } | Self::Bad { at, .. } => *at,
        }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}: ", self.at())?;
        match self {
            Self::Morph(m) => write!(f, "{m}"),
            Self::Rule(r) => {
                write!(f, "rule")?;
                for (condition, action) in r.arms() {
                    write!(f, "\n  when {condition} => {action}")?;
                }
                write!(f, "\n  else {}", r.default_action())
            }
            Self::Halt { operand, .. } => write!(f, "halt {operand}"),
            Self::Data { word, .. } => write!(f, ".word {word}"),
            Self::Bad { word, fault, .. } => write!(f, ".bad {word:#018x} ; {fault}"),
        }
    }
}

impl fmt::Display for Disassembly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{entry}")?;
        }
        Ok(())
    }
}
