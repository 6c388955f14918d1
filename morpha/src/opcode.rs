// Copyright 2026 the Morpha Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Opcode byte values for the bootstrap instruction set.
//!
//! This module is a small wrapper around the generated opcode table, plus the closed [`Op`]
//! subset that morphs are allowed to use.

use core::fmt;

include!("opcodes_gen.rs");

impl Opcode {
    /// Returns the opcode byte value.
    #[must_use]
    pub const fn byte(self) -> u8 {
        self as u8
    }

    /// Parses an opcode from its byte value.
    #[must_use]
    pub fn from_byte(b: u8) -> Option<Self> {
        Self::from_u8(b)
    }

    /// Returns the morph operator for this opcode, if it introduces a morph.
    #[must_use]
    pub fn as_op(self) -> Option<Op> {
        Some(match self {
            Self::Sub => Op::Sub,
            Self::Add => Op::Add,
            Self::Cmp => Op::Cmp,
            Self::Jmp => Op::Jmp,
            Self::Offset => Op::Offset,
            Self::Rule | Self::Halt => return None,
        })
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// A morph operator.
///
/// Adding a variant here is a compile-time decision: every executor and encoder matches on it
/// exhaustively.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Op {
    /// `a - b`, wrapping.
    Sub,
    /// `a + b`, wrapping.
    Add,
    /// `1` if `a > b` as signed words, else `0`.
    Cmp,
    /// Absolute jump to an earlier entity.
    Jmp,
    /// Dereference of an arena offset.
    Offset,
}

impl Op {
    /// Every morph operator.
    pub const ALL: [Self; 5] = [Self::Sub, Self::Add, Self::Cmp, Self::Jmp, Self::Offset];

    /// Returns the header opcode for this operator.
    #[must_use]
    pub const fn opcode(self) -> Opcode {
        match self {
            Self::Sub => Opcode::Sub,
            Self::Add => Opcode::Add,
            Self::Cmp => Opcode::Cmp,
            Self::Jmp => Opcode::Jmp,
            Self::Offset => Opcode::Offset,
        }
    }

    /// Returns the fixed number of operand words this operator consumes.
    #[must_use]
    pub fn arity(self) -> usize {
        self.opcode().arity()
    }
}

impl From<Op> for Opcode {
    fn from(op: Op) -> Self {
        op.opcode()
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.opcode().mnemonic())
    }
}
