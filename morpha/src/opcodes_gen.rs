// Copyright 2026 the Morpha Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// @generated by morpha_codegen. Do not edit by hand.
// Source: opcodes.json

/// The kind of entity introduced by a header word.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EntityKind {
    /// A fixed-arity operation.
    Morph,
    /// Condition/action arms plus a default.
    Rule,
    /// The terminal marker of a composition.
    Halt,
}

/// Header opcode byte for the bootstrap instruction set.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    /// Wrapping difference of two operands, appended as a new result cell.
    Sub = 0x00,
    /// Wrapping sum of two operands, appended as a new result cell.
    Add = 0x01,
    /// Signed greater-than of two operands, appended as a `0`/`1` result cell.
    Cmp = 0x02,
    /// Transfers control to an earlier entity boundary.
    Jmp = 0x03,
    /// Recalls the word stored at the operand, interpreted as an offset from zero.
    Offset = 0x04,
    /// Ordered condition/action arms followed by a mandatory default action.
    Rule = 0x10,
    /// Terminal marker carrying the composition's return offset.
    Halt = 0x11,
}

impl Opcode {
    /// Every opcode, in byte order.
    pub const ALL: [Self; 7] = [
        Self::Sub,
        Self::Add,
        Self::Cmp,
        Self::Jmp,
        Self::Offset,
        Self::Rule,
        Self::Halt,
    ];

    /// Decodes an opcode byte.
    #[must_use]
    pub fn from_u8(b: u8) -> Option<Self> {
        Some(match b {
            0x00 => Self::Sub,
            0x01 => Self::Add,
            0x02 => Self::Cmp,
            0x03 => Self::Jmp,
            0x04 => Self::Offset,
            0x10 => Self::Rule,
            0x11 => Self::Halt,
            _ => return None,
        })
    }

    /// Stable, parseable opcode name.
    ///
    /// This string is used by the disassembler output.
    #[must_use]
    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::Sub => "sub",
            Self::Add => "add",
            Self::Cmp => "cmp",
            Self::Jmp => "jmp",
            Self::Offset => "offset",
            Self::Rule => "rule",
            Self::Halt => "halt",
        }
    }

    /// Number of operand words that follow the header word.
    #[must_use]
    pub fn arity(self) -> usize {
        match self {
            Self::Sub => 2,
            Self::Add => 2,
            Self::Cmp => 2,
            Self::Jmp => 1,
            Self::Offset => 1,
            Self::Rule => 0,
            Self::Halt => 1,
        }
    }

    /// Returns the kind of entity this opcode introduces.
    #[must_use]
    pub fn kind(self) -> EntityKind {
        match self {
            Self::Sub => EntityKind::Morph,
            Self::Add => EntityKind::Morph,
            Self::Cmp => EntityKind::Morph,
            Self::Jmp => EntityKind::Morph,
            Self::Offset => EntityKind::Morph,
            Self::Rule => EntityKind::Rule,
            Self::Halt => EntityKind::Halt,
        }
    }
}
