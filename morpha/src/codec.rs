// Copyright 2026 the Morpha Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Header word layout and entity decoding.
//!
//! Operand words carry no tag of their own. Everything needed to interpret them lives in the
//! header word in front of them:
//!
//! ```text
//!  63        48 47                16 15          8 7          0
//! +------------+--------------------+-------------+------------+
//! |  reserved  |  rule arm count    | modes 2b/op |  opcode    |
//! +------------+--------------------+-------------+------------+
//! ```

use crate::arena::{Arena, Offset, Word};
use crate::morph::{Mode, MorphView, Operand};
use crate::opcode::{EntityKind, Opcode};
use crate::rule::RuleView;
use crate::status::{Fault, TotalityReason};

/// Maximum operands a header can describe (two mode bits each in one byte).
pub(crate) const MAX_OPERANDS: usize = 4;

const OPCODE_MASK: Word = 0xFF;
const MODES_SHIFT: u32 = 8;
const MODES_MASK: Word = 0xFF;
const ARMS_SHIFT: u32 = 16;
const ARMS_MASK: Word = 0xFFFF_FFFF;
const RESERVED_SHIFT: u32 = 48;

/// A decoded header word.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Header {
    pub(crate) opcode: Opcode,
    pub(crate) modes: [Mode; MAX_OPERANDS],
    pub(crate) arms: u32,
}

pub(crate) fn encode_header(opcode: Opcode, modes: &[Mode], arms: u32) -> Word {
    debug_assert!(modes.len() <= MAX_OPERANDS, "too many operand modes");
    let mut packed: Word = 0;
    for (i, mode) in modes.iter().enumerate() {
        packed |= Word::from(mode.bits()) << (2 * i);
    }
    Word::from(opcode.byte()) | (packed << MODES_SHIFT) | (Word::from(arms) << ARMS_SHIFT)
}

pub(crate) fn decode_header(w: Word) -> Result<Header, TotalityReason> {
    let opcode = u8::try_from(w & OPCODE_MASK)
        .ok()
        .and_then(Opcode::from_byte)
        .ok_or(TotalityReason::UnknownOperator)?;
    if w >> RESERVED_SHIFT != 0 {
        return Err(TotalityReason::MalformedHeader);
    }
    let arms = u32::try_from((w >> ARMS_SHIFT) & ARMS_MASK)
        .map_err(|_| TotalityReason::MalformedHeader)?;
    if arms != 0 && opcode != Opcode::Rule {
        return Err(TotalityReason::MalformedHeader);
    }

    let packed = (w >> MODES_SHIFT) & MODES_MASK;
    let mut modes = [Mode::Lit; MAX_OPERANDS];
    for (i, slot) in modes.iter_mut().enumerate() {
        let bits = u8::try_from((packed >> (2 * i)) & 0b11).unwrap_or(u8::MAX);
        if i >= opcode.arity() {
            // Unused operand slots must stay zero so a header has exactly one spelling.
            if bits != 0 {
                return Err(TotalityReason::MalformedHeader);
            }
            continue;
        }
        *slot = Mode::from_bits(bits).ok_or(TotalityReason::BadOperandMode)?;
    }

    Ok(Header {
        opcode,
        modes,
        arms,
    })
}

/// Reads and decodes the header at `at`.
pub(crate) fn read_header(arena: &Arena, at: Offset) -> Result<Header, Fault> {
    let w = arena.read(at)?;
    decode_header(w).map_err(|reason| Fault::totality(at, reason))
}

/// Reads `arity` operands following the header at `at`.
pub(crate) fn read_operands(
    arena: &Arena,
    at: Offset,
    header: &Header,
) -> Result<[Operand; MAX_OPERANDS], Fault> {
    let mut operands = [Operand::Lit(0); MAX_OPERANDS];
    for (i, slot) in operands
        .iter_mut()
        .enumerate()
        .take(header.opcode.arity())
    {
        let w = arena.read(at + 1 + i)?;
        *slot = Operand::from_parts(header.modes[i], w);
    }
    Ok(operands)
}

/// A decoded top-level entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Entity {
    Morph(MorphView),
    Rule(RuleView),
    Halt { at: Offset, operand: Operand },
}

impl Entity {
    /// Decodes whatever entity starts at `at`.
    pub(crate) fn decode(arena: &Arena, at: Offset) -> Result<Self, Fault> {
        let header = read_header(arena, at)?;
        Ok(match header.opcode.kind() {
            EntityKind::Morph => Self::Morph(MorphView::from_header(arena, at, &header)?),
            EntityKind::Rule => Self::Rule(RuleView::from_header(arena, at, &header)?),
            EntityKind::Halt => {
                let operands = read_operands(arena, at, &header)?;
                Self::Halt {
                    at,
                    operand: operands[0],
                }
            }
        })
    }

    /// Number of words the entity occupies.
    pub(crate) fn width(&self) -> usize {
        match self {
            Self::Morph(m) => m.width(),
            Self::Rule(r) => r.width(),
            Self::Halt { .. } => 1 + Opcode::Halt.arity(),
        }
    }

    pub(crate) fn opcode(&self) -> Opcode {
        match self {
            Self::Morph(m) => m.op().opcode(),
            Self::Rule(_) => Opcode::Rule,
            Self::Halt { .. } => Opcode::Halt,
        }
    }
}
