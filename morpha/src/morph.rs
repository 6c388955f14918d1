// Copyright 2026 the Morpha Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Morphs: fixed-arity operations over words.
//!
//! A [`Morph`] is the definition-time form handed to [`Runtime::encode_morph`]. It may carry the
//! wrong number of operands; the encoder rejects it. A [`MorphView`] is what the runtime decodes
//! back out of the arena, and always has exactly the operator's arity.
//!
//! [`Runtime::encode_morph`]: crate::runtime::Runtime::encode_morph

use alloc::vec::Vec;
use core::fmt;

use crate::arena::{Arena, Offset, Word, word_to_offset};
use crate::cell::Cell;
use crate::codec::{self, Header, MAX_OPERANDS};
use crate::opcode::Op;
use crate::status::{Fault, TotalityReason};

/// How an operand word is interpreted.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Mode {
    /// The word is the value.
    Lit,
    /// The word is an arena offset; the value is the word stored there.
    Ref,
    /// The word is ignored; the value is the word at the accumulator location.
    Acc,
}

impl Mode {
    /// Returns the two-bit header encoding.
    #[must_use]
    pub const fn bits(self) -> u8 {
        match self {
            Self::Lit => 0,
            Self::Ref => 1,
            Self::Acc => 2,
        }
    }

    /// Decodes a two-bit header field.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::Lit),
            1 => Some(Self::Ref),
            2 => Some(Self::Acc),
            _ => None,
        }
    }
}

/// A morph operand.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Operand {
    /// An immediate word, written `#x`.
    Lit(Word),
    /// The word stored at an arena offset, written `@p`.
    Ref(Offset),
    /// The word at the current accumulator location, written `acc`.
    Acc,
}

impl Operand {
    /// A literal from a signed value, stored as its two's-complement word.
    #[must_use]
    pub const fn lit_i64(v: i64) -> Self {
        Self::Lit(v as Word)
    }

    /// Returns the operand's mode.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        match self {
            Self::Lit(_) => Mode::Lit,
            Self::Ref(_) => Mode::Ref,
            Self::Acc => Mode::Acc,
        }
    }

    /// The operand word as it is stored after the header.
    pub(crate) const fn word(&self) -> Word {
        match self {
            Self::Lit(w) => *w,
            Self::Ref(p) => *p as Word,
            Self::Acc => 0,
        }
    }

    pub(crate) fn from_parts(mode: Mode, w: Word) -> Self {
        match mode {
            Mode::Lit => Self::Lit(w),
            Mode::Ref => Self::Ref(word_to_offset(w)),
            Mode::Acc => Self::Acc,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lit(w) => write!(f, "#{}", *w as i64),
            Self::Ref(p) => write!(f, "@{p:04}"),
            Self::Acc => write!(f, "acc"),
        }
    }
}

/// A morph definition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Morph {
    op: Op,
    operands: Vec<Operand>,
}

impl Morph {
    /// Creates a morph from an operator and any number of operands.
    ///
    /// The operand count is checked against the operator's arity when the morph is encoded.
    #[must_use]
    pub fn new(op: Op, operands: &[Operand]) -> Self {
        Self {
            op,
            operands: operands.to_vec(),
        }
    }

    /// `a + b`.
    #[must_use]
    pub fn add(a: Operand, b: Operand) -> Self {
        Self::new(Op::Add, &[a, b])
    }

    /// `a - b`.
    #[must_use]
    pub fn sub(a: Operand, b: Operand) -> Self {
        Self::new(Op::Sub, &[a, b])
    }

    /// `a > b` (signed).
    #[must_use]
    pub fn cmp(a: Operand, b: Operand) -> Self {
        Self::new(Op::Cmp, &[a, b])
    }

    /// Jump to the entity at `target`.
    #[must_use]
    pub fn jmp(target: Offset) -> Self {
        Self::new(Op::Jmp, &[Operand::Lit(target as Word)])
    }

    /// Load the word at the offset `at` resolves to.
    #[must_use]
    pub fn offset(at: Operand) -> Self {
        Self::new(Op::Offset, &[at])
    }

    /// Applies `op` to references to each member of `cell`, in order.
    #[must_use]
    pub fn over(op: Op, cell: &Cell) -> Self {
        Self {
            op,
            operands: cell.offsets().iter().map(|&p| Operand::Ref(p)).collect(),
        }
    }

    /// Returns the operator.
    #[must_use]
    pub fn op(&self) -> Op {
        self.op
    }

    /// Returns the operands as supplied.
    #[must_use]
    pub fn operands(&self) -> &[Operand] {
        &self.operands
    }

    /// Number of words this morph encodes to.
    pub(crate) fn encoded_len(&self) -> usize {
        1 + self.operands.len()
    }

    /// Appends the header and operand words to `out`. Arity must already be checked.
    pub(crate) fn encode_into(&self, out: &mut Vec<Word>) {
        let mut modes = [Mode::Lit; MAX_OPERANDS];
        for (slot, operand) in modes.iter_mut().zip(&self.operands) {
            *slot = operand.mode();
        }
        out.push(codec::encode_header(
            self.op.opcode(),
            &modes[..self.operands.len()],
            0,
        ));
        out.extend(self.operands.iter().map(Operand::word));
    }
}

impl fmt::Display for Morph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_morph(f, self.op, &self.operands)
    }
}

/// A morph decoded from the arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MorphView {
    at: Offset,
    op: Op,
    operands: [Operand; MAX_OPERANDS],
}

impl MorphView {
    /// Decodes the morph whose header is at `at`.
    pub(crate) fn decode(arena: &Arena, at: Offset) -> Result<Self, Fault> {
        let header = codec::read_header(arena, at)?;
        Self::from_header(arena, at, &header)
    }

    pub(crate) fn from_header(arena: &Arena, at: Offset, header: &Header) -> Result<Self, Fault> {
        let op = header
            .opcode
            .as_op()
            .ok_or(Fault::totality(at, TotalityReason::UnknownOperator))?;
        let operands = codec::read_operands(arena, at, header)?;
        Ok(Self { at, op, operands })
    }

    /// Offset of the header word.
    #[must_use]
    pub fn at(&self) -> Offset {
        self.at
    }

    /// The operator.
    #[must_use]
    pub fn op(&self) -> Op {
        self.op
    }

    /// The decoded operands, exactly `op().arity()` of them.
    #[must_use]
    pub fn operands(&self) -> &[Operand] {
        &self.operands[..self.op.arity()]
    }

    /// Number of words the morph occupies.
    #[must_use]
    pub fn width(&self) -> usize {
        1 + self.op.arity()
    }

    /// Offset of the first word after the morph.
    #[must_use]
    pub fn end(&self) -> Offset {
        self.at + self.width()
    }
}

impl fmt::Display for MorphView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_morph(f, self.op, self.operands())
    }
}

fn write_morph(f: &mut fmt::Formatter<'_>, op: Op, operands: &[Operand]) -> fmt::Result {
    write!(f, "{op}")?;
    if let (Op::Jmp, [Operand::Lit(target)]) = (op, operands) {
        return write!(f, " {target:04}");
    }
    for (i, operand) in operands.iter().enumerate() {
        let sep = if i == 0 { " " } else { ", " };
        write!(f, "{sep}{operand}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use alloc::vec;
    use std::string::ToString;

    #[test]
    fn modes_round_trip_and_reject_three() {
        for mode in [Mode::Lit, Mode::Ref, Mode::Acc] {
            assert_eq!(Mode::from_bits(mode.bits()), Some(mode));
        }
        assert_eq!(Mode::from_bits(3), None);
    }

    #[test]
    fn negative_literals_are_twos_complement() {
        assert_eq!(Operand::lit_i64(-1), Operand::Lit(u64::MAX));
        assert_eq!(Operand::lit_i64(-5).to_string(), "#-5");
    }

    #[test]
    fn encode_into_writes_header_then_operands() {
        let m = Morph::add(Operand::Ref(3), Operand::Lit(7));
        let mut out = vec![];
        m.encode_into(&mut out);
        assert_eq!(out.len(), m.encoded_len());
        assert_eq!(
            out,
            [codec::encode_header(Op::Add.opcode(), &[Mode::Ref, Mode::Lit], 0), 3, 7]
        );
    }

    #[test]
    fn encoded_morph_decodes_back() {
        let mut arena = Arena::new(vec![0; 8]).unwrap();
        let mut words = vec![];
        Morph::sub(Operand::Acc, Operand::lit_i64(1)).encode_into(&mut words);
        let at = arena.append(&words).unwrap();
        let view = MorphView::decode(&arena, at).unwrap();
        assert_eq!(view.op(), Op::Sub);
        assert_eq!(view.operands(), &[Operand::Acc, Operand::Lit(1)]);
        assert_eq!(view.end(), 3);
    }

    #[test]
    fn truncated_morph_is_unresolved() {
        let mut arena = Arena::new(vec![0; 8]).unwrap();
        let header = codec::encode_header(Op::Add.opcode(), &[Mode::Lit, Mode::Lit], 0);
        arena.append(&[header, 1]).unwrap();
        assert_eq!(
            MorphView::decode(&arena, 0),
            Err(Fault::totality(2, TotalityReason::Unresolved))
        );
    }

    #[test]
    fn over_references_every_member() {
        let cell = Cell::new(vec![4, 9]);
        let m = Morph::over(Op::Cmp, &cell);
        assert_eq!(m.operands(), &[Operand::Ref(4), Operand::Ref(9)]);
    }

    #[test]
    fn display_uses_assembly_syntax() {
        assert_eq!(
            Morph::sub(Operand::Acc, Operand::Lit(1)).to_string(),
            "sub acc, #1"
        );
        assert_eq!(Morph::jmp(4).to_string(), "jmp 0004");
        assert_eq!(
            Morph::offset(Operand::Ref(12)).to_string(),
            "offset @0012"
        );
    }
}
