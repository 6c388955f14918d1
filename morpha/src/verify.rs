// Copyright 2026 the Morpha Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Encode-time totality checks.
//!
//! Every definition is checked against the arena as it stands *before* the definition is
//! appended. That single rule gives the evaluator its termination argument: a reference can only
//! name an existing word, and a jump can only name an existing entity, so every jump goes
//! backward.

use crate::arena::{Arena, Offset, word_to_offset};
use crate::bitset::BitSet;
use crate::cell::Cell;
use crate::morph::{Morph, Operand};
use crate::opcode::Op;
use crate::status::{Fault, TotalityReason};

/// Where a morph is being placed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Role {
    /// A top-level morph.
    Standalone,
    /// A rule condition.
    Condition,
    /// A rule action or default.
    Action,
}

/// What a definition may refer to.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Scope<'a> {
    cursor: Offset,
    entities: &'a BitSet,
}

impl<'a> Scope<'a> {
    pub(crate) fn new(arena: &Arena, entities: &'a BitSet) -> Self {
        Self {
            cursor: arena.cursor(),
            entities,
        }
    }

    fn resolved(&self, at: Offset) -> Result<(), Fault> {
        if at >= self.cursor {
            return Err(Fault::totality(at, TotalityReason::Unresolved));
        }
        Ok(())
    }

    fn operand(&self, operand: Operand) -> Result<(), Fault> {
        match operand {
            Operand::Ref(p) => self.resolved(p),
            Operand::Lit(_) | Operand::Acc => Ok(()),
        }
    }

    pub(crate) fn check_morph(&self, morph: &Morph, role: Role) -> Result<(), Fault> {
        let op = morph.op();
        let operands = morph.operands();
        if operands.len() != op.arity() {
            return Err(Fault::totality(
                self.cursor,
                TotalityReason::ArityMismatch {
                    op,
                    expected: op.arity(),
                    actual: operands.len(),
                },
            ));
        }
        if op == Op::Jmp && role == Role::Condition {
            return Err(Fault::totality(
                self.cursor,
                TotalityReason::JumpInCondition,
            ));
        }
        for &operand in operands {
            self.operand(operand)?;
        }

        match (op, operands) {
            (Op::Jmp, &[Operand::Lit(target)]) => {
                let target = word_to_offset(target);
                self.resolved(target)?;
                if !self.entities.get(target) {
                    return Err(Fault::totality(target, TotalityReason::NotAnEntity));
                }
                Ok(())
            }
            (Op::Jmp, _) => Err(Fault::totality(self.cursor, TotalityReason::DynamicJump)),
            (Op::Offset, &[Operand::Lit(at)]) => self.resolved(word_to_offset(at)),
            _ => Ok(()),
        }
    }

    pub(crate) fn check_halt(&self, operand: Operand) -> Result<(), Fault> {
        if let Operand::Lit(_) = operand {
            return Err(Fault::totality(self.cursor, TotalityReason::LiteralReturn));
        }
        self.operand(operand)
    }

    pub(crate) fn check_cell(&self, cell: &Cell) -> Result<(), Fault> {
        cell.offsets().iter().try_for_each(|&p| self.resolved(p))
    }
}
