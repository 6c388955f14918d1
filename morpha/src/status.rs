// Copyright 2026 the Morpha Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The four-way result protocol shared by every component.
//!
//! Fallible operations return `Result<T, Fault>`: `Ok` is the OK kind, and the two fault kinds
//! are the variants of [`Fault`]. The evaluator reports HALT through [`Flow::Halt`] (for a
//! single step) or through `Ok` of `exec`. [`Status`] flattens all of this back into the plain
//! tagged `{kind, payload}` shape for hosts that want it.

use core::fmt;

use crate::arena::{Offset, Word};
use crate::opcode::Op;

/// Result kinds of the runtime protocol.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Expected state with an operation-specific payload.
    Ok,
    /// The composition finished; the payload is its return offset.
    Halt,
    /// A definition or reference is not total; the payload is the offending offset.
    TotalityFault,
    /// The backing store is too small; the payload is the number of additional words needed.
    MemLow,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::Halt => write!(f, "HALT"),
            Self::TotalityFault => write!(f, "TOTALITY_FAULT"),
            Self::MemLow => write!(f, "MEM_LOW"),
        }
    }
}

/// Why a definition or reference was rejected as non-total.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TotalityReason {
    /// A morph was given the wrong number of operands.
    ArityMismatch {
        /// Operator being encoded.
        op: Op,
        /// Fixed arity of `op`.
        expected: usize,
        /// Number of operands supplied.
        actual: usize,
    },
    /// An offset is at or beyond the allocation cursor.
    Unresolved,
    /// An offset is allocated but no top-level entity starts there.
    NotAnEntity,
    /// A header word carries an opcode byte outside the closed table, or the wrong entity kind
    /// for its position.
    UnknownOperator,
    /// A header word carries an operand mode outside `{literal, reference, accumulator}`.
    BadOperandMode,
    /// A header word has reserved bits set, or an arm count on a non-rule.
    MalformedHeader,
    /// Rule conditions and actions have different lengths.
    RuleShape {
        /// Number of conditions.
        conditions: usize,
        /// Number of actions.
        actions: usize,
    },
    /// A `jmp` was used as a rule condition.
    JumpInCondition,
    /// A `jmp` target was not a literal offset.
    DynamicJump,
    /// A `halt` operand was a literal rather than a location.
    LiteralReturn,
    /// The accumulator was read before any action produced a result.
    UnboundAccumulator,
}

impl fmt::Display for TotalityReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ArityMismatch {
                op,
                expected,
                actual,
            } => write!(
                f,
                "{op} takes {expected} operand(s), {actual} supplied"
            ),
            Self::Unresolved => write!(f, "offset is not allocated"),
            Self::NotAnEntity => write!(f, "offset is not an entity boundary"),
            Self::UnknownOperator => write!(f, "unknown operator"),
            Self::BadOperandMode => write!(f, "bad operand mode"),
            Self::MalformedHeader => write!(f, "malformed header word"),
            Self::RuleShape {
                conditions,
                actions,
            } => write!(
                f,
                "rule has {conditions} condition(s) but {actions} action(s)"
            ),
            Self::JumpInCondition => write!(f, "jmp cannot be a rule condition"),
            Self::DynamicJump => write!(f, "jmp target must be a literal offset"),
            Self::LiteralReturn => write!(f, "halt must return a location, not a literal"),
            Self::UnboundAccumulator => write!(f, "accumulator read before it was set"),
        }
    }
}

/// A failed definition or step.
///
/// Both kinds leave the arena, the instruction pointer and the accumulator exactly as they were
/// before the call.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Fault {
    /// The definition or reference is not total. Permanent for the given inputs.
    Totality {
        /// The offending offset.
        offset: Offset,
        /// What made it non-total.
        reason: TotalityReason,
    },
    /// The backing store is too small. Retriable after the caller grows the store.
    MemLow {
        /// Additional words required.
        needed: usize,
    },
}

impl Fault {
    pub(crate) const fn totality(offset: Offset, reason: TotalityReason) -> Self {
        Self::Totality { offset, reason }
    }

    /// Returns the protocol kind of this fault.
    #[must_use]
    pub const fn kind(&self) -> Kind {
        match self {
            Self::Totality { .. } => Kind::TotalityFault,
            Self::MemLow { .. } => Kind::MemLow,
        }
    }

    /// Returns the protocol payload: the offending offset or the words needed.
    #[must_use]
    pub const fn payload(&self) -> usize {
        match self {
            Self::Totality { offset, .. } => *offset,
            Self::MemLow { needed } => *needed,
        }
    }

    /// Returns `true` if reissuing the call after growing the store can succeed.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(self, Self::MemLow { .. })
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Totality { offset, reason } => {
                write!(f, "totality fault at {offset:04}: {reason}")
            }
            Self::MemLow { needed } => write!(f, "memory low: {needed} more word(s) required"),
        }
    }
}

impl core::error::Error for Fault {}

/// The outcome of a single successful step.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Flow {
    /// Execution continues at the given offset.
    Continue(Offset),
    /// A halt was reached, or no entity follows the pointer; the payload is the return offset.
    Halt(Offset),
}

/// The flat `{kind, payload}` form of any runtime result.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Status {
    /// OK with an operation-specific payload.
    Ok(Word),
    /// HALT with the return offset.
    Halt(Offset),
    /// TOTALITY_FAULT with the offending offset.
    TotalityFault(Offset),
    /// MEM_LOW with the number of additional words required.
    MemLow(usize),
}

impl Status {
    /// Flattens the result of an `encode_*` call or an arena append.
    #[must_use]
    pub fn from_define(r: Result<Offset, Fault>) -> Self {
        match r {
            Ok(offset) => Self::Ok(offset as Word),
            Err(fault) => fault.into(),
        }
    }

    /// Flattens the result of `step`.
    #[must_use]
    pub fn from_step(r: Result<Flow, Fault>) -> Self {
        match r {
            Ok(Flow::Continue(next)) => Self::Ok(next as Word),
            Ok(Flow::Halt(ret)) => Self::Halt(ret),
            Err(fault) => fault.into(),
        }
    }

    /// Flattens the result of `exec`.
    #[must_use]
    pub fn from_exec(r: Result<Offset, Fault>) -> Self {
        match r {
            Ok(ret) => Self::Halt(ret),
            Err(fault) => fault.into(),
        }
    }

    /// Returns the protocol kind.
    #[must_use]
    pub const fn kind(&self) -> Kind {
        match self {
            Self::Ok(_) => Kind::Ok,
            Self::Halt(_) => Kind::Halt,
            Self::TotalityFault(_) => Kind::TotalityFault,
            Self::MemLow(_) => Kind::MemLow,
        }
    }

    /// Returns the payload as a word.
    #[must_use]
    pub const fn payload(&self) -> Word {
        match self {
            Self::Ok(w) => *w,
            Self::Halt(o) | Self::TotalityFault(o) | Self::MemLow(o) => *o as Word,
        }
    }
}

impl From<Fault> for Status {
    fn from(fault: Fault) -> Self {
        match fault {
            Fault::Totality { offset, .. } => Self::TotalityFault(offset),
            Fault::MemLow { needed } => Self::MemLow(needed),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind(), self.payload())
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::string::ToString;

    #[test]
    fn only_mem_low_is_retriable() {
        assert!(Fault::MemLow { needed: 3 }.is_retriable());
        assert!(!Fault::totality(0, TotalityReason::Unresolved).is_retriable());
    }

    #[test]
    fn status_flattens_each_kind() {
        assert_eq!(Status::from_define(Ok(7)), Status::Ok(7));
        assert_eq!(
            Status::from_step(Ok(Flow::Continue(12))).kind(),
            Kind::Ok
        );
        assert_eq!(Status::from_step(Ok(Flow::Halt(4))), Status::Halt(4));
        assert_eq!(Status::from_exec(Ok(9)), Status::Halt(9));
        assert_eq!(
            Status::from_exec(Err(Fault::MemLow { needed: 2 })),
            Status::MemLow(2)
        );
        let s = Status::from_define(Err(Fault::totality(5, TotalityReason::NotAnEntity)));
        assert_eq!(s.kind(), Kind::TotalityFault);
        assert_eq!(s.payload(), 5);
    }

    #[test]
    fn display_is_readable() {
        let f = Fault::totality(
            3,
            TotalityReason::ArityMismatch {
                op: Op::Add,
                expected: 2,
                actual: 1,
            },
        );
        assert_eq!(
            f.to_string(),
            "totality fault at 0003: add takes 2 operand(s), 1 supplied"
        );
        assert_eq!(Status::MemLow(4).to_string(), "MEM_LOW(4)");
    }
}
