// Copyright 2026 the Morpha Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing hooks for `morpha`.
//!
//! Tracing is optional and `no_std` friendly. The runtime only emits events requested by a
//! [`TraceMask`], which makes these hooks the audit trail for a run: which entities executed,
//! which rule conditions were evaluated, which arm was taken and why a step faulted.
//!
//! To enable tracing, pass a [`TraceMask`] and [`TraceSink`] to [`Runtime::step_traced`] or
//! [`Runtime::exec_traced`].

#[cfg(doc)]
use crate::runtime::Runtime;

use crate::arena::{Arena, Offset, Word};
use crate::opcode::Opcode;
use crate::rule::Arm;
use crate::status::Fault;

/// A set of trace events requested by a [`TraceSink`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TraceMask(u32);

impl core::ops::BitOr for TraceMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl core::ops::BitOrAssign for TraceMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl TraceMask {
    /// No tracing.
    pub const NONE: Self = Self(0);
    /// Trace run boundaries.
    ///
    /// Enables:
    /// - [`TraceSink::run_start`]
    /// - [`TraceSink::run_end`]
    pub const RUN: Self = Self(1 << 0);
    /// Trace each successful step.
    ///
    /// Enables:
    /// - [`TraceSink::step`]
    pub const STEP: Self = Self(1 << 1);
    /// Trace rule evaluation.
    ///
    /// Enables:
    /// - [`TraceSink::condition`]
    /// - [`TraceSink::arm`]
    pub const RULE: Self = Self(1 << 2);
    /// Trace failed steps.
    ///
    /// Enables:
    /// - [`TraceSink::fault`]
    pub const FAULT: Self = Self(1 << 3);
    /// Every event.
    pub const ALL: Self = Self(Self::RUN.0 | Self::STEP.0 | Self::RULE.0 | Self::FAULT.0);

    /// Returns `true` if this mask includes all bits in `other`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }
}

/// Run outcome for tracing.
#[derive(Clone, Debug)]
pub enum TraceOutcome<'a> {
    /// The composition halted with this return offset.
    Halt(Offset),
    /// The run stopped on a fault.
    Fault(&'a Fault),
}

/// A trace sink that can receive runtime events.
///
/// Every method has an empty default, so sinks only implement what they record.
pub trait TraceSink {
    /// Returns the set of events the sink wants.
    fn mask(&self) -> TraceMask {
        TraceMask::NONE
    }

    /// Called when [`Runtime::exec_traced`] starts.
    ///
    /// Called only if the mask includes [`TraceMask::RUN`].
    ///
    /// - `arena`: the arena at the start of the run
    /// - `pos`: the starting instruction pointer
    fn run_start(&mut self, _arena: &Arena, _pos: Offset) {}

    /// Called after each successful step that did not halt.
    ///
    /// Called only if the mask includes [`TraceMask::STEP`].
    ///
    /// - `arena`: the arena after the step committed
    /// - `pos`: offset of the entity that executed
    /// - `next`: the new instruction pointer
    /// - `opcode`: header opcode of the executed entity
    fn step(&mut self, _arena: &Arena, _pos: Offset, _next: Offset, _opcode: Opcode) {}

    /// Called for each rule condition that was executed, once the step has committed.
    ///
    /// Called only if the mask includes [`TraceMask::RULE`]. A step that faults reports no
    /// condition or arm events.
    ///
    /// - `arena`: the arena after the step committed
    /// - `rule`: offset of the rule header
    /// - `index`: zero-based condition index
    /// - `value`: the condition's result word; non-zero selects the arm
    fn condition(&mut self, _arena: &Arena, _rule: Offset, _index: usize, _value: Word) {}

    /// Called once per committed rule evaluation with the selected arm, after its conditions.
    ///
    /// Called only if the mask includes [`TraceMask::RULE`].
    fn arm(&mut self, _arena: &Arena, _rule: Offset, _arm: Arm) {}

    /// Called when a step fails. The arena, instruction pointer and accumulator are unchanged.
    ///
    /// Called only if the mask includes [`TraceMask::FAULT`].
    fn fault(&mut self, _arena: &Arena, _pos: Offset, _fault: &Fault) {}

    /// Called when [`Runtime::exec_traced`] returns.
    ///
    /// Called only if the mask includes [`TraceMask::RUN`].
    fn run_end(&mut self, _arena: &Arena, _outcome: TraceOutcome<'_>) {}
}
