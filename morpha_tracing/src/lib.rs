// Copyright 2026 the Morpha Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `tracing` adapter for `morpha`.
//!
//! [`TracingSink`] implements [`TraceSink`] and forwards every runtime event to the `tracing`
//! ecosystem as a structured event, which turns a run into an audit log:
//!
//! | event | level | fields |
//! |---|---|---|
//! | run start / end | `INFO` | `pos`, `cursor`, `ret` or `fault` |
//! | step | `TRACE` | `pos`, `next`, `opcode`, `cursor` |
//! | rule condition | `TRACE` | `rule`, `index`, `value` |
//! | rule arm | `DEBUG` | `rule`, `arm` |
//! | fault | `WARN` | `pos`, `kind`, `payload`, `fault` |
//!
//! All events use the `morpha` target, so `RUST_LOG=morpha=trace` shows everything.

use morpha::arena::{Arena, Offset, Word};
use morpha::opcode::Opcode;
use morpha::rule::Arm;
use morpha::status::Fault;
use morpha::trace::{TraceMask, TraceOutcome, TraceSink};
use tracing::{debug, info, trace, warn};

/// A [`TraceSink`] that emits `tracing` events.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TracingSink {
    mask: TraceMask,
}

impl Default for TracingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl TracingSink {
    /// A sink that requests every event.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_mask(TraceMask::ALL)
    }

    /// A sink that requests only the events in `mask`.
    #[must_use]
    pub const fn with_mask(mask: TraceMask) -> Self {
        Self { mask }
    }
}

impl TraceSink for TracingSink {
    fn mask(&self) -> TraceMask {
        self.mask
    }

    fn run_start(&mut self, arena: &Arena, pos: Offset) {
        info!(
            target: "morpha",
            pos,
            cursor = arena.cursor(),
            capacity = arena.capacity(),
            "run start"
        );
    }

    fn step(&mut self, arena: &Arena, pos: Offset, next: Offset, opcode: Opcode) {
        trace!(
            target: "morpha",
            pos,
            next,
            opcode = opcode.mnemonic(),
            cursor = arena.cursor(),
            "step"
        );
    }

    fn condition(&mut self, _arena: &Arena, rule: Offset, index: usize, value: Word) {
        trace!(target: "morpha", rule, index, value, "condition");
    }

    fn arm(&mut self, _arena: &Arena, rule: Offset, arm: Arm) {
        debug!(target: "morpha", rule, arm = %arm, "arm selected");
    }

    fn fault(&mut self, _arena: &Arena, pos: Offset, fault: &Fault) {
        warn!(
            target: "morpha",
            pos,
            kind = %fault.kind(),
            payload = fault.payload(),
            fault = %fault,
            "step fault"
        );
    }

    fn run_end(&mut self, arena: &Arena, outcome: TraceOutcome<'_>) {
        match outcome {
            TraceOutcome::Halt(ret) => {
                info!(
                    target: "morpha",
                    ret,
                    value = ?arena.get(ret),
                    cursor = arena.cursor(),
                    "run halted"
                );
            }
            TraceOutcome::Fault(fault) => {
                info!(
                    target: "morpha",
                    kind = %fault.kind(),
                    payload = fault.payload(),
                    cursor = arena.cursor(),
                    "run stopped"
                );
            }
        }
    }
}
