// Copyright 2026 the Morpha Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The runtime: an arena plus the evaluator state that walks it.
//!
//! A [`Runtime`] owns everything a composition needs: the [`Arena`], the set of offsets where
//! top-level entities begin, the instruction pointer and the accumulator. There is no shared
//! or global state, so independent runtimes never interact.
//!
//! ## Termination
//!
//! Definitions are checked against the arena before they are appended, so a `jmp` can only
//! name an entity that already exists and every jump goes backward. Taking a jump appends a
//! one-word continuation record. Between two jumps execution only moves forward, and the number
//! of jumps is bounded by the free space, so [`Runtime::exec`] always ends in a halt or a
//! [`Fault::MemLow`].

use alloc::vec::Vec;
use core::num::NonZeroUsize;

use crate::arena::{Arena, ArenaError, Offset, Word};
use crate::bitset::BitSet;
use crate::cell::Cell;
use crate::codec::{self, Entity};
use crate::eval::{Choice, Outcome, Stage};
use crate::morph::{Morph, MorphView, Operand};
use crate::opcode::Opcode;
use crate::rule::{Rule, RuleView};
use crate::status::{Fault, Flow, TotalityReason};
use crate::trace::{TraceMask, TraceOutcome, TraceSink};
use crate::verify::{Role, Scope};

/// The bootstrap default block size, in words.
pub const DEFAULT_BLOCK: usize = 0x200;

const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(DEFAULT_BLOCK) {
    Some(n) => n,
    None => panic!("DEFAULT_BLOCK must be non-zero"),
};

/// Runtime construction options.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Capacity of the freshly allocated backing store, in words.
    pub capacity: NonZeroUsize,
}

impl Config {
    /// A config with the given capacity.
    #[must_use]
    pub const fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self { capacity }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

/// An arena together with its evaluator state.
#[derive(Clone, Debug)]
pub struct Runtime {
    arena: Arena,
    entities: BitSet,
    pos: Offset,
    acc: Option<Offset>,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Runtime {
    /// Creates a runtime over a zeroed store of `config.capacity` words.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self::with_arena(Arena::with_capacity(config.capacity))
    }

    /// Creates a runtime over a caller-supplied backing store.
    ///
    /// The capacity is `store.len()`; the store's current contents are treated as free space.
    pub fn from_store(store: Vec<Word>) -> Result<Self, ArenaError> {
        Arena::new(store).map(Self::with_arena)
    }

    fn with_arena(arena: Arena) -> Self {
        Self {
            entities: BitSet::new_empty(arena.capacity()),
            arena,
            pos: 0,
            acc: None,
        }
    }

    /// The arena.
    #[must_use]
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// The instruction pointer.
    #[must_use]
    pub fn pos(&self) -> Offset {
        self.pos
    }

    /// Sets the instruction pointer. It is validated when the next step decodes it.
    pub fn set_pos(&mut self, pos: Offset) {
        self.pos = pos;
    }

    /// The location of the most recent action result, if any.
    #[must_use]
    pub fn acc(&self) -> Option<Offset> {
        self.acc
    }

    /// Returns `true` if a top-level morph, rule or halt was encoded at `at`.
    #[must_use]
    pub fn is_entity(&self, at: Offset) -> bool {
        at < self.arena.cursor() && self.entities.get(at)
    }

    /// Offsets of every top-level entity, ascending.
    pub fn entities(&self) -> impl Iterator<Item = Offset> + '_ {
        self.entities.iter_ones()
    }

    /// Moves everything into a larger backing store after a [`Fault::MemLow`].
    ///
    /// A store that is not strictly larger than the current capacity is handed back.
    pub fn rebind(&mut self, store: Vec<Word>) -> Result<(), Vec<Word>> {
        self.arena.rebind(store)?;
        self.entities.grow(self.arena.capacity());
        Ok(())
    }

    /// Releases the backing store.
    #[must_use]
    pub fn into_store(self) -> Vec<Word> {
        self.arena.into_store()
    }

    fn scope(&self) -> Scope<'_> {
        Scope::new(&self.arena, &self.entities)
    }

    fn append_entity(&mut self, words: &[Word]) -> Result<Offset, Fault> {
        let at = self.arena.append(words)?;
        self.entities.set(at);
        Ok(at)
    }

    /// Appends data words and describes them as a cell.
    pub fn alloc(&mut self, words: &[Word]) -> Result<Cell, Fault> {
        let first = self.arena.append(words)?;
        Ok(Cell::contiguous(first, words.len()))
    }

    /// Checks that every member of `cell` is allocated.
    pub fn check_cell(&self, cell: &Cell) -> Result<(), Fault> {
        self.scope().check_cell(cell)
    }

    /// Encodes a top-level morph and returns its offset.
    ///
    /// Faults with [`TotalityReason::ArityMismatch`] (payload: the cursor) if the operand count
    /// is wrong. References must name allocated words and a `jmp` must name an existing entity.
    /// Nothing is appended on failure.
    pub fn encode_morph(&mut self, morph: &Morph) -> Result<Offset, Fault> {
        self.scope().check_morph(morph, Role::Standalone)?;
        let mut words = Vec::with_capacity(morph.encoded_len());
        morph.encode_into(&mut words);
        self.append_entity(&words)
    }

    /// Encodes a rule in one atomic append and returns its offset.
    ///
    /// Faults with [`TotalityReason::RuleShape`] (payload: the cursor) if conditions and actions
    /// differ in length. Every inline morph is checked as in [`Runtime::encode_morph`], and a
    /// `jmp` may not be a condition.
    pub fn encode_rule(&mut self, rule: &Rule) -> Result<Offset, Fault> {
        let scope = self.scope();
        let arms = rule.check_shape(self.arena.cursor())?;
        for c in rule.conditions() {
            scope.check_morph(c, Role::Condition)?;
        }
        for a in rule.actions().iter().chain([rule.default_action()]) {
            scope.check_morph(a, Role::Action)?;
        }
        let words = rule.encode(arms);
        self.append_entity(&words)
    }

    /// Encodes the terminal marker of a composition.
    ///
    /// `operand` names the return location: `@p` returns `p`, `acc` returns the accumulator.
    pub fn encode_halt(&mut self, operand: Operand) -> Result<Offset, Fault> {
        self.scope().check_halt(operand)?;
        let header = codec::encode_header(Opcode::Halt, &[operand.mode()], 0);
        self.append_entity(&[header, operand.word()])
    }

    fn entity_at(&self, at: Offset) -> Result<(), Fault> {
        if at >= self.arena.cursor() {
            return Err(Fault::totality(at, TotalityReason::Unresolved));
        }
        if !self.entities.get(at) {
            return Err(Fault::totality(at, TotalityReason::NotAnEntity));
        }
        Ok(())
    }

    /// Executes the morph at `at` once and commits its result cell.
    ///
    /// The instruction pointer and accumulator are not touched, and a `jmp` only reports its
    /// target.
    pub fn execute(&mut self, at: Offset) -> Result<Outcome, Fault> {
        self.entity_at(at)?;
        let morph = MorphView::decode(&self.arena, at)?;
        let mut stage = Stage::new(&self.arena, self.acc);
        let outcome = stage.execute(&morph)?;
        let words = stage.into_words();
        self.arena.append(&words)?;
        Ok(outcome)
    }

    /// Evaluates the rule at `at` once and commits every result cell it produced.
    ///
    /// The instruction pointer and accumulator are not touched.
    pub fn evaluate(&mut self, at: Offset) -> Result<Choice, Fault> {
        self.entity_at(at)?;
        let rule = RuleView::decode(&self.arena, at)?;
        let mut stage = Stage::new(&self.arena, self.acc);
        let choice = stage.evaluate(&rule, TraceMask::NONE)?;
        let words = stage.into_words();
        self.arena.append(&words)?;
        Ok(choice)
    }

    /// Executes the entity at the instruction pointer.
    ///
    /// Returns [`Flow::Continue`] with the new instruction pointer, or [`Flow::Halt`] with the
    /// return offset when the pointer is on a halt (the pointer stays there). Falling through
    /// skips data words up to the next entity. With no entity at or after the pointer the
    /// composition has ended and the step halts on the accumulator, or on the pointer itself
    /// if nothing was ever produced. On any fault the arena, instruction pointer and
    /// accumulator are unchanged.
    pub fn step(&mut self) -> Result<Flow, Fault> {
        self.step_traced(TraceMask::NONE, None)
    }

    /// Like [`Runtime::step`], reporting events in `trace_mask` to `trace`.
    pub fn step_traced(
        &mut self,
        trace_mask: TraceMask,
        mut trace: Option<&mut dyn TraceSink>,
    ) -> Result<Flow, Fault> {
        self.step_body(trace_mask, &mut trace)
    }

    fn step_body(
        &mut self,
        trace_mask: TraceMask,
        trace: &mut Option<&mut dyn TraceSink>,
    ) -> Result<Flow, Fault> {
        let pos = self.pos;
        match self.step_inner(trace_mask, trace) {
            Ok((Flow::Continue(next), opcode)) => {
                if trace_mask.contains(TraceMask::STEP)
                    && let Some(t) = trace.as_mut()
                {
                    let t: &mut dyn TraceSink = &mut **t;
                    t.step(&self.arena, pos, next, opcode);
                }
                Ok(Flow::Continue(next))
            }
            Ok((flow, _)) => Ok(flow),
            Err(fault) => {
                if trace_mask.contains(TraceMask::FAULT)
                    && let Some(t) = trace.as_mut()
                {
                    let t: &mut dyn TraceSink = &mut **t;
                    t.fault(&self.arena, pos, &fault);
                }
                Err(fault)
            }
        }
    }

    fn step_inner(
        &mut self,
        trace_mask: TraceMask,
        trace: &mut Option<&mut dyn TraceSink>,
    ) -> Result<(Flow, Opcode), Fault> {
        let pos = self.pos;
        if self.entities.next_one(pos).is_none() {
            // Past the last entity: the composition ends without an explicit halt.
            return Ok((Flow::Halt(self.acc.unwrap_or(pos)), Opcode::Halt));
        }
        self.entity_at(pos)?;
        let entity = Entity::decode(&self.arena, pos)?;

        let mut stage = Stage::new(&self.arena, self.acc);
        let outcome = match &entity {
            Entity::Halt { operand, .. } => {
                let ret = match *operand {
                    Operand::Ref(p) => p,
                    Operand::Acc => self
                        .acc
                        .ok_or(Fault::totality(pos, TotalityReason::UnboundAccumulator))?,
                    Operand::Lit(_) => {
                        return Err(Fault::totality(pos, TotalityReason::LiteralReturn));
                    }
                };
                return Ok((Flow::Halt(ret), Opcode::Halt));
            }
            Entity::Morph(morph) => stage.execute(morph)?,
            Entity::Rule(rule) => stage.evaluate(rule, trace_mask)?.outcome,
        };

        let next = match outcome {
            Outcome::Jump { target } => {
                // Continuation record: every backward edge costs one word.
                stage.push(pos as Word);
                target
            }
            Outcome::Value { .. } | Outcome::Load { .. } => {
                let end = pos + entity.width();
                self.entities.next_one(end).unwrap_or(end)
            }
        };
        let (words, events) = stage.into_parts();
        self.arena.append(&words)?;

        if let Some(t) = trace.as_mut() {
            let t: &mut dyn TraceSink = &mut **t;
            for event in events {
                event.report(&self.arena, t);
            }
        }
        if let Some(at) = outcome.location() {
            self.acc = Some(at);
        }
        self.pos = next;
        Ok((Flow::Continue(next), entity.opcode()))
    }

    /// Steps until the composition halts or a step faults.
    ///
    /// Returns the halt's return offset. A [`Fault::MemLow`] can be retried after
    /// [`Runtime::rebind`]: the failed step left everything as it was.
    pub fn exec(&mut self) -> Result<Offset, Fault> {
        self.exec_traced(TraceMask::NONE, None)
    }

    /// Like [`Runtime::exec`], reporting events in `trace_mask` to `trace`.
    pub fn exec_traced(
        &mut self,
        trace_mask: TraceMask,
        mut trace: Option<&mut dyn TraceSink>,
    ) -> Result<Offset, Fault> {
        if trace_mask.contains(TraceMask::RUN)
            && let Some(t) = trace.as_mut()
        {
            let t: &mut dyn TraceSink = &mut **t;
            t.run_start(&self.arena, self.pos);
        }

        let result = loop {
            match self.step_body(trace_mask, &mut trace) {
                Ok(Flow::Continue(_)) => {}
                Ok(Flow::Halt(ret)) => break Ok(ret),
                Err(fault) => break Err(fault),
            }
        };

        if trace_mask.contains(TraceMask::RUN)
            && let Some(t) = trace.as_mut()
        {
            let outcome = match &result {
                Ok(ret) => TraceOutcome::Halt(*ret),
                Err(fault) => TraceOutcome::Fault(fault),
            };
            let t: &mut dyn TraceSink = &mut **t;
            t.run_end(&self.arena, outcome);
        }

        result
    }
}
