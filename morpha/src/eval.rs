// Copyright 2026 the Morpha Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Morph execution and rule evaluation.
//!
//! Execution never writes to the arena directly. Result cells are collected in a [`Stage`] and
//! the caller commits them with a single [`Arena::append`], so a step that runs out of space
//! leaves no trace.

use alloc::vec::Vec;

use crate::arena::{Arena, Offset, Word, word_to_offset};
use crate::morph::{MorphView, Operand};
use crate::opcode::Op;
use crate::rule::{Arm, RuleView};
use crate::status::{Fault, TotalityReason};
use crate::trace::{TraceMask, TraceSink};

/// What executing a single morph produced.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// `add`, `sub` or `cmp` appended a result cell.
    Value {
        /// Offset of the result cell.
        at: Offset,
        /// The word stored there.
        word: Word,
    },
    /// `jmp` selected its target.
    Jump {
        /// The entity to continue at.
        target: Offset,
    },
    /// `offset` read an existing word.
    Load {
        /// The offset that was read.
        at: Offset,
        /// The word stored there.
        word: Word,
    },
}

impl Outcome {
    /// The OK payload: the result offset for arithmetic, the target for `jmp`, and the loaded
    /// word for `offset`.
    #[must_use]
    pub fn payload(&self) -> Word {
        match self {
            Self::Value { at, .. } => *at as Word,
            Self::Jump { target } => *target as Word,
            Self::Load { word, .. } => *word,
        }
    }

    /// The produced or loaded word, if any.
    #[must_use]
    pub fn word(&self) -> Option<Word> {
        match self {
            Self::Value { word, .. } | Self::Load { word, .. } => Some(*word),
            Self::Jump { .. } => None,
        }
    }

    /// Where the accumulator points after this outcome, if it moves.
    #[must_use]
    pub fn location(&self) -> Option<Offset> {
        match self {
            Self::Value { at, .. } | Self::Load { at, .. } => Some(*at),
            Self::Jump { .. } => None,
        }
    }
}

/// The result of evaluating one rule.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Choice {
    /// The arm whose action ran.
    pub arm: Arm,
    /// What the action produced.
    pub outcome: Outcome,
    /// How many conditions were executed before the choice was made.
    pub conditions_evaluated: usize,
}

/// A rule event held back until the step that produced it commits.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum RuleEvent {
    Condition {
        rule: Offset,
        index: usize,
        value: Word,
    },
    Arm {
        rule: Offset,
        arm: Arm,
    },
}

impl RuleEvent {
    pub(crate) fn report(self, arena: &Arena, trace: &mut dyn TraceSink) {
        match self {
            Self::Condition { rule, index, value } => trace.condition(arena, rule, index, value),
            Self::Arm { rule, arm } => trace.arm(arena, rule, arm),
        }
    }
}

/// Pending writes for one step, over a read-only view of the committed arena.
pub(crate) struct Stage<'a> {
    arena: &'a Arena,
    acc: Option<Offset>,
    staged: Vec<Word>,
    events: Vec<RuleEvent>,
}

impl<'a> Stage<'a> {
    pub(crate) fn new(arena: &'a Arena, acc: Option<Offset>) -> Self {
        Self {
            arena,
            acc,
            staged: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Stages `w` and returns the offset it will have once committed.
    pub(crate) fn push(&mut self, w: Word) -> Offset {
        let at = self.arena.cursor() + self.staged.len();
        self.staged.push(w);
        at
    }

    pub(crate) fn into_words(self) -> Vec<Word> {
        self.staged
    }

    /// The staged words and the rule events to report once they are committed.
    pub(crate) fn into_parts(self) -> (Vec<Word>, Vec<RuleEvent>) {
        (self.staged, self.events)
    }

    /// Resolves `operand` for the morph at `at`.
    fn resolve(&self, at: Offset, operand: Operand) -> Result<Word, Fault> {
        match operand {
            Operand::Lit(w) => Ok(w),
            Operand::Ref(p) => self.arena.read(p),
            Operand::Acc => {
                let acc = self
                    .acc
                    .ok_or(Fault::totality(at, TotalityReason::UnboundAccumulator))?;
                self.arena.read(acc)
            }
        }
    }

    pub(crate) fn execute(&mut self, morph: &MorphView) -> Result<Outcome, Fault> {
        let at = morph.at();
        let operands = morph.operands();
        match morph.op() {
            op @ (Op::Add | Op::Sub | Op::Cmp) => {
                let a = self.resolve(at, operands[0])?;
                let b = self.resolve(at, operands[1])?;
                let word = match op {
                    Op::Add => a.wrapping_add(b),
                    Op::Sub => a.wrapping_sub(b),
                    _ => Word::from((a as i64) > (b as i64)),
                };
                let at = self.push(word);
                Ok(Outcome::Value { at, word })
            }
            Op::Jmp => match operands[0] {
                Operand::Lit(target) => Ok(Outcome::Jump {
                    target: word_to_offset(target),
                }),
                _ => Err(Fault::totality(at, TotalityReason::DynamicJump)),
            },
            Op::Offset => {
                let target = word_to_offset(self.resolve(at, operands[0])?);
                let word = self.arena.read(target)?;
                Ok(Outcome::Load { at: target, word })
            }
        }
    }

    /// Runs conditions left to right until one holds, then runs exactly one action.
    ///
    /// With [`TraceMask::RULE`] set, condition and arm events are recorded in the stage rather
    /// than reported, so a step that fails to commit leaves no audit trail.
    pub(crate) fn evaluate(
        &mut self,
        rule: &RuleView,
        trace_mask: TraceMask,
    ) -> Result<Choice, Fault> {
        let record = trace_mask.contains(TraceMask::RULE);
        let mut selected = None;
        let mut conditions_evaluated = 0;
        for (index, (condition, action)) in rule.arms().iter().enumerate() {
            if condition.op() == Op::Jmp {
                return Err(Fault::totality(
                    condition.at(),
                    TotalityReason::JumpInCondition,
                ));
            }
            let value = self.execute(condition)?.word().unwrap_or(0);
            conditions_evaluated += 1;
            if record {
                self.events.push(RuleEvent::Condition {
                    rule: rule.at(),
                    index,
                    value,
                });
            }
            if value != 0 {
                selected = Some((Arm::Condition(index), action));
                break;
            }
        }
        let (arm, action) = selected.unwrap_or((Arm::Default, rule.default_action()));
        if record {
            self.events.push(RuleEvent::Arm {
                rule: rule.at(),
                arm,
            });
        }

        let outcome = self.execute(action)?;
        Ok(Choice {
            arm,
            outcome,
            conditions_evaluated,
        })
    }
}
