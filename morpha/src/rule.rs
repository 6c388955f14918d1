// Copyright 2026 the Morpha Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rules: ordered condition/action arms with a mandatory default.
//!
//! A rule is encoded as one contiguous run of inline morphs:
//!
//! ```text
//! [header(n), cond_1, act_1, .., cond_n, act_n, default]
//! ```
//!
//! The arm count lives in the header, so the trailing morph is always the default.

use alloc::vec::Vec;
use core::fmt;

use crate::arena::{Arena, Offset, Word};
use crate::codec::{self, Header};
use crate::morph::{Morph, MorphView};
use crate::opcode::Opcode;
use crate::status::{Fault, TotalityReason};

/// A rule definition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rule {
    conditions: Vec<Morph>,
    actions: Vec<Morph>,
    default: Morph,
}

impl Rule {
    /// Creates a rule from parallel condition and action sequences plus a default.
    ///
    /// The lengths are checked when the rule is encoded.
    #[must_use]
    pub fn new(conditions: Vec<Morph>, actions: Vec<Morph>, default: Morph) -> Self {
        Self {
            conditions,
            actions,
            default,
        }
    }

    /// Starts a rule with no arms and the given default.
    #[must_use]
    pub fn otherwise(default: Morph) -> Self {
        Self::new(Vec::new(), Vec::new(), default)
    }

    /// Appends an arm that runs `action` when `condition` yields a non-zero word.
    #[must_use]
    pub fn when(mut self, condition: Morph, action: Morph) -> Self {
        self.conditions.push(condition);
        self.actions.push(action);
        self
    }

    /// The condition morphs, in evaluation order.
    #[must_use]
    pub fn conditions(&self) -> &[Morph] {
        &self.conditions
    }

    /// The action morphs, paired by index with [`Rule::conditions`].
    #[must_use]
    pub fn actions(&self) -> &[Morph] {
        &self.actions
    }

    /// The action run when no condition holds.
    #[must_use]
    pub fn default_action(&self) -> &Morph {
        &self.default
    }

    /// Checks that conditions and actions pair up, reporting `at` on failure.
    pub(crate) fn check_shape(&self, at: Offset) -> Result<u32, Fault> {
        let shape = TotalityReason::RuleShape {
            conditions: self.conditions.len(),
            actions: self.actions.len(),
        };
        if self.conditions.len() != self.actions.len() {
            return Err(Fault::totality(at, shape));
        }
        u32::try_from(self.conditions.len()).map_err(|_| Fault::totality(at, shape))
    }

    /// Every inline morph in encoding order.
    pub(crate) fn morphs(&self) -> impl Iterator<Item = &Morph> {
        self.conditions
            .iter()
            .zip(&self.actions)
            .flat_map(|(c, a)| [c, a])
            .chain(core::iter::once(&self.default))
    }

    /// Serializes the rule. Shape and arities must already be checked.
    pub(crate) fn encode(&self, arms: u32) -> Vec<Word> {
        let len = 1 + self.morphs().map(Morph::encoded_len).sum::<usize>();
        let mut out = Vec::with_capacity(len);
        out.push(codec::encode_header(Opcode::Rule, &[], arms));
        for m in self.morphs() {
            m.encode_into(&mut out);
        }
        out
    }
}

/// Which action a rule evaluation selected.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Arm {
    /// The action paired with condition `i` (zero-based).
    Condition(usize),
    /// The default action.
    Default,
}

impl fmt::Display for Arm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Condition(i) => write!(f, "arm {i}"),
            Self::Default => write!(f, "default"),
        }
    }
}

/// A rule decoded from the arena.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleView {
    at: Offset,
    arms: Vec<(MorphView, MorphView)>,
    default: MorphView,
}

impl RuleView {
    /// Decodes the rule whose header is at `at`.
    pub(crate) fn decode(arena: &Arena, at: Offset) -> Result<Self, Fault> {
        let header = codec::read_header(arena, at)?;
        Self::from_header(arena, at, &header)
    }

    pub(crate) fn from_header(arena: &Arena, at: Offset, header: &Header) -> Result<Self, Fault> {
        if header.opcode != Opcode::Rule {
            return Err(Fault::totality(at, TotalityReason::UnknownOperator));
        }
        let mut arms = Vec::new();
        let mut next = at + 1;
        for _ in 0..header.arms {
            let condition = MorphView::decode(arena, next)?;
            let action = MorphView::decode(arena, condition.end())?;
            next = action.end();
            arms.push((condition, action));
        }
        let default = MorphView::decode(arena, next)?;
        Ok(Self { at, arms, default })
    }

    /// Offset of the header word.
    #[must_use]
    pub fn at(&self) -> Offset {
        self.at
    }

    /// The condition/action pairs in evaluation order.
    #[must_use]
    pub fn arms(&self) -> &[(MorphView, MorphView)] {
        &self.arms
    }

    /// The default action.
    #[must_use]
    pub fn default_action(&self) -> &MorphView {
        &self.default
    }

    /// The action selected by `arm`.
    #[must_use]
    pub fn action(&self, arm: Arm) -> Option<&MorphView> {
        match arm {
            Arm::Condition(i) => self.arms.get(i).map(|(_, a)| a),
            Arm::Default => Some(&self.default),
        }
    }

    /// Number of words the rule occupies, header included.
    #[must_use]
    pub fn width(&self) -> usize {
        self.default.end() - self.at
    }
}
