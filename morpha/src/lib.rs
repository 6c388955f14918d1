// Copyright 2026 the Morpha Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `morpha`: a total, arena-addressed rewrite-system runtime.
//!
//! Compositions are built from *morphs* (fixed-arity operations) and *rules* (ordered
//! condition/action arms with a mandatory default), encoded as words in one fixed-capacity,
//! append-only [`arena::Arena`] and addressed by offset. Every definition is checked when it is
//! encoded, and every accepted composition either halts or reports that it needs more memory.
//!
//! ## Example
//!
//! Count a value down to zero:
//!
//! ```
//! use morpha::morph::{Morph, Operand};
//! use morpha::rule::Rule;
//! use morpha::runtime::{Config, Runtime};
//!
//! let mut rt = Runtime::new(Config::default());
//! let n = rt.alloc(&[3])?;
//!
//! // acc = n + 0
//! let start = rt.encode_morph(&Morph::add(n.operand(0).unwrap(), Operand::Lit(0)))?;
//! // acc = acc - 1
//! let body = rt.encode_morph(&Morph::sub(Operand::Acc, Operand::Lit(1)))?;
//! // if acc > 0 { goto body } else { acc = acc + 0 }
//! rt.encode_rule(
//!     &Rule::otherwise(Morph::add(Operand::Acc, Operand::Lit(0)))
//!         .when(Morph::cmp(Operand::Acc, Operand::Lit(0)), Morph::jmp(body)),
//! )?;
//! rt.encode_halt(Operand::Acc)?;
//!
//! rt.set_pos(start);
//! let ret = rt.exec()?;
//! assert_eq!(rt.arena().get(ret), Some(0));
//! # Ok::<(), morpha::status::Fault>(())
//! ```

#![no_std]

extern crate alloc;

pub mod arena;
pub(crate) mod bitset;
pub mod cell;
pub(crate) mod codec;
pub mod disasm;
pub mod eval;
pub mod morph;
pub mod opcode;
pub mod rule;
pub mod runtime;
pub mod status;
pub mod trace;
pub(crate) mod verify;
