// Copyright 2026 the Morpha Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A small runnable `morpha` host.
//!
//! Shows:
//! - Building a loop out of morphs, a rule and a halt
//! - The grow-and-retry protocol: start with a store that is too small and rebind on MEM_LOW
//! - Run auditing through `morpha_tracing` (try `RUST_LOG=morpha=trace`)
//! - The disassembly of the finished arena
//!
//! Run with:
//! `cargo run -p morpha_examples --bin countdown -- [N] [INITIAL_CAPACITY]`

use anyhow::{Context, Result, bail};
use morpha::disasm::disassemble;
use morpha::morph::{Morph, Operand};
use morpha::rule::Rule;
use morpha::runtime::Runtime;
use morpha::status::{Fault, Status};
use morpha::trace::TraceSink;
use morpha_tracing::TracingSink;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Encodes `acc = n; loop { acc -= 1; if acc > 0 continue }; halt acc`, growing the store
/// whenever a definition does not fit.
fn build(rt: &mut Runtime, n: u64) -> Result<()> {
    let cell = retry(rt, |rt| rt.alloc(&[n]))?;
    let counter = cell.operand(0).context("allocated cell has no member")?;
    let start = retry(rt, |rt| {
        rt.encode_morph(&Morph::add(counter, Operand::Lit(0)))
    })?;
    let body = retry(rt, |rt| {
        rt.encode_morph(&Morph::sub(Operand::Acc, Operand::Lit(1)))
    })?;
    let rule = Rule::otherwise(Morph::add(Operand::Acc, Operand::Lit(0)))
        .when(Morph::cmp(Operand::Acc, Operand::Lit(0)), Morph::jmp(body));
    retry(rt, |rt| rt.encode_rule(&rule))?;
    retry(rt, |rt| rt.encode_halt(Operand::Acc))?;
    rt.set_pos(start);
    Ok(())
}

/// Reissues `f` after each MEM_LOW, doubling the store until it fits.
fn retry<T>(rt: &mut Runtime, mut f: impl FnMut(&mut Runtime) -> Result<T, Fault>) -> Result<T> {
    loop {
        match f(rt) {
            Ok(v) => return Ok(v),
            Err(Fault::MemLow { needed }) => grow(rt, needed)?,
            Err(fault) => bail!("definition rejected: {fault}"),
        }
    }
}

fn grow(rt: &mut Runtime, needed: usize) -> Result<()> {
    let capacity = rt.arena().capacity();
    let new_capacity = capacity
        .checked_mul(2)
        .map(|doubled| doubled.max(capacity + needed))
        .context("backing store size overflows")?;
    warn!(capacity, needed, new_capacity, "MEM_LOW; growing store");
    if rt.rebind(vec![0; new_capacity]).is_err() {
        bail!("store of {new_capacity} words was not larger than {capacity}");
    }
    Ok(())
}

fn parse_arg<T: core::str::FromStr>(arg: Option<String>, default: T, name: &str) -> Result<T>
where
    T::Err: core::error::Error + Send + Sync + 'static,
{
    match arg {
        Some(s) => s
            .parse()
            .with_context(|| format!("invalid {name}: {s:?}")),
        None => Ok(default),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "countdown=info,morpha=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let n: u64 = parse_arg(args.next(), 5, "N")?;
    let initial: usize = parse_arg(args.next(), 8, "INITIAL_CAPACITY")?;
    if args.next().is_some() {
        bail!("usage: countdown [N] [INITIAL_CAPACITY]");
    }

    let mut rt =
        Runtime::from_store(vec![0; initial]).context("initial capacity must be non-zero")?;
    build(&mut rt, n)?;
    info!(
        cursor = rt.arena().cursor(),
        capacity = rt.arena().capacity(),
        "composition encoded"
    );

    let mut sink = TracingSink::new();
    let ret = loop {
        match rt.exec_traced(sink.mask(), Some(&mut sink)) {
            Ok(ret) => break ret,
            Err(Fault::MemLow { needed }) => grow(&mut rt, needed)?,
            Err(fault) => bail!("run failed: {fault}"),
        }
    };

    let value = rt
        .arena()
        .get(ret)
        .context("halt returned an unallocated offset")?;
    info!(status = %Status::Halt(ret), value, "done");

    print!("{}", disassemble(&rt));
    println!("result: {} at {ret:04}", value as i64);
    Ok(())
}
