// Copyright 2026 the Morpha Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![allow(missing_docs, reason = "integration test crate")]

use morpha::arena::{Arena, ArenaError, Offset, Word};
use morpha::cell::Cell;
use morpha::disasm::{Entry, disassemble};
use morpha::eval::Outcome;
use morpha::morph::{Morph, Operand};
use morpha::opcode::{Op, Opcode};
use morpha::rule::{Arm, Rule};
use morpha::runtime::{Config, DEFAULT_BLOCK, Runtime};
use morpha::status::{Fault, Flow, Kind, Status, TotalityReason};
use morpha::trace::{TraceMask, TraceOutcome, TraceSink};

fn runtime(capacity: usize) -> Runtime {
    Runtime::from_store(vec![0; capacity]).unwrap()
}

#[derive(Default)]
struct Recorder {
    steps: Vec<(Offset, Offset, Opcode)>,
    conditions: Vec<(Offset, usize, Word)>,
    arms: Vec<(Offset, Arm)>,
    faults: Vec<(Offset, Fault)>,
    runs: usize,
    halted: Option<Offset>,
}

impl TraceSink for Recorder {
    fn mask(&self) -> TraceMask {
        TraceMask::ALL
    }

    fn run_start(&mut self, _arena: &Arena, _pos: Offset) {
        self.runs += 1;
    }

    fn step(&mut self, _arena: &Arena, pos: Offset, next: Offset, opcode: Opcode) {
        self.steps.push((pos, next, opcode));
    }

    fn condition(&mut self, _arena: &Arena, rule: Offset, index: usize, value: Word) {
        self.conditions.push((rule, index, value));
    }

    fn arm(&mut self, _arena: &Arena, rule: Offset, arm: Arm) {
        self.arms.push((rule, arm));
    }

    fn fault(&mut self, _arena: &Arena, pos: Offset, fault: &Fault) {
        self.faults.push((pos, *fault));
    }

    fn run_end(&mut self, _arena: &Arena, outcome: TraceOutcome<'_>) {
        if let TraceOutcome::Halt(ret) = outcome {
            self.halted = Some(ret);
        }
    }
}

/// `acc = n; loop { acc -= 1; if acc > 0 continue }; halt acc`
struct Countdown {
    rt: Runtime,
    start: Offset,
    body: Offset,
    rule: Offset,
    halt: Offset,
}

fn countdown(n: u64, capacity: usize) -> Countdown {
    let mut rt = runtime(capacity);
    let cell = rt.alloc(&[n]).unwrap();
    let start = rt
        .encode_morph(&Morph::add(cell.operand(0).unwrap(), Operand::Lit(0)))
        .unwrap();
    let body = rt
        .encode_morph(&Morph::sub(Operand::Acc, Operand::Lit(1)))
        .unwrap();
    let rule = rt
        .encode_rule(
            &Rule::otherwise(Morph::add(Operand::Acc, Operand::Lit(0)))
                .when(Morph::cmp(Operand::Acc, Operand::Lit(0)), Morph::jmp(body)),
        )
        .unwrap();
    let halt = rt.encode_halt(Operand::Acc).unwrap();
    rt.set_pos(start);
    Countdown {
        rt,
        start,
        body,
        rule,
        halt,
    }
}

#[test]
fn initialize_binds_capacity_and_resets_cursor() {
    for capacity in [1, 3, 64, 4096] {
        let rt = runtime(capacity);
        assert_eq!(rt.arena().capacity(), capacity);
        assert_eq!(rt.arena().cursor(), 0);
    }
    assert!(matches!(
        Runtime::from_store(Vec::new()),
        Err(ArenaError::ZeroCapacity)
    ));
    assert_eq!(
        Runtime::new(Config::default()).arena().capacity(),
        DEFAULT_BLOCK
    );
}

#[test]
fn short_append_leaves_arena_identical() {
    let mut rt = runtime(5);
    rt.alloc(&[1, 2, 3]).unwrap();
    let before = rt.arena().clone();
    let err = rt.alloc(&[4, 5, 6, 7]).unwrap_err();
    assert_eq!(err, Fault::MemLow { needed: 2 });
    assert_eq!(Status::from(err), Status::MemLow(2));
    assert_eq!(rt.arena(), &before);
}

#[test]
fn wrong_arity_never_advances_the_cursor() {
    let mut rt = runtime(16);
    rt.alloc(&[9]).unwrap();
    let cases = [
        Morph::new(Op::Add, &[]),
        Morph::new(Op::Sub, &[Operand::Lit(1)]),
        Morph::new(Op::Cmp, &[Operand::Lit(1), Operand::Lit(2), Operand::Lit(3)]),
        Morph::new(Op::Jmp, &[]),
        Morph::new(Op::Offset, &[Operand::Ref(0), Operand::Ref(0)]),
    ];
    for morph in &cases {
        let err = rt.encode_morph(morph).unwrap_err();
        assert_eq!(err.kind(), Kind::TotalityFault, "{morph}");
        assert_eq!(err.payload(), 1);
        assert!(matches!(
            err,
            Fault::Totality {
                reason: TotalityReason::ArityMismatch { .. },
                ..
            }
        ));
        assert_eq!(rt.arena().cursor(), 1);
    }
}

#[test]
fn add_two_three_yields_five() {
    let mut rt = runtime(16);
    let add = rt
        .encode_morph(&Morph::add(Operand::Lit(2), Operand::Lit(3)))
        .unwrap();
    rt.set_pos(add);
    let flow = rt.step().unwrap();
    assert_eq!(flow, Flow::Continue(add + 3));
    let cell = rt.acc().unwrap();
    assert_eq!(rt.arena().get(cell), Some(5));
    assert_eq!(Status::from_step(Ok(flow)), Status::Ok((add + 3) as Word));
}

#[test]
fn execute_reports_each_operator() {
    let mut rt = runtime(32);
    let data = rt.alloc(&[7, 0]).unwrap();
    let add = rt
        .encode_morph(&Morph::over(Op::Add, &data))
        .unwrap();
    let sub = rt
        .encode_morph(&Morph::sub(Operand::Lit(2), Operand::Lit(5)))
        .unwrap();
    let cmp = rt
        .encode_morph(&Morph::cmp(Operand::Ref(0), Operand::lit_i64(-1)))
        .unwrap();
    let jmp = rt.encode_morph(&Morph::jmp(add)).unwrap();
    let load = rt.encode_morph(&Morph::offset(Operand::Lit(0))).unwrap();

    let cursor = rt.arena().cursor();
    assert_eq!(
        rt.execute(add),
        Ok(Outcome::Value {
            at: cursor,
            word: 7
        })
    );
    assert_eq!(rt.execute(sub).unwrap().word(), Some((-3_i64) as Word));
    assert_eq!(rt.execute(cmp).unwrap().word(), Some(1));
    assert_eq!(rt.execute(jmp), Ok(Outcome::Jump { target: add }));
    assert_eq!(rt.execute(load).unwrap().payload(), 7);
    // Three result cells; jmp and offset append nothing.
    assert_eq!(rt.arena().cursor(), cursor + 3);
}

#[test]
fn rule_picks_add_for_positive_and_default_for_negative() {
    for (a, arm, expected) in [(5_i64, Arm::Condition(0), 6_i64), (-5, Arm::Default, -6)] {
        let mut rt = runtime(32);
        rt.alloc(&[a as Word]).unwrap();
        let rule = rt
            .encode_rule(&Rule::new(
                vec![Morph::cmp(Operand::Ref(0), Operand::Lit(0))],
                vec![Morph::add(Operand::Ref(0), Operand::Lit(1))],
                Morph::sub(Operand::Ref(0), Operand::Lit(1)),
            ))
            .unwrap();
        let choice = rt.evaluate(rule).unwrap();
        assert_eq!(choice.arm, arm, "a = {a}");
        assert_eq!(choice.outcome.word(), Some(expected as Word), "a = {a}");
        assert_eq!(choice.conditions_evaluated, 1);
    }
}

#[test]
fn rule_stops_at_first_true_condition() {
    let mut rt = runtime(64);
    let rule = rt
        .encode_rule(
            &Rule::otherwise(Morph::add(Operand::Lit(0), Operand::Lit(0)))
                .when(
                    Morph::cmp(Operand::Lit(0), Operand::Lit(1)),
                    Morph::add(Operand::Lit(10), Operand::Lit(0)),
                )
                .when(
                    Morph::cmp(Operand::Lit(2), Operand::Lit(1)),
                    Morph::add(Operand::Lit(20), Operand::Lit(0)),
                )
                .when(
                    Morph::cmp(Operand::Lit(3), Operand::Lit(1)),
                    Morph::add(Operand::Lit(30), Operand::Lit(0)),
                ),
        )
        .unwrap();
    let halt = rt.encode_halt(Operand::Acc).unwrap();
    rt.set_pos(rule);

    let cursor = rt.arena().cursor();
    let mut rec = Recorder::default();
    let flow = rt.step_traced(rec.mask(), Some(&mut rec)).unwrap();
    assert_eq!(flow, Flow::Continue(halt));

    // Two condition cells plus one action cell: the third condition never ran.
    assert_eq!(rt.arena().cursor(), cursor + 3);
    assert_eq!(rec.conditions, vec![(rule, 0, 0), (rule, 1, 1)]);
    assert_eq!(rec.arms, vec![(rule, Arm::Condition(1))]);
    assert_eq!(rt.arena().get(rt.acc().unwrap()), Some(20));
}

#[test]
fn rule_with_no_true_condition_runs_default_once() {
    let mut rt = runtime(64);
    let rule = rt
        .encode_rule(
            &Rule::otherwise(Morph::add(Operand::Lit(99), Operand::Lit(0)))
                .when(
                    Morph::cmp(Operand::Lit(0), Operand::Lit(1)),
                    Morph::add(Operand::Lit(10), Operand::Lit(0)),
                )
                .when(
                    Morph::cmp(Operand::Lit(0), Operand::Lit(2)),
                    Morph::add(Operand::Lit(20), Operand::Lit(0)),
                ),
        )
        .unwrap();
    let cursor = rt.arena().cursor();
    let choice = rt.evaluate(rule).unwrap();
    assert_eq!(choice.arm, Arm::Default);
    assert_eq!(choice.conditions_evaluated, 2);
    assert_eq!(choice.outcome.word(), Some(99));
    assert_eq!(rt.arena().cursor(), cursor + 3);
}

#[test]
fn rule_shape_mismatch_is_rejected_at_the_cursor() {
    let mut rt = runtime(32);
    rt.alloc(&[0, 0]).unwrap();
    let err = rt
        .encode_rule(&Rule::new(
            vec![],
            vec![Morph::add(Operand::Lit(1), Operand::Lit(1))],
            Morph::add(Operand::Lit(1), Operand::Lit(1)),
        ))
        .unwrap_err();
    assert_eq!(Status::from(err), Status::TotalityFault(2));
    assert_eq!(rt.arena().cursor(), 2);
}

#[test]
fn countdown_loop_halts_with_zero() {
    let Countdown {
        mut rt,
        start,
        body,
        rule,
        halt,
    } = countdown(3, 128);
    let mut rec = Recorder::default();
    let ret = rt.exec_traced(rec.mask(), Some(&mut rec)).unwrap();

    assert_eq!(rt.arena().get(ret), Some(0));
    assert_eq!(rt.pos(), halt);
    assert_eq!(rec.runs, 1);
    assert_eq!(rec.halted, Some(ret));
    assert!(rec.faults.is_empty());

    let visited: Vec<Offset> = rec.steps.iter().map(|&(pos, _, _)| pos).collect();
    assert_eq!(
        visited,
        vec![start, body, rule, body, rule, body, rule]
    );
    let jumps = rec
        .steps
        .iter()
        .filter(|&&(pos, next, _)| pos == rule && next == body)
        .count();
    assert_eq!(jumps, 2);
    assert_eq!(
        rec.arms.iter().map(|&(_, arm)| arm).collect::<Vec<_>>(),
        vec![Arm::Condition(0), Arm::Condition(0), Arm::Default]
    );
}

#[test]
fn diverging_loop_ends_in_mem_low() {
    let mut rt = runtime(64);
    let top = rt
        .encode_morph(&Morph::add(Operand::Lit(1), Operand::Lit(1)))
        .unwrap();
    let back = rt.encode_morph(&Morph::jmp(top)).unwrap();
    rt.set_pos(top);

    let mut steps = 0_usize;
    let result = loop {
        match rt.step() {
            Ok(Flow::Continue(_)) => steps += 1,
            other => break other,
        }
        assert!(steps <= 1000, "loop did not terminate");
    };
    assert!(matches!(result, Err(Fault::MemLow { .. })));
    assert_eq!(rt.arena().remaining(), 0);
    assert!(rt.pos() == top || rt.pos() == back);

    // The same program under exec ends the same way.
    let mut rt2 = runtime(64);
    let top = rt2
        .encode_morph(&Morph::add(Operand::Lit(1), Operand::Lit(1)))
        .unwrap();
    rt2.encode_morph(&Morph::jmp(top)).unwrap();
    rt2.set_pos(top);
    assert_eq!(Status::from_exec(rt2.exec()).kind(), Kind::MemLow);
}

#[test]
fn mem_low_step_changes_nothing() {
    let mut c = countdown(3, 18);
    let before_arena = c.rt.arena().clone();
    let before_pos = c.rt.pos();
    let before_acc = c.rt.acc();

    assert_eq!(c.rt.step(), Err(Fault::MemLow { needed: 1 }));
    assert_eq!(c.rt.arena(), &before_arena);
    assert_eq!(c.rt.pos(), before_pos);
    assert_eq!(c.rt.acc(), before_acc);
}

#[test]
fn rebind_and_retry_matches_a_roomy_run() {
    let mut roomy = countdown(4, 256);
    let expected = roomy.rt.exec().unwrap();
    let expected_words = roomy.rt.arena().words().to_vec();

    let mut tight = countdown(4, 20);
    let mut capacity = 20;
    let ret = loop {
        match tight.rt.exec() {
            Ok(ret) => break ret,
            Err(Fault::MemLow { needed }) => {
                capacity += needed;
                tight.rt.rebind(vec![0; capacity]).unwrap();
            }
            Err(fault) => panic!("unexpected fault: {fault}"),
        }
    };
    assert_eq!(ret, expected);
    assert_eq!(tight.rt.arena().words(), expected_words.as_slice());
    assert_eq!(tight.rt.arena().get(ret), Some(0));
}

#[test]
fn rebind_rejects_smaller_stores() {
    let mut rt = runtime(4);
    rt.alloc(&[1, 2]).unwrap();
    let returned = rt.rebind(vec![0; 3]).unwrap_err();
    assert_eq!(returned.len(), 3);
    assert_eq!(rt.arena().capacity(), 4);
}

#[test]
fn references_beyond_the_cursor_are_rejected() {
    let mut rt = runtime(16);
    rt.alloc(&[1]).unwrap();
    assert_eq!(
        rt.encode_morph(&Morph::add(Operand::Ref(1), Operand::Lit(0))),
        Err(Fault::Totality {
            offset: 1,
            reason: TotalityReason::Unresolved
        })
    );
    assert_eq!(
        rt.check_cell(&Cell::new(vec![0, 5])),
        Err(Fault::Totality {
            offset: 5,
            reason: TotalityReason::Unresolved
        })
    );
    assert_eq!(rt.check_cell(&Cell::contiguous(0, 1)), Ok(()));
    assert_eq!(rt.arena().cursor(), 1);
}

#[test]
fn jumps_must_land_on_existing_entities() {
    let mut rt = runtime(32);
    rt.alloc(&[0]).unwrap();
    let add = rt
        .encode_morph(&Morph::add(Operand::Lit(1), Operand::Lit(1)))
        .unwrap();
    assert!(rt.encode_morph(&Morph::jmp(add)).is_ok());
    for (target, reason) in [
        (0, TotalityReason::NotAnEntity),
        (add + 1, TotalityReason::NotAnEntity),
        (rt.arena().cursor(), TotalityReason::Unresolved),
    ] {
        assert_eq!(
            rt.encode_morph(&Morph::jmp(target)),
            Err(Fault::Totality {
                offset: target,
                reason
            })
        );
    }
    let cursor = rt.arena().cursor();
    assert_eq!(
        rt.encode_morph(&Morph::new(Op::Jmp, &[Operand::Ref(0)])),
        Err(Fault::Totality {
            offset: cursor,
            reason: TotalityReason::DynamicJump
        })
    );
}

#[test]
fn halt_requires_a_location_and_is_idempotent() {
    let mut rt = runtime(16);
    let cell = rt.alloc(&[42]).unwrap();
    assert_eq!(
        rt.encode_halt(Operand::Lit(0)),
        Err(Fault::Totality {
            offset: 1,
            reason: TotalityReason::LiteralReturn
        })
    );
    let halt = rt.encode_halt(cell.operand(0).unwrap()).unwrap();
    rt.set_pos(halt);
    for _ in 0..3 {
        assert_eq!(rt.step(), Ok(Flow::Halt(0)));
        assert_eq!(rt.pos(), halt);
    }
    assert_eq!(Status::from_exec(rt.exec()), Status::Halt(0));
}

#[test]
fn stepping_onto_data_is_a_totality_fault() {
    let mut rt = runtime(16);
    rt.alloc(&[Opcode::Add.byte().into(), 1, 2]).unwrap();
    rt.encode_halt(Operand::Ref(1)).unwrap();
    rt.set_pos(0);
    let mut rec = Recorder::default();
    assert_eq!(
        rt.exec_traced(rec.mask(), Some(&mut rec)),
        Err(Fault::Totality {
            offset: 0,
            reason: TotalityReason::NotAnEntity
        })
    );
    assert_eq!(rec.faults.len(), 1);
    assert_eq!(rt.arena().cursor(), 5);
}

#[test]
fn composition_without_halt_ends_on_its_last_result() {
    let mut rt = runtime(16);
    let add = rt
        .encode_morph(&Morph::add(Operand::Lit(2), Operand::Lit(3)))
        .unwrap();
    rt.set_pos(add);
    let ret = rt.exec().unwrap();
    assert_eq!(rt.arena().get(ret), Some(5));
    assert_eq!(Status::from_exec(Ok(ret)).kind(), Kind::Halt);

    let mut rt = runtime(32);
    rt.alloc(&[5]).unwrap();
    let rule = rt
        .encode_rule(&Rule::new(
            vec![Morph::cmp(Operand::Ref(0), Operand::Lit(0))],
            vec![Morph::add(Operand::Ref(0), Operand::Lit(1))],
            Morph::sub(Operand::Ref(0), Operand::Lit(1)),
        ))
        .unwrap();
    rt.set_pos(rule);
    let ret = rt.exec().unwrap();
    assert_eq!(rt.arena().get(ret), Some(6));
    assert_eq!(rt.acc(), Some(ret));
}

#[test]
fn retried_step_reports_rule_events_once() {
    let mut rt = runtime(11);
    rt.alloc(&[5]).unwrap();
    let rule = rt
        .encode_rule(&Rule::new(
            vec![Morph::cmp(Operand::Ref(0), Operand::Lit(0))],
            vec![Morph::add(Operand::Ref(0), Operand::Lit(1))],
            Morph::sub(Operand::Ref(0), Operand::Lit(1)),
        ))
        .unwrap();
    assert_eq!(rt.arena().remaining(), 0);
    rt.set_pos(rule);

    let mut rec = Recorder::default();
    assert_eq!(
        rt.step_traced(rec.mask(), Some(&mut rec)),
        Err(Fault::MemLow { needed: 2 })
    );
    assert!(rec.conditions.is_empty());
    assert!(rec.arms.is_empty());
    assert_eq!(rec.faults, vec![(rule, Fault::MemLow { needed: 2 })]);

    rt.rebind(vec![0; 32]).unwrap();
    let ret = rt.exec_traced(rec.mask(), Some(&mut rec)).unwrap();
    assert_eq!(rt.arena().get(ret), Some(6));
    assert_eq!(rec.conditions, vec![(rule, 0, 1)]);
    assert_eq!(rec.arms, vec![(rule, Arm::Condition(0))]);
    assert_eq!(rec.steps.len(), 1);
    assert_eq!(rec.faults.len(), 1);
}

#[test]
fn disassembly_lists_a_finished_run() {
    let mut c = countdown(1, 64);
    c.rt.exec().unwrap();
    let d = disassemble(&c.rt);
    assert!(matches!(d.entry_at(c.start), Some(Entry::Morph(_))));
    assert!(matches!(d.entry_at(c.rule), Some(Entry::Rule(_))));
    assert!(matches!(d.entry_at(c.halt), Some(Entry::Halt { .. })));
    let text = d.to_string();
    assert!(text.contains("0007: rule\n  when cmp acc, #0 => jmp 0004\n  else add acc, #0\n"));
    assert!(text.starts_with("0000: .word 1\n"));
    // Result cells trail the definitions as data.
    assert_eq!(
        d.entries().last().map(Entry::at),
        Some(c.rt.arena().cursor() - 1)
    );
}

#[test]
fn opcode_bytes_are_stable() {
    let table: Vec<(u8, &str)> = Opcode::ALL.iter().map(|o| (o.byte(), o.mnemonic())).collect();
    assert_eq!(
        table,
        vec![
            (0x00, "sub"),
            (0x01, "add"),
            (0x02, "cmp"),
            (0x03, "jmp"),
            (0x04, "offset"),
            (0x10, "rule"),
            (0x11, "halt"),
        ]
    );
}

#[test]
fn independent_runtimes_do_not_interact() {
    let mut a = countdown(2, 64);
    let mut b = countdown(5, 64);
    let ra = a.rt.exec().unwrap();
    let rb = b.rt.exec().unwrap();
    assert_eq!(a.rt.arena().get(ra), Some(0));
    assert_eq!(b.rt.arena().get(rb), Some(0));
    assert!(b.rt.arena().cursor() > a.rt.arena().cursor());

    fn assert_send<T: Send>() {}
    assert_send::<Runtime>();
}

#[test]
fn encode_results_flatten_to_status() {
    let mut rt = runtime(4);
    rt.alloc(&[1]).unwrap();
    assert_eq!(
        Status::from_define(rt.encode_morph(&Morph::add(Operand::Ref(0), Operand::Lit(1)))),
        Status::Ok(1)
    );
    assert_eq!(
        Status::from_define(rt.encode_halt(Operand::Acc)),
        Status::MemLow(2)
    );
    assert_eq!(
        Status::from_define(rt.encode_halt(Operand::Lit(0))),
        Status::TotalityFault(4)
    );
}
