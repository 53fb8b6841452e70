//! End-to-end checks of [`lazy_transform`] on generated functions.
//!
//! Each generated function projects inputs, combines them with integer
//! operators, and returns a tuple of some of the results. The lazy form must
//! commit every slot once, fetch once per projection, release every fetched
//! value exactly once after its last use, and compute the same outputs.

#![allow(clippy::unwrap_used, reason = "Tests can panic")]

use lp_ir::interp::{Interpreter, NoExterns, Value};
use lp_ir::{verify, Expr, Function, Literal, SharedInterner, VarId};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use crate::externs::{GET_ITEM, RELEASE, SET_ITEM};
use crate::test_helpers::{count_calls, extern_calls, ops, Fixture, LazyParamEnv};
use crate::{init_tracing, lazy_transform, LazyTransformOptions, TransformError};

// ── Generation ──────────────────────────────────────────────────────

/// One generated binding: a selector and two operand picks.
type Step = (u8, usize, usize);

struct Generated {
    func: Function,
    interner: SharedInterner,
    num_projections: usize,
}

/// Build a function from generated steps.
///
/// Selector 0 projects input `a % num_inputs`; 1..=4 apply `neg`, `scale`,
/// `add` or `mul` to earlier values picked by `a` and `b`. The first binding
/// is always a projection.
fn build(num_inputs: usize, steps: &[Step], outputs: &[usize]) -> Generated {
    let mut fx = Fixture::new(num_inputs);
    let mut pool = vec![fx.proj(0)];
    let mut num_projections = 1;

    for &(selector, a, b) in steps {
        let x = pool[a % pool.len()];
        let y = pool[b % pool.len()];
        let var = match selector % 5 {
            0 => {
                num_projections += 1;
                fx.proj(u32::try_from(a % num_inputs).unwrap())
            }
            1 => fx.call("neg", &[x]),
            2 => fx.call("scale", &[x]),
            3 => fx.call("add", &[x, y]),
            _ => fx.call("mul", &[x, y]),
        };
        pool.push(var);
    }

    let outputs: Vec<VarId> = outputs.iter().map(|&i| pool[i % pool.len()]).collect();
    let (func, interner) = fx.finish(&outputs);
    Generated {
        func,
        interner,
        num_projections,
    }
}

fn slot_of(args: &[Expr]) -> i64 {
    match args.first() {
        Some(Expr::Literal(Literal::Int(slot))) => *slot,
        other => panic!("set_item without a literal slot: {other:?}"),
    }
}

/// Whether any binding after `position` reads `var`.
fn read_after(func: &Function, position: usize, var: VarId) -> bool {
    func.bindings()
        .skip(position + 1)
        .any(|binding| binding.value.used_vars().contains(&var))
}

fn run_original(generated: &Generated, inputs: &[Value]) -> Value {
    let ops = ops(&generated.interner);
    Interpreter::new(&generated.interner, &ops)
        .run(
            &generated.func,
            vec![Value::Tuple(inputs.to_vec())],
            &mut NoExterns,
        )
        .unwrap()
}

fn run_lazy(generated: &Generated, lazy: &Function, inputs: &[Value]) -> LazyParamEnv {
    let ops = ops(&generated.interner);
    let mut env = LazyParamEnv::new(inputs.to_vec());
    Interpreter::new(&generated.interner, &ops)
        .run(lazy, Vec::new(), &mut env)
        .unwrap();
    env
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn lazy_form_preserves_outputs(
        num_inputs in 1usize..=4,
        steps in prop::collection::vec((0u8..5, any::<usize>(), any::<usize>()), 0..12),
        outputs in prop::collection::vec(any::<usize>(), 1..5),
        raw_inputs in prop::collection::vec(-50i64..50, 4),
        release_intermediates in any::<bool>(),
    ) {
        let generated = build(num_inputs, &steps, &outputs);
        let options = LazyTransformOptions::default()
            .with_release_intermediates(release_intermediates);
        let lazy = lazy_transform(&generated.func, &generated.interner, &options).unwrap();
        prop_assert!(lazy.params.is_empty());
        prop_assert!(verify(&lazy).is_ok());

        let inputs: Vec<Value> = raw_inputs[..num_inputs].iter().map(|&n| Value::Int(n)).collect();
        let expected = run_original(&generated, &inputs);
        let env = run_lazy(&generated, &lazy, &inputs);

        let committed: Option<Vec<Value>> = env.outputs().iter().cloned().collect();
        prop_assert_eq!(committed.map(Value::Tuple), Some(expected));
        prop_assert_eq!(env.resident(), 0);
        prop_assert!(env.peak_resident <= generated.num_projections);
    }

    #[test]
    fn lazy_form_places_externs(
        num_inputs in 1usize..=4,
        steps in prop::collection::vec((0u8..5, any::<usize>(), any::<usize>()), 0..12),
        outputs in prop::collection::vec(any::<usize>(), 1..5),
    ) {
        let generated = build(num_inputs, &steps, &outputs);
        let interner = &generated.interner;
        let lazy = lazy_transform(&generated.func, interner, &LazyTransformOptions::default())
            .unwrap();
        let calls = extern_calls(&lazy, interner);

        // One commit per output slot.
        let mut slots: Vec<i64> = calls
            .iter()
            .filter(|call| call.name == SET_ITEM)
            .map(|call| slot_of(&call.args))
            .collect();
        slots.sort_unstable();
        let all_slots: Vec<i64> = (0..).take(outputs.len()).collect();
        prop_assert_eq!(slots, all_slots);

        // One fetch per projection, and each fetched value released once.
        prop_assert_eq!(count_calls(&lazy, interner, GET_ITEM), generated.num_projections);
        let fetched: Vec<VarId> = calls
            .iter()
            .filter(|call| call.name == GET_ITEM)
            .map(|call| call.var)
            .collect();
        let released: Vec<VarId> = calls
            .iter()
            .filter(|call| call.name == RELEASE)
            .map(|call| call.args[0].as_var().unwrap())
            .collect();
        for var in &fetched {
            prop_assert_eq!(released.iter().filter(|r| *r == var).count(), 1);
        }
        prop_assert_eq!(released.len(), fetched.len());

        // Nothing reads a value after its release.
        for (position, binding) in lazy.bindings().enumerate() {
            let Expr::Call { args, .. } = &binding.value else { continue };
            if calls.iter().any(|call| call.var == binding.var && call.name == RELEASE) {
                let var = args[0].as_var().unwrap();
                prop_assert!(!read_after(&lazy, position, var), "%{} read after release", var.raw());
            }
        }
    }
}

// ── Fixed cases ─────────────────────────────────────────────────────

#[test]
fn single_input_identity() {
    let generated = build(1, &[], &[0]);
    let lazy = lazy_transform(
        &generated.func,
        &generated.interner,
        &LazyTransformOptions::default(),
    )
    .unwrap();

    let env = run_lazy(&generated, &lazy, &[Value::Int(9)]);
    assert_eq!(env.outputs(), &[Some(Value::Int(9))]);
    assert_eq!(env.peak_resident, 1);
}

/// Fetching happens on demand: the second input is fetched only after the
/// first has been committed and released.
#[test]
fn inputs_are_fetched_one_at_a_time() {
    // w0 = p.0; a = scale(w0); w1 = p.1; b = neg(w1); out = (a, b)
    let generated = build(2, &[(2, 0, 0), (0, 1, 0), (1, 2, 0)], &[1, 3]);
    let lazy = lazy_transform(
        &generated.func,
        &generated.interner,
        &LazyTransformOptions::default(),
    )
    .unwrap();

    let env = run_lazy(&generated, &lazy, &[Value::Int(2), Value::Int(5)]);
    assert_eq!(env.peak_resident, 1);
    assert_eq!(env.outputs(), &[Some(Value::Int(6)), Some(Value::Int(-5))]);
}

#[test]
fn malformed_input_is_not_internal() {
    let mut fx = Fixture::new(1);
    let whole = fx.emit(Expr::Var(fx.param));
    let (func, interner) = fx.finish(&[whole]);

    let err = lazy_transform(&func, &interner, &LazyTransformOptions::default()).unwrap_err();
    assert_eq!(err, TransformError::ParamEscapes { param: 0 });
    assert!(!err.is_internal());
}

#[test]
fn init_tracing_is_idempotent() {
    init_tracing();
    init_tracing();
}
