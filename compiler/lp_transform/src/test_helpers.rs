//! Shared test utilities for the lazy transform.
//!
//! Consolidates the function fixtures, the operator table and the recording
//! `get_item`/`set_item`/`release` environment used by the `collect`,
//! `liveness`, `rewrite` and `pass` tests. Only compiled in test builds.

use lp_ir::interp::{EvalError, ExternEnv, OpTable, Value};
use lp_ir::{BlockKind, Expr, Function, FunctionBuilder, SharedInterner, StringInterner, Ty, VarId};

use crate::externs::{GET_ITEM, RELEASE, SET_ITEM};

/// Builds a transform-params style function: one tuple parameter of
/// `num_inputs` tensors, bindings in a dataflow block, and a final output
/// tuple.
pub(crate) struct Fixture {
    pub interner: SharedInterner,
    builder: FunctionBuilder,
    pub param: VarId,
}

impl Fixture {
    pub(crate) fn new(num_inputs: usize) -> Self {
        Self::with_interner(StringInterner::shared(), num_inputs)
    }

    /// Like [`Fixture::new`], interning into an existing (module) interner.
    pub(crate) fn with_interner(interner: SharedInterner, num_inputs: usize) -> Self {
        let mut builder = FunctionBuilder::new();
        let param = builder.param(
            interner.intern("params"),
            Ty::Tuple(vec![Ty::Tensor; num_inputs]),
        );
        builder.begin_block(BlockKind::Dataflow);
        Self {
            interner,
            builder,
            param,
        }
    }

    /// `w{index} = params.index`
    pub(crate) fn proj(&mut self, index: u32) -> VarId {
        let name = self.interner.intern(&format!("w{index}"));
        self.builder
            .emit(name, Expr::get_item(Expr::Var(self.param), index))
    }

    /// `op(args...) : tensor`
    pub(crate) fn call(&mut self, op: &str, args: &[VarId]) -> VarId {
        let op = self.interner.intern(op);
        let args = args.iter().map(|&v| Expr::Var(v)).collect();
        self.builder
            .emit(self.interner.intern("t"), Expr::call_op(op, args, Ty::Tensor))
    }

    /// Bind an arbitrary expression.
    pub(crate) fn emit(&mut self, value: Expr) -> VarId {
        self.builder.emit(self.interner.intern("t"), value)
    }

    /// Start a new block.
    pub(crate) fn block(&mut self, kind: BlockKind) {
        self.builder.begin_block(kind);
    }

    /// Bind the output tuple and return it.
    pub(crate) fn finish(mut self, outputs: &[VarId]) -> (Function, SharedInterner) {
        let fields = outputs.iter().map(|&v| Expr::Var(v)).collect();
        let out = self.builder.emit(self.interner.intern("out"), Expr::Tuple(fields));
        let ret_ty = self.builder.ty_of(&Expr::Var(out));
        (self.builder.finish(Expr::Var(out), ret_ty), self.interner)
    }

    /// Finish with an arbitrary result expression (for malformed shapes).
    pub(crate) fn finish_raw(self, result: Expr) -> (Function, SharedInterner) {
        (self.builder.finish(result, Ty::Object), self.interner)
    }
}

fn int_args<const N: usize>(op: &str, args: &[Value]) -> Result<[i64; N], String> {
    let mut out = [0; N];
    if args.len() != N {
        return Err(format!("{op}: expected {N} operands, got {}", args.len()));
    }
    for (slot, arg) in out.iter_mut().zip(args) {
        match arg {
            Value::Int(n) => *slot = *n,
            other => return Err(format!("{op}: non-int operand {other:?}")),
        }
    }
    Ok(out)
}

/// `add`, `mul`, `neg`, `scale` (x * 3) over integers.
pub(crate) fn ops(interner: &StringInterner) -> OpTable {
    let mut ops = OpTable::new();
    ops.register(interner.intern("add"), |args| {
        int_args::<2>("add", args).map(|[a, b]| Value::Int(a.wrapping_add(b)))
    });
    ops.register(interner.intern("mul"), |args| {
        int_args::<2>("mul", args).map(|[a, b]| Value::Int(a.wrapping_mul(b)))
    });
    ops.register(interner.intern("neg"), |args| {
        int_args::<1>("neg", args).map(|[a]| Value::Int(a.wrapping_neg()))
    });
    ops.register(interner.intern("scale"), |args| {
        int_args::<1>("scale", args).map(|[a]| Value::Int(a.wrapping_mul(3)))
    });
    ops
}

/// One extern call observed at runtime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Event {
    Get(i64),
    Set(i64, Value),
    Release(Value),
}

/// Serves inputs to `get_item`, collects `set_item` outputs, and tracks how
/// many fetched inputs are resident at once.
///
/// Only values handed out by `get_item` count as resident; releasing a
/// computed value leaves the count alone. Values have no identity, so a
/// computed value equal to a resident input is indistinguishable from it.
pub(crate) struct LazyParamEnv {
    inputs: Vec<Value>,
    outputs: Vec<Option<Value>>,
    pub events: Vec<Event>,
    resident: Vec<Value>,
    pub peak_resident: usize,
}

impl LazyParamEnv {
    pub(crate) fn new(inputs: Vec<Value>) -> Self {
        Self {
            inputs,
            outputs: Vec::new(),
            events: Vec::new(),
            resident: Vec::new(),
            peak_resident: 0,
        }
    }

    /// Committed outputs in slot order; `None` for slots never written.
    pub(crate) fn outputs(&self) -> &[Option<Value>] {
        &self.outputs
    }

    pub(crate) fn resident(&self) -> usize {
        self.resident.len()
    }
}

impl ExternEnv for LazyParamEnv {
    fn call_extern(&mut self, name: &str, args: Vec<Value>) -> Result<Value, EvalError> {
        let bad = |message: &str| EvalError::Extern {
            name: name.to_owned(),
            message: message.to_owned(),
        };
        match (name, args.as_slice()) {
            (GET_ITEM, [Value::Int(i)]) => {
                let value = usize::try_from(*i)
                    .ok()
                    .and_then(|i| self.inputs.get(i))
                    .cloned()
                    .ok_or_else(|| bad("index out of range"))?;
                self.events.push(Event::Get(*i));
                self.resident.push(value.clone());
                self.peak_resident = self.peak_resident.max(self.resident.len());
                Ok(value)
            }
            (SET_ITEM, [Value::Int(j), value]) => {
                let slot = usize::try_from(*j).map_err(|_| bad("negative slot"))?;
                if self.outputs.len() <= slot {
                    self.outputs.resize(slot + 1, None);
                }
                self.outputs[slot] = Some(value.clone());
                self.events.push(Event::Set(*j, value.clone()));
                Ok(Value::Unit)
            }
            (RELEASE, [value]) => {
                self.events.push(Event::Release(value.clone()));
                if let Some(pos) = self.resident.iter().position(|v| v == value) {
                    self.resident.swap_remove(pos);
                }
                Ok(Value::Unit)
            }
            _ => Err(EvalError::UnknownExtern {
                name: name.to_owned(),
            }),
        }
    }
}

/// An extern call found in a rewritten function.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ExternCall {
    pub name: &'static str,
    pub args: Vec<Expr>,
    /// The variable the call is bound to.
    pub var: VarId,
}

/// Every top-level extern call binding, in program order.
pub(crate) fn extern_calls(func: &Function, interner: &StringInterner) -> Vec<ExternCall> {
    func.bindings()
        .filter_map(|binding| match &binding.value {
            Expr::Call { callee, args, .. } => match **callee {
                Expr::ExternFunc(name) => Some(ExternCall {
                    name: interner.lookup(name),
                    args: args.clone(),
                    var: binding.var,
                }),
                _ => None,
            },
            _ => None,
        })
        .collect()
}

/// Number of calls to extern `name`.
pub(crate) fn count_calls(func: &Function, interner: &StringInterner, name: &str) -> usize {
    extern_calls(func, interner)
        .iter()
        .filter(|call| call.name == name)
        .count()
}

/// Printed form of a rewritten function.
pub(crate) fn render(func: &Function, interner: &StringInterner) -> String {
    func.display("lazy_transform_params", interner).to_string()
}
