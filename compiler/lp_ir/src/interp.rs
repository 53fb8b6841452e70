//! Reference interpreter.
//!
//! Evaluates a [`Function`] over concrete [`Value`]s. Operators are looked up
//! in an [`OpTable`]; extern calls (`get_item`, `set_item`, `release`, ...)
//! are delegated to an [`ExternEnv`] supplied by the caller. Tests use it to
//! check that a rewritten function computes the same outputs as the original
//! and to observe the order of extern calls.

use rustc_hash::FxHashMap;

use crate::{Expr, Function, Literal, Name, StringInterner, VarId};

/// Runtime value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Value {
    Int(i64),
    Bool(bool),
    Tuple(Vec<Value>),
    Unit,
}

/// Evaluation failure.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    #[error("expected {expected} arguments, found {found}")]
    ArgCount { expected: usize, found: usize },
    #[error("variable %{var} read before it was bound")]
    Unbound { var: u32 },
    #[error("projection out of a non-tuple value")]
    NotATuple,
    #[error("projection index {index} out of range for tuple of {len}")]
    IndexOutOfRange { index: u32, len: usize },
    #[error("unknown operator `{name}`")]
    UnknownOp { name: String },
    #[error("unknown extern function `{name}`")]
    UnknownExtern { name: String },
    #[error("{what} cannot be evaluated here")]
    Unsupported { what: &'static str },
    #[error("operator `{op}` failed: {message}")]
    Op { op: String, message: String },
    #[error("extern `{name}` failed: {message}")]
    Extern { name: String, message: String },
}

/// Operator implementation.
pub type OpFn = fn(&[Value]) -> Result<Value, String>;

/// Operators available to the interpreter, by interned name.
#[derive(Default)]
pub struct OpTable {
    ops: FxHashMap<Name, OpFn>,
}

impl OpTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: Name, op: OpFn) {
        self.ops.insert(name, op);
    }

    pub fn get(&self, name: Name) -> Option<OpFn> {
        self.ops.get(&name).copied()
    }
}

/// Host side of extern calls.
pub trait ExternEnv {
    fn call_extern(&mut self, name: &str, args: Vec<Value>) -> Result<Value, EvalError>;
}

/// Environment without extern functions.
pub struct NoExterns;

impl ExternEnv for NoExterns {
    fn call_extern(&mut self, name: &str, _args: Vec<Value>) -> Result<Value, EvalError> {
        Err(EvalError::UnknownExtern {
            name: name.to_owned(),
        })
    }
}

/// Evaluates functions against an operator table.
pub struct Interpreter<'a> {
    interner: &'a StringInterner,
    ops: &'a OpTable,
}

impl<'a> Interpreter<'a> {
    pub fn new(interner: &'a StringInterner, ops: &'a OpTable) -> Self {
        Self { interner, ops }
    }

    /// Run `func` on `args`, routing extern calls to `env`.
    pub fn run(
        &self,
        func: &Function,
        args: Vec<Value>,
        env: &mut dyn ExternEnv,
    ) -> Result<Value, EvalError> {
        if args.len() != func.params.len() {
            return Err(EvalError::ArgCount {
                expected: func.params.len(),
                found: args.len(),
            });
        }

        let mut frame = Frame {
            slots: vec![None; func.vars.len()],
        };
        for (&param, arg) in func.params.iter().zip(args) {
            frame.bind(param, arg);
        }

        for binding in func.bindings() {
            let value = self.eval(&binding.value, &frame, env)?;
            frame.bind(binding.var, value);
        }

        self.eval(&func.result, &frame, env)
    }

    fn eval(
        &self,
        expr: &Expr,
        frame: &Frame,
        env: &mut dyn ExternEnv,
    ) -> Result<Value, EvalError> {
        match expr {
            Expr::Var(v) => frame.read(*v),
            Expr::Tuple(fields) => fields
                .iter()
                .map(|field| self.eval(field, frame, env))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Tuple),
            Expr::TupleGetItem { tuple, index } => match self.eval(tuple, frame, env)? {
                Value::Tuple(mut fields) => {
                    let len = fields.len();
                    if (*index as usize) < len {
                        Ok(fields.swap_remove(*index as usize))
                    } else {
                        Err(EvalError::IndexOutOfRange { index: *index, len })
                    }
                }
                _ => Err(EvalError::NotATuple),
            },
            Expr::Call { callee, args, .. } => {
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg, frame, env))
                    .collect::<Result<Vec<_>, _>>()?;
                match **callee {
                    Expr::Op(name) => {
                        let op = self.interner.lookup(name);
                        let imp = self.ops.get(name).ok_or_else(|| EvalError::UnknownOp {
                            name: op.to_owned(),
                        })?;
                        imp(&args).map_err(|message| EvalError::Op {
                            op: op.to_owned(),
                            message,
                        })
                    }
                    Expr::ExternFunc(name) => env.call_extern(self.interner.lookup(name), args),
                    _ => Err(EvalError::Unsupported {
                        what: "a call through a non-function callee",
                    }),
                }
            }
            Expr::Literal(Literal::Int(n)) => Ok(Value::Int(*n)),
            Expr::Literal(Literal::Bool(b)) => Ok(Value::Bool(*b)),
            Expr::Literal(Literal::Unit) => Ok(Value::Unit),
            Expr::ExternFunc(_) | Expr::Op(_) => Err(EvalError::Unsupported {
                what: "a first-class function reference",
            }),
        }
    }
}

struct Frame {
    slots: Vec<Option<Value>>,
}

impl Frame {
    fn bind(&mut self, var: VarId, value: Value) {
        if let Some(slot) = self.slots.get_mut(var.index()) {
            *slot = Some(value);
        }
    }

    fn read(&self, var: VarId) -> Result<Value, EvalError> {
        self.slots
            .get(var.index())
            .and_then(|slot| slot.clone())
            .ok_or(EvalError::Unbound { var: var.raw() })
    }
}
