//! Lazy-form rewrite.
//!
//! Rebuilds the function block by block with a [`FunctionBuilder`]:
//!
//! - A binding `w = param.i` becomes `w' = get_item(i)`. A `param.i` nested
//!   in a larger expression is hoisted into its own `get_item(i)` binding
//!   and released right after the binding that reads it.
//! - A binding `d = e` feeding output slot `j` becomes `t = e'` followed by
//!   `set_item(j, t)` (one commit per slot).
//! - Any other binding is re-emitted with its operands remapped.
//! - After the code for `d`, every variable `v` whose last use is that
//!   binding gets `release(v')`, where `v'` is `v`'s rewritten value.
//!
//! The rewritten function has no parameters, returns the tuple of commit
//! results, and keeps the original attributes.

use lp_ir::{Binding, Expr, Function, FunctionBuilder, Name, StringInterner, Ty, VarId};
use rustc_hash::FxHashMap;

use crate::externs::Externs;
use crate::{ForwardInfo, LivenessMap, OutputIndexMap, ParamShape, TransformError};

/// Substitutions from original variables to rewritten ones.
///
/// `values` holds the variable carrying the original value (what ordinary
/// bindings and releases read). `commits` holds, per output slot, the
/// `set_item` result the rebuilt output tuple refers to.
#[derive(Default)]
struct Remap {
    values: FxHashMap<VarId, VarId>,
    commits: FxHashMap<u32, VarId>,
}

impl Remap {
    fn value(&self, var: VarId) -> Result<VarId, TransformError> {
        self.values
            .get(&var)
            .copied()
            .ok_or(TransformError::MissingRemap { var: var.raw() })
    }

    fn commit(&self, var: VarId, slot: u32) -> Result<VarId, TransformError> {
        self.commits
            .get(&slot)
            .copied()
            .ok_or(TransformError::MissingRemap { var: var.raw() })
    }
}

struct LazyRewriter<'a> {
    func: &'a Function,
    param: VarId,
    output: VarId,
    outputs: &'a OutputIndexMap,
    liveness: &'a LivenessMap,
    externs: Externs,
    builder: FunctionBuilder,
    remap: Remap,
}

/// Produce the lazy form of `func`.
///
/// `forward` and `liveness` must have been computed from `func` with the same
/// `shape`; any disagreement surfaces as
/// [`TransformError::MissingRemap`].
pub fn rewrite_lazy(
    func: &Function,
    shape: &ParamShape,
    forward: &ForwardInfo,
    liveness: &LivenessMap,
    interner: &StringInterner,
) -> Result<Function, TransformError> {
    let mut rewriter = LazyRewriter {
        func,
        param: shape.param,
        output: shape.output,
        outputs: &forward.outputs,
        liveness,
        externs: Externs::new(interner),
        builder: FunctionBuilder::new(),
        remap: Remap::default(),
    };

    for &(name, value) in &func.attrs {
        rewriter.builder.attr(name, value);
    }

    for block in &func.blocks {
        rewriter.builder.begin_block(block.kind);
        for binding in &block.bindings {
            rewriter.rewrite_binding(binding)?;
        }
    }

    // The result is the output variable, so nothing is hoisted here.
    let mut hoisted = Vec::new();
    let result = rewriter.rewrite_expr(&func.result, &mut hoisted)?;
    let lazy = rewriter.builder.finish(result, Ty::Object);

    tracing::debug!(
        vars_before = func.vars.len(),
        vars_after = lazy.vars.len(),
        "lazy rewrite done"
    );

    Ok(lazy)
}

impl LazyRewriter<'_> {
    fn name_of(&self, var: VarId) -> Name {
        self.func.var_decl(var).map_or(Name::EMPTY, |decl| decl.name)
    }

    fn rewrite_binding(&mut self, binding: &Binding) -> Result<(), TransformError> {
        if binding.var == self.output {
            return self.rewrite_output(binding);
        }

        let mut hoisted = Vec::new();
        let value = match &binding.value {
            Expr::TupleGetItem { tuple, index } if tuple.as_var() == Some(self.param) => {
                self.externs.get_item(*index)
            }
            value => self.rewrite_expr(value, &mut hoisted)?,
        };
        let new_var = self.builder.emit(self.name_of(binding.var), value);
        self.remap.values.insert(binding.var, new_var);

        if let Some(slots) = self.outputs.get(binding.var) {
            for &slot in slots {
                let committed = self
                    .builder
                    .emit(Name::EMPTY, self.externs.set_item(slot, new_var));
                self.remap.commits.insert(slot, committed);
            }
        }

        for &dead in self.liveness.dying_at(binding.var) {
            // For a pass-through slot `dead == binding.var`, and its value
            // remap is the variable produced before the commit.
            let target = self.remap.value(dead)?;
            tracing::trace!(var = dead.raw(), release = target.raw(), "release");
            self.builder.emit(Name::EMPTY, self.externs.release(target));
        }

        for fetched in hoisted {
            self.builder.emit(Name::EMPTY, self.externs.release(fetched));
        }

        Ok(())
    }

    /// Re-emit the output tuple over the commit results.
    fn rewrite_output(&mut self, binding: &Binding) -> Result<(), TransformError> {
        let Expr::Tuple(fields) = &binding.value else {
            return Err(TransformError::OutputNotAggregate {
                var: binding.var.raw(),
            });
        };

        let fields = fields
            .iter()
            .enumerate()
            .map(|(position, field)| {
                let var = field
                    .as_var()
                    .ok_or(TransformError::OutputElementNotVar { position })?;
                let slot = u32::try_from(position)
                    .unwrap_or_else(|_| panic!("output tuple arity exceeds u32::MAX"));
                Ok(Expr::Var(self.remap.commit(var, slot)?))
            })
            .collect::<Result<Vec<_>, TransformError>>()?;

        let new_var = self
            .builder
            .emit_typed(self.name_of(binding.var), Expr::Tuple(fields), Ty::Object);
        self.remap.values.insert(binding.var, new_var);
        Ok(())
    }

    /// Rewrite an operand expression. Nested `param.i` fetches are emitted
    /// as their own bindings and pushed onto `hoisted`.
    fn rewrite_expr(
        &mut self,
        expr: &Expr,
        hoisted: &mut Vec<VarId>,
    ) -> Result<Expr, TransformError> {
        Ok(match expr {
            Expr::Var(v) if *v == self.param => {
                return Err(TransformError::ParamEscapes {
                    param: self.param.raw(),
                })
            }
            Expr::Var(v) => Expr::Var(self.remap.value(*v)?),
            Expr::TupleGetItem { tuple, index } => {
                if tuple.as_var() == Some(self.param) {
                    let fetched = self
                        .builder
                        .emit(Name::EMPTY, self.externs.get_item(*index));
                    hoisted.push(fetched);
                    Expr::Var(fetched)
                } else {
                    Expr::get_item(self.rewrite_expr(tuple, hoisted)?, *index)
                }
            }
            Expr::Tuple(fields) => Expr::Tuple(self.rewrite_list(fields, hoisted)?),
            Expr::Call { callee, args, ty } => Expr::Call {
                callee: Box::new(self.rewrite_expr(callee, hoisted)?),
                args: self.rewrite_list(args, hoisted)?,
                ty: ty.clone(),
            },
            Expr::Literal(_) | Expr::ExternFunc(_) | Expr::Op(_) => expr.clone(),
        })
    }

    fn rewrite_list(
        &mut self,
        exprs: &[Expr],
        hoisted: &mut Vec<VarId>,
    ) -> Result<Vec<Expr>, TransformError> {
        let mut out = Vec::with_capacity(exprs.len());
        for expr in exprs {
            out.push(self.rewrite_expr(expr, hoisted)?);
        }
        Ok(out)
    }
}
