//! Calling-convention checks for parameter-transform functions.
//!
//! A function can be rewritten only if:
//! - it has exactly one parameter, and that parameter is a tuple
//! - it is structurally sound (see [`lp_ir::verify`])
//! - its result is a variable bound somewhere in the body (the output tuple)
//! - the parameter appears only as the base of projections
//! - ordinary bindings only read variables defined in their own block
//!
//! The last rule makes every block an independent liveness scope. The output
//! tuple binding is exempt: its elements are consumed by commits, not by
//! ordinary uses.

use lp_ir::{verify, Expr, Function, VarId};
use rustc_hash::FxHashMap;

use crate::TransformError;

/// The two variables the transform is organized around.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParamShape {
    /// The single tuple parameter.
    pub param: VarId,
    /// The variable bound to the output tuple and returned.
    pub output: VarId,
}

/// Check that `func` follows the single-tuple-parameter convention.
pub fn check_shape(func: &Function) -> Result<ParamShape, TransformError> {
    let param = match func.params.as_slice() {
        [param] => *param,
        params => {
            return Err(TransformError::ParamCount {
                found: params.len(),
            })
        }
    };

    verify(func)?;

    match func.var_ty(param) {
        Some(ty) if ty.is_tuple() => {}
        ty => {
            return Err(TransformError::ParamNotAggregate {
                param: param.raw(),
                ty: ty.cloned().unwrap_or(lp_ir::Ty::Object),
            })
        }
    }

    let output = func.result.as_var().ok_or(TransformError::ResultNotVar)?;
    if func.find_binding(output).is_none() {
        return Err(TransformError::MissingOutputBinding { var: output.raw() });
    }

    check_scopes(func, param, output)?;

    Ok(ParamShape { param, output })
}

/// Reject parameter escapes and cross-block reads.
fn check_scopes(func: &Function, param: VarId, output: VarId) -> Result<(), TransformError> {
    let mut def_block: FxHashMap<VarId, usize> = FxHashMap::default();

    for (block_idx, block) in func.blocks.iter().enumerate() {
        for binding in &block.bindings {
            if param_escapes(&binding.value, param) {
                return Err(TransformError::ParamEscapes { param: param.raw() });
            }

            if binding.var != output {
                let mut result = Ok(());
                binding.value.for_each_var(&mut |var| {
                    if result.is_err() || var == param {
                        return;
                    }
                    if let Some(&def) = def_block.get(&var) {
                        if def != block_idx {
                            result = Err(TransformError::CrossBlockUse {
                                var: var.raw(),
                                def_block: def,
                                use_block: block_idx,
                            });
                        }
                    }
                });
                result?;
            }

            def_block.insert(binding.var, block_idx);
        }
    }

    Ok(())
}

/// Whether `param` is referenced anywhere other than as `param.i`.
fn param_escapes(expr: &Expr, param: VarId) -> bool {
    match expr {
        Expr::Var(v) => *v == param,
        Expr::TupleGetItem { tuple, .. } => match **tuple {
            Expr::Var(_) => false,
            ref inner => param_escapes(inner, param),
        },
        Expr::Tuple(fields) => fields.iter().any(|f| param_escapes(f, param)),
        Expr::Call { callee, args, .. } => {
            param_escapes(callee, param) || args.iter().any(|a| param_escapes(a, param))
        }
        Expr::Literal(_) | Expr::ExternFunc(_) | Expr::Op(_) => false,
    }
}
