//! Structural validation of functions.
//!
//! Checks the single-assignment discipline every pass relies on:
//! - every referenced `VarId` is in range of the variable table
//! - every variable is defined at most once (parameters count as definitions)
//! - every use follows its definition in program order
//!
//! Scope rules beyond program order (which block may see which variable) are
//! pass-specific and checked by the passes themselves.

use rustc_hash::FxHashSet;

use crate::{Expr, Function, VarId};

/// Structural problem in a function.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    /// A `VarId` outside the variable table.
    #[error("variable %{var} is not in the variable table ({num_vars} entries)")]
    UnknownVar { var: u32, num_vars: usize },
    /// A variable defined by more than one binding or parameter.
    #[error("variable %{var} is defined more than once")]
    Redefined { var: u32 },
    /// A variable read before the binding that defines it.
    #[error("variable %{var} is used before its definition")]
    UseBeforeDef { var: u32 },
}

/// Verify the single-assignment and def-before-use invariants.
pub fn verify(func: &Function) -> Result<(), VerifyError> {
    let mut defined: FxHashSet<VarId> = FxHashSet::default();

    for &param in &func.params {
        check_in_range(func, param)?;
        if !defined.insert(param) {
            return Err(VerifyError::Redefined { var: param.raw() });
        }
    }

    for binding in func.bindings() {
        check_uses(func, &binding.value, &defined)?;
        check_in_range(func, binding.var)?;
        if !defined.insert(binding.var) {
            return Err(VerifyError::Redefined {
                var: binding.var.raw(),
            });
        }
    }

    check_uses(func, &func.result, &defined)
}

fn check_in_range(func: &Function, var: VarId) -> Result<(), VerifyError> {
    if var.index() < func.vars.len() {
        Ok(())
    } else {
        Err(VerifyError::UnknownVar {
            var: var.raw(),
            num_vars: func.vars.len(),
        })
    }
}

fn check_uses(
    func: &Function,
    expr: &Expr,
    defined: &FxHashSet<VarId>,
) -> Result<(), VerifyError> {
    let mut result = Ok(());
    expr.for_each_var(&mut |var| {
        if result.is_err() {
            return;
        }
        result = check_in_range(func, var).and_then(|()| {
            if defined.contains(&var) {
                Ok(())
            } else {
                Err(VerifyError::UseBeforeDef { var: var.raw() })
            }
        });
    });
    result
}
