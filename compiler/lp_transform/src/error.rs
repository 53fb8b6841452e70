//! Errors raised by the lazy transform.

use lp_ir::{Ty, VerifyError};

/// Why a function could not be rewritten.
///
/// Every variant except [`MissingRemap`](TransformError::MissingRemap)
/// describes malformed input; `MissingRemap` means the analyses and the
/// rewrite disagree, which is a bug in this crate.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TransformError {
    #[error("expected exactly one parameter, found {found}")]
    ParamCount { found: usize },

    #[error("parameter %{param} must be a tuple, found `{ty}`")]
    ParamNotAggregate { param: u32, ty: Ty },

    #[error("function result must be the variable bound to the output tuple")]
    ResultNotVar,

    #[error("no binding defines the output variable %{var}")]
    MissingOutputBinding { var: u32 },

    #[error("output variable %{var} must be bound to a tuple")]
    OutputNotAggregate { var: u32 },

    #[error("output tuple element {position} is not a variable reference")]
    OutputElementNotVar { position: usize },

    #[error("variable %{var} is defined in block {def_block} but used in block {use_block}")]
    CrossBlockUse {
        var: u32,
        def_block: usize,
        use_block: usize,
    },

    #[error("parameter %{param} is used other than as the base of a projection")]
    ParamEscapes { param: u32 },

    #[error("malformed function: {0}")]
    Verify(#[from] VerifyError),

    #[error("internal error: no substitution recorded for %{var}")]
    MissingRemap { var: u32 },
}

impl TransformError {
    /// Whether this error indicates a bug in the transform rather than bad
    /// input.
    pub fn is_internal(&self) -> bool {
        matches!(self, TransformError::MissingRemap { .. })
    }
}

/// A pass failed on a specific function.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("pass '{pass}' failed on `{function}`: {source}")]
pub struct PassError {
    pub pass: &'static str,
    pub function: String,
    pub source: TransformError,
}

impl PassError {
    pub fn new(pass: &'static str, function: impl Into<String>, source: TransformError) -> Self {
        PassError {
            pass,
            function: function.into(),
            source,
        }
    }
}
