//! Lazy parameter transform.
//!
//! Rewrites a *parameter-transform function* (one that takes a single tuple
//! of N parameters and returns a tuple of M transformed parameters) into a
//! zero-parameter function that
//!
//! - fetches input `i` on demand with `get_item(i)`,
//! - commits output `j` as soon as it is computed with `set_item(j, value)`,
//! - frees each fetched input with `release(value)` right after its last use.
//!
//! Peak memory then depends on how many parameters are live at once rather
//! than on N + M.
//!
//! # Pipeline
//!
//! 1. [`check_shape`]: calling-convention and scoping checks.
//! 2. [`collect_forward`]: forward scan for output slots and input projections.
//! 3. [`analyze_liveness`]: backward scan per block finding where each
//!    tracked variable dies.
//! 4. [`rewrite_lazy`]: forward rebuild emitting `get_item`/`set_item`/
//!    `release`.
//!
//! [`lazy_transform`] runs all four on one function; the
//! [`LazyTransformParams`] pass applies it to every `*transform_params`
//! function of a [`Module`](lp_ir::Module).

mod collect;
mod error;
pub mod externs;
mod liveness;
mod options;
mod pass;
mod rewrite;
mod shape;

#[cfg(test)]
mod test_helpers;

use std::sync::Once;

use lp_ir::{Function, StringInterner};

pub use collect::{collect_forward, ForwardInfo, OutputIndexMap, OutputSlots};
pub use error::{PassError, TransformError};
pub use liveness::{analyze_liveness, tracked_vars, LivenessMap};
pub use options::{LazyTransformOptions, DEFAULT_SUFFIX};
pub use pass::{LazyTransformParams, Pass, PassResult, PassStats};
pub use rewrite::rewrite_lazy;
pub use shape::{check_shape, ParamShape};

/// Rewrite one function into its lazy form.
///
/// Fails without producing a partial result if the function does not follow
/// the single-tuple-parameter calling convention.
pub fn lazy_transform(
    func: &Function,
    interner: &StringInterner,
    options: &LazyTransformOptions,
) -> Result<Function, TransformError> {
    let shape = check_shape(func)?;
    let forward = collect_forward(func, shape.param, shape.output)?;

    tracing::debug!(
        outputs = forward.outputs.num_slots(),
        input_projections = forward.input_projections.len(),
        "collected forward info"
    );

    let tracked = tracked_vars(func, &shape, &forward, options.release_intermediates);
    let liveness = analyze_liveness(func, shape.output, tracked);
    rewrite_lazy(func, &shape, &forward, &liveness, interner)
}

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Call this once at startup. Safe to call multiple times.
/// Enable with `RUST_LOG=lp_transform=debug` or `RUST_LOG=lp_transform=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}

#[cfg(test)]
mod tests;
