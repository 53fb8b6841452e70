//! Module-level driver.
//!
//! [`LazyTransformParams`] selects every function whose name ends with the
//! configured suffix and replaces it with its lazy form. Other functions and
//! external declarations pass through untouched.
//!
//! Each function is rewritten independently (fresh analyses, no shared
//! mutable state), so with [`LazyTransformOptions::parallel`] the rewrites
//! run on the rayon thread pool. Results are installed in module order
//! either way, and the module is left unchanged if any function fails.

use std::time::{Duration, Instant};

use lp_ir::{Function, Module, ModuleItem};
use rayon::prelude::*;

use crate::{lazy_transform, LazyTransformOptions, PassError, TransformError};

/// Result of running a pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PassResult {
    /// Whether the pass made any changes.
    pub changed: bool,
    pub stats: PassStats,
}

impl PassResult {
    pub fn unchanged() -> Self {
        PassResult {
            changed: false,
            stats: PassStats::default(),
        }
    }

    pub fn changed(items_transformed: usize) -> Self {
        PassResult {
            changed: true,
            stats: PassStats {
                duration: Duration::ZERO,
                items_transformed,
            },
        }
    }
}

/// Statistics collected during pass execution.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PassStats {
    /// Time taken by the pass.
    pub duration: Duration,
    /// Number of functions rewritten.
    pub items_transformed: usize,
}

/// A module-to-module transformation.
pub trait Pass {
    /// Name of this pass (for diagnostics and logging).
    fn name(&self) -> &'static str;

    /// Optimization level at which the pass is enabled. 0 means always.
    fn opt_level(&self) -> u32 {
        0
    }

    /// Run the pass on `module`.
    fn run(&self, module: &mut Module) -> Result<PassResult, PassError>;
}

impl<T: Pass + ?Sized> Pass for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn opt_level(&self) -> u32 {
        (**self).opt_level()
    }

    fn run(&self, module: &mut Module) -> Result<PassResult, PassError> {
        (**self).run(module)
    }
}

/// Convert parameter-transform functions into their lazy form.
#[derive(Clone, Debug, Default)]
pub struct LazyTransformParams {
    options: LazyTransformOptions,
}

impl LazyTransformParams {
    pub const NAME: &'static str = "LazyTransformParams";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: LazyTransformOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LazyTransformOptions {
        &self.options
    }
}

/// A selected function: item index, name, body.
type Selected<'m> = (usize, &'static str, &'m Function);

impl Pass for LazyTransformParams {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn run(&self, module: &mut Module) -> Result<PassResult, PassError> {
        let start = Instant::now();

        let selected: Vec<Selected<'_>> = module
            .items()
            .iter()
            .enumerate()
            .filter_map(|(index, (name, item))| match item {
                ModuleItem::Function(func) => {
                    let name = module.name_str(*name);
                    self.options.selects(name).then_some((index, name, func))
                }
                ModuleItem::External { .. } => None,
            })
            .collect();

        if selected.is_empty() {
            tracing::debug!(suffix = %self.options.suffix, "no functions selected");
            return Ok(PassResult::unchanged());
        }

        let interner = module.interner().as_ref();
        let rewrite = |&(index, name, func): &Selected<'_>| {
            tracing::debug!(function = name, "lazy transform");
            (index, name, lazy_transform(func, interner, &self.options))
        };
        let results: Vec<(usize, &'static str, Result<Function, TransformError>)> =
            if self.options.parallel {
                selected.par_iter().map(rewrite).collect()
            } else {
                selected.iter().map(rewrite).collect()
            };

        let rewritten = results
            .into_iter()
            .map(|(index, name, result)| {
                result
                    .map(|func| (index, func))
                    .map_err(|err| PassError::new(Self::NAME, name, err))
            })
            .collect::<Result<Vec<_>, PassError>>()?;

        let items_transformed = rewritten.len();
        let items = module.items_mut();
        for (index, func) in rewritten {
            items[index].1 = ModuleItem::Function(func);
        }

        let mut result = PassResult::changed(items_transformed);
        result.stats.duration = start.elapsed();
        tracing::debug!(
            functions = items_transformed,
            duration_us = u64::try_from(result.stats.duration.as_micros()).unwrap_or(u64::MAX),
            "pass done"
        );
        Ok(result)
    }
}
