//! Backward last-use analysis.
//!
//! Determines, for every binding, which tracked variables are read for the
//! last time by that binding. The rewrite emits a `release` for each of them
//! right after the binding.
//!
//! # Algorithm
//!
//! Each block is scanned in reverse with one set of still-tracked variables:
//!
//! 1. The output tuple binding is skipped (its elements are consumed by
//!    commits, not ordinary uses).
//! 2. For binding `d = e`, every variable read by `e` that is still tracked
//!    is reading its *last* use: it joins `d`'s list and leaves the set.
//!    Scanning backward, the first encounter is the latest use in program
//!    order, so no use counts are needed.
//! 3. If `d` itself is still tracked, nothing after it reads it: `d` dies in
//!    its own binding. For an input slot forwarded straight to the output
//!    this means "release after commit".
//!
//! Blocks are independent scopes (cross-block reads are rejected by
//! [`check_shape`](crate::check_shape)), and the tracked set lives only for
//! one call of [`analyze_liveness`].

use lp_ir::{Function, Ty, VarId};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::{ForwardInfo, ParamShape};

/// Per-binding lists of variables whose last use is that binding.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LivenessMap {
    dies: FxHashMap<VarId, Vec<VarId>>,
}

impl LivenessMap {
    /// Variables released after the binding of `def`, in scan order.
    pub fn dying_at(&self, def: VarId) -> &[VarId] {
        self.dies.get(&def).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether the binding of `def` was analyzed.
    pub fn contains(&self, def: VarId) -> bool {
        self.dies.contains_key(&def)
    }

    /// Total number of releases the map calls for.
    pub fn num_releases(&self) -> usize {
        self.dies.values().map(Vec::len).sum()
    }

    /// Number of analyzed bindings.
    pub fn len(&self) -> usize {
        self.dies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dies.is_empty()
    }
}

/// The variables whose storage the rewrite may release.
///
/// Always the input projections. With `release_intermediates`, also every
/// other non-scalar variable bound by an ordinary binding.
pub fn tracked_vars(
    func: &Function,
    shape: &ParamShape,
    forward: &ForwardInfo,
    release_intermediates: bool,
) -> FxHashSet<VarId> {
    let mut tracked: FxHashSet<VarId> = forward.input_projections.iter().copied().collect();

    if release_intermediates {
        for binding in func.bindings() {
            if binding.var == shape.output {
                continue;
            }
            if !matches!(func.var_ty(binding.var), Some(Ty::Prim(_))) {
                tracked.insert(binding.var);
            }
        }
    }

    tracked
}

/// Compute where each tracked variable dies.
///
/// Consumes `tracked`: a variable leaves the set at its last use.
pub fn analyze_liveness(
    func: &Function,
    output: VarId,
    mut tracked: FxHashSet<VarId>,
) -> LivenessMap {
    tracing::debug!(
        num_blocks = func.blocks.len(),
        tracked = tracked.len(),
        "computing last uses"
    );

    let mut dies: FxHashMap<VarId, Vec<VarId>> = FxHashMap::default();

    for block in &func.blocks {
        for binding in block.bindings.iter().rev() {
            if binding.var == output {
                continue;
            }

            let mut dies_here = Vec::new();
            binding.value.for_each_var(&mut |var| {
                if tracked.remove(&var) {
                    dies_here.push(var);
                }
            });

            if tracked.remove(&binding.var) {
                dies_here.push(binding.var);
            }

            dies.insert(binding.var, dies_here);
        }
    }

    let map = LivenessMap { dies };
    tracing::debug!(releases = map.num_releases(), "last uses computed");
    map
}
