//! Forward collection of output slots and input projections.
//!
//! One pass over the bindings in program order gathers:
//!
//! - **Output slots**: for the binding that defines the output variable, each
//!   `(position, Var(x))` element of its tuple records `x → position`.
//! - **Input projections**: every other binding whose value is exactly
//!   `param.i` (a direct, non-transitive alias of an input slot).
//!
//! Whether a binding is an input projection is decided from that binding's
//! own value alone; nothing carries over from earlier bindings.

use lp_ir::{Binding, Expr, Function, VarId};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::TransformError;

/// Output slots fed by one variable.
///
/// Almost always a single slot; a variable listed twice in the output tuple
/// feeds both positions.
pub type OutputSlots = SmallVec<[u32; 1]>;

/// Map from variable to the output slot(s) it is committed to.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OutputIndexMap {
    slots: FxHashMap<VarId, OutputSlots>,
    num_slots: usize,
}

impl OutputIndexMap {
    /// Slots fed by `var`, if it appears in the output tuple.
    pub fn get(&self, var: VarId) -> Option<&[u32]> {
        self.slots.get(&var).map(SmallVec::as_slice)
    }

    pub fn contains(&self, var: VarId) -> bool {
        self.slots.contains_key(&var)
    }

    /// Arity of the output tuple.
    pub fn num_slots(&self) -> usize {
        self.num_slots
    }

    /// Number of distinct variables feeding the output.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Result of the forward scan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForwardInfo {
    pub outputs: OutputIndexMap,
    /// Variables bound to `param.i`, in program order.
    pub input_projections: Vec<VarId>,
}

/// Scan `func` forward, collecting output slots and input projections.
///
/// Fails if the binding of `output` is not a tuple of variable references,
/// or if no binding defines `output`.
pub fn collect_forward(
    func: &Function,
    param: VarId,
    output: VarId,
) -> Result<ForwardInfo, TransformError> {
    let mut outputs = None;
    let mut input_projections = Vec::new();

    for binding in func.bindings() {
        if binding.var == output {
            outputs = Some(collect_output_slots(binding)?);
        } else if is_input_projection(&binding.value, param) {
            input_projections.push(binding.var);
        }
    }

    let outputs = outputs.ok_or(TransformError::MissingOutputBinding { var: output.raw() })?;

    tracing::trace!(
        num_slots = outputs.num_slots(),
        projections = ?input_projections,
        "forward scan done"
    );

    Ok(ForwardInfo {
        outputs,
        input_projections,
    })
}

/// Map each element of the output tuple to its position.
fn collect_output_slots(binding: &Binding) -> Result<OutputIndexMap, TransformError> {
    let Expr::Tuple(fields) = &binding.value else {
        return Err(TransformError::OutputNotAggregate {
            var: binding.var.raw(),
        });
    };

    let mut slots: FxHashMap<VarId, OutputSlots> = FxHashMap::default();
    for (position, field) in fields.iter().enumerate() {
        let var = field
            .as_var()
            .ok_or(TransformError::OutputElementNotVar { position })?;
        let slot = u32::try_from(position)
            .unwrap_or_else(|_| panic!("output tuple arity exceeds u32::MAX"));
        slots.entry(var).or_default().push(slot);
    }

    Ok(OutputIndexMap {
        slots,
        num_slots: fields.len(),
    })
}

/// Whether `value` is exactly `param.i`.
fn is_input_projection(value: &Expr, param: VarId) -> bool {
    match value {
        Expr::TupleGetItem { tuple, .. } => tuple.as_var() == Some(param),
        Expr::Var(_)
        | Expr::Tuple(_)
        | Expr::Call { .. }
        | Expr::Literal(_)
        | Expr::ExternFunc(_)
        | Expr::Op(_) => false,
    }
}
