//! Expressions, bindings and blocks.

use crate::{Name, Ty};

// ── ID newtypes ─────────────────────────────────────────────────────

/// Variable ID within a [`Function`](crate::Function).
///
/// Each `VarId` is defined by exactly one binding (or is a parameter).
/// IDs are allocated sequentially starting from 0 and index the function's
/// variable table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct VarId(u32);

impl VarId {
    /// Create a new variable ID from a raw index.
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw `u32` value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Get the index as `usize` (for indexing into `Vec`s).
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

// ── Literals ────────────────────────────────────────────────────────

/// Literal constant.
///
/// Slot indices passed to `get_item`/`set_item` are `Int` literals.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Literal {
    Int(i64),
    Bool(bool),
    Unit,
}

// ── Expressions ─────────────────────────────────────────────────────

/// Expression bound by a [`Binding`] or returned from a function.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Expr {
    /// Use of a previously bound variable.
    Var(VarId),
    /// Aggregate construction: `(a, b, c)`.
    Tuple(Vec<Expr>),
    /// Aggregate projection: `tuple.index`.
    TupleGetItem { tuple: Box<Expr>, index: u32 },
    /// Call of an operator or extern function.
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        /// Declared result type.
        ty: Ty,
    },
    /// A constant.
    Literal(Literal),
    /// Reference to an extern capability supplied by the runtime.
    ExternFunc(Name),
    /// Reference to a primitive operator.
    Op(Name),
}

impl Expr {
    /// Integer literal shorthand.
    pub fn int(value: i64) -> Self {
        Expr::Literal(Literal::Int(value))
    }

    /// Projection shorthand: `tuple.index`.
    pub fn get_item(tuple: Expr, index: u32) -> Self {
        Expr::TupleGetItem {
            tuple: Box::new(tuple),
            index,
        }
    }

    /// Call an operator by name.
    pub fn call_op(op: Name, args: Vec<Expr>, ty: Ty) -> Self {
        Expr::Call {
            callee: Box::new(Expr::Op(op)),
            args,
            ty,
        }
    }

    /// Call an extern function by name.
    pub fn call_extern(func: Name, args: Vec<Expr>, ty: Ty) -> Self {
        Expr::Call {
            callee: Box::new(Expr::ExternFunc(func)),
            args,
            ty,
        }
    }

    /// The referenced variable if this is a bare `Var`.
    pub fn as_var(&self) -> Option<VarId> {
        match self {
            Expr::Var(v) => Some(*v),
            _ => None,
        }
    }

    /// Visit every variable reference, depth-first, left to right.
    ///
    /// A `Call` visits its callee before its arguments.
    pub fn for_each_var(&self, f: &mut impl FnMut(VarId)) {
        match self {
            Expr::Var(v) => f(*v),
            Expr::Tuple(fields) => {
                for field in fields {
                    field.for_each_var(f);
                }
            }
            Expr::TupleGetItem { tuple, .. } => tuple.for_each_var(f),
            Expr::Call { callee, args, .. } => {
                callee.for_each_var(f);
                for arg in args {
                    arg.for_each_var(f);
                }
            }
            Expr::Literal(_) | Expr::ExternFunc(_) | Expr::Op(_) => {}
        }
    }

    /// All variable references in visit order (duplicates included).
    pub fn used_vars(&self) -> Vec<VarId> {
        let mut vars = Vec::new();
        self.for_each_var(&mut |v| vars.push(v));
        vars
    }
}

// ── Bindings and blocks ─────────────────────────────────────────────

/// `var = value`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Binding {
    pub var: VarId,
    pub value: Expr,
}

/// Whether a block is a pure dataflow region or an ordinary binding block.
///
/// Passes carry the kind through unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum BlockKind {
    Dataflow,
    Plain,
}

/// Ordered sequence of bindings.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Block {
    pub kind: BlockKind,
    pub bindings: Vec<Binding>,
}
