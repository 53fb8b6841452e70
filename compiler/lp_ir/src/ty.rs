//! Types of IR values.

use std::fmt;

/// Primitive scalar types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum PrimTy {
    Int,
    Bool,
}

/// Type of an IR value.
///
/// Only as precise as the lazy transform needs: the pass distinguishes
/// aggregates (`Tuple`) from everything else, and everything it introduces
/// is `Object`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Ty {
    /// Opaque runtime object (results of extern calls).
    Object,
    /// A numeric parameter buffer.
    Tensor,
    /// Scalar value.
    Prim(PrimTy),
    /// Fixed-size aggregate.
    Tuple(Vec<Ty>),
}

impl Ty {
    /// The empty tuple.
    pub fn unit() -> Self {
        Ty::Tuple(Vec::new())
    }

    pub fn is_tuple(&self) -> bool {
        matches!(self, Ty::Tuple(_))
    }

    /// Type of field `index` if this is a tuple with that many fields.
    pub fn field(&self, index: u32) -> Option<&Ty> {
        match self {
            Ty::Tuple(fields) => fields.get(index as usize),
            Ty::Object | Ty::Tensor | Ty::Prim(_) => None,
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Object => f.write_str("object"),
            Ty::Tensor => f.write_str("tensor"),
            Ty::Prim(PrimTy::Int) => f.write_str("int"),
            Ty::Prim(PrimTy::Bool) => f.write_str("bool"),
            Ty::Tuple(fields) => {
                f.write_str("(")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{field}")?;
                }
                if fields.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
        }
    }
}
