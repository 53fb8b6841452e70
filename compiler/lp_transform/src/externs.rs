//! Extern functions the lazy form calls.
//!
//! The runtime that executes a rewritten function must provide:
//!
//! - `get_item(index: int) -> object`
//! - `set_item(index: int, value: object) -> ()`
//! - `release(value: object) -> ()`

use lp_ir::{Expr, Name, StringInterner, Ty, VarId};

pub const GET_ITEM: &str = "get_item";
pub const SET_ITEM: &str = "set_item";
pub const RELEASE: &str = "release";

/// Interned extern names plus constructors for the calls.
pub(crate) struct Externs {
    get_item: Name,
    set_item: Name,
    release: Name,
}

impl Externs {
    pub(crate) fn new(interner: &StringInterner) -> Self {
        Self {
            get_item: interner.intern(GET_ITEM),
            set_item: interner.intern(SET_ITEM),
            release: interner.intern(RELEASE),
        }
    }

    /// `get_item(index)`.
    pub(crate) fn get_item(&self, index: u32) -> Expr {
        Expr::call_extern(self.get_item, vec![Expr::int(i64::from(index))], Ty::Object)
    }

    /// `set_item(slot, value)`.
    pub(crate) fn set_item(&self, slot: u32, value: VarId) -> Expr {
        Expr::call_extern(
            self.set_item,
            vec![Expr::int(i64::from(slot)), Expr::Var(value)],
            Ty::unit(),
        )
    }

    /// `release(value)`.
    pub(crate) fn release(&self, value: VarId) -> Expr {
        Expr::call_extern(self.release, vec![Expr::Var(value)], Ty::unit())
    }
}
