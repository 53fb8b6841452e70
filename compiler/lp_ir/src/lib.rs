//! Binding-block IR for parameter-transform functions.
//!
//! This crate contains the data structures the lazy parameter transform
//! operates on:
//!
//! - **Names** ([`Name`], [`StringInterner`]) are interned identifiers for
//!   functions, operators and extern symbols.
//! - **Types** ([`Ty`]): the small type language needed to tell aggregates
//!   from opaque values.
//! - **Expressions and bindings** ([`Expr`], [`Binding`], [`Block`]) in
//!   administrative-normal form: every intermediate value is bound to a fresh
//!   [`VarId`] exactly once.
//! - **Functions and modules** ([`Function`], [`Module`]) plus a
//!   [`FunctionBuilder`] for producing new functions.
//! - **Tooling**: a structural [`verify`]er, a pretty-printer
//!   ([`Function::display`]) and a reference [`interp`]reter.
//!
//! # Design Philosophy
//!
//! - **Identity by index**: variables are `VarId(u32)` indices into the
//!   owning function's variable table. Two syntactically identical
//!   expressions bound to different variables are different values.
//! - **Immutable functions**: passes build new functions with
//!   [`FunctionBuilder`] rather than editing in place.
//! - **Closed variant set**: [`Expr`] is an enum, so every analysis is an
//!   exhaustive `match` and adding a variant is a compile error until all
//!   passes handle it.

mod builder;
mod expr;
mod function;
mod interner;
pub mod interp;
mod name;
mod print;
mod ty;
mod verify;

pub use builder::FunctionBuilder;
pub use expr::{Binding, Block, BlockKind, Expr, Literal, VarId};
pub use function::{AttrValue, Function, Module, ModuleItem, VarDecl};
pub use interner::{InternError, SharedInterner, StringInterner};
pub use name::Name;
pub use print::{FunctionDisplay, ModuleDisplay};
pub use ty::{PrimTy, Ty};
pub use verify::{verify, VerifyError};
