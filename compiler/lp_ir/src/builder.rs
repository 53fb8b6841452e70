//! Incremental construction of [`Function`]s.
//!
//! Passes never edit a function in place: they open blocks on a
//! [`FunctionBuilder`], emit bindings one at a time, and call
//! [`finish`](FunctionBuilder::finish) to obtain the new function.

use crate::function::infer_ty;
use crate::{AttrValue, Binding, Block, BlockKind, Expr, Function, Name, Ty, VarDecl, VarId};

/// Accumulates parameters, blocks and bindings for a new function.
#[derive(Default)]
pub struct FunctionBuilder {
    params: Vec<VarId>,
    vars: Vec<VarDecl>,
    blocks: Vec<Block>,
    current: Option<Block>,
    attrs: Vec<(Name, AttrValue)>,
}

impl FunctionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh variable.
    fn fresh_var(&mut self, name: Name, ty: Ty) -> VarId {
        let id = u32::try_from(self.vars.len())
            .unwrap_or_else(|_| panic!("variable count exceeds u32::MAX"));
        self.vars.push(VarDecl { name, ty });
        VarId::new(id)
    }

    /// Declare the next formal parameter.
    pub fn param(&mut self, name: Name, ty: Ty) -> VarId {
        let var = self.fresh_var(name, ty);
        self.params.push(var);
        var
    }

    /// Open a new block, closing the current one if any.
    pub fn begin_block(&mut self, kind: BlockKind) {
        self.end_block();
        self.current = Some(Block {
            kind,
            bindings: Vec::new(),
        });
    }

    /// Close the current block. Empty blocks are dropped.
    pub fn end_block(&mut self) {
        if let Some(block) = self.current.take() {
            if !block.bindings.is_empty() {
                self.blocks.push(block);
            }
        }
    }

    /// Bind `value` to a fresh variable whose type is inferred from it.
    ///
    /// Opens a `Plain` block if none is open.
    pub fn emit(&mut self, name: Name, value: Expr) -> VarId {
        let ty = self.ty_of(&value);
        self.emit_typed(name, value, ty)
    }

    /// Bind `value` to a fresh variable of type `ty`.
    pub fn emit_typed(&mut self, name: Name, value: Expr, ty: Ty) -> VarId {
        let var = self.fresh_var(name, ty);
        self.current
            .get_or_insert_with(|| Block {
                kind: BlockKind::Plain,
                bindings: Vec::new(),
            })
            .bindings
            .push(Binding { var, value });
        var
    }

    /// Type of `expr` given the variables allocated so far.
    pub fn ty_of(&self, expr: &Expr) -> Ty {
        infer_ty(expr, &self.vars)
    }

    /// Set (or replace) a function attribute.
    pub fn attr(&mut self, name: Name, value: AttrValue) {
        if let Some(slot) = self.attrs.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.attrs.push((name, value));
        }
    }

    /// Close the current block and produce the function.
    pub fn finish(mut self, result: Expr, ret_ty: Ty) -> Function {
        self.end_block();
        Function {
            params: self.params,
            blocks: self.blocks,
            result,
            ret_ty,
            vars: self.vars,
            attrs: self.attrs,
        }
    }
}
