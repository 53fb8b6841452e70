//! Functions and modules.

use crate::{Binding, Block, Expr, Literal, Name, PrimTy, SharedInterner, Ty, VarId};

/// Variable table entry: a name hint (for printing) and the variable's type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct VarDecl {
    pub name: Name,
    pub ty: Ty,
}

/// Function attribute value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum AttrValue {
    Int(i64),
    Bool(bool),
    Str(Name),
}

/// A function in binding-block form.
///
/// The body is `blocks` executed in order, followed by `result`. Every
/// variable is either a parameter or defined by exactly one binding.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Function {
    /// Formal parameters, in order.
    pub params: Vec<VarId>,
    /// Body blocks in program order.
    pub blocks: Vec<Block>,
    /// Returned expression, evaluated after the last block.
    pub result: Expr,
    /// Declared return type.
    pub ret_ty: Ty,
    /// Variable table, indexed by `VarId::index()`.
    pub vars: Vec<VarDecl>,
    /// Attributes carried through passes unchanged.
    pub attrs: Vec<(Name, AttrValue)>,
}

impl Function {
    /// Look up a variable's table entry.
    #[inline]
    pub fn var_decl(&self, var: VarId) -> Option<&VarDecl> {
        self.vars.get(var.index())
    }

    /// Look up a variable's type.
    #[inline]
    pub fn var_ty(&self, var: VarId) -> Option<&Ty> {
        self.var_decl(var).map(|decl| &decl.ty)
    }

    /// All bindings in program order, across blocks.
    pub fn bindings(&self) -> impl Iterator<Item = &Binding> {
        self.blocks.iter().flat_map(|block| block.bindings.iter())
    }

    /// Find the binding that defines `var`, with the index of its block.
    pub fn find_binding(&self, var: VarId) -> Option<(usize, &Binding)> {
        self.blocks.iter().enumerate().find_map(|(block_idx, block)| {
            block
                .bindings
                .iter()
                .find(|binding| binding.var == var)
                .map(|binding| (block_idx, binding))
        })
    }

    /// Compute the type of `expr` in the context of this function.
    pub fn expr_ty(&self, expr: &Expr) -> Ty {
        infer_ty(expr, &self.vars)
    }

    /// Look up an attribute by name.
    pub fn attr(&self, name: Name) -> Option<AttrValue> {
        self.attrs
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
    }
}

/// Type of an expression given a variable table.
///
/// Total: anything that cannot be typed precisely (out-of-range variables,
/// projections out of a non-tuple) is `Object`.
pub(crate) fn infer_ty(expr: &Expr, vars: &[VarDecl]) -> Ty {
    match expr {
        Expr::Var(v) => vars
            .get(v.index())
            .map_or(Ty::Object, |decl| decl.ty.clone()),
        Expr::Tuple(fields) => Ty::Tuple(fields.iter().map(|f| infer_ty(f, vars)).collect()),
        Expr::TupleGetItem { tuple, index } => infer_ty(tuple, vars)
            .field(*index)
            .cloned()
            .unwrap_or(Ty::Object),
        Expr::Call { ty, .. } => ty.clone(),
        Expr::Literal(Literal::Int(_)) => Ty::Prim(PrimTy::Int),
        Expr::Literal(Literal::Bool(_)) => Ty::Prim(PrimTy::Bool),
        Expr::Literal(Literal::Unit) => Ty::unit(),
        Expr::ExternFunc(_) | Expr::Op(_) => Ty::Object,
    }
}

// ── Modules ─────────────────────────────────────────────────────────

/// A named item in a [`Module`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum ModuleItem {
    /// A function in binding-block form.
    Function(Function),
    /// A symbol implemented outside the module (e.g. a kernel library).
    External { symbol: Name },
}

/// Ordered collection of named items sharing one interner.
#[derive(Clone)]
pub struct Module {
    interner: SharedInterner,
    items: Vec<(Name, ModuleItem)>,
}

impl Module {
    pub fn new(interner: SharedInterner) -> Self {
        Self {
            interner,
            items: Vec::new(),
        }
    }

    pub fn interner(&self) -> &SharedInterner {
        &self.interner
    }

    /// Add or replace a function.
    pub fn add_function(&mut self, name: &str, func: Function) {
        let name = self.interner.intern(name);
        self.insert(name, ModuleItem::Function(func));
    }

    /// Add or replace an external declaration.
    pub fn add_external(&mut self, name: &str, symbol: &str) {
        let name = self.interner.intern(name);
        let symbol = self.interner.intern(symbol);
        self.insert(name, ModuleItem::External { symbol });
    }

    /// Insert an item, keeping the original position when replacing.
    pub fn insert(&mut self, name: Name, item: ModuleItem) {
        if let Some(slot) = self.items.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = item;
        } else {
            self.items.push((name, item));
        }
    }

    pub fn get(&self, name: &str) -> Option<&ModuleItem> {
        let name = self.interner.get(name)?;
        self.items
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, item)| item)
    }

    /// Look up a function item by name.
    pub fn function(&self, name: &str) -> Option<&Function> {
        match self.get(name)? {
            ModuleItem::Function(func) => Some(func),
            ModuleItem::External { .. } => None,
        }
    }

    /// Items in insertion order.
    pub fn items(&self) -> &[(Name, ModuleItem)] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut [(Name, ModuleItem)] {
        &mut self.items
    }

    /// Resolve an item name.
    pub fn name_str(&self, name: Name) -> &'static str {
        self.interner.lookup(name)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl std::fmt::Debug for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Module")
            .field("items", &self.items)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
