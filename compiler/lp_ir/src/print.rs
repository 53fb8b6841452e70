//! Textual dump of functions and modules.
//!
//! The format is stable and used by tests to compare whole functions:
//!
//! ```text
//! fn main_transform_params(%0: (tensor, tensor)) -> (tensor, tensor) {
//!   dataflow {
//!     %1 = %0.0
//!     %2 = add(%1, %1) : tensor
//!     %3 = (%1, %2)
//!   }
//!   return %3
//! }
//! ```
//!
//! Extern callees print as `@name`, operators as their bare name.

use std::fmt::{self, Write};

use crate::{AttrValue, BlockKind, Expr, Function, Literal, Module, ModuleItem, StringInterner};

/// `Display` adapter for a [`Function`].
pub struct FunctionDisplay<'a> {
    func: &'a Function,
    name: &'a str,
    interner: &'a StringInterner,
}

/// `Display` adapter for a [`Module`].
pub struct ModuleDisplay<'a> {
    module: &'a Module,
}

impl Function {
    /// Display this function under `name`, resolving symbols via `interner`.
    pub fn display<'a>(
        &'a self,
        name: &'a str,
        interner: &'a StringInterner,
    ) -> FunctionDisplay<'a> {
        FunctionDisplay {
            func: self,
            name,
            interner,
        }
    }
}

impl Module {
    pub fn display(&self) -> ModuleDisplay<'_> {
        ModuleDisplay { module: self }
    }
}

impl fmt::Display for FunctionDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let func = self.func;
        write!(f, "fn {}(", self.name)?;
        for (i, &param) in func.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "%{}", param.raw())?;
            if let Some(ty) = func.var_ty(param) {
                write!(f, ": {ty}")?;
            }
        }
        writeln!(f, ") -> {} {{", func.ret_ty)?;

        if !func.attrs.is_empty() {
            f.write_str("  attrs {")?;
            for (i, (key, value)) in func.attrs.iter().enumerate() {
                f.write_str(if i > 0 { ", " } else { " " })?;
                write!(f, "{} = ", self.interner.lookup(*key))?;
                match value {
                    AttrValue::Int(n) => write!(f, "{n}")?,
                    AttrValue::Bool(b) => write!(f, "{b}")?,
                    AttrValue::Str(s) => write!(f, "{:?}", self.interner.lookup(*s))?,
                }
            }
            f.write_str(" }\n")?;
        }

        for block in &func.blocks {
            match block.kind {
                BlockKind::Dataflow => f.write_str("  dataflow {\n")?,
                BlockKind::Plain => f.write_str("  block {\n")?,
            }
            for binding in &block.bindings {
                write!(f, "    %{} = ", binding.var.raw())?;
                write_expr(f, &binding.value, self.interner)?;
                f.write_char('\n')?;
            }
            f.write_str("  }\n")?;
        }

        f.write_str("  return ")?;
        write_expr(f, &func.result, self.interner)?;
        f.write_str("\n}")
    }
}

fn write_expr(f: &mut impl Write, expr: &Expr, interner: &StringInterner) -> fmt::Result {
    match expr {
        Expr::Var(v) => write!(f, "%{}", v.raw()),
        Expr::Tuple(fields) => {
            f.write_char('(')?;
            write_list(f, fields, interner)?;
            if fields.len() == 1 {
                f.write_char(',')?;
            }
            f.write_char(')')
        }
        Expr::TupleGetItem { tuple, index } => {
            if let Expr::Call { .. } = **tuple {
                f.write_char('(')?;
                write_expr(f, tuple, interner)?;
                f.write_char(')')?;
            } else {
                write_expr(f, tuple, interner)?;
            }
            write!(f, ".{index}")
        }
        Expr::Call { callee, args, ty } => {
            write_expr(f, callee, interner)?;
            f.write_char('(')?;
            write_list(f, args, interner)?;
            write!(f, ") : {ty}")
        }
        Expr::Literal(Literal::Int(n)) => write!(f, "{n}"),
        Expr::Literal(Literal::Bool(b)) => write!(f, "{b}"),
        Expr::Literal(Literal::Unit) => f.write_str("()"),
        Expr::ExternFunc(name) => write!(f, "@{}", interner.lookup(*name)),
        Expr::Op(name) => f.write_str(interner.lookup(*name)),
    }
}

fn write_list(f: &mut impl Write, exprs: &[Expr], interner: &StringInterner) -> fmt::Result {
    for (i, expr) in exprs.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write_expr(f, expr, interner)?;
    }
    Ok(())
}

impl fmt::Display for ModuleDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let interner = self.module.interner();
        for (i, (name, item)) in self.module.items().iter().enumerate() {
            if i > 0 {
                f.write_str("\n\n")?;
            }
            let name = interner.lookup(*name);
            match item {
                ModuleItem::Function(func) => write!(f, "{}", func.display(name, interner))?,
                ModuleItem::External { symbol } => {
                    write!(f, "extern {name} = {:?}", interner.lookup(*symbol))?;
                }
            }
        }
        Ok(())
    }
}
