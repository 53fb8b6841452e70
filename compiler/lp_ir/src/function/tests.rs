use std::sync::Arc;

use crate::{
    BlockKind, Expr, Function, FunctionBuilder, Module, ModuleItem, Name, StringInterner, Ty,
};

fn tiny_function(interner: &StringInterner) -> Function {
    let mut b = FunctionBuilder::new();
    let p = b.param(interner.intern("params"), Ty::Tuple(vec![Ty::Tensor]));
    b.begin_block(BlockKind::Dataflow);
    let w = b.emit(interner.intern("w"), Expr::get_item(Expr::Var(p), 0));
    let out = b.emit(interner.intern("out"), Expr::Tuple(vec![Expr::Var(w)]));
    let ret_ty = b.ty_of(&Expr::Var(out));
    b.finish(Expr::Var(out), ret_ty)
}

#[test]
fn find_binding_reports_block() {
    let interner = StringInterner::new();
    let func = tiny_function(&interner);
    let out = func.result.as_var().unwrap();
    let (block_idx, binding) = func.find_binding(out).unwrap();
    assert_eq!(block_idx, 0);
    assert!(matches!(binding.value, Expr::Tuple(_)));
    assert!(func.find_binding(func.params[0]).is_none());
}

#[test]
fn expr_ty_projection() {
    let interner = StringInterner::new();
    let func = tiny_function(&interner);
    let p = func.params[0];
    assert_eq!(func.expr_ty(&Expr::get_item(Expr::Var(p), 0)), Ty::Tensor);
    // Out-of-range projection degrades to Object.
    assert_eq!(func.expr_ty(&Expr::get_item(Expr::Var(p), 4)), Ty::Object);
    assert_eq!(func.ret_ty, Ty::Tuple(vec![Ty::Tensor]));
}

#[test]
fn module_keeps_insertion_order_on_replace() {
    let interner = Arc::new(StringInterner::new());
    let mut module = Module::new(Arc::clone(&interner));
    module.add_function("main_transform_params", tiny_function(&interner));
    module.add_external("matmul", "cublas_matmul");
    module.add_function("other", tiny_function(&interner));
    module.add_function("main_transform_params", tiny_function(&interner));

    let names: Vec<&str> = module
        .items()
        .iter()
        .map(|(n, _)| module.name_str(*n))
        .collect();
    assert_eq!(names, vec!["main_transform_params", "matmul", "other"]);
    assert_eq!(module.len(), 3);
}

#[test]
fn module_lookup() {
    let interner = Arc::new(StringInterner::new());
    let mut module = Module::new(Arc::clone(&interner));
    module.add_function("f", tiny_function(&interner));
    module.add_external("g", "libg");

    assert!(module.function("f").is_some());
    assert!(module.function("g").is_none());
    assert!(matches!(
        module.get("g"),
        Some(ModuleItem::External { symbol }) if interner.lookup(*symbol) == "libg"
    ));
    assert!(module.get("missing").is_none());
    assert_ne!(interner.intern("f"), Name::EMPTY);
}
