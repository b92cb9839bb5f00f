mod functions;

pub use functions::*;

use crate::{
    context::{AnalysisContext, MethodTable},
    ir::{MethodSignature, Type, TypeHierarchy},
};

// Context with an abstract `Shape` and `n` concrete subtypes, each implementing `area`
pub fn shapes_context(n: usize) -> AnalysisContext {
    let mut hierarchy = TypeHierarchy::builtin();
    hierarchy.insert("Shape", "Any");
    let table: MethodTable = (0..n)
        .map(|i| {
            let name = format!("Shape{i}");
            hierarchy.insert(name.clone(), "Shape");
            MethodSignature::new("area", vec![Type::concrete(name)])
        })
        .collect();
    AnalysisContext::new()
        .with_hierarchy(hierarchy)
        .with_methods(table)
}

pub fn vector_of(elem: Type) -> Type {
    Type::container("Vector", vec![elem])
}
