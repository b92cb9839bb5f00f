//! Allocation site discovery and size estimation.
//!
//! A `Call` is an allocation site when its callee is on the allocator allow-list of the
//! [`AnalysisContext`]. The size estimate only uses dimension arguments that are constants at
//! the call: immediates, or values defined directly by an integer `Literal`. Anything else,
//! including an overflowing product, leaves the size unknown.

use log::trace;
use serde::Serialize;

use crate::{
    context::{AllocationKind, AnalysisContext, SizeRule},
    ir::{ConstValue, Function, Operand, Statement, StmtIndex, Type},
};

/// A call recognized as producing heap or manually managed memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocationSite {
    /// Index of the allocating call, which is also the allocation's SSA value
    pub index: StmtIndex,
    /// The allocating callee
    pub callee: String,
    /// Memory kind produced
    pub kind: AllocationKind,
    /// Whether `estimated_bytes` is known
    pub size_known: bool,
    /// Estimated size in bytes
    pub estimated_bytes: Option<u64>,
}

/// Finds every allocation site of a function, in statement order.
#[must_use]
pub fn allocation_sites(function: &Function, ctx: &AnalysisContext) -> Vec<AllocationSite> {
    function
        .iter()
        .filter_map(|(idx, stmt)| {
            let Statement::Call {
                callee,
                args,
                result_type,
            } = stmt
            else {
                return None;
            };
            let spec = ctx.allocator(callee)?;
            let estimated_bytes = estimate_size(function, spec.size, args, result_type);
            trace!("allocation site #{idx}: {callee} ({}) ~ {estimated_bytes:?} bytes", spec.kind);

            Some(AllocationSite {
                index: idx,
                callee: callee.clone(),
                kind: spec.kind,
                size_known: estimated_bytes.is_some(),
                estimated_bytes,
            })
        })
        .collect()
}

/// Applies a size rule to the arguments of an allocating call.
fn estimate_size(
    function: &Function,
    rule: SizeRule,
    args: &[Operand],
    result_type: &Type,
) -> Option<u64> {
    match rule {
        SizeRule::Fixed(bytes) => Some(bytes),
        SizeRule::Elements {
            element_bytes,
            first_dim,
        } => {
            let element_bytes =
                element_bytes.or_else(|| result_type.element_type()?.size_bytes())?;
            let dims = args.get(first_dim..).filter(|dims| !dims.is_empty())?;
            let elements = product(function, dims)?;
            elements.checked_mul(element_bytes)
        }
        SizeRule::Bytes => {
            if args.is_empty() {
                return None;
            }
            product(function, args)
        }
        SizeRule::StringLength => args.iter().try_fold(0u64, |total, arg| {
            match constant_operand(function, arg)? {
                ConstValue::Str(s) => total.checked_add(u64::try_from(s.len()).ok()?),
                _ => None,
            }
        }),
        SizeRule::Unknown => None,
    }
}

/// Checked product of non-negative constant integer operands.
fn product(function: &Function, operands: &[Operand]) -> Option<u64> {
    operands.iter().try_fold(1u64, |acc, operand| {
        let dim = constant_operand(function, operand)?.as_int()?;
        acc.checked_mul(u64::try_from(dim).ok()?)
    })
}

/// Resolves an operand that is a constant right at its use.
fn constant_operand<'a>(function: &'a Function, operand: &'a Operand) -> Option<&'a ConstValue> {
    match operand {
        Operand::Const(value) => Some(value),
        Operand::Value(idx) => match function.statement(*idx)? {
            Statement::Literal { value, .. } => Some(value),
            _ => None,
        },
        Operand::Argument(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{context::AllocatorSpec, ir::FunctionBuilder};

    fn vec_of(elem: Type) -> Type {
        Type::container("Vector", vec![elem])
    }

    #[test]
    fn test_element_size_from_result_type() {
        let mut b = FunctionBuilder::new("f");
        let arr = b.call("zeros", vec![ConstValue::Int(10).into()], vec_of(Type::float()));
        b.ret(Some(arr));
        let f = b.build().unwrap();

        let sites = allocation_sites(&f, &AnalysisContext::new());
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].kind, AllocationKind::Array);
        assert_eq!(sites[0].estimated_bytes, Some(80));
        assert!(sites[0].size_known);
    }

    #[test]
    fn test_dimensions_through_literals() {
        let mut b = FunctionBuilder::new("f");
        let rows = b.int(4);
        let cols = b.int(8);
        let m = b.call("zeros", vec![rows, cols], Type::container("Matrix", vec![Type::int()]));
        b.ret(Some(m));
        let f = b.build().unwrap();

        let sites = allocation_sites(&f, &AnalysisContext::new());
        assert_eq!(sites[0].estimated_bytes, Some(256));
    }

    #[test]
    fn test_unknown_sizes() {
        let mut b = FunctionBuilder::new("f");
        let n = b.param(Type::int());
        let dynamic = b.call("zeros", vec![n], vec_of(Type::float()));
        let abstract_elem = b.call(
            "zeros",
            vec![ConstValue::Int(4).into()],
            vec_of(Type::abstract_type("Real")),
        );
        let huge = b.call(
            "malloc",
            vec![ConstValue::Int(i64::MAX).into(), ConstValue::Int(4).into()],
            Type::concrete("Ptr"),
        );
        let negative = b.call("malloc", vec![ConstValue::Int(-1).into()], Type::concrete("Ptr"));
        b.call("println", vec![dynamic, abstract_elem, huge, negative], Type::nothing());
        b.ret(None);
        let f = b.build().unwrap();

        let sites = allocation_sites(&f, &AnalysisContext::new());
        assert_eq!(sites.len(), 4);
        assert!(sites.iter().all(|s| !s.size_known && s.estimated_bytes.is_none()));
    }

    #[test]
    fn test_fill_skips_value_argument() {
        let mut b = FunctionBuilder::new("f");
        let arr = b.call(
            "fill",
            vec![ConstValue::Float(1.0).into(), ConstValue::Int(3).into()],
            vec_of(Type::float()),
        );
        b.ret(Some(arr));
        let f = b.build().unwrap();

        let sites = allocation_sites(&f, &AnalysisContext::new());
        assert_eq!(sites[0].estimated_bytes, Some(24));
    }

    #[test]
    fn test_custom_allocator_and_strings() {
        let ctx = AnalysisContext::new().with_allocator("makeArray", AllocatorSpec::array(Some(8)));
        let mut b = FunctionBuilder::new("f");
        let arr = b.call("makeArray", vec![ConstValue::Int(10).into()], Type::Top);
        let s = b.call(
            "string",
            vec![
                ConstValue::Str("abc".into()).into(),
                ConstValue::Str("de".into()).into(),
            ],
            Type::string(),
        );
        b.call("println", vec![arr, s], Type::nothing());
        b.ret(None);
        let f = b.build().unwrap();

        let sites = allocation_sites(&f, &ctx);
        assert_eq!(sites[0].estimated_bytes, Some(80));
        assert_eq!(sites[1].kind, AllocationKind::String);
        assert_eq!(sites[1].estimated_bytes, Some(5));
        assert_eq!(sites.len(), 2);
    }
}
