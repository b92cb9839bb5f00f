//! Monomorphization analysis.
//!
//! Finds the abstract positions of a function's signature and the concrete types each could be
//! specialized to. A position is abstract when the declared parameter type is `Any`, abstract
//! or a union, or when a container parameter has an abstract type argument (one level deep).
//!
//! Instantiations come from, in order of preference:
//!
//! 1. **Observed**: concrete members of a union type, and concrete types found at the same
//!    position in the method table entries registered under the function's own name.
//! 2. **Suggested**: a small curated table of the usual concrete members of common abstract
//!    numeric, array and string categories, used only when nothing was observed.
//!
//! The required variant count is the product of all instantiation set sizes.

use std::collections::BTreeSet;

use log::{debug, trace};
use serde::Serialize;
use strum::Display;

use crate::{
    analysis::AnalysisPass,
    context::AnalysisContext,
    ir::{Function, MethodSignature, Type},
    Result,
};

/// Where an instantiation set came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InstantiationSource {
    /// Seen in the signature or the method table
    Observed,
    /// Taken from the curated suggestion table
    Suggested,
    /// No instantiation is known
    Unresolved,
}

/// An abstract position of the signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AbstractParameter {
    /// 1-based parameter position
    pub position: usize,
    /// 0-based type argument position when the abstract type is nested in a container
    pub nested: Option<usize>,
    /// The abstract type at that position
    pub declared_type: Type,
    /// Concrete types the position could be specialized to
    pub concrete_instantiations: BTreeSet<Type>,
    /// Provenance of `concrete_instantiations`
    pub source: InstantiationSource,
}

/// Result of monomorphization analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonomorphizationReport {
    /// Abstract positions in signature order
    pub parameters: Vec<AbstractParameter>,
    /// Every abstract position has at least one instantiation
    pub can_fully_monomorphize: bool,
    /// Number of specialized variants needed (saturating product)
    pub required_variants: usize,
}

impl MonomorphizationReport {
    /// Returns `true` if the signature has no abstract position.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

/// Monomorphization pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct Monomorphization;

impl Monomorphization {
    /// Creates the pass.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Analyzes a signature against the context's method table.
    #[must_use]
    pub fn analyze_signature(
        &self,
        signature: &MethodSignature,
        ctx: &AnalysisContext,
    ) -> MonomorphizationReport {
        let observed_signatures = ctx.methods().lookup(&signature.name).unwrap_or_default();

        let mut parameters = Vec::new();
        for (i, declared) in signature.parameter_types.iter().enumerate() {
            let position = i + 1;
            if declared.is_abstract() {
                parameters.push(Self::parameter(
                    ctx,
                    observed_signatures,
                    position,
                    None,
                    declared,
                ));
            } else {
                for (arg_position, arg_type) in declared.abstract_args() {
                    parameters.push(Self::parameter(
                        ctx,
                        observed_signatures,
                        position,
                        Some(arg_position),
                        arg_type,
                    ));
                }
            }
        }

        let can_fully_monomorphize = parameters
            .iter()
            .all(|p| !p.concrete_instantiations.is_empty());
        let required_variants = if parameters.is_empty() {
            0
        } else {
            parameters.iter().fold(1usize, |acc, p| {
                acc.saturating_mul(p.concrete_instantiations.len())
            })
        };

        MonomorphizationReport {
            parameters,
            can_fully_monomorphize,
            required_variants,
        }
    }

    fn parameter(
        ctx: &AnalysisContext,
        observed_signatures: &[MethodSignature],
        position: usize,
        arg_position: Option<usize>,
        declared: &Type,
    ) -> AbstractParameter {
        let mut observed: BTreeSet<Type> = declared
            .members()
            .iter()
            .filter(|m| m.is_concrete())
            .cloned()
            .collect();

        for sig in observed_signatures {
            let at_position = sig.parameter_types.get(position - 1);
            let candidate = match arg_position {
                None => at_position,
                Some(arg) => at_position.and_then(|ty| match ty {
                    Type::Container { args, .. } => args.get(arg),
                    _ => None,
                }),
            };
            if let Some(ty) = candidate {
                if ty.is_concrete() && ctx.hierarchy().intersects(ty, declared) {
                    observed.insert(ty.clone());
                }
            }
        }

        let (concrete_instantiations, source) = if !observed.is_empty() {
            (observed, InstantiationSource::Observed)
        } else {
            let suggested = suggestions(declared);
            if suggested.is_empty() {
                (suggested, InstantiationSource::Unresolved)
            } else {
                (suggested, InstantiationSource::Suggested)
            }
        };
        trace!(
            "param {position}{}: {declared} -> {} {source}",
            arg_position.map(|n| format!("[{n}]")).unwrap_or_default(),
            concrete_instantiations.len()
        );

        AbstractParameter {
            position,
            nested: arg_position,
            declared_type: declared.clone(),
            concrete_instantiations,
            source,
        }
    }
}

impl AnalysisPass for Monomorphization {
    type Output = MonomorphizationReport;

    fn name(&self) -> &'static str {
        "monomorphization"
    }

    fn run(&self, function: &Function, ctx: &AnalysisContext) -> Result<Self::Output> {
        let report = self.analyze_signature(&function.signature(), ctx);
        debug!(
            "{}: {} abstract positions, {} variants",
            function.name,
            report.parameters.len(),
            report.required_variants
        );
        Ok(report)
    }

    fn description(&self) -> &'static str {
        "Finds abstract-typed parameters and their concrete instantiation sets"
    }
}

/// Curated concrete members of common abstract categories.
fn suggestions(declared: &Type) -> BTreeSet<Type> {
    let Type::Abstract(name) = declared else {
        return BTreeSet::new();
    };
    let vector = |elem: Type| Type::container("Vector", vec![elem]);
    match name.as_str() {
        "Number" | "Real" => [Type::int(), Type::float()].into(),
        "Integer" | "Signed" => [Type::concrete("Int32"), Type::int()].into(),
        "AbstractFloat" => [Type::concrete("Float32"), Type::float()].into(),
        "AbstractArray" | "AbstractVector" => [vector(Type::float()), vector(Type::int())].into(),
        "AbstractString" => [Type::string()].into(),
        _ => BTreeSet::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::MethodTable;

    fn analyze(signature: &MethodSignature, ctx: &AnalysisContext) -> MonomorphizationReport {
        Monomorphization::new().analyze_signature(signature, ctx)
    }

    #[test]
    fn test_concrete_signature() {
        let sig = MethodSignature::new("f", vec![Type::int(), Type::float()]);
        let report = analyze(&sig, &AnalysisContext::new());
        assert!(report.is_empty());
        assert!(report.can_fully_monomorphize);
        assert_eq!(report.required_variants, 0);
    }

    #[test]
    fn test_cartesian_product() {
        let table: MethodTable = [
            MethodSignature::new("f", vec![Type::int(), Type::concrete("Int32")]),
            MethodSignature::new("f", vec![Type::float(), Type::concrete("Int16")]),
            MethodSignature::new("f", vec![Type::concrete("Float32"), Type::concrete("Int32")]),
        ]
        .into_iter()
        .collect();
        let ctx = AnalysisContext::new().with_methods(table);
        let sig = MethodSignature::new(
            "f",
            vec![Type::abstract_type("Real"), Type::abstract_type("Integer")],
        );

        let report = analyze(&sig, &ctx);
        assert_eq!(report.parameters.len(), 2);
        assert_eq!(report.parameters[0].concrete_instantiations.len(), 3);
        assert_eq!(report.parameters[1].concrete_instantiations.len(), 2);
        assert!(report
            .parameters
            .iter()
            .all(|p| p.source == InstantiationSource::Observed));
        assert_eq!(report.required_variants, 6);
        assert!(report.can_fully_monomorphize);
    }

    #[test]
    fn test_observations_outside_declared_type_are_ignored() {
        let table: MethodTable = [
            MethodSignature::new("f", vec![Type::string()]),
            MethodSignature::new("f", vec![Type::int()]),
        ]
        .into_iter()
        .collect();
        let ctx = AnalysisContext::new().with_methods(table);
        let sig = MethodSignature::new("f", vec![Type::abstract_type("Integer")]);

        let report = analyze(&sig, &ctx);
        assert_eq!(
            report.parameters[0].concrete_instantiations,
            BTreeSet::from([Type::int()])
        );
    }

    #[test]
    fn test_suggestions_and_unresolved() {
        let sig = MethodSignature::new(
            "g",
            vec![Type::abstract_type("AbstractFloat"), Type::Top],
        );
        let report = analyze(&sig, &AnalysisContext::new());
        assert_eq!(report.parameters[0].source, InstantiationSource::Suggested);
        assert_eq!(report.parameters[0].concrete_instantiations.len(), 2);
        assert_eq!(report.parameters[1].source, InstantiationSource::Unresolved);
        assert!(!report.can_fully_monomorphize);
        assert_eq!(report.required_variants, 0);
    }

    #[test]
    fn test_union_and_nested_container() {
        let sig = MethodSignature::new(
            "h",
            vec![
                Type::union([Type::int(), Type::float(), Type::string()]),
                Type::container("Vector", vec![Type::abstract_type("Real")]),
            ],
        );
        let report = analyze(&sig, &AnalysisContext::new());
        assert_eq!(report.parameters.len(), 2);

        let union = &report.parameters[0];
        assert_eq!(union.position, 1);
        assert_eq!(union.source, InstantiationSource::Observed);
        assert_eq!(union.concrete_instantiations.len(), 3);

        let nested = &report.parameters[1];
        assert_eq!(nested.position, 2);
        assert_eq!(nested.nested, Some(0));
        assert_eq!(nested.declared_type, Type::abstract_type("Real"));
        assert_eq!(nested.source, InstantiationSource::Suggested);
        assert_eq!(report.required_variants, 6);
    }

    #[test]
    fn test_nested_observations() {
        let table: MethodTable = [MethodSignature::new(
            "k",
            vec![Type::container("Vector", vec![Type::concrete("Float32")])],
        )]
        .into_iter()
        .collect();
        let ctx = AnalysisContext::new().with_methods(table);
        let sig = MethodSignature::new(
            "k",
            vec![Type::container("Vector", vec![Type::abstract_type("AbstractFloat")])],
        );
        let report = analyze(&sig, &ctx);
        assert_eq!(report.parameters[0].source, InstantiationSource::Observed);
        assert_eq!(
            report.parameters[0].concrete_instantiations,
            BTreeSet::from([Type::concrete("Float32")])
        );
    }
}
