//! Nominal type hierarchy used for subtype and intersection queries.
//!
//! The hierarchy is a forest of named types, each with at most one parent; anything without a
//! recorded parent hangs directly below `Top`. It is supplied by the frontend together with the
//! method table, and [`TypeHierarchy::builtin`] seeds the usual numeric, string and array tower.
//!
//! Two questions are answered here:
//!
//! - [`TypeHierarchy::is_subtype`] is a *proof*: `true` only when every value of the first type
//!   is a value of the second.
//! - [`TypeHierarchy::intersects`] is a *possibility*: `false` only when the two types provably
//!   share no value. Unknown names therefore intersect everything except distinct concrete types.

use std::collections::HashMap;

use crate::ir::Type;

/// Parent links between named types.
#[derive(Debug, Clone, Default)]
pub struct TypeHierarchy {
    /// Map from type name to its direct supertype name.
    parents: HashMap<String, String>,
}

impl TypeHierarchy {
    /// Creates an empty hierarchy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a hierarchy seeded with the builtin numeric, string, array and dict types.
    #[must_use]
    pub fn builtin() -> Self {
        let mut hierarchy = Self::new();
        let edges: &[(&str, &str)] = &[
            ("Real", "Number"),
            ("Complex", "Number"),
            ("Integer", "Real"),
            ("AbstractFloat", "Real"),
            ("Signed", "Integer"),
            ("Unsigned", "Integer"),
            ("Bool", "Integer"),
            ("Int8", "Signed"),
            ("Int16", "Signed"),
            ("Int32", "Signed"),
            ("Int64", "Signed"),
            ("Int128", "Signed"),
            ("UInt8", "Unsigned"),
            ("UInt16", "Unsigned"),
            ("UInt32", "Unsigned"),
            ("UInt64", "Unsigned"),
            ("UInt128", "Unsigned"),
            ("Float16", "AbstractFloat"),
            ("Float32", "AbstractFloat"),
            ("Float64", "AbstractFloat"),
            ("String", "AbstractString"),
            ("Char", "AbstractChar"),
            ("AbstractVector", "AbstractArray"),
            ("AbstractMatrix", "AbstractArray"),
            ("DenseArray", "AbstractArray"),
            ("Array", "DenseArray"),
            ("Vector", "AbstractVector"),
            ("Matrix", "AbstractMatrix"),
            ("Dict", "AbstractDict"),
        ];
        for (child, parent) in edges {
            hierarchy.insert(*child, *parent);
        }
        hierarchy
    }

    /// Records `child` as a direct subtype of `parent`.
    ///
    /// Re-inserting a child replaces its previous parent.
    pub fn insert(&mut self, child: impl Into<String>, parent: impl Into<String>) {
        self.parents.insert(child.into(), parent.into());
    }

    /// Returns the direct supertype of a named type.
    #[must_use]
    pub fn parent(&self, name: &str) -> Option<&str> {
        self.parents.get(name).map(String::as_str)
    }

    /// Returns `true` if the name appears anywhere in the hierarchy.
    #[must_use]
    pub fn knows(&self, name: &str) -> bool {
        self.parents.contains_key(name) || self.parents.values().any(|p| p == name)
    }

    /// Returns `true` if `child` equals `ancestor` or reaches it through parent links.
    #[must_use]
    pub fn is_named_subtype(&self, child: &str, ancestor: &str) -> bool {
        let mut current = child;
        // Bounded walk, a malformed cyclic hierarchy must not hang the analysis
        for _ in 0..=self.parents.len() {
            if current == ancestor {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
        false
    }

    /// Returns `true` if `sub` is provably a subtype of `sup`.
    #[must_use]
    pub fn is_subtype(&self, sub: &Type, sup: &Type) -> bool {
        match (sub, sup) {
            (_, Type::Top) => true,
            (Type::Top, _) => false,
            (Type::Union(members), _) => members.iter().all(|m| self.is_subtype(m, sup)),
            (_, Type::Union(members)) => members.iter().any(|m| self.is_subtype(sub, m)),
            (Type::Concrete(a) | Type::Abstract(a), Type::Concrete(b)) => a == b,
            (Type::Concrete(a) | Type::Abstract(a), Type::Abstract(b)) => {
                self.is_named_subtype(a, b)
            }
            (Type::Container { name, .. }, Type::Abstract(b)) => self.is_named_subtype(name, b),
            (
                Type::Container { name, args },
                Type::Container {
                    name: sup_name,
                    args: sup_args,
                },
            ) => {
                self.is_named_subtype(name, sup_name)
                    && (sup_args.is_empty()
                        || (args.len() == sup_args.len()
                            && args
                                .iter()
                                .zip(sup_args)
                                .all(|(a, b)| self.is_subtype(a, b))))
            }
            (Type::Container { .. }, Type::Concrete(_))
            | (Type::Concrete(_) | Type::Abstract(_), Type::Container { .. }) => false,
        }
    }

    /// Returns `false` only if the two types provably have no value in common.
    ///
    /// This is the containment test used for candidate selection: two named types intersect
    /// when either is an ancestor of the other, or when the hierarchy cannot tell.
    #[must_use]
    pub fn intersects(&self, a: &Type, b: &Type) -> bool {
        match (a, b) {
            (Type::Top, _) | (_, Type::Top) => true,
            (Type::Union(members), other) | (other, Type::Union(members)) => {
                members.iter().any(|m| self.intersects(m, other))
            }
            (Type::Concrete(x), Type::Concrete(y)) => x == y,
            (Type::Concrete(x), Type::Abstract(y)) | (Type::Abstract(y), Type::Concrete(x)) => {
                self.names_related(x, y)
            }
            (Type::Abstract(x), Type::Abstract(y)) => self.names_related(x, y),
            (Type::Container { name, .. }, Type::Abstract(y))
            | (Type::Abstract(y), Type::Container { name, .. }) => self.names_related(name, y),
            (Type::Container { name, .. }, Type::Concrete(x))
            | (Type::Concrete(x), Type::Container { name, .. }) => name == x,
            (
                Type::Container { name: n1, args: a1 },
                Type::Container { name: n2, args: a2 },
            ) => {
                self.names_related(n1, n2)
                    && (a1.len() != a2.len()
                        || a1.iter().zip(a2).all(|(x, y)| self.intersects(x, y)))
            }
        }
    }

    /// Ancestor relation in either direction, or unknown.
    fn names_related(&self, x: &str, y: &str) -> bool {
        if x == y {
            return true;
        }
        if !self.knows(x) || !self.knows(y) {
            return true;
        }
        self.is_named_subtype(x, y) || self.is_named_subtype(y, x)
    }
}
