//! Type annotations attached to SSA values and parameters.
//!
//! The frontend's type inference hands every SSA value a declared [`Type`]. The analyses only
//! need to answer a few questions about it: is it concrete (dispatch is static), is it abstract
//! (dispatch is dynamic, specialization may pay off), and what are its components.
//!
//! # Type Categories
//!
//! - **Top**: the universal supertype, nothing is known
//! - **Concrete**: a leaf type with a fixed layout (`Int64`, `Float64`, `String`)
//! - **Abstract**: a named interior node of the hierarchy (`Number`, `AbstractArray`)
//! - **Union**: one of several member types
//! - **Container**: a parameterized type such as `Vector{Float64}`
//!
//! Subtyping questions need a [`crate::ir::TypeHierarchy`]; this module only holds the
//! structural part.

use std::fmt;

use serde::Serialize;

/// Declared type of an SSA value, parameter or method-table receiver.
///
/// The ordering is structural and only exists so that types can live in ordered sets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Type {
    /// Universal supertype (`Any`).
    Top,
    /// A concrete leaf type.
    Concrete(String),
    /// A named abstract type.
    Abstract(String),
    /// Union of member types. Build through [`Type::union`] to keep it normalized.
    Union(Vec<Type>),
    /// A parameterized container type.
    Container {
        /// Container name, e.g. `Vector`
        name: String,
        /// Type arguments
        args: Vec<Type>,
    },
}

impl Type {
    /// Creates a concrete type.
    #[must_use]
    pub fn concrete(name: impl Into<String>) -> Self {
        Self::Concrete(name.into())
    }

    /// Creates an abstract type.
    #[must_use]
    pub fn abstract_type(name: impl Into<String>) -> Self {
        Self::Abstract(name.into())
    }

    /// Creates a container type.
    #[must_use]
    pub fn container(name: impl Into<String>, args: Vec<Type>) -> Self {
        Self::Container {
            name: name.into(),
            args,
        }
    }

    /// Creates a normalized union.
    ///
    /// Nested unions are flattened, members are sorted and deduplicated. A union containing
    /// [`Type::Top`] is `Top`, and a single remaining member is returned unwrapped.
    #[must_use]
    pub fn union(members: impl IntoIterator<Item = Type>) -> Self {
        let mut flat = Vec::new();
        for member in members {
            match member {
                Self::Top => return Self::Top,
                Self::Union(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        flat.sort();
        flat.dedup();

        match flat.len() {
            0 => Self::Top,
            1 => flat.remove(0),
            _ => Self::Union(flat),
        }
    }

    /// Shorthand for `Int64`.
    #[must_use]
    pub fn int() -> Self {
        Self::concrete("Int64")
    }

    /// Shorthand for `Float64`.
    #[must_use]
    pub fn float() -> Self {
        Self::concrete("Float64")
    }

    /// Shorthand for `Bool`.
    #[must_use]
    pub fn bool() -> Self {
        Self::concrete("Bool")
    }

    /// Shorthand for `String`.
    #[must_use]
    pub fn string() -> Self {
        Self::concrete("String")
    }

    /// Shorthand for `Nothing`, the type of statements producing no useful value.
    #[must_use]
    pub fn nothing() -> Self {
        Self::concrete("Nothing")
    }

    /// Returns `true` if values of this type have a single statically known runtime type.
    ///
    /// A container is concrete when all of its type arguments are.
    #[must_use]
    pub fn is_concrete(&self) -> bool {
        match self {
            Self::Concrete(_) => true,
            Self::Container { args, .. } => args.iter().all(Type::is_concrete),
            Self::Top | Self::Abstract(_) | Self::Union(_) => false,
        }
    }

    /// Returns `true` if this type is `Top`, abstract or a union.
    ///
    /// Containers are not abstract themselves even when their arguments are; see
    /// [`Type::abstract_args`] for the nested positions.
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        matches!(self, Self::Top | Self::Abstract(_) | Self::Union(_))
    }

    /// Returns the positions and types of abstract type arguments, one level deep.
    #[must_use]
    pub fn abstract_args(&self) -> Vec<(usize, &Type)> {
        match self {
            Self::Container { args, .. } => args
                .iter()
                .enumerate()
                .filter(|(_, arg)| arg.is_abstract())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Returns the name of a concrete, abstract or container type.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Concrete(name) | Self::Abstract(name) | Self::Container { name, .. } => {
                Some(name)
            }
            Self::Top | Self::Union(_) => None,
        }
    }

    /// Returns the union members, or the type itself for anything else.
    #[must_use]
    pub fn members(&self) -> &[Type] {
        match self {
            Self::Union(members) => members,
            other => std::slice::from_ref(other),
        }
    }

    /// Returns the element type of a single-argument container.
    #[must_use]
    pub fn element_type(&self) -> Option<&Type> {
        match self {
            Self::Container { args, .. } => args.first(),
            _ => None,
        }
    }

    /// Returns the size in bytes of a fixed-size primitive, if known.
    #[must_use]
    pub fn size_bytes(&self) -> Option<u64> {
        match self.name()? {
            "Bool" | "Int8" | "UInt8" => Some(1),
            "Int16" | "UInt16" | "Float16" => Some(2),
            "Int32" | "UInt32" | "Float32" | "Char" => Some(4),
            "Int64" | "UInt64" | "Float64" | "Ptr" => Some(8),
            "Int128" | "UInt128" | "ComplexF64" => Some(16),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Top => write!(f, "Any"),
            Self::Concrete(name) | Self::Abstract(name) => write!(f, "{name}"),
            Self::Union(members) => {
                write!(f, "Union{{")?;
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{member}")?;
                }
                write!(f, "}}")
            }
            Self::Container { name, args } => {
                write!(f, "{name}{{")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, "}}")
            }
        }
    }
}
