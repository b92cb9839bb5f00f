//! Allocation-constructor allow-list.
//!
//! A `Call` is an allocation site only if its callee is registered here. Each entry says what
//! kind of memory the call produces and how to estimate its size from the call's arguments.

use std::collections::HashMap;

use serde::Serialize;
use strum::Display;

/// What kind of memory an allocation site produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AllocationKind {
    /// Managed array storage.
    Array,
    /// Managed string storage.
    String,
    /// Managed struct / boxed object.
    Struct,
    /// Explicitly allocated memory that must be released by hand.
    Manual,
}

/// How the byte size of an allocation is derived from its call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeRule {
    /// Always the same number of bytes.
    Fixed(u64),
    /// Element size times the product of the dimension arguments starting at `first_dim`.
    ///
    /// With `element_bytes == None` the element size comes from the result type's element
    /// type, and the size is unknown if that type has no fixed size.
    Elements {
        /// Bytes per element, if fixed by the constructor
        element_bytes: Option<u64>,
        /// 0-based position of the first dimension argument
        first_dim: usize,
    },
    /// Product of all arguments, interpreted as a byte count (`malloc`, `calloc`).
    Bytes,
    /// Total length of the constant string arguments.
    StringLength,
    /// The size cannot be estimated.
    Unknown,
}

/// One allow-list entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocatorSpec {
    /// Memory kind produced
    pub kind: AllocationKind,
    /// Size estimation rule
    pub size: SizeRule,
}

impl AllocatorSpec {
    /// Creates a new allow-list entry.
    #[must_use]
    pub const fn new(kind: AllocationKind, size: SizeRule) -> Self {
        Self { kind, size }
    }

    /// Array constructor whose arguments are all dimensions.
    #[must_use]
    pub const fn array(element_bytes: Option<u64>) -> Self {
        Self::new(
            AllocationKind::Array,
            SizeRule::Elements {
                element_bytes,
                first_dim: 0,
            },
        )
    }

    /// Manual allocator whose arguments multiply to a byte count.
    #[must_use]
    pub const fn manual() -> Self {
        Self::new(AllocationKind::Manual, SizeRule::Bytes)
    }
}

/// Registry of allocation constructors keyed by callee symbol.
#[derive(Debug, Clone, Default)]
pub struct AllocatorRegistry {
    specs: HashMap<String, AllocatorSpec>,
}

impl AllocatorRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the builtin array, string, struct and manual constructors.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for name in ["zeros", "ones", "rand", "Array", "Vector", "Matrix"] {
            registry.register(name, AllocatorSpec::array(None));
        }
        registry.register(
            "fill",
            AllocatorSpec::new(
                AllocationKind::Array,
                SizeRule::Elements {
                    element_bytes: None,
                    first_dim: 1,
                },
            ),
        );
        for name in ["similar", "collect", "copy", "vcat", "hcat"] {
            registry.register(name, AllocatorSpec::new(AllocationKind::Array, SizeRule::Unknown));
        }
        registry.register(
            "string",
            AllocatorSpec::new(AllocationKind::String, SizeRule::StringLength),
        );
        for name in ["repeat", "join"] {
            registry.register(name, AllocatorSpec::new(AllocationKind::String, SizeRule::Unknown));
        }
        registry.register("Ref", AllocatorSpec::new(AllocationKind::Struct, SizeRule::Fixed(16)));
        for name in ["malloc", "calloc", "Libc.malloc", "Libc.calloc", "allocate"] {
            registry.register(name, AllocatorSpec::manual());
        }
        registry
    }

    /// Registers or replaces a constructor.
    pub fn register(&mut self, callee: impl Into<String>, spec: AllocatorSpec) {
        self.specs.insert(callee.into(), spec);
    }

    /// Returns the entry for a callee, if it is an allocation constructor.
    #[must_use]
    pub fn get(&self, callee: &str) -> Option<&AllocatorSpec> {
        self.specs.get(callee)
    }
}
