//! Immutable analysis context threaded through every pass.
//!
//! Everything the passes know beyond the IR itself lives here: the method table, the type
//! hierarchy and the allow-lists that classify callees. The context is built once by the
//! frontend, wrapped in an `Arc`, and shared read-only between all passes and all concurrent
//! `analyze` calls. There is no process-wide state anywhere in the engine.
//!
//! # Allow-lists
//!
//! | List | Meaning |
//! |------|---------|
//! | allocators | callee produces an allocation site ([`AllocatorRegistry`]) |
//! | safe reads | callee only reads its arguments and never retains them |
//! | releases | callee releases manually allocated memory |
//! | global stores | callee stores its arguments into global storage |
//!
//! Callees not on any list are unknown and assumed to capture every argument.
//!
//! The context may also carry the values of immutable globals. An immutable `GlobalRead` is
//! always a constant; its value only takes part in folding when the frontend supplied it.

mod allocators;
mod methods;

use std::collections::{HashMap, HashSet};

pub use allocators::{AllocationKind, AllocatorRegistry, AllocatorSpec, SizeRule};
pub use methods::MethodTable;

use crate::ir::{ConstValue, TypeHierarchy};

const SAFE_READS: &[&str] = &[
    "getindex",
    "length",
    "size",
    "sum",
    "prod",
    "maximum",
    "minimum",
    "first",
    "last",
    "isempty",
    "eltype",
    "ndims",
    "axes",
    "unsafe_load",
];

const RELEASES: &[&str] = &["free", "Libc.free", "release"];

const GLOBAL_STORES: &[&str] = &["setglobal!"];

/// Shared, read-only collaborator state for one or more analyses.
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    methods: MethodTable,
    hierarchy: TypeHierarchy,
    allocators: AllocatorRegistry,
    safe_reads: HashSet<String>,
    releases: HashSet<String>,
    global_stores: HashSet<String>,
    global_constants: HashMap<String, ConstValue>,
}

impl Default for AnalysisContext {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisContext {
    /// Creates a context with an empty method table and the builtin hierarchy and allow-lists.
    #[must_use]
    pub fn new() -> Self {
        Self {
            methods: MethodTable::new(),
            hierarchy: TypeHierarchy::builtin(),
            allocators: AllocatorRegistry::builtin(),
            safe_reads: SAFE_READS.iter().map(ToString::to_string).collect(),
            releases: RELEASES.iter().map(ToString::to_string).collect(),
            global_stores: GLOBAL_STORES.iter().map(ToString::to_string).collect(),
            global_constants: HashMap::new(),
        }
    }

    /// Replaces the method table.
    #[must_use]
    pub fn with_methods(mut self, methods: MethodTable) -> Self {
        self.methods = methods;
        self
    }

    /// Replaces the type hierarchy.
    #[must_use]
    pub fn with_hierarchy(mut self, hierarchy: TypeHierarchy) -> Self {
        self.hierarchy = hierarchy;
        self
    }

    /// Registers an additional allocation constructor.
    #[must_use]
    pub fn with_allocator(mut self, callee: impl Into<String>, spec: AllocatorSpec) -> Self {
        self.allocators.register(callee, spec);
        self
    }

    /// Adds a callee to the safe-read allow-list.
    #[must_use]
    pub fn with_safe_read(mut self, callee: impl Into<String>) -> Self {
        self.safe_reads.insert(callee.into());
        self
    }

    /// Adds a callee to the release allow-list.
    #[must_use]
    pub fn with_release(mut self, callee: impl Into<String>) -> Self {
        self.releases.insert(callee.into());
        self
    }

    /// Adds a callee to the global-store allow-list.
    #[must_use]
    pub fn with_global_store(mut self, callee: impl Into<String>) -> Self {
        self.global_stores.insert(callee.into());
        self
    }

    /// Records the value of an immutable global binding.
    #[must_use]
    pub fn with_global_constant(mut self, symbol: impl Into<String>, value: ConstValue) -> Self {
        self.global_constants.insert(symbol.into(), value);
        self
    }

    /// Returns the method table.
    #[must_use]
    pub fn methods(&self) -> &MethodTable {
        &self.methods
    }

    /// Returns the type hierarchy.
    #[must_use]
    pub fn hierarchy(&self) -> &TypeHierarchy {
        &self.hierarchy
    }

    /// Returns the allocation constructor entry for a callee.
    #[must_use]
    pub fn allocator(&self, callee: &str) -> Option<&AllocatorSpec> {
        self.allocators.get(callee)
    }

    /// Returns `true` if the callee only reads its arguments.
    #[must_use]
    pub fn is_safe_read(&self, callee: &str) -> bool {
        self.safe_reads.contains(callee)
    }

    /// Returns `true` if the callee releases manual memory.
    #[must_use]
    pub fn is_release(&self, callee: &str) -> bool {
        self.releases.contains(callee)
    }

    /// Returns `true` if the callee stores into global storage.
    #[must_use]
    pub fn is_global_store(&self, callee: &str) -> bool {
        self.global_stores.contains(callee)
    }

    /// Returns the known value of an immutable global.
    #[must_use]
    pub fn global_constant(&self, symbol: &str) -> Option<&ConstValue> {
        self.global_constants.get(symbol)
    }
}
