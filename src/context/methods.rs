//! Read-only method table collaborator.

use std::collections::HashMap;

use crate::ir::MethodSignature;

/// Map from callee symbol to the method signatures registered under it.
///
/// The frontend fills this in before analysis starts. Passes only ever read it, so one table
/// can back any number of concurrent `analyze` calls.
#[derive(Debug, Clone, Default)]
pub struct MethodTable {
    methods: HashMap<String, Vec<MethodSignature>>,
}

impl MethodTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a method under its own name. Duplicate signatures are ignored.
    pub fn register(&mut self, signature: MethodSignature) {
        let entry = self.methods.entry(signature.name.clone()).or_default();
        if !entry.contains(&signature) {
            entry.push(signature);
        }
    }

    /// Returns the signatures registered for a symbol, or `None` if the symbol is unknown.
    #[must_use]
    pub fn lookup(&self, symbol: &str) -> Option<&[MethodSignature]> {
        self.methods.get(symbol).map(Vec::as_slice)
    }

    /// Returns the number of distinct symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Returns `true` if no method is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

impl FromIterator<MethodSignature> for MethodTable {
    fn from_iter<I: IntoIterator<Item = MethodSignature>>(iter: I) -> Self {
        let mut table = Self::new();
        for signature in iter {
            table.register(signature);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Type;

    #[test]
    fn test_register_and_lookup() {
        let table: MethodTable = [
            MethodSignature::new("area", vec![Type::concrete("Circle")]),
            MethodSignature::new("area", vec![Type::concrete("Square")]),
            MethodSignature::new("area", vec![Type::concrete("Square")]),
            MethodSignature::new("perimeter", vec![Type::concrete("Square")]),
        ]
        .into_iter()
        .collect();

        assert_eq!(table.len(), 2);
        assert_eq!(table.lookup("area").map(<[_]>::len), Some(2));
        assert!(table.lookup("volume").is_none());
    }
}
