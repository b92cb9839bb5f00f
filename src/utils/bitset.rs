//! A compact set of statement indices.
//!
//! Passes mark join points (the targets of live jumps) while they scan a function. Statement
//! indices are dense and 1-based, so one bit per statement is all that is needed.
//!
//! # Example
//!
//! ```rust,ignore
//! use optscope::utils::StatementSet;
//!
//! let mut targets = StatementSet::new(12);
//! targets.insert(1);
//! targets.insert(12);
//!
//! assert!(targets.contains(12));
//! assert!(!targets.contains(2));
//! assert!(!targets.contains(13));
//! ```

use crate::ir::StmtIndex;

/// A bit vector over the statements `1..=len` of one function.
///
/// Indices outside that range are never members: `insert` ignores them and `contains`
/// answers `false`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatementSet {
    /// The bits, stored as a vector of words. Bit `i` is statement `i + 1`.
    words: Vec<u64>,
    /// The number of statements covered.
    len: usize,
}

impl StatementSet {
    /// Creates an empty set covering statements `1..=len`.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(64)],
            len,
        }
    }

    /// Adds a statement. Returns `true` if it was not present before.
    pub fn insert(&mut self, idx: StmtIndex) -> bool {
        let Some((word, bit)) = self.slot(idx) else {
            return false;
        };
        let old = self.words[word];
        self.words[word] |= 1u64 << bit;
        old != self.words[word]
    }

    /// Returns `true` if the statement is in the set.
    #[must_use]
    pub fn contains(&self, idx: StmtIndex) -> bool {
        self.slot(idx)
            .is_some_and(|(word, bit)| self.words[word] & (1u64 << bit) != 0)
    }

    fn slot(&self, idx: StmtIndex) -> Option<(usize, usize)> {
        let bit = idx.checked_sub(1).filter(|&b| b < self.len)?;
        Some((bit / 64, bit % 64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_set_basic() {
        let mut set = StatementSet::new(100);
        assert!(!set.contains(1));

        assert!(set.insert(1));
        assert!(set.insert(64));
        assert!(set.insert(65));
        assert!(set.insert(100));
        assert!(!set.insert(100));

        assert!(set.contains(1));
        assert!(set.contains(64));
        assert!(set.contains(65));
        assert!(set.contains(100));
        assert!(!set.contains(2));
        assert!(!set.contains(66));
    }

    #[test]
    fn test_statement_set_out_of_range() {
        let mut set = StatementSet::new(3);
        assert!(!set.insert(0));
        assert!(!set.insert(4));
        assert!(!set.contains(0));
        assert!(!set.contains(4));
        assert_eq!(set, StatementSet::new(3));
    }

    #[test]
    fn test_statement_set_empty_function() {
        let mut set = StatementSet::new(0);
        assert!(!set.insert(1));
        assert!(!set.contains(1));
    }
}
