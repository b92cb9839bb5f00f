use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Only two situations produce an error. Ingestion validation rejects IR that breaks the
/// structural invariants the frontend is supposed to guarantee, and individual passes may fail
/// internally. Pass failures never reach the caller of [`crate::Analyzer::analyze`]; the
/// aggregator turns them into an unavailable report section instead.
///
/// # Error Categories
///
/// ## Precondition Violations
/// - [`Error::Empty`] - Function without any statements
/// - [`Error::DanglingReference`] - SSA operand pointing outside the statement sequence
/// - [`Error::NotAValue`] - SSA operand pointing at a statement that defines no value
/// - [`Error::InvalidArgument`] - Parameter operand beyond the declared parameter list
/// - [`Error::InvalidJumpTarget`] - Branch or jump target outside the statement sequence
///
/// ## Analysis Errors
/// - [`Error::Malformed`] - Inconsistent IR detected while a pass was running
/// - [`Error::Error`] - Miscellaneous failure
///
/// # Examples
///
/// ```rust
/// use optscope::{Error, FunctionBuilder, Operand};
///
/// let mut builder = FunctionBuilder::new("broken");
/// builder.ret(Some(Operand::Value(7)));
///
/// match builder.build() {
///     Err(Error::DanglingReference { statement, reference }) => {
///         assert_eq!((statement, reference), (1, 7));
///     }
///     other => panic!("unexpected result: {other:?}"),
/// }
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The function body contains no statements.
    #[error("Function '{0}' has an empty body")]
    Empty(String),

    /// An SSA operand references an index outside `1..=len`, or the statement itself.
    #[error("Statement #{statement} references undefined value #{reference}")]
    DanglingReference {
        /// Index of the statement holding the operand
        statement: usize,
        /// The referenced SSA value
        reference: usize,
    },

    /// An SSA operand references a branch, jump or return, which define no value.
    #[error("Statement #{statement} references #{reference}, which defines no value")]
    NotAValue {
        /// Index of the statement holding the operand
        statement: usize,
        /// The referenced statement
        reference: usize,
    },

    /// A parameter operand names a position the function does not declare.
    #[error("Statement #{statement} references parameter {position} of {count}")]
    InvalidArgument {
        /// Index of the statement holding the operand
        statement: usize,
        /// The 1-based parameter position
        position: usize,
        /// Number of declared parameters
        count: usize,
    },

    /// A branch or jump targets an index outside the statement sequence.
    #[error("Statement #{statement} jumps to out-of-range target #{target}")]
    InvalidJumpTarget {
        /// Index of the branch or jump
        statement: usize,
        /// The offending target
        target: usize,
    },

    /// The IR is inconsistent in a way validation did not catch.
    ///
    /// Carries the source location where the problem was detected.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// Generic error for miscellaneous failures.
    #[error("{0}")]
    Error(String),
}
