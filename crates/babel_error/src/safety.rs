//! Content safety error types.

/// Why a prompt was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum SafetyErrorKind {
    /// Prompt matched a banned term
    #[display("Prompt contains inappropriate content ({})", matched)]
    UnsafePrompt {
        /// The term that matched
        matched: String,
    },
    /// Banned-term policy could not be compiled
    #[display("Invalid safety policy: {}", _0)]
    InvalidPolicy(String),
}

/// Safety error with location tracking.
///
/// # Examples
///
/// ```
/// use babel_error::{SafetyError, SafetyErrorKind};
///
/// let err = SafetyError::new(SafetyErrorKind::UnsafePrompt { matched: "knife".into() });
/// assert!(format!("{}", err).contains("inappropriate"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Safety Error: {} at line {} in {}", kind, line, file)]
pub struct SafetyError {
    /// The kind of error that occurred
    pub kind: SafetyErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl SafetyError {
    /// Create a new safety error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: SafetyErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
