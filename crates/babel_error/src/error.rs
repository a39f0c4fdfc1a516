//! Top-level error wrapper types.

use crate::{
    ConfigError, DatabaseError, GenerationError, PipelineError, SafetyError, StorageError,
};

/// Every error condition the worker can surface.
///
/// # Examples
///
/// ```
/// use babel_error::{BabelError, SafetyError, SafetyErrorKind};
///
/// let unsafe_prompt = SafetyError::new(SafetyErrorKind::UnsafePrompt { matched: "knife".into() });
/// let err: BabelError = unsafe_prompt.into();
/// assert!(err.is_unsafe_prompt());
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum BabelErrorKind {
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Prompt rejected by the safety gate
    #[from(SafetyError)]
    Safety(SafetyError),
    /// Text, image or narration backend error
    #[from(GenerationError)]
    Generation(GenerationError),
    /// Blob storage error
    #[from(StorageError)]
    Storage(StorageError),
    /// Document store error
    #[from(DatabaseError)]
    Database(DatabaseError),
    /// Coordinator error
    #[from(PipelineError)]
    Pipeline(PipelineError),
}

impl BabelErrorKind {
    /// Human-readable cause without the source location suffix.
    ///
    /// This is the string recorded in the `error` field of failed jobs and stories.
    pub fn summary(&self) -> String {
        match self {
            BabelErrorKind::Config(e) => e.message.clone(),
            BabelErrorKind::Safety(e) => e.kind.to_string(),
            BabelErrorKind::Generation(e) => e.kind.to_string(),
            BabelErrorKind::Storage(e) => e.kind.to_string(),
            BabelErrorKind::Database(e) => e.kind.to_string(),
            BabelErrorKind::Pipeline(e) => e.kind.to_string(),
        }
    }
}

/// BabelBooks error with kind discrimination.
///
/// # Examples
///
/// ```
/// use babel_error::{BabelResult, ConfigError};
///
/// fn might_fail() -> BabelResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// let err = might_fail().unwrap_err();
/// assert_eq!(err.summary(), "Missing field");
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Babel Error: {}", _0)]
pub struct BabelError(Box<BabelErrorKind>);

impl BabelError {
    /// Create a new error from a kind.
    pub fn new(kind: BabelErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &BabelErrorKind {
        &self.0
    }

    /// Human-readable cause without location information.
    pub fn summary(&self) -> String {
        self.0.summary()
    }

    /// True when the error is an input rejection by the safety gate.
    pub fn is_unsafe_prompt(&self) -> bool {
        matches!(self.kind(), BabelErrorKind::Safety(_))
    }
}

// Generic From implementation for any type that converts to BabelErrorKind
impl<T> From<T> for BabelError
where
    T: Into<BabelErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for BabelBooks operations.
pub type BabelResult<T> = std::result::Result<T, BabelError>;
