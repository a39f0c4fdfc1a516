//! Job pipeline error types.

/// Coordinator-level error conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum PipelineErrorKind {
    /// No job exists for the given identifier
    #[display("Job not found: {}", _0)]
    JobNotFound(String),
    /// No story exists for the given identifier
    #[display("Story not found: {}", _0)]
    StoryNotFound(String),
    /// Story is already completed and must not be mutated
    #[display("Story {} is already completed", _0)]
    StoryCompleted(String),
    /// Page arrived before the story's text metadata was saved
    #[display("Story {} has no metadata yet", _0)]
    MetadataMissing(String),
    /// Page would break the dense 1..N numbering of a story
    #[display("Page {} is out of range for story with {} pages", page, total)]
    PageOutOfRange {
        /// Offending page number
        page: u32,
        /// Stored total page count
        total: u32,
    },
}

/// Pipeline error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Pipeline Error: {} at line {} in {}", kind, line, file)]
pub struct PipelineError {
    /// The kind of error that occurred
    pub kind: PipelineErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl PipelineError {
    /// Create a new pipeline error with caller location tracking.
    #[track_caller]
    pub fn new(kind: PipelineErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
