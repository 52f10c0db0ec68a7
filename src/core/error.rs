use thiserror::Error;

/// Terminal outcome of a failed generation attempt. The display string is
/// exactly what the error view shows the user.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    #[error("Your prompt was flagged for potentially unsafe content. Please try a different story.")]
    ContentRejected,

    #[error("{0}")]
    ScriptGenerationFailed(String),

    #[error("{0}")]
    IllustrationFailed(String),

    /// Anything outside the three pipeline categories, e.g. a transport
    /// failure during the safety call.
    #[error("{0}")]
    Unknown(String),
}
