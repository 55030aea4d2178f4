/// Errors raised while painting.
#[derive(Debug, thiserror::Error)]
pub enum DisplayError {
    /// The surface refused to paint, for example after losing its
    /// graphics context.
    #[error("surface error: {0}")]
    Surface(String),
}
