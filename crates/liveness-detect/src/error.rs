/// Errors from the detection pipeline.
///
/// Finding no face is not an error; these cover broken input and broken
/// backends only.
#[derive(Debug, thiserror::Error)]
pub enum DetectError {
    /// The frame's pixel buffer does not match its declared size.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    /// The detection backend failed.
    #[error("detector failed: {0}")]
    Backend(String),
}
