use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A requested font file or family could not be read or parsed.
    #[error("font unavailable: {0}")]
    FontUnavailable(String),

    #[error("topic must not be empty")]
    EmptyTopic,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
