use thiserror::Error;

/// Errors raised while decoding or segmenting an EDR recording.
#[derive(Error, Debug)]
pub enum EdrError {
    /// The bytes (or file name) do not form a valid EDR recording.
    #[error("EDR format error: {0}")]
    Format(String),

    /// The caller asked for something the recording cannot satisfy.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl EdrError {
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        EdrError::Format(msg.into())
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        EdrError::InvalidArgument(msg.into())
    }

    /// Whether the error is the caller's input rather than the environment.
    ///
    /// Malformed JSON or CSV counts as input; failing to read it does not.
    pub fn is_input_error(&self) -> bool {
        match self {
            EdrError::Format(_) | EdrError::InvalidArgument(_) => true,
            EdrError::Json(e) => !e.is_io(),
            EdrError::Csv(e) => !e.is_io_error(),
            EdrError::Io(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, EdrError>;
