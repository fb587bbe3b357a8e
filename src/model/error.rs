use super::PatientId;

/// Classification of a failed retrieval, kept in the `Failed` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    NotFound,
    Server,
    Unknown,
}

impl ErrorKind {
    pub fn title(self) -> &'static str {
        match self {
            ErrorKind::Network => "Network error",
            ErrorKind::NotFound => "Patient not found",
            ErrorKind::Server => "Server error",
            ErrorKind::Unknown => "Unexpected error",
        }
    }

    pub fn user_message(self) -> &'static str {
        match self {
            ErrorKind::Network => {
                "Unable to reach the imaging service. Check your connection and try again."
            }
            ErrorKind::NotFound => "No patient record was found for this identifier.",
            ErrorKind::Server => "The imaging service reported an error. Please try again later.",
            ErrorKind::Unknown => "An unexpected error occurred while loading CT studies.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RetrievalError {
    #[error("imaging service unreachable: {0}")]
    Network(String),
    #[error("no patient record for {0}")]
    NotFound(PatientId),
    #[error("imaging service fault (status {status}): {message}")]
    Server { status: u16, message: String },
    #[error("unexpected retrieval failure: {0}")]
    Unknown(String),
}

impl RetrievalError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RetrievalError::Network(_) => ErrorKind::Network,
            RetrievalError::NotFound(_) => ErrorKind::NotFound,
            RetrievalError::Server { .. } => ErrorKind::Server,
            RetrievalError::Unknown(_) => ErrorKind::Unknown,
        }
    }
}
