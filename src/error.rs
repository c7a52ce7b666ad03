use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy for the client core.
///
/// `Network` covers transport failures and non-success HTTP statuses;
/// `RemoteJobFailed` is the job itself ending in a failure state, which
/// is not a transport problem.
#[derive(Debug, Error)]
pub enum Error {
    #[error("network failure: {message}")]
    Network { message: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("not ready: {0}")]
    NotReady(String),

    /// The locally cached generation parameters are gone; the action
    /// must be refused and the user pointed back to document analysis.
    #[error("context lost: {0}")]
    ContextLost(String),

    #[error("job {job_id} failed: {message}")]
    RemoteJobFailed { job_id: String, message: String },
}

impl Error {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            message: err.to_string(),
        }
    }
}
