use bridge_traits::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PushError {
    #[error("Push configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Device is already registered for this user and tag set")]
    AlreadyRegistered,

    #[error("Device is not registered")]
    NotRegistered,

    /// The backend could not be reached or sent nothing back.
    #[error("No response from push backend: {0}")]
    Transport(String),

    /// The backend answered but without a usable entity.
    #[error("Unknown result from push backend: {0}")]
    UnknownResult(String),

    #[error("Push backend returned status {status_code}: {}", backend_detail(.error, .description))]
    Backend {
        status_code: u16,
        error: Option<String>,
        description: Option<String>,
    },

    #[error("Platform push provider failed: {0}")]
    Platform(String),

    #[error("Registration state storage failed: {0}")]
    Storage(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),
}

fn backend_detail(error: &Option<String>, description: &Option<String>) -> String {
    match (error, description) {
        (Some(error), Some(description)) => format!("{} ({})", error, description),
        (Some(error), None) => error.clone(),
        (None, Some(description)) => description.clone(),
        (None, None) => "no details".to_string(),
    }
}

impl PushError {
    /// HTTP status attached to the error, if the backend answered.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            PushError::Backend { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    /// Whether another registration attempt may succeed.
    ///
    /// Server errors (5xx) and failures without any status are retryable;
    /// any other status and every local failure is terminal.
    pub fn is_retryable(&self) -> bool {
        match self {
            PushError::Backend { status_code, .. } => (500..=599).contains(status_code),
            PushError::Transport(_) | PushError::UnknownResult(_) => true,
            _ => false,
        }
    }

    pub(crate) fn storage(err: BridgeError) -> Self {
        PushError::Storage(err.to_string())
    }

    pub(crate) fn platform(err: BridgeError) -> Self {
        PushError::Platform(err.to_string())
    }
}

impl From<serde_json::Error> for PushError {
    fn from(err: serde_json::Error) -> Self {
        PushError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PushError>;
