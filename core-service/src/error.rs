use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Blocking call made from inside an async runtime; use the async API instead")]
    BlockingInAsyncContext,

    #[error("No async runtime available to run background work")]
    NoRuntime,

    #[error("Background task failed: {0}")]
    TaskFailed(String),

    #[error("Push error: {0}")]
    Push(#[from] core_push::PushError),

    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),
}

impl CoreError {
    /// The underlying push error, if this is one.
    pub fn as_push(&self) -> Option<&core_push::PushError> {
        match self {
            CoreError::Push(err) => Some(err),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
