use super::http::TransportError;
use crate::PathError;
use crate::store::StorageError;

/// Failure of a route calculation, or of loading/saving router options
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouterError {
    /// The query could not be solved, or the service answered with something
    /// that is not a usable route
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid router options: {0}")]
    InvalidOptions(String),

    /// Reserved for UI-driven cancellation by the embedding application
    #[error("canceled by the user")]
    UserCanceled,

    #[error("option storage error: {0}")]
    Storage(String),

    #[error("{0}")]
    Generic(String),
}

impl From<TransportError> for RouterError {
    fn from(err: TransportError) -> Self {
        RouterError::Network(err.to_string())
    }
}

impl From<StorageError> for RouterError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidValue { key, value } => {
                RouterError::InvalidOptions(format!("{key} = {value:?}"))
            }
            other => RouterError::Storage(other.to_string()),
        }
    }
}

impl From<PathError> for RouterError {
    fn from(err: PathError) -> Self {
        RouterError::Generic(err.to_string())
    }
}
