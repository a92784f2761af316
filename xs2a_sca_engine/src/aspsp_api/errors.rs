use thiserror::Error;

use crate::traits::ConsentManagementError;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AspspApiError {
    #[error("Consent management error: {0}")]
    BackendError(#[from] ConsentManagementError),
    #[error("The PSU has no identifying data")]
    EmptyPsu,
    #[error("A TPP can only be blocked for a positive duration")]
    InvalidBlockDuration,
}
