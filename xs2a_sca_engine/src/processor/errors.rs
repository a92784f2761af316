use thiserror::Error;

use crate::{
    traits::ConsentManagementError,
    xs2a_types::{ScaApproach, ScaStatus, ServiceType},
};

/// Errors that escape the processor. Expected business failures are reported inside the response instead.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthorisationProcessorError {
    #[error("This SCA status is not supported by this processor: {0}")]
    UnsupportedScaStatus(ScaStatus),
    #[error("{service_type} authorisation service was not found for approach {approach}")]
    ServiceNotFound { service_type: ServiceType, approach: ScaApproach },
    #[error("Could not persist the authorisation. {0}")]
    AuthorisationUpdate(#[from] ConsentManagementError),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApproachRegistryError {
    #[error("No handler was supplied for the supported SCA approach {0}")]
    MissingHandler(ScaApproach),
    #[error("More than one handler was supplied for the SCA approach {0}")]
    DuplicateHandler(ScaApproach),
}
