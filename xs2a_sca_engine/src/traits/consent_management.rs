use thiserror::Error;

use crate::xs2a_types::{ConsentStatus, ScaStatus, TransactionStatus};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConsentManagementError {
    #[error("Backend error: {0}")]
    BackendError(String),
    #[error("The consent does not exist: {0}")]
    ConsentNotFound(String),
    #[error("The payment does not exist: {0}")]
    PaymentNotFound(String),
    #[error("The authorisation does not exist: {0}")]
    AuthorisationNotFound(String),
    #[error("Consent {id} is {status} and cannot be changed")]
    ConsentFinalised { id: String, status: ConsentStatus },
    #[error("Payment {id} is {status} and cannot be changed")]
    PaymentFinalised { id: String, status: TransactionStatus },
    #[error("Authorisation {id} is {status} and cannot be changed")]
    AuthorisationFinalised { id: String, status: ScaStatus },
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Consent lookups and mutations for consents of type `C`.
#[allow(async_fn_in_trait)]
pub trait ConsentManagement<C> {
    /// Fetch the consent with the given id. If the consent does not exist, `Ok(None)` is returned.
    async fn fetch_consent(&self, consent_id: &str) -> Result<Option<C>, ConsentManagementError>;

    async fn update_consent_status(&self, consent_id: &str, status: ConsentStatus)
        -> Result<(), ConsentManagementError>;

    async fn update_multilevel_sca_required(
        &self,
        consent_id: &str,
        multilevel_sca_required: bool,
    ) -> Result<(), ConsentManagementError>;

    /// Revoke the consents that the newly authorised consent with id `new_consent_id` supersedes: earlier,
    /// non-finalised consents issued to the same TPP for exactly the same PSUs. One-off consents supersede nothing.
    ///
    /// Returns the ids of the consents that changed status. Running this twice changes nothing the second time.
    async fn find_and_terminate_old_consents(&self, new_consent_id: &str)
        -> Result<Vec<String>, ConsentManagementError>;
}
