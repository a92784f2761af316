use crate::{
    traits::{ConsentManagementError, CreatePiisConsentRequest},
    xs2a_types::{AisConsent, CommonPayment, PiisConsent, PsuIdData},
};

/// Read-only export queries for the ASPSP.
#[allow(async_fn_in_trait)]
pub trait ConsentExport {
    async fn export_ais_consents_by_tpp(&self, tpp_authorisation_number: &str)
        -> Result<Vec<AisConsent>, ConsentManagementError>;

    /// All AIS consents where `psu` is one of the consent's PSUs.
    async fn export_ais_consents_by_psu(&self, psu: &PsuIdData) -> Result<Vec<AisConsent>, ConsentManagementError>;

    async fn export_piis_consents_by_psu(&self, psu: &PsuIdData) -> Result<Vec<PiisConsent>, ConsentManagementError>;

    async fn export_payments_by_psu(&self, psu: &PsuIdData) -> Result<Vec<CommonPayment>, ConsentManagementError>;
}

/// PIIS consents are created by the ASPSP on the PSU's behalf rather than requested by a TPP.
#[allow(async_fn_in_trait)]
pub trait PiisConsentManagement {
    async fn create_piis_consent(&self, request: CreatePiisConsentRequest) -> Result<PiisConsent, ConsentManagementError>;

    /// Marks the consent as terminated by the ASPSP. Returns false if the consent was already finalised.
    async fn terminate_piis_consent(&self, consent_id: &str) -> Result<bool, ConsentManagementError>;
}
