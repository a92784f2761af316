use xs2a_common::Secret;

use crate::{
    config::AspspSettings,
    processor::{consent_processor::ConsentAuthorisationFlow, ConsentAuthorisationProcessor},
    spi::{
        AisConsentSpi,
        SpiAuthorisationDecoupledScaResponse,
        SpiAuthorizationCodeResult,
        SpiAvailableScaMethodsResponse,
        SpiContextData,
        SpiPsuAuthorisationResponse,
        SpiResponse,
        SpiScaConfirmation,
        SpiStartAuthorisationResponse,
        SpiVerifyScaAuthorisationResponse,
    },
    traits::{ConsentManagement, ConsentManagementError},
    xs2a_types::{AisConsent, AisConsentRequestType, ConsentStatus, PsuIdData, ScaApproach, ScaStatus, ServiceType},
};

/// The AIS consent authorisation processor, persisting each step to the authorisation store `A`.
pub type AisAuthorisationProcessorService<C, S, A> = ConsentAuthorisationProcessor<AisAuthorisationFlow<C, S>, A>;

/// Account information consents. A newly valid AIS consent revokes the TPP's earlier consents for the same PSUs.
#[derive(Debug, Clone)]
pub struct AisAuthorisationFlow<C, S> {
    consents: C,
    spi: S,
    settings: AspspSettings,
}

impl<C, S> AisAuthorisationFlow<C, S> {
    pub fn new(consents: C, spi: S, settings: AspspSettings) -> Self {
        Self { consents, spi, settings }
    }

    pub fn spi(&self) -> &S {
        &self.spi
    }
}

impl<C, S> ConsentAuthorisationFlow for AisAuthorisationFlow<C, S>
where
    C: ConsentManagement<AisConsent>,
    S: AisConsentSpi,
{
    type Consent = AisConsent;

    fn service_type(&self) -> ServiceType {
        ServiceType::Ais
    }

    async fn fetch_consent(&self, consent_id: &str) -> Result<Option<AisConsent>, ConsentManagementError> {
        self.consents.fetch_consent(consent_id).await
    }

    async fn update_consent_status(&self, consent_id: &str, status: ConsentStatus) -> Result<(), ConsentManagementError> {
        self.consents.update_consent_status(consent_id, status).await
    }

    async fn update_multilevel_sca_required(
        &self,
        consent_id: &str,
        multilevel_sca_required: bool,
    ) -> Result<(), ConsentManagementError> {
        self.consents.update_multilevel_sca_required(consent_id, multilevel_sca_required).await
    }

    async fn find_and_terminate_old_consents(&self, consent_id: &str) -> Result<Vec<String>, ConsentManagementError> {
        self.consents.find_and_terminate_old_consents(consent_id).await
    }

    /// A one-off consent that only lists the available accounts needs no second factor, unless the ASPSP says
    /// otherwise or several PSUs must sign.
    fn is_one_factor_authorisation(&self, consent: &AisConsent) -> bool {
        consent.request_type == AisConsentRequestType::AllAvailableAccounts &&
            consent.is_one_access_type() &&
            !self.settings.sca_by_one_time_available_accounts_consent_required &&
            !consent.multilevel_sca_required
    }

    async fn start_authorisation(
        &self,
        context: &SpiContextData,
        sca_approach: ScaApproach,
        sca_status: ScaStatus,
        authorisation_id: &str,
        consent: &AisConsent,
    ) -> SpiResponse<SpiStartAuthorisationResponse> {
        self.spi.start_authorisation(context, sca_approach, sca_status, authorisation_id, consent).await
    }

    async fn authorise_psu(
        &self,
        context: &SpiContextData,
        authorisation_id: &str,
        psu_data: &PsuIdData,
        password: &Option<Secret<String>>,
        consent: &AisConsent,
    ) -> SpiResponse<SpiPsuAuthorisationResponse> {
        self.spi.authorise_psu(context, authorisation_id, psu_data, password, consent).await
    }

    async fn request_available_sca_methods(
        &self,
        context: &SpiContextData,
        consent: &AisConsent,
    ) -> SpiResponse<SpiAvailableScaMethodsResponse> {
        self.spi.request_available_sca_methods(context, consent).await
    }

    async fn request_authorisation_code(
        &self,
        context: &SpiContextData,
        authentication_method_id: &str,
        consent: &AisConsent,
    ) -> SpiResponse<SpiAuthorizationCodeResult> {
        self.spi.request_authorisation_code(context, authentication_method_id, consent).await
    }

    async fn start_sca_decoupled(
        &self,
        context: &SpiContextData,
        authorisation_id: &str,
        authentication_method_id: &str,
        consent: &AisConsent,
    ) -> SpiResponse<SpiAuthorisationDecoupledScaResponse> {
        self.spi.start_sca_decoupled(context, authorisation_id, authentication_method_id, consent).await
    }

    async fn verify_sca_authorisation(
        &self,
        context: &SpiContextData,
        confirmation: &SpiScaConfirmation,
        consent: &AisConsent,
    ) -> SpiResponse<SpiVerifyScaAuthorisationResponse> {
        self.spi.verify_sca_authorisation(context, confirmation, consent).await
    }
}
