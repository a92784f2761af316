use log::*;
use xs2a_common::Secret;

use crate::{
    processor::{consent_processor::ConsentAuthorisationFlow, ConsentAuthorisationProcessor},
    spi::{
        PiisConsentSpi,
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
    xs2a_types::{ConsentStatus, PiisConsent, PsuIdData, ScaApproach, ScaStatus, ServiceType},
};

pub type PiisAuthorisationProcessorService<C, S, A> = ConsentAuthorisationProcessor<PiisAuthorisationFlow<C, S>, A>;

/// Funds confirmation consents. A TPP may hold several valid PIIS consents, so none are ever superseded, and every
/// PIIS consent needs full SCA.
#[derive(Debug, Clone)]
pub struct PiisAuthorisationFlow<C, S> {
    consents: C,
    spi: S,
}

impl<C, S> PiisAuthorisationFlow<C, S> {
    pub fn new(consents: C, spi: S) -> Self {
        Self { consents, spi }
    }

    pub fn spi(&self) -> &S {
        &self.spi
    }
}

impl<C, S> ConsentAuthorisationFlow for PiisAuthorisationFlow<C, S>
where
    C: ConsentManagement<PiisConsent>,
    S: PiisConsentSpi,
{
    type Consent = PiisConsent;

    fn service_type(&self) -> ServiceType {
        ServiceType::Piis
    }

    async fn fetch_consent(&self, consent_id: &str) -> Result<Option<PiisConsent>, ConsentManagementError> {
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
        trace!("🔐️ PIIS consent {consent_id} is valid. Earlier PIIS consents remain valid.");
        Ok(Vec::new())
    }

    fn is_one_factor_authorisation(&self, _consent: &PiisConsent) -> bool {
        false
    }

    async fn start_authorisation(
        &self,
        context: &SpiContextData,
        sca_approach: ScaApproach,
        sca_status: ScaStatus,
        authorisation_id: &str,
        consent: &PiisConsent,
    ) -> SpiResponse<SpiStartAuthorisationResponse> {
        self.spi.start_authorisation(context, sca_approach, sca_status, authorisation_id, consent).await
    }

    async fn authorise_psu(
        &self,
        context: &SpiContextData,
        authorisation_id: &str,
        psu_data: &PsuIdData,
        password: &Option<Secret<String>>,
        consent: &PiisConsent,
    ) -> SpiResponse<SpiPsuAuthorisationResponse> {
        self.spi.authorise_psu(context, authorisation_id, psu_data, password, consent).await
    }

    async fn request_available_sca_methods(
        &self,
        context: &SpiContextData,
        consent: &PiisConsent,
    ) -> SpiResponse<SpiAvailableScaMethodsResponse> {
        self.spi.request_available_sca_methods(context, consent).await
    }

    async fn request_authorisation_code(
        &self,
        context: &SpiContextData,
        authentication_method_id: &str,
        consent: &PiisConsent,
    ) -> SpiResponse<SpiAuthorizationCodeResult> {
        self.spi.request_authorisation_code(context, authentication_method_id, consent).await
    }

    async fn start_sca_decoupled(
        &self,
        context: &SpiContextData,
        authorisation_id: &str,
        authentication_method_id: &str,
        consent: &PiisConsent,
    ) -> SpiResponse<SpiAuthorisationDecoupledScaResponse> {
        self.spi.start_sca_decoupled(context, authorisation_id, authentication_method_id, consent).await
    }

    async fn verify_sca_authorisation(
        &self,
        context: &SpiContextData,
        confirmation: &SpiScaConfirmation,
        consent: &PiisConsent,
    ) -> SpiResponse<SpiVerifyScaAuthorisationResponse> {
        self.spi.verify_sca_authorisation(context, confirmation, consent).await
    }
}
