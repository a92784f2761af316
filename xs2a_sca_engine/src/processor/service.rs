use crate::{
    processor::{
        errors::AuthorisationProcessorError,
        objects::{AuthorisationParameters, AuthorisationProcessorRequest},
        response::AuthorisationProcessorResponse,
    },
    xs2a_types::ScaStatus,
};

pub type ProcessorResult = Result<AuthorisationProcessorResponse, AuthorisationProcessorError>;

/// One SCA authorisation processor per business object flow (AIS, PIIS, PIS initiation, PIS cancellation).
///
/// Each `do_sca_*` handler processes a single step for an authorisation in the matching SCA status. Callers usually
/// go through [`AuthorisationProcessorService::process`], which picks the handler from the request's status, and then
/// hand the response to [`AuthorisationProcessorService::update_authorisation`] to persist it.
///
/// Business failures are returned as `Ok` responses carrying an error holder. `Err` is reserved for requests the
/// processor cannot handle at all.
#[allow(async_fn_in_trait)]
pub trait AuthorisationProcessorService {
    type Parameters: AuthorisationParameters;

    /// Persist the outcome of a step through the handler registered for the request's SCA approach.
    async fn update_authorisation(
        &self,
        request: &AuthorisationProcessorRequest<Self::Parameters>,
        response: &AuthorisationProcessorResponse,
    ) -> Result<(), AuthorisationProcessorError>;

    async fn do_sca_received(&self, request: &AuthorisationProcessorRequest<Self::Parameters>) -> ProcessorResult;

    async fn do_sca_psu_identified(&self, request: &AuthorisationProcessorRequest<Self::Parameters>)
        -> ProcessorResult;

    async fn do_sca_psu_authenticated(
        &self,
        request: &AuthorisationProcessorRequest<Self::Parameters>,
    ) -> ProcessorResult;

    async fn do_sca_method_selected(
        &self,
        request: &AuthorisationProcessorRequest<Self::Parameters>,
    ) -> ProcessorResult;

    async fn do_sca_finalised(&self, request: &AuthorisationProcessorRequest<Self::Parameters>) -> ProcessorResult;

    async fn do_sca_started(&self, _request: &AuthorisationProcessorRequest<Self::Parameters>) -> ProcessorResult {
        Err(AuthorisationProcessorError::UnsupportedScaStatus(ScaStatus::Started))
    }

    async fn do_sca_failed(&self, _request: &AuthorisationProcessorRequest<Self::Parameters>) -> ProcessorResult {
        Err(AuthorisationProcessorError::UnsupportedScaStatus(ScaStatus::Failed))
    }

    async fn do_sca_exempted(&self, _request: &AuthorisationProcessorRequest<Self::Parameters>) -> ProcessorResult {
        Err(AuthorisationProcessorError::UnsupportedScaStatus(ScaStatus::Exempted))
    }

    /// Runs the handler for the status in `request.sca_status`.
    async fn process(&self, request: &AuthorisationProcessorRequest<Self::Parameters>) -> ProcessorResult {
        match request.sca_status {
            ScaStatus::Started => self.do_sca_started(request).await,
            ScaStatus::Received => self.do_sca_received(request).await,
            ScaStatus::PsuIdentified => self.do_sca_psu_identified(request).await,
            ScaStatus::PsuAuthenticated => self.do_sca_psu_authenticated(request).await,
            ScaStatus::ScaMethodSelected => self.do_sca_method_selected(request).await,
            ScaStatus::Finalised => self.do_sca_finalised(request).await,
            ScaStatus::Failed => self.do_sca_failed(request).await,
            ScaStatus::Exempted => self.do_sca_exempted(request).await,
            ScaStatus::Unconfirmed => Err(AuthorisationProcessorError::UnsupportedScaStatus(ScaStatus::Unconfirmed)),
        }
    }
}
