//! The SCA state machine for consents (AIS and PIIS).
//!
//! [`ConsentAuthorisationProcessor`] holds the steps that both consent types share. What differs between them, the
//! consent store, the SPI and a handful of business rules, is supplied by a [`ConsentAuthorisationFlow`].
use std::fmt::Debug;

use log::*;
use xs2a_common::Secret;

use crate::{
    config::AspspSettings,
    error_holder::{ErrorHolder, ErrorType, MessageErrorCode},
    processor::{
        approach::{ApproachRegistry, ScaApproachHandler, StoredAuthorisationHandler},
        base::{
            decoupled_method_id,
            extract_psu_id_data,
            into_spi_result,
            is_attempt_failure,
            is_credentials_invalid,
            is_decoupled_authorisation,
            is_multiple_sca_methods,
            is_psu_exist,
            write_error_log,
            write_info_log,
        },
        errors::{ApproachRegistryError, AuthorisationProcessorError},
        objects::{AuthorisationProcessorRequest, CommonAuthorisationParameters},
        response::{AuthorisationProcessorResponse, StartAuthorisationResponse, UpdatePsuDataResponse},
        service::{AuthorisationProcessorService, ProcessorResult},
    },
    spi::{
        SpiAuthorisationDecoupledScaResponse,
        SpiAuthorisationStatus,
        SpiAuthorizationCodeResult,
        SpiAvailableScaMethodsResponse,
        SpiContextData,
        SpiPsuAuthorisationResponse,
        SpiResponse,
        SpiScaConfirmation,
        SpiStartAuthorisationResponse,
        SpiVerifyScaAuthorisationResponse,
    },
    traits::{AuthorisationManagement, ConsentManagementError},
    xs2a_types::{AuthenticationObject, Consent, ConsentStatus, PsuIdData, ScaApproach, ScaStatus, ServiceType},
};

const CONSENT_NOT_FOUND: &str = "Apply authorisation when update consent PSU data has failed. Consent not found by id.";
const CONSENT_LOOKUP_FAILED: &str = "Apply authorisation when update consent PSU data has failed. Consent lookup failed.";

type ConsentRequest = AuthorisationProcessorRequest<CommonAuthorisationParameters>;

/// The consent-type specific half of the consent SCA state machine.
#[allow(async_fn_in_trait)]
pub trait ConsentAuthorisationFlow {
    type Consent: Consent;

    fn service_type(&self) -> ServiceType;

    fn error_type_400(&self) -> ErrorType {
        ErrorType::new(self.service_type(), 400)
    }

    fn error_type_401(&self) -> ErrorType {
        ErrorType::new(self.service_type(), 401)
    }

    async fn fetch_consent(&self, consent_id: &str) -> Result<Option<Self::Consent>, ConsentManagementError>;

    async fn update_consent_status(&self, consent_id: &str, status: ConsentStatus)
        -> Result<(), ConsentManagementError>;

    async fn update_multilevel_sca_required(
        &self,
        consent_id: &str,
        multilevel_sca_required: bool,
    ) -> Result<(), ConsentManagementError>;

    /// Revoke the consents that `consent_id` supersedes. Returns the ids of the revoked consents.
    async fn find_and_terminate_old_consents(&self, consent_id: &str) -> Result<Vec<String>, ConsentManagementError>;

    /// True when a successful PSU login is enough to validate the consent without a second factor.
    fn is_one_factor_authorisation(&self, consent: &Self::Consent) -> bool;

    async fn start_authorisation(
        &self,
        context: &SpiContextData,
        sca_approach: ScaApproach,
        sca_status: ScaStatus,
        authorisation_id: &str,
        consent: &Self::Consent,
    ) -> SpiResponse<SpiStartAuthorisationResponse>;

    async fn authorise_psu(
        &self,
        context: &SpiContextData,
        authorisation_id: &str,
        psu_data: &PsuIdData,
        password: &Option<Secret<String>>,
        consent: &Self::Consent,
    ) -> SpiResponse<SpiPsuAuthorisationResponse>;

    async fn request_available_sca_methods(
        &self,
        context: &SpiContextData,
        consent: &Self::Consent,
    ) -> SpiResponse<SpiAvailableScaMethodsResponse>;

    async fn request_authorisation_code(
        &self,
        context: &SpiContextData,
        authentication_method_id: &str,
        consent: &Self::Consent,
    ) -> SpiResponse<SpiAuthorizationCodeResult>;

    async fn start_sca_decoupled(
        &self,
        context: &SpiContextData,
        authorisation_id: &str,
        authentication_method_id: &str,
        consent: &Self::Consent,
    ) -> SpiResponse<SpiAuthorisationDecoupledScaResponse>;

    async fn verify_sca_authorisation(
        &self,
        context: &SpiContextData,
        confirmation: &SpiScaConfirmation,
        consent: &Self::Consent,
    ) -> SpiResponse<SpiVerifyScaAuthorisationResponse>;
}

/// Drives AIS and PIIS consent authorisations.
///
/// * `F` supplies the consent store, the SPI and the consent-type rules.
/// * `A` is the authorisation store used for status, SCA method and approach updates.
/// * `H` persists each step's outcome for the approach of the request.
pub struct ConsentAuthorisationProcessor<F, A, H = StoredAuthorisationHandler<A>> {
    flow: F,
    authorisations: A,
    approaches: ApproachRegistry<H>,
}

impl<F: ConsentAuthorisationFlow, A, H> Debug for ConsentAuthorisationProcessor<F, A, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ConsentAuthorisationProcessor ({}, {:?})", self.flow.service_type(), self.approaches)
    }
}

impl<F, A> ConsentAuthorisationProcessor<F, A>
where
    F: ConsentAuthorisationFlow,
    A: AuthorisationManagement + Clone,
{
    /// Builds a processor that persists every step straight to the authorisation store, for each approach the
    /// ASPSP supports.
    pub fn with_stored_handlers(
        flow: F,
        authorisations: A,
        settings: &AspspSettings,
    ) -> Result<Self, ApproachRegistryError> {
        let handlers = StoredAuthorisationHandler::for_approaches(authorisations.clone(), &settings.supported_sca_approaches);
        Self::new(flow, authorisations, handlers, settings)
    }
}

impl<F, A, H> ConsentAuthorisationProcessor<F, A, H>
where
    F: ConsentAuthorisationFlow,
    A: AuthorisationManagement,
    H: ScaApproachHandler,
{
    pub fn new(
        flow: F,
        authorisations: A,
        handlers: Vec<H>,
        settings: &AspspSettings,
    ) -> Result<Self, ApproachRegistryError> {
        let approaches = ApproachRegistry::new(handlers, &settings.supported_sca_approaches)?;
        Ok(Self { flow, authorisations, approaches })
    }

    pub fn flow(&self) -> &F {
        &self.flow
    }

    //-----------------------------------------   Steps   ----------------------------------------------------------

    async fn start(&self, request: &ConsentRequest) -> StartAuthorisationResponse {
        let params = request.parameters();
        let psu = params.psu_data.clone();
        let consent = match self.load_consent(request, psu.as_ref()).await {
            Ok(consent) => consent,
            Err(error_holder) => return start_error(request, error_holder),
        };
        let context = spi_context(&consent, psu.clone());
        let response = self
            .flow
            .start_authorisation(&context, request.sca_approach, request.sca_status, &params.authorisation_id, &consent)
            .await;
        match into_spi_result(response, self.flow.service_type()) {
            Ok(start) => StartAuthorisationResponse::new(
                start.sca_status,
                start.sca_approach,
                params.business_object_id.as_str(),
                params.authorisation_id.as_str(),
                psu,
            )
            .with_psu_message(start.psu_message)
            .with_tpp_messages(start.tpp_messages),
            Err(failure) => {
                write_error_log(
                    request,
                    psu.as_ref(),
                    &failure.error_holder,
                    "Start authorisation failed when creating the authorisation.",
                );
                start_error(request, failure.error_holder)
            },
        }
    }

    fn apply_identification(&self, request: &ConsentRequest) -> UpdatePsuDataResponse {
        let params = request.parameters();
        if !is_psu_exist(params.psu_data.as_ref()) {
            let error_holder = ErrorHolder::single(self.flow.error_type_400(), MessageErrorCode::FormatErrorNoPsu);
            write_error_log(
                request,
                params.psu_data.as_ref(),
                &error_holder,
                "Apply identification when update consent PSU data has failed. No PSU data available in request.",
            );
            return update_error(request, error_holder, params.psu_data.clone());
        }
        UpdatePsuDataResponse::new(
            ScaStatus::PsuIdentified,
            params.business_object_id.as_str(),
            params.authorisation_id.as_str(),
            params.psu_data.clone(),
        )
    }

    async fn apply_authorisation(&self, request: &ConsentRequest) -> UpdatePsuDataResponse {
        let params = request.parameters();
        let consent = match self.load_consent(request, params.psu_data.as_ref()).await {
            Ok(consent) => consent,
            Err(error_holder) => return update_error(request, error_holder, params.psu_data.clone()),
        };
        let psu = extract_psu_id_data(params, &request.authorisation);
        let context = spi_context(&consent, psu.clone());
        let spi_psu = psu.clone().unwrap_or_default();
        let response = self
            .flow
            .authorise_psu(&context, &request.authorisation.authorisation_id, &spi_psu, &params.password, &consent)
            .await;
        let authorisation = match into_spi_result(response, self.flow.service_type()) {
            Ok(authorisation) => authorisation,
            Err(failure) => {
                write_error_log(
                    request,
                    psu.as_ref(),
                    &failure.error_holder,
                    "Authorise PSU when apply authorisation has failed.",
                );
                if is_attempt_failure(failure.payload.map(|p| p.authorisation_status)) {
                    return retry_error(request, failure.error_holder, psu);
                }
                return update_error(request, failure.error_holder, psu);
            },
        };

        if authorisation.authorisation_status == SpiAuthorisationStatus::Failure {
            let error_holder = ErrorHolder::single(self.flow.error_type_401(), MessageErrorCode::PsuCredentialsInvalid);
            write_error_log(
                request,
                psu.as_ref(),
                &error_holder,
                "Authorise PSU when apply authorisation has failed. PSU credentials invalid.",
            );
            self.set_authorisation_status(&params.authorisation_id, ScaStatus::Failed).await;
            return update_error(request, error_holder, psu);
        }

        if self.flow.is_one_factor_authorisation(&consent) {
            self.set_consent_status(&params.business_object_id, ConsentStatus::Valid).await;
            write_info_log(request, psu.as_ref(), "Consent authorised with a single factor.");
            return update_response(request, ScaStatus::Finalised, psu);
        }

        if is_decoupled_authorisation(&request.authorisation) {
            let method_id = decoupled_method_id(request);
            return self.proceed_decoupled_approach(request, &consent, &method_id, psu).await;
        }

        self.request_available_sca_methods(request, &consent, psu).await
    }

    async fn request_available_sca_methods(
        &self,
        request: &ConsentRequest,
        consent: &F::Consent,
        psu: Option<PsuIdData>,
    ) -> UpdatePsuDataResponse {
        let context = spi_context(consent, psu.clone());
        let response = self.flow.request_available_sca_methods(&context, consent).await;
        match into_spi_result(response, self.flow.service_type()) {
            Ok(methods) => self.process_sca_methods(request, consent, psu, methods.available_sca_methods).await,
            Err(failure) => {
                write_error_log(
                    request,
                    psu.as_ref(),
                    &failure.error_holder,
                    "Request available SCA methods when apply authorisation has failed.",
                );
                update_error(request, failure.error_holder, psu)
            },
        }
    }

    async fn process_sca_methods(
        &self,
        request: &ConsentRequest,
        consent: &F::Consent,
        psu: Option<PsuIdData>,
        methods: Vec<AuthenticationObject>,
    ) -> UpdatePsuDataResponse {
        let params = request.parameters();
        if is_multiple_sca_methods(&methods) {
            self.save_authentication_methods(&params.authorisation_id, &methods).await;
            return update_response(request, ScaStatus::PsuAuthenticated, psu).with_available_sca_methods(methods);
        }
        let Some(chosen) = methods.first() else {
            let error_holder = ErrorHolder::single(self.flow.error_type_400(), MessageErrorCode::ScaMethodUnknown);
            write_error_log(
                request,
                psu.as_ref(),
                &error_holder,
                "Apply authorisation has failed. Consent was rejected because PSU has no available SCA methods.",
            );
            self.set_consent_status(&params.business_object_id, ConsentStatus::Rejected).await;
            self.set_authorisation_status(&params.authorisation_id, ScaStatus::Failed).await;
            return update_error(request, error_holder, psu);
        };
        self.save_authentication_methods(&params.authorisation_id, &methods).await;
        if chosen.is_decoupled() {
            self.switch_to_decoupled(&params.authorisation_id).await;
            return self.proceed_decoupled_approach(request, consent, &chosen.authentication_method_id, psu).await;
        }
        self.proceed_embedded_approach(request, consent, &chosen.authentication_method_id, psu).await
    }

    async fn proceed_embedded_approach(
        &self,
        request: &ConsentRequest,
        consent: &F::Consent,
        authentication_method_id: &str,
        psu: Option<PsuIdData>,
    ) -> UpdatePsuDataResponse {
        let context = spi_context(consent, psu.clone());
        let response = self.flow.request_authorisation_code(&context, authentication_method_id, consent).await;
        match into_spi_result(response, self.flow.service_type()) {
            Ok(code) => {
                let sca_status = if code.sca_exempted {
                    ScaStatus::Exempted
                } else {
                    code.sca_status.unwrap_or(ScaStatus::ScaMethodSelected)
                };
                update_response(request, sca_status, psu)
                    .with_chosen_sca_method(code.selected_sca_method)
                    .with_challenge_data(code.challenge_data)
            },
            Err(failure) => {
                write_error_log(
                    request,
                    psu.as_ref(),
                    &failure.error_holder,
                    "Proceed embedded approach when performs authorisation depending on selected SCA method has failed.",
                );
                if is_credentials_invalid(&failure.error_holder) {
                    self.set_authorisation_status(&request.parameters().authorisation_id, ScaStatus::Failed).await;
                }
                update_error(request, failure.error_holder, psu)
            },
        }
    }

    async fn proceed_decoupled_approach(
        &self,
        request: &ConsentRequest,
        consent: &F::Consent,
        authentication_method_id: &str,
        psu: Option<PsuIdData>,
    ) -> UpdatePsuDataResponse {
        let context = spi_context(consent, psu.clone());
        let authorisation_id = &request.parameters().authorisation_id;
        let response = self.flow.start_sca_decoupled(&context, authorisation_id, authentication_method_id, consent).await;
        match into_spi_result(response, self.flow.service_type()) {
            Ok(decoupled) => {
                write_info_log(request, psu.as_ref(), "Decoupled SCA started.");
                update_response(request, decoupled.sca_status, psu).with_psu_message(decoupled.psu_message)
            },
            Err(failure) => {
                write_error_log(request, psu.as_ref(), &failure.error_holder, "Starting decoupled SCA has failed.");
                update_error(request, failure.error_holder, psu)
            },
        }
    }

    async fn psu_authenticated(&self, request: &ConsentRequest) -> UpdatePsuDataResponse {
        let params = request.parameters();
        let consent = match self.load_consent(request, params.psu_data.as_ref()).await {
            Ok(consent) => consent,
            Err(error_holder) => return update_error(request, error_holder, params.psu_data.clone()),
        };
        let psu = extract_psu_id_data(params, &request.authorisation);
        let Some(method_id) = params.authentication_method_id.as_deref() else {
            let error_holder = ErrorHolder::single(self.flow.error_type_400(), MessageErrorCode::FormatError);
            write_error_log(request, psu.as_ref(), &error_holder, "No authentication method was selected.");
            return update_error(request, error_holder, psu);
        };
        if self.is_decoupled_method(&params.authorisation_id, method_id).await {
            self.switch_to_decoupled(&params.authorisation_id).await;
            return self.proceed_decoupled_approach(request, &consent, method_id, psu).await;
        }
        self.proceed_embedded_approach(request, &consent, method_id, psu).await
    }

    async fn method_selected(&self, request: &ConsentRequest) -> UpdatePsuDataResponse {
        let params = request.parameters();
        let consent_id = params.business_object_id.as_str();
        let consent = match self.load_consent(request, params.psu_data.as_ref()).await {
            Ok(consent) => consent,
            Err(error_holder) => return update_error(request, error_holder, params.psu_data.clone()),
        };
        let psu = extract_psu_id_data(params, &request.authorisation);
        let context = spi_context(&consent, psu.clone());
        let confirmation = SpiScaConfirmation {
            business_object_id: consent_id.to_string(),
            authorisation_id: params.authorisation_id.clone(),
            psu_data: psu.clone(),
            tan_number: params.sca_authentication_data.clone(),
        };
        let response = self.flow.verify_sca_authorisation(&context, &confirmation, &consent).await;
        let verified = match into_spi_result(response, self.flow.service_type()) {
            Ok(verified) => verified,
            Err(failure) => {
                write_error_log(
                    request,
                    params.psu_data.as_ref(),
                    &failure.error_holder,
                    "Verify SCA authorisation failed when update PSU data.",
                );
                if is_attempt_failure(failure.payload.map(|p| p.authorisation_status)) {
                    return retry_error(request, failure.error_holder, psu);
                }
                if is_credentials_invalid(&failure.error_holder) {
                    self.set_authorisation_status(&params.authorisation_id, ScaStatus::Failed).await;
                }
                return update_error(request, failure.error_holder, psu);
            },
        };

        let new_status = verified.consent_status;
        let multilevel = new_status == ConsentStatus::PartiallyAuthorised;
        if multilevel && !consent.is_multilevel_sca_required() {
            if let Err(e) = self.flow.update_multilevel_sca_required(consent_id, multilevel).await {
                warn!("🔐️ Could not set the multilevel SCA flag on consent {consent_id}. {e}");
            }
        }
        if consent.consent_status() != new_status {
            self.set_consent_status(consent_id, new_status).await;
        }
        match self.flow.find_and_terminate_old_consents(consent_id).await {
            Ok(revoked) if !revoked.is_empty() => {
                info!("🔐️ Consent {consent_id} supersedes {} older consent(s): {}", revoked.len(), revoked.join(", "))
            },
            Ok(_) => {},
            Err(e) => warn!("🔐️ Could not terminate the consents superseded by {consent_id}. {e}"),
        }
        update_response(request, ScaStatus::Finalised, psu)
    }

    //-----------------------------------------  Collaborators  ----------------------------------------------------

    async fn load_consent(&self, request: &ConsentRequest, psu: Option<&PsuIdData>) -> Result<F::Consent, ErrorHolder> {
        let consent_id = &request.parameters().business_object_id;
        match self.flow.fetch_consent(consent_id).await {
            Ok(Some(consent)) => Ok(consent),
            Ok(None) => {
                let error_holder = ErrorHolder::single(self.flow.error_type_400(), MessageErrorCode::ConsentUnknown400);
                write_error_log(request, psu, &error_holder, CONSENT_NOT_FOUND);
                Err(error_holder)
            },
            Err(e) => {
                error!("🔐️ Could not fetch consent {consent_id}. {e}");
                let error_type = ErrorType::new(self.flow.service_type(), 500);
                let error_holder = ErrorHolder::single(error_type, MessageErrorCode::InternalServerError);
                write_error_log(request, psu, &error_holder, CONSENT_LOOKUP_FAILED);
                Err(error_holder)
            },
        }
    }

    async fn set_consent_status(&self, consent_id: &str, status: ConsentStatus) {
        match self.flow.update_consent_status(consent_id, status).await {
            Ok(()) => debug!("🔐️ Consent {consent_id} is now {status}"),
            Err(e) => warn!("🔐️ Could not update consent {consent_id} to {status}. {e}"),
        }
    }

    async fn set_authorisation_status(&self, authorisation_id: &str, status: ScaStatus) {
        if let Err(e) = self.authorisations.update_authorisation_status(authorisation_id, status).await {
            warn!("🔐️ Could not update authorisation {authorisation_id} to {status}. {e}");
        }
    }

    async fn save_authentication_methods(&self, authorisation_id: &str, methods: &[AuthenticationObject]) {
        if let Err(e) = self.authorisations.save_authentication_methods(authorisation_id, methods).await {
            warn!("🔐️ Could not save the SCA methods of authorisation {authorisation_id}. {e}");
        }
    }

    async fn switch_to_decoupled(&self, authorisation_id: &str) {
        if let Err(e) = self.authorisations.update_sca_approach(authorisation_id, ScaApproach::Decoupled).await {
            warn!("🔐️ Could not switch authorisation {authorisation_id} to the decoupled approach. {e}");
        }
    }

    async fn is_decoupled_method(&self, authorisation_id: &str, method_id: &str) -> bool {
        self.authorisations.is_authentication_method_decoupled(authorisation_id, method_id).await.unwrap_or_else(|e| {
            warn!("🔐️ Could not check whether method {method_id} of authorisation {authorisation_id} is decoupled. {e}");
            false
        })
    }
}

impl<F, A, H> AuthorisationProcessorService for ConsentAuthorisationProcessor<F, A, H>
where
    F: ConsentAuthorisationFlow,
    A: AuthorisationManagement,
    H: ScaApproachHandler,
{
    type Parameters = CommonAuthorisationParameters;

    async fn update_authorisation(
        &self,
        request: &ConsentRequest,
        response: &AuthorisationProcessorResponse,
    ) -> Result<(), AuthorisationProcessorError> {
        let handler = self.approaches.resolve(request.sca_approach, self.flow.service_type())?;
        handler.update_authorisation(request.parameters(), response).await?;
        Ok(())
    }

    async fn do_sca_started(&self, request: &ConsentRequest) -> ProcessorResult {
        Ok(AuthorisationProcessorResponse::CreateConsentAuthorisation(self.start(request).await))
    }

    async fn do_sca_received(&self, request: &ConsentRequest) -> ProcessorResult {
        self.do_sca_psu_identified(request).await
    }

    async fn do_sca_psu_identified(&self, request: &ConsentRequest) -> ProcessorResult {
        let response = if request.parameters().update_psu_identification {
            self.apply_identification(request)
        } else {
            self.apply_authorisation(request).await
        };
        Ok(AuthorisationProcessorResponse::UpdateConsentPsuData(response))
    }

    async fn do_sca_psu_authenticated(&self, request: &ConsentRequest) -> ProcessorResult {
        Ok(AuthorisationProcessorResponse::UpdateConsentPsuData(self.psu_authenticated(request).await))
    }

    async fn do_sca_method_selected(&self, request: &ConsentRequest) -> ProcessorResult {
        Ok(AuthorisationProcessorResponse::UpdateConsentPsuData(self.method_selected(request).await))
    }

    async fn do_sca_finalised(&self, request: &ConsentRequest) -> ProcessorResult {
        let params = request.parameters();
        let response = update_response(request, ScaStatus::Finalised, params.psu_data.clone());
        Ok(AuthorisationProcessorResponse::UpdateConsentPsuData(response))
    }
}

//-----------------------------------------  Response helpers  -----------------------------------------------------

fn spi_context<C: Consent>(consent: &C, psu: Option<PsuIdData>) -> SpiContextData {
    SpiContextData { psu_data: psu, tpp_authorisation_number: Some(consent.tpp_authorisation_number().to_string()) }
}

fn start_error(request: &ConsentRequest, error_holder: ErrorHolder) -> StartAuthorisationResponse {
    let params = request.parameters();
    StartAuthorisationResponse::error(
        error_holder,
        request.sca_status,
        request.sca_approach,
        params.business_object_id.as_str(),
        params.authorisation_id.as_str(),
        params.psu_data.clone(),
    )
}

fn update_response(request: &ConsentRequest, sca_status: ScaStatus, psu: Option<PsuIdData>) -> UpdatePsuDataResponse {
    let params = request.parameters();
    UpdatePsuDataResponse::new(sca_status, params.business_object_id.as_str(), params.authorisation_id.as_str(), psu)
}

fn update_error(request: &ConsentRequest, error_holder: ErrorHolder, psu: Option<PsuIdData>) -> UpdatePsuDataResponse {
    let params = request.parameters();
    UpdatePsuDataResponse::error(error_holder, params.business_object_id.as_str(), params.authorisation_id.as_str(), psu)
}

/// The PSU may try again, so the response keeps the status the request was dispatched on.
fn retry_error(request: &ConsentRequest, error_holder: ErrorHolder, psu: Option<PsuIdData>) -> UpdatePsuDataResponse {
    let params = request.parameters();
    UpdatePsuDataResponse::error_with_status(
        request.sca_status,
        error_holder,
        params.business_object_id.as_str(),
        params.authorisation_id.as_str(),
        psu,
    )
}
