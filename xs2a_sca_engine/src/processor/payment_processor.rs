//! The SCA state machine for payments: payment initiation (PIS) and payment cancellation.
//!
//! [`PaymentAuthorisationProcessor`] holds the shared steps. The payment-specific rules (SCA exemption, how a payment
//! is executed or cancelled, which PSU may identify themselves) come from a [`PaymentAuthorisationFlow`].
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
        objects::{AuthorisationProcessorRequest, PaymentAuthorisationParameters},
        response::{AuthorisationProcessorResponse, StartAuthorisationResponse, UpdatePsuDataResponse},
        service::{AuthorisationProcessorService, ProcessorResult},
    },
    spi::{
        SpiAuthorisationDecoupledScaResponse,
        SpiAuthorisationStatus,
        SpiAuthorizationCodeResult,
        SpiAvailableScaMethodsResponse,
        SpiContextData,
        SpiPaymentExecutionResponse,
        SpiPsuAuthorisationResponse,
        SpiResponse,
        SpiScaConfirmation,
        SpiStartAuthorisationResponse,
    },
    traits::{AuthorisationManagement, ConsentManagementError},
    xs2a_types::{
        AuthenticationObject,
        AuthorisationType,
        CommonPayment,
        CurrencyConversionInfo,
        PaymentType,
        PsuIdData,
        ScaApproach,
        ScaStatus,
        ServiceType,
        TransactionStatus,
    },
};

const EMBEDDED_SELECTING_SCA_METHOD_FAILED: &str =
    "Proceed embedded approach when performs authorisation depending on selected SCA method has failed.";

pub type PaymentRequest = AuthorisationProcessorRequest<PaymentAuthorisationParameters>;

/// The flow-specific half of the payment SCA state machine.
#[allow(async_fn_in_trait)]
pub trait PaymentAuthorisationFlow {
    fn authorisation_type(&self) -> AuthorisationType;

    /// Whether an SCA exemption reported by the backend lets the payment go through without SCA.
    fn need_process_exempted_sca(&self, payment_type: PaymentType, sca_exempted: bool) -> bool;

    /// Whether a `RECEIVED` or `PSUIDENTIFIED` request only identifies the PSU.
    fn is_identification_request(&self, request: &PaymentRequest) -> bool;

    /// Whether an identifying PSU must already be one of the payment's PSUs.
    fn requires_known_psu(&self) -> bool;

    /// Whether authorisations of this flow can be processed in the `EXEMPTED` status.
    fn supports_exempted_status(&self) -> bool;

    /// The error reported when the backend answers a selected method with an empty authorisation code.
    fn empty_authorisation_code_error(&self) -> MessageErrorCode;

    async fn fetch_payment(&self, payment_id: &str) -> Result<Option<CommonPayment>, ConsentManagementError>;

    async fn fetch_internal_payment_id(&self, payment_id: &str) -> Result<Option<String>, ConsentManagementError>;

    async fn update_payment_status(
        &self,
        payment_id: &str,
        status: TransactionStatus,
    ) -> Result<(), ConsentManagementError>;

    async fn update_multilevel_sca(&self, payment_id: &str, multilevel_sca_required: bool)
        -> Result<(), ConsentManagementError>;

    async fn start_authorisation(
        &self,
        context: &SpiContextData,
        sca_approach: ScaApproach,
        sca_status: ScaStatus,
        authorisation_id: &str,
        payment: &CommonPayment,
    ) -> SpiResponse<SpiStartAuthorisationResponse>;

    async fn authorise_psu(
        &self,
        context: &SpiContextData,
        authorisation_id: &str,
        psu_data: &PsuIdData,
        password: &Option<Secret<String>>,
        payment: &CommonPayment,
    ) -> SpiResponse<SpiPsuAuthorisationResponse>;

    async fn request_available_sca_methods(
        &self,
        context: &SpiContextData,
        payment: &CommonPayment,
    ) -> SpiResponse<SpiAvailableScaMethodsResponse>;

    async fn request_authorisation_code(
        &self,
        context: &SpiContextData,
        authentication_method_id: &str,
        payment: &CommonPayment,
    ) -> SpiResponse<SpiAuthorizationCodeResult>;

    async fn start_sca_decoupled(
        &self,
        context: &SpiContextData,
        authorisation_id: &str,
        authentication_method_id: &str,
        payment: &CommonPayment,
    ) -> SpiResponse<SpiAuthorisationDecoupledScaResponse>;

    /// Checks the TAN and, if it is correct, executes (or cancels) the payment.
    async fn verify_sca_authorisation_and_execute(
        &self,
        context: &SpiContextData,
        confirmation: &SpiScaConfirmation,
        payment: &CommonPayment,
    ) -> SpiResponse<SpiPaymentExecutionResponse>;

    /// Executes (or cancels) the payment when no SCA is needed.
    async fn execute_without_sca(
        &self,
        context: &SpiContextData,
        payment: &CommonPayment,
    ) -> SpiResponse<SpiPaymentExecutionResponse>;

    /// `None` if the flow never reports currency conversion details.
    async fn get_currency_conversion_info(
        &self,
        context: &SpiContextData,
        payment: &CommonPayment,
        authorisation_id: &str,
    ) -> Option<SpiResponse<CurrencyConversionInfo>>;
}

/// Drives payment initiation and payment cancellation authorisations.
///
/// The type parameters play the same roles as in [`crate::ConsentAuthorisationProcessor`].
pub struct PaymentAuthorisationProcessor<F, A, H = StoredAuthorisationHandler<A>> {
    flow: F,
    authorisations: A,
    approaches: ApproachRegistry<H>,
}

impl<F: PaymentAuthorisationFlow, A, H> Debug for PaymentAuthorisationProcessor<F, A, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentAuthorisationProcessor ({}, {:?})", self.flow.authorisation_type(), self.approaches)
    }
}

impl<F, A> PaymentAuthorisationProcessor<F, A>
where
    F: PaymentAuthorisationFlow,
    A: AuthorisationManagement + Clone,
{
    pub fn with_stored_handlers(
        flow: F,
        authorisations: A,
        settings: &AspspSettings,
    ) -> Result<Self, ApproachRegistryError> {
        let handlers = StoredAuthorisationHandler::for_approaches(authorisations.clone(), &settings.supported_sca_approaches);
        Self::new(flow, authorisations, handlers, settings)
    }
}

impl<F, A, H> PaymentAuthorisationProcessor<F, A, H>
where
    F: PaymentAuthorisationFlow,
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

    async fn start(&self, request: &PaymentRequest) -> StartAuthorisationResponse {
        let params = request.parameters();
        let psu = params.psu_data.clone();
        let payment = match self.load_payment(request, psu.as_ref()).await {
            Ok(payment) => payment,
            Err(error_holder) => return start_error(request, error_holder),
        };
        let context = spi_context(&payment, psu.clone());
        let response = self
            .flow
            .start_authorisation(&context, request.sca_approach, request.sca_status, &params.authorisation_id, &payment)
            .await;
        match into_spi_result(response, ServiceType::Pis) {
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
                    "Start authorisation failed when creating the payment authorisation.",
                );
                start_error(request, failure.error_holder)
            },
        }
    }

    async fn received(&self, request: &PaymentRequest) -> UpdatePsuDataResponse {
        if self.flow.is_identification_request(request) {
            self.apply_identification(request).await
        } else {
            self.apply_authorisation(request).await
        }
    }

    async fn apply_identification(&self, request: &PaymentRequest) -> UpdatePsuDataResponse {
        let params = request.parameters();
        let psu = params.psu_data.clone();
        let Some(identified) = psu.as_ref().filter(|p| is_psu_exist(Some(p))) else {
            let error_holder = ErrorHolder::single(ErrorType::PIS_400, MessageErrorCode::FormatErrorNoPsu);
            write_error_log(
                request,
                psu.as_ref(),
                &error_holder,
                "Apply identification when update payment PSU data has failed. No PSU data available in request.",
            );
            return update_error(request, error_holder, psu);
        };
        let payment = self.find_payment(&params.business_object_id).await;
        if self.flow.requires_known_psu() && !payment.as_ref().map(|p| p.has_psu(identified)).unwrap_or(false) {
            let error_holder = ErrorHolder::single(ErrorType::PIS_401, MessageErrorCode::UnauthorizedNoPsu);
            write_error_log(
                request,
                psu.as_ref(),
                &error_holder,
                "Apply identification when update payment PSU data has failed. PSU credentials invalid.",
            );
            return update_error(request, error_holder, psu);
        }
        let conversion = match &payment {
            Some(payment) => self.conversion_info(&spi_context(payment, psu.clone()), payment, request).await,
            None => None,
        };
        update_response(request, ScaStatus::PsuIdentified, psu).with_currency_conversion_info(conversion)
    }

    async fn apply_authorisation(&self, request: &PaymentRequest) -> UpdatePsuDataResponse {
        let params = request.parameters();
        let psu = extract_psu_id_data(params, &request.authorisation);
        let payment = match self.load_payment(request, psu.as_ref()).await {
            Ok(payment) => payment,
            Err(error_holder) => return update_error(request, error_holder, psu),
        };
        let context = spi_context(&payment, psu.clone());
        let spi_psu = psu.clone().unwrap_or_default();
        let response = self
            .flow
            .authorise_psu(&context, &request.authorisation.authorisation_id, &spi_psu, &params.password, &payment)
            .await;
        let authorisation = match into_spi_result(response, ServiceType::Pis) {
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
            let error_holder = ErrorHolder::single(ErrorType::PIS_401, MessageErrorCode::PsuCredentialsInvalid);
            write_error_log(
                request,
                psu.as_ref(),
                &error_holder,
                "PSU authorisation failed due to incorrect credentials.",
            );
            self.set_authorisation_status(&params.authorisation_id, ScaStatus::Failed).await;
            return update_error(request, error_holder, psu);
        }

        let conversion = self.conversion_info(&context, &payment, request).await;
        let payment_type = request.update_authorisation_request.payment_service;
        if self.flow.need_process_exempted_sca(payment_type, authorisation.sca_exempted) {
            write_info_log(request, psu.as_ref(), "SCA was exempted for the payment after authorising the PSU.");
            return self.execute_payment_without_sca(request, &payment, psu, ScaStatus::Exempted, conversion).await;
        }

        if is_decoupled_authorisation(&request.authorisation) {
            let method_id = decoupled_method_id(request);
            return self.proceed_decoupled_approach(request, &payment, &method_id, psu).await;
        }

        let response = self.flow.request_available_sca_methods(&context, &payment).await;
        let methods = match into_spi_result(response, ServiceType::Pis) {
            Ok(methods) => methods,
            Err(failure) => {
                write_error_log(request, psu.as_ref(), &failure.error_holder, "Request available SCA methods has failed.");
                return update_error(request, failure.error_holder, psu);
            },
        };
        if self.flow.need_process_exempted_sca(payment_type, methods.sca_exempted) {
            write_info_log(request, psu.as_ref(), "SCA was exempted for the payment after requesting SCA methods.");
            return self.execute_payment_without_sca(request, &payment, psu, ScaStatus::Exempted, conversion).await;
        }

        self.process_sca_methods(request, &payment, psu, methods.available_sca_methods, conversion).await
    }

    async fn process_sca_methods(
        &self,
        request: &PaymentRequest,
        payment: &CommonPayment,
        psu: Option<PsuIdData>,
        methods: Vec<AuthenticationObject>,
        conversion: Option<CurrencyConversionInfo>,
    ) -> UpdatePsuDataResponse {
        let authorisation_id = &request.parameters().authorisation_id;
        if is_multiple_sca_methods(&methods) {
            self.save_authentication_methods(authorisation_id, &methods).await;
            return update_response(request, ScaStatus::PsuAuthenticated, psu)
                .with_available_sca_methods(methods)
                .with_currency_conversion_info(conversion);
        }
        let Some(chosen) = methods.first() else {
            write_info_log(request, psu.as_ref(), "Available SCA methods is empty.");
            return self.execute_payment_without_sca(request, payment, psu, ScaStatus::Finalised, conversion).await;
        };
        self.save_authentication_methods(authorisation_id, &methods).await;
        if chosen.is_decoupled() {
            self.switch_to_decoupled(authorisation_id).await;
            return self.proceed_decoupled_approach(request, payment, &chosen.authentication_method_id, psu).await;
        }
        self.proceed_single_sca_embedded_approach(request, payment, chosen, psu, conversion).await
    }

    async fn proceed_single_sca_embedded_approach(
        &self,
        request: &PaymentRequest,
        payment: &CommonPayment,
        chosen: &AuthenticationObject,
        psu: Option<PsuIdData>,
        conversion: Option<CurrencyConversionInfo>,
    ) -> UpdatePsuDataResponse {
        let context = spi_context(payment, psu.clone());
        let response = self.flow.request_authorisation_code(&context, &chosen.authentication_method_id, payment).await;
        let code = match into_spi_result(response, ServiceType::Pis) {
            Ok(code) => code,
            Err(failure) => {
                write_error_log(
                    request,
                    psu.as_ref(),
                    &failure.error_holder,
                    "Proceed single SCA embedded approach when performs authorisation has failed.",
                );
                return update_error(request, failure.error_holder, psu);
            },
        };
        if self.flow.need_process_exempted_sca(payment.payment_type, code.sca_exempted) {
            write_info_log(request, psu.as_ref(), "SCA was exempted for the payment after requesting an authorisation code.");
            return self.execute_payment_without_sca(request, payment, psu, ScaStatus::Exempted, conversion).await;
        }
        let sca_status = code.sca_status.unwrap_or(ScaStatus::ScaMethodSelected);
        update_response(request, sca_status, psu)
            .with_chosen_sca_method(code.selected_sca_method)
            .with_challenge_data(code.challenge_data)
            .with_currency_conversion_info(conversion)
    }

    async fn proceed_embedded_approach(
        &self,
        request: &PaymentRequest,
        payment: &CommonPayment,
        authentication_method_id: &str,
        psu: Option<PsuIdData>,
    ) -> UpdatePsuDataResponse {
        let context = spi_context(payment, psu.clone());
        let response = self.flow.request_authorisation_code(&context, authentication_method_id, payment).await;
        let code = match into_spi_result(response, ServiceType::Pis) {
            Ok(code) => code,
            Err(failure) => {
                write_error_log(request, psu.as_ref(), &failure.error_holder, EMBEDDED_SELECTING_SCA_METHOD_FAILED);
                if is_credentials_invalid(&failure.error_holder) {
                    self.set_authorisation_status(&request.parameters().authorisation_id, ScaStatus::Failed).await;
                }
                return update_error(request, failure.error_holder, psu);
            },
        };
        let conversion = self.conversion_info(&context, payment, request).await;
        if self.flow.need_process_exempted_sca(payment.payment_type, code.sca_exempted) {
            write_info_log(request, psu.as_ref(), "SCA was exempted for the payment after requesting an authorisation code.");
            return self.execute_payment_without_sca(request, payment, psu, ScaStatus::Exempted, conversion).await;
        }
        if code.is_empty() {
            let error_holder = ErrorHolder::single(ErrorType::PIS_400, self.flow.empty_authorisation_code_error());
            write_error_log(request, psu.as_ref(), &error_holder, EMBEDDED_SELECTING_SCA_METHOD_FAILED);
            return update_error(request, error_holder, psu);
        }
        update_response(request, ScaStatus::ScaMethodSelected, psu)
            .with_chosen_sca_method(code.selected_sca_method)
            .with_challenge_data(code.challenge_data)
            .with_currency_conversion_info(conversion)
    }

    async fn proceed_decoupled_approach(
        &self,
        request: &PaymentRequest,
        payment: &CommonPayment,
        authentication_method_id: &str,
        psu: Option<PsuIdData>,
    ) -> UpdatePsuDataResponse {
        let context = spi_context(payment, psu.clone());
        let authorisation_id = &request.parameters().authorisation_id;
        let response = self.flow.start_sca_decoupled(&context, authorisation_id, authentication_method_id, payment).await;
        match into_spi_result(response, ServiceType::Pis) {
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

    async fn execute_payment_without_sca(
        &self,
        request: &PaymentRequest,
        payment: &CommonPayment,
        psu: Option<PsuIdData>,
        result_status: ScaStatus,
        conversion: Option<CurrencyConversionInfo>,
    ) -> UpdatePsuDataResponse {
        let context = spi_context(payment, psu.clone());
        let response = self.flow.execute_without_sca(&context, payment).await;
        match into_spi_result(response, ServiceType::Pis) {
            Ok(execution) => {
                self.update_payment_data(&request.parameters().business_object_id, &execution).await;
                update_response(request, result_status, psu).with_currency_conversion_info(conversion)
            },
            Err(failure) => {
                write_error_log(request, psu.as_ref(), &failure.error_holder, "Execute payment without SCA has failed.");
                update_error(request, failure.error_holder, psu)
            },
        }
    }

    async fn psu_authenticated(&self, request: &PaymentRequest) -> UpdatePsuDataResponse {
        let params = request.parameters();
        let psu = extract_psu_id_data(params, &request.authorisation);
        let payment = match self.load_payment(request, psu.as_ref()).await {
            Ok(payment) => payment,
            Err(error_holder) => return update_error(request, error_holder, psu),
        };
        let Some(method_id) = params.authentication_method_id.as_deref() else {
            let error_holder = ErrorHolder::single(ErrorType::PIS_400, MessageErrorCode::FormatError);
            write_error_log(request, psu.as_ref(), &error_holder, "No authentication method was selected.");
            return update_error(request, error_holder, psu);
        };
        if self.is_decoupled_method(&params.authorisation_id, method_id).await {
            self.switch_to_decoupled(&params.authorisation_id).await;
            return self.proceed_decoupled_approach(request, &payment, method_id, psu).await;
        }
        self.proceed_embedded_approach(request, &payment, method_id, psu).await
    }

    async fn method_selected(&self, request: &PaymentRequest) -> UpdatePsuDataResponse {
        let params = request.parameters();
        let payment_id = params.business_object_id.as_str();
        let psu = extract_psu_id_data(params, &request.authorisation);
        let payment = match self.load_payment(request, psu.as_ref()).await {
            Ok(payment) => payment,
            Err(error_holder) => return update_error(request, error_holder, psu),
        };
        let context = spi_context(&payment, psu.clone());
        let confirmation = SpiScaConfirmation {
            business_object_id: self.internal_payment_id(payment_id).await,
            authorisation_id: params.authorisation_id.clone(),
            psu_data: psu.clone(),
            tan_number: params.sca_authentication_data.clone(),
        };
        let response = self.flow.verify_sca_authorisation_and_execute(&context, &confirmation, &payment).await;
        let execution = match into_spi_result(response, ServiceType::Pis) {
            Ok(execution) => execution,
            Err(failure) => {
                write_error_log(
                    request,
                    psu.as_ref(),
                    &failure.error_holder,
                    "Verify SCA authorisation and execute payment has failed.",
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
        self.update_payment_data(payment_id, &execution).await;
        let conversion = self.conversion_info(&context, &payment, request).await;
        update_response(request, ScaStatus::Finalised, psu).with_currency_conversion_info(conversion)
    }

    /// A terminal status that is simply echoed back, with the currency conversion details if they are available.
    async fn terminal(&self, request: &PaymentRequest, sca_status: ScaStatus) -> UpdatePsuDataResponse {
        let params = request.parameters();
        let conversion = match self.find_payment(&params.business_object_id).await {
            Some(payment) => {
                let psu = extract_psu_id_data(params, &request.authorisation);
                self.conversion_info(&spi_context(&payment, psu), &payment, request).await
            },
            None => None,
        };
        update_response(request, sca_status, params.psu_data.clone()).with_currency_conversion_info(conversion)
    }

    //-----------------------------------------  Collaborators  ----------------------------------------------------

    async fn load_payment(&self, request: &PaymentRequest, psu: Option<&PsuIdData>) -> Result<CommonPayment, ErrorHolder> {
        let payment_id = &request.parameters().business_object_id;
        match self.flow.fetch_payment(payment_id).await {
            Ok(Some(payment)) => Ok(payment),
            Ok(None) => {
                let error_holder = ErrorHolder::single(ErrorType::PIS_400, MessageErrorCode::ResourceUnknown400);
                write_error_log(request, psu, &error_holder, "Payment not found by id.");
                Err(error_holder)
            },
            Err(e) => {
                error!("🔐️ Could not fetch payment {payment_id}. {e}");
                let error_holder = ErrorHolder::single(ErrorType::PIS_500, MessageErrorCode::InternalServerError);
                write_error_log(request, psu, &error_holder, "Payment lookup failed.");
                Err(error_holder)
            },
        }
    }

    async fn find_payment(&self, payment_id: &str) -> Option<CommonPayment> {
        self.flow.fetch_payment(payment_id).await.unwrap_or_else(|e| {
            warn!("🔐️ Could not fetch payment {payment_id}. {e}");
            None
        })
    }

    async fn internal_payment_id(&self, payment_id: &str) -> String {
        match self.flow.fetch_internal_payment_id(payment_id).await {
            Ok(Some(internal_id)) => internal_id,
            Ok(None) => {
                debug!("🔐️ Payment {payment_id} has no internal id mapping. Using it as is.");
                payment_id.to_string()
            },
            Err(e) => {
                warn!("🔐️ Could not resolve the internal id of payment {payment_id}. {e}");
                payment_id.to_string()
            },
        }
    }

    async fn conversion_info(
        &self,
        context: &SpiContextData,
        payment: &CommonPayment,
        request: &PaymentRequest,
    ) -> Option<CurrencyConversionInfo> {
        let authorisation_id = &request.parameters().authorisation_id;
        let response = self.flow.get_currency_conversion_info(context, payment, authorisation_id).await?;
        match into_spi_result(response, ServiceType::Pis) {
            Ok(info) => Some(info),
            Err(failure) => {
                debug!("🔐️ No currency conversion info for payment {}. {}", payment.payment_id, failure.error_holder);
                None
            },
        }
    }

    /// Records the transaction status the backend reported. A partially accepted payment needs more PSUs to sign.
    async fn update_payment_data(&self, payment_id: &str, execution: &SpiPaymentExecutionResponse) {
        let status = execution.transaction_status;
        let multilevel = status == TransactionStatus::Patc;
        if multilevel {
            if let Err(e) = self.flow.update_multilevel_sca(payment_id, multilevel).await {
                warn!("🔐️ Could not set the multilevel SCA flag on payment {payment_id}. {e}");
            }
        }
        match self.flow.update_payment_status(payment_id, status).await {
            Ok(()) => debug!("🔐️ Payment {payment_id} is now {status}"),
            Err(e) => warn!("🔐️ Could not update payment {payment_id} to {status}. {e}"),
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

impl<F, A, H> AuthorisationProcessorService for PaymentAuthorisationProcessor<F, A, H>
where
    F: PaymentAuthorisationFlow,
    A: AuthorisationManagement,
    H: ScaApproachHandler,
{
    type Parameters = PaymentAuthorisationParameters;

    async fn update_authorisation(
        &self,
        request: &PaymentRequest,
        response: &AuthorisationProcessorResponse,
    ) -> Result<(), AuthorisationProcessorError> {
        let handler = self.approaches.resolve(request.sca_approach, ServiceType::Pis)?;
        handler.update_authorisation(request.parameters(), response).await?;
        Ok(())
    }

    async fn do_sca_started(&self, request: &PaymentRequest) -> ProcessorResult {
        Ok(AuthorisationProcessorResponse::CreatePaymentAuthorisation(self.start(request).await))
    }

    async fn do_sca_received(&self, request: &PaymentRequest) -> ProcessorResult {
        Ok(AuthorisationProcessorResponse::UpdatePaymentPsuData(self.received(request).await))
    }

    async fn do_sca_psu_identified(&self, request: &PaymentRequest) -> ProcessorResult {
        self.do_sca_received(request).await
    }

    async fn do_sca_psu_authenticated(&self, request: &PaymentRequest) -> ProcessorResult {
        Ok(AuthorisationProcessorResponse::UpdatePaymentPsuData(self.psu_authenticated(request).await))
    }

    async fn do_sca_method_selected(&self, request: &PaymentRequest) -> ProcessorResult {
        Ok(AuthorisationProcessorResponse::UpdatePaymentPsuData(self.method_selected(request).await))
    }

    async fn do_sca_finalised(&self, request: &PaymentRequest) -> ProcessorResult {
        Ok(AuthorisationProcessorResponse::UpdatePaymentPsuData(self.terminal(request, ScaStatus::Finalised).await))
    }

    async fn do_sca_exempted(&self, request: &PaymentRequest) -> ProcessorResult {
        if !self.flow.supports_exempted_status() {
            return Err(AuthorisationProcessorError::UnsupportedScaStatus(ScaStatus::Exempted));
        }
        Ok(AuthorisationProcessorResponse::UpdatePaymentPsuData(self.terminal(request, ScaStatus::Exempted).await))
    }
}

//-----------------------------------------  Response helpers  -----------------------------------------------------

fn spi_context(payment: &CommonPayment, psu: Option<PsuIdData>) -> SpiContextData {
    SpiContextData { psu_data: psu, tpp_authorisation_number: Some(payment.tpp_authorisation_number.clone()) }
}

fn start_error(request: &PaymentRequest, error_holder: ErrorHolder) -> StartAuthorisationResponse {
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

fn update_response(request: &PaymentRequest, sca_status: ScaStatus, psu: Option<PsuIdData>) -> UpdatePsuDataResponse {
    let params = request.parameters();
    UpdatePsuDataResponse::new(sca_status, params.business_object_id.as_str(), params.authorisation_id.as_str(), psu)
}

fn update_error(request: &PaymentRequest, error_holder: ErrorHolder, psu: Option<PsuIdData>) -> UpdatePsuDataResponse {
    let params = request.parameters();
    UpdatePsuDataResponse::error(error_holder, params.business_object_id.as_str(), params.authorisation_id.as_str(), psu)
}

fn retry_error(request: &PaymentRequest, error_holder: ErrorHolder, psu: Option<PsuIdData>) -> UpdatePsuDataResponse {
    let params = request.parameters();
    UpdatePsuDataResponse::error_with_status(
        request.sca_status,
        error_holder,
        params.business_object_id.as_str(),
        params.authorisation_id.as_str(),
        psu,
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        error_holder::TppMessageInformation,
        processor::{
            flows::{PisAuthorisationFlow, PisCancellationAuthorisationFlow},
            mocks::{MockCancellationSpi, MockPisSpi},
            objects::CommonAuthorisationParameters,
        },
        test_utils::fixtures::{challenge, chip_otp, conversion_info, payment, push_otp, sms_otp},
        traits::PaymentManagement,
        xs2a_types::Authorisation,
        InMemoryConsentManagement,
    };

    type PisProcessor =
        PaymentAuthorisationProcessor<PisAuthorisationFlow<InMemoryConsentManagement, MockPisSpi>, InMemoryConsentManagement>;
    type CancellationProcessor = PaymentAuthorisationProcessor<
        PisCancellationAuthorisationFlow<InMemoryConsentManagement, MockCancellationSpi>,
        InMemoryConsentManagement,
    >;

    async fn backend_with(payment_type: PaymentType, authorisation: Authorisation) -> InMemoryConsentManagement {
        let _ = env_logger::try_init();
        let backend = InMemoryConsentManagement::new();
        backend.insert_payment_with_internal_id(payment("payment-1", payment_type, &[PsuIdData::new("alice")]), "INT-1").await;
        backend.insert_authorisation(authorisation).await;
        backend
    }

    async fn pis(spi: MockPisSpi, payment_type: PaymentType, status: ScaStatus) -> (PisProcessor, InMemoryConsentManagement) {
        let backend = backend_with(payment_type, authorisation(AuthorisationType::PisCreation, status)).await;
        let flow = PisAuthorisationFlow::new(backend.clone(), spi);
        let processor =
            PaymentAuthorisationProcessor::with_stored_handlers(flow, backend.clone(), &AspspSettings::default()).unwrap();
        (processor, backend)
    }

    async fn cancellation(
        spi: MockCancellationSpi,
        status: ScaStatus,
    ) -> (CancellationProcessor, InMemoryConsentManagement) {
        let backend = backend_with(PaymentType::Single, authorisation(AuthorisationType::PisCancellation, status)).await;
        let flow = PisCancellationAuthorisationFlow::new(backend.clone(), spi);
        let processor =
            PaymentAuthorisationProcessor::with_stored_handlers(flow, backend.clone(), &AspspSettings::default()).unwrap();
        (processor, backend)
    }

    fn authorisation(authorisation_type: AuthorisationType, status: ScaStatus) -> Authorisation {
        Authorisation::new("auth-1", "payment-1", authorisation_type, status, ScaApproach::Embedded)
    }

    /// An authorisation an earlier step already moved to the decoupled approach with the push method.
    fn decoupled_authorisation(authorisation_type: AuthorisationType) -> Authorisation {
        let mut authorisation =
            Authorisation::new("auth-1", "payment-1", authorisation_type, ScaStatus::PsuIdentified, ScaApproach::Decoupled);
        authorisation.authentication_method_id = Some("push".to_string());
        authorisation
    }

    fn decoupled_started(spi_message: &'static str) -> SpiResponse<SpiAuthorisationDecoupledScaResponse> {
        SpiResponse::success(SpiAuthorisationDecoupledScaResponse {
            sca_status: ScaStatus::ScaMethodSelected,
            psu_message: Some(spi_message.into()),
        })
    }

    fn request(
        authorisation_type: AuthorisationType,
        payment_type: PaymentType,
        status: ScaStatus,
        common: CommonAuthorisationParameters,
    ) -> PaymentRequest {
        let params = PaymentAuthorisationParameters::new(common, payment_type, "sepa-credit-transfers");
        AuthorisationProcessorRequest::new(ServiceType::Pis, authorisation(authorisation_type, status), params)
    }

    fn pis_request(payment_type: PaymentType, status: ScaStatus, common: CommonAuthorisationParameters) -> PaymentRequest {
        request(AuthorisationType::PisCreation, payment_type, status, common)
    }

    fn login() -> CommonAuthorisationParameters {
        CommonAuthorisationParameters::new("payment-1", "auth-1").with_psu_data(PsuIdData::new("alice")).with_password("1234")
    }

    fn authorised(spi: &mut MockPisSpi, exempted: bool) {
        spi.expect_authorise_psu().returning(move |_, _, _, _, _| {
            let response = SpiPsuAuthorisationResponse::new(SpiAuthorisationStatus::Success);
            SpiResponse::success(if exempted { response.exempted() } else { response })
        });
    }

    fn no_conversion(spi: &mut MockPisSpi) {
        spi.expect_get_currency_conversion_info()
            .returning(|_, _, _| SpiResponse::error_code(MessageErrorCode::ResourceUnknown404));
    }

    async fn stored_payment(backend: &InMemoryConsentManagement) -> CommonPayment {
        backend.fetch_payment("payment-1").await.unwrap().unwrap()
    }

    async fn stored_authorisation(backend: &InMemoryConsentManagement) -> Authorisation {
        backend.fetch_authorisation("auth-1").await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn an_exempted_single_payment_is_executed_without_sca() {
        let mut spi = MockPisSpi::new();
        authorised(&mut spi, true);
        spi.expect_get_currency_conversion_info().returning(|_, _, _| SpiResponse::success(conversion_info()));
        spi.expect_request_available_sca_methods().never();
        spi.expect_execute_payment_without_sca()
            .times(1)
            .returning(|_, _| SpiResponse::success(SpiPaymentExecutionResponse::new(TransactionStatus::Acsc)));
        let (processor, backend) = pis(spi, PaymentType::Single, ScaStatus::Received).await;
        let response = processor.process(&pis_request(PaymentType::Single, ScaStatus::Received, login())).await.unwrap();
        assert!(!response.has_error());
        assert_eq!(response.sca_status(), ScaStatus::Exempted);
        assert_eq!(response.currency_conversion_info(), Some(&conversion_info()));
        assert_eq!(stored_payment(&backend).await.transaction_status, TransactionStatus::Acsc);
    }

    #[tokio::test]
    async fn periodic_payments_always_need_sca() {
        let mut spi = MockPisSpi::new();
        authorised(&mut spi, true);
        no_conversion(&mut spi);
        spi.expect_execute_payment_without_sca().never();
        spi.expect_request_available_sca_methods().returning(|_, _| {
            SpiResponse::success(SpiAvailableScaMethodsResponse { sca_exempted: true, available_sca_methods: vec![sms_otp()] })
        });
        spi.expect_request_authorisation_code()
            .returning(|_, _, _| SpiResponse::success(SpiAuthorizationCodeResult::new(sms_otp(), challenge())));
        let (processor, _) = pis(spi, PaymentType::Periodic, ScaStatus::Received).await;
        let response = processor.process(&pis_request(PaymentType::Periodic, ScaStatus::Received, login())).await.unwrap();
        assert_eq!(response.sca_status(), ScaStatus::ScaMethodSelected);
        assert_eq!(response.chosen_sca_method(), Some(&sms_otp()));
        assert_eq!(response.currency_conversion_info(), None);
    }

    #[tokio::test]
    async fn no_sca_methods_executes_the_payment() {
        let mut spi = MockPisSpi::new();
        authorised(&mut spi, false);
        no_conversion(&mut spi);
        spi.expect_request_available_sca_methods()
            .returning(|_, _| SpiResponse::success(SpiAvailableScaMethodsResponse::new(vec![])));
        spi.expect_execute_payment_without_sca()
            .times(1)
            .returning(|_, _| SpiResponse::success(SpiPaymentExecutionResponse::new(TransactionStatus::Acsp)));
        let (processor, backend) = pis(spi, PaymentType::Single, ScaStatus::Received).await;
        let response = processor.process(&pis_request(PaymentType::Single, ScaStatus::Received, login())).await.unwrap();
        assert_eq!(response.sca_status(), ScaStatus::Finalised);
        assert_eq!(stored_payment(&backend).await.transaction_status, TransactionStatus::Acsp);
    }

    #[tokio::test]
    async fn several_methods_are_offered_with_conversion_info() {
        let mut spi = MockPisSpi::new();
        authorised(&mut spi, false);
        spi.expect_get_currency_conversion_info().returning(|_, _, _| SpiResponse::success(conversion_info()));
        spi.expect_request_available_sca_methods()
            .returning(|_, _| SpiResponse::success(SpiAvailableScaMethodsResponse::new(vec![sms_otp(), chip_otp()])));
        let (processor, backend) = pis(spi, PaymentType::Bulk, ScaStatus::PsuIdentified).await;
        let response = processor.process(&pis_request(PaymentType::Bulk, ScaStatus::PsuIdentified, login())).await.unwrap();
        assert_eq!(response.sca_status(), ScaStatus::PsuAuthenticated);
        assert_eq!(response.available_sca_methods().len(), 2);
        assert!(response.currency_conversion_info().is_some());
        assert_eq!(stored_authorisation(&backend).await.authentication_methods, vec![sms_otp(), chip_otp()]);
    }

    #[tokio::test]
    async fn a_single_decoupled_method_switches_the_approach() {
        let mut spi = MockPisSpi::new();
        authorised(&mut spi, false);
        no_conversion(&mut spi);
        spi.expect_request_available_sca_methods()
            .returning(|_, _| SpiResponse::success(SpiAvailableScaMethodsResponse::new(vec![push_otp()])));
        spi.expect_start_sca_decoupled().returning(|_, _, _, _| {
            SpiResponse::success(SpiAuthorisationDecoupledScaResponse {
                sca_status: ScaStatus::ScaMethodSelected,
                psu_message: Some("Confirm the payment in your app".into()),
            })
        });
        let (processor, backend) = pis(spi, PaymentType::Single, ScaStatus::Received).await;
        let response = processor.process(&pis_request(PaymentType::Single, ScaStatus::Received, login())).await.unwrap();
        assert_eq!(response.sca_status(), ScaStatus::ScaMethodSelected);
        assert_eq!(response.psu_message(), Some("Confirm the payment in your app"));
        assert_eq!(stored_authorisation(&backend).await.chosen_sca_approach, ScaApproach::Decoupled);
    }

    #[tokio::test]
    async fn a_decoupled_authorisation_skips_method_selection() {
        let mut spi = MockPisSpi::new();
        authorised(&mut spi, false);
        no_conversion(&mut spi);
        spi.expect_request_available_sca_methods().never();
        spi.expect_request_authorisation_code().never();
        spi.expect_start_sca_decoupled()
            .withf(|_, authorisation_id, method_id, _| authorisation_id == "auth-1" && method_id == "push")
            .times(1)
            .returning(|_, _, _, _| decoupled_started("Confirm the payment in your app"));
        let stored = decoupled_authorisation(AuthorisationType::PisCreation);
        let backend = backend_with(PaymentType::Single, stored.clone()).await;
        let flow = PisAuthorisationFlow::new(backend.clone(), spi);
        let processor =
            PaymentAuthorisationProcessor::with_stored_handlers(flow, backend.clone(), &AspspSettings::default()).unwrap();
        let params = PaymentAuthorisationParameters::new(login(), PaymentType::Single, "sepa-credit-transfers");
        let request = AuthorisationProcessorRequest::new(ServiceType::Pis, stored, params);

        let response = processor.process(&request).await.unwrap();
        assert!(!response.has_error());
        assert_eq!(response.sca_status(), ScaStatus::ScaMethodSelected);
        assert_eq!(response.psu_message(), Some("Confirm the payment in your app"));
    }

    #[tokio::test]
    async fn an_exempted_payment_is_executed_before_the_decoupled_start() {
        let mut spi = MockPisSpi::new();
        authorised(&mut spi, true);
        no_conversion(&mut spi);
        spi.expect_start_sca_decoupled().never();
        spi.expect_execute_payment_without_sca()
            .times(1)
            .returning(|_, _| SpiResponse::success(SpiPaymentExecutionResponse::new(TransactionStatus::Acsc)));
        let stored = decoupled_authorisation(AuthorisationType::PisCreation);
        let backend = backend_with(PaymentType::Single, stored.clone()).await;
        let flow = PisAuthorisationFlow::new(backend.clone(), spi);
        let processor =
            PaymentAuthorisationProcessor::with_stored_handlers(flow, backend.clone(), &AspspSettings::default()).unwrap();
        let params = PaymentAuthorisationParameters::new(login(), PaymentType::Single, "sepa-credit-transfers");
        let request = AuthorisationProcessorRequest::new(ServiceType::Pis, stored, params);

        let response = processor.process(&request).await.unwrap();
        assert_eq!(response.sca_status(), ScaStatus::Exempted);
    }

    #[tokio::test]
    async fn a_decoupled_cancellation_goes_straight_to_the_decoupled_start() {
        let mut spi = MockCancellationSpi::new();
        spi.expect_authorise_psu()
            .times(1)
            .returning(|_, _, _, _, _| SpiResponse::success(SpiPsuAuthorisationResponse::new(SpiAuthorisationStatus::Success)));
        spi.expect_request_available_sca_methods().never();
        spi.expect_start_sca_decoupled()
            .withf(|_, _, method_id, _| method_id == "push")
            .times(1)
            .returning(|_, _, _, _| decoupled_started("Confirm the cancellation in your app"));
        let stored = decoupled_authorisation(AuthorisationType::PisCancellation);
        let backend = backend_with(PaymentType::Single, stored.clone()).await;
        let flow = PisCancellationAuthorisationFlow::new(backend.clone(), spi);
        let processor =
            PaymentAuthorisationProcessor::with_stored_handlers(flow, backend.clone(), &AspspSettings::default()).unwrap();
        let params =
            PaymentAuthorisationParameters::new(login().psu_identification_only(), PaymentType::Single, "sepa-credit-transfers");
        let request = AuthorisationProcessorRequest::new(ServiceType::Pis, stored, params);

        let response = processor.process(&request).await.unwrap();
        assert!(!response.has_error());
        assert_eq!(response.sca_status(), ScaStatus::ScaMethodSelected);
        assert_eq!(response.psu_message(), Some("Confirm the cancellation in your app"));
        assert_eq!(response.currency_conversion_info(), None);
    }

    #[tokio::test]
    async fn an_empty_authorisation_code_is_reported_per_flow() {
        let mut spi = MockPisSpi::new();
        no_conversion(&mut spi);
        spi.expect_request_authorisation_code()
            .returning(|_, _, _| SpiResponse::success(SpiAuthorizationCodeResult::default()));
        let (processor, _) = pis(spi, PaymentType::Single, ScaStatus::PsuAuthenticated).await;
        let common = login().with_authentication_method_id("sms");
        let response =
            processor.process(&pis_request(PaymentType::Single, ScaStatus::PsuAuthenticated, common)).await.unwrap();
        let error = response.error_holder().unwrap();
        assert_eq!(error.error_type(), ErrorType::PIS_400);
        assert_eq!(error.first_error_code(), Some(MessageErrorCode::FormatError));

        let mut spi = MockCancellationSpi::new();
        spi.expect_request_authorisation_code()
            .returning(|_, _, _| SpiResponse::success(SpiAuthorizationCodeResult::default()));
        let (processor, _) = cancellation(spi, ScaStatus::PsuAuthenticated).await;
        let common = login().with_authentication_method_id("sms");
        let request = request(AuthorisationType::PisCancellation, PaymentType::Single, ScaStatus::PsuAuthenticated, common);
        let response = processor.process(&request).await.unwrap();
        let error = response.error_holder().unwrap();
        assert_eq!(error.error_type(), ErrorType::PIS_400);
        assert_eq!(error.first_error_code(), Some(MessageErrorCode::ScaMethodUnknown));
    }

    #[tokio::test]
    async fn invalid_credentials_and_retries() {
        let mut spi = MockPisSpi::new();
        let mut attempts = 0;
        spi.expect_authorise_psu().times(2).returning(move |_, _, _, _, _| {
            attempts += 1;
            if attempts == 1 {
                SpiResponse::error_with_payload(
                    SpiPsuAuthorisationResponse::new(SpiAuthorisationStatus::AttemptFailure),
                    vec![TppMessageInformation::of(MessageErrorCode::PsuCredentialsInvalid)],
                )
            } else {
                SpiResponse::success(SpiPsuAuthorisationResponse::new(SpiAuthorisationStatus::Failure))
            }
        });
        let (processor, backend) = pis(spi, PaymentType::Single, ScaStatus::PsuIdentified).await;
        let request = pis_request(PaymentType::Single, ScaStatus::PsuIdentified, login());

        let response = processor.process(&request).await.unwrap();
        assert_eq!(response.sca_status(), ScaStatus::PsuIdentified);
        assert_eq!(response.error_holder().unwrap().error_type(), ErrorType::PIS_401);

        let response = processor.process(&request).await.unwrap();
        assert_eq!(response.sca_status(), ScaStatus::Failed);
        assert_eq!(response.error_holder().unwrap().first_error_code(), Some(MessageErrorCode::PsuCredentialsInvalid));
        assert_eq!(stored_authorisation(&backend).await.sca_status, ScaStatus::Failed);
    }

    #[tokio::test]
    async fn a_verified_tan_executes_with_the_internal_id() {
        let mut spi = MockPisSpi::new();
        no_conversion(&mut spi);
        spi.expect_verify_sca_authorisation_and_execute_payment()
            .withf(|_, confirmation, _| confirmation.business_object_id == "INT-1")
            .returning(|_, _, _| SpiResponse::success(SpiPaymentExecutionResponse::new(TransactionStatus::Patc)));
        let (processor, backend) = pis(spi, PaymentType::Single, ScaStatus::ScaMethodSelected).await;
        let common = login().with_sca_authentication_data("123456");
        let response =
            processor.process(&pis_request(PaymentType::Single, ScaStatus::ScaMethodSelected, common)).await.unwrap();
        assert!(!response.has_error());
        assert_eq!(response.sca_status(), ScaStatus::Finalised);
        let payment = stored_payment(&backend).await;
        assert_eq!(payment.transaction_status, TransactionStatus::Patc);
        assert!(payment.multilevel_sca_required);
    }

    #[tokio::test]
    async fn unknown_payments_are_reported() {
        let (processor, _) = pis(MockPisSpi::new(), PaymentType::Single, ScaStatus::Received).await;
        let common = CommonAuthorisationParameters::new("payment-2", "auth-1").with_psu_data(PsuIdData::new("alice"));
        let response = processor.process(&pis_request(PaymentType::Single, ScaStatus::Received, common)).await.unwrap();
        let error = response.error_holder().unwrap();
        assert_eq!(error.error_type(), ErrorType::PIS_400);
        assert_eq!(error.first_error_code(), Some(MessageErrorCode::ResourceUnknown400));
    }

    #[tokio::test]
    async fn missing_method_selection_is_a_format_error() {
        let (processor, _) = pis(MockPisSpi::new(), PaymentType::Single, ScaStatus::PsuAuthenticated).await;
        let response =
            processor.process(&pis_request(PaymentType::Single, ScaStatus::PsuAuthenticated, login())).await.unwrap();
        let error = response.error_holder().unwrap();
        assert_eq!(error.error_type(), ErrorType::PIS_400);
        assert_eq!(error.first_error_code(), Some(MessageErrorCode::FormatError));
    }

    #[tokio::test]
    async fn exempted_status_is_echoed_for_initiation_only() {
        let mut spi = MockPisSpi::new();
        no_conversion(&mut spi);
        let (processor, _) = pis(spi, PaymentType::Single, ScaStatus::Exempted).await;
        let response = processor.process(&pis_request(PaymentType::Single, ScaStatus::Exempted, login())).await.unwrap();
        assert_eq!(response.sca_status(), ScaStatus::Exempted);

        let (processor, _) = cancellation(MockCancellationSpi::new(), ScaStatus::Exempted).await;
        let request = request(AuthorisationType::PisCancellation, PaymentType::Single, ScaStatus::Exempted, login());
        let err = processor.process(&request).await.unwrap_err();
        assert_eq!(err, AuthorisationProcessorError::UnsupportedScaStatus(ScaStatus::Exempted));
    }

    #[tokio::test]
    async fn cancellation_identification_requires_a_payment_psu() {
        let (processor, _) = cancellation(MockCancellationSpi::new(), ScaStatus::Received).await;

        let bob = CommonAuthorisationParameters::new("payment-1", "auth-1")
            .with_psu_data(PsuIdData::new("bob"))
            .psu_identification_only();
        let bob = request(AuthorisationType::PisCancellation, PaymentType::Single, ScaStatus::Received, bob);
        let response = processor.process(&bob).await.unwrap();
        let error = response.error_holder().unwrap();
        assert_eq!(error.error_type(), ErrorType::PIS_401);
        assert_eq!(error.first_error_code(), Some(MessageErrorCode::UnauthorizedNoPsu));

        let alice = request(
            AuthorisationType::PisCancellation,
            PaymentType::Single,
            ScaStatus::Received,
            login().psu_identification_only(),
        );
        let response = processor.process(&alice).await.unwrap();
        assert!(!response.has_error());
        assert_eq!(response.sca_status(), ScaStatus::PsuIdentified);
    }

    #[tokio::test]
    async fn a_verified_cancellation_cancels_the_payment() {
        let mut spi = MockCancellationSpi::new();
        spi.expect_verify_sca_authorisation_and_cancel_payment()
            .times(1)
            .returning(|_, _, _| SpiResponse::success(()));
        let (processor, backend) = cancellation(spi, ScaStatus::ScaMethodSelected).await;
        let common = login().with_sca_authentication_data("123456");
        let request = request(AuthorisationType::PisCancellation, PaymentType::Single, ScaStatus::ScaMethodSelected, common);
        let response = processor.process(&request).await.unwrap();
        assert_eq!(response.sca_status(), ScaStatus::Finalised);
        assert_eq!(response.currency_conversion_info(), None);
        processor.update_authorisation(&request, &response).await.unwrap();
        assert_eq!(stored_payment(&backend).await.transaction_status, TransactionStatus::Canc);
        assert_eq!(stored_authorisation(&backend).await.sca_status, ScaStatus::Finalised);
    }

    #[tokio::test]
    async fn start_reports_backend_errors_with_the_request_status() {
        let mut spi = MockPisSpi::new();
        spi.expect_start_authorisation()
            .returning(|_, _, _, _, _| SpiResponse::error_code(MessageErrorCode::ServiceBlocked));
        let (processor, _) = pis(spi, PaymentType::Single, ScaStatus::Started).await;
        let response = processor.process(&pis_request(PaymentType::Single, ScaStatus::Started, login())).await.unwrap();
        assert!(matches!(response, AuthorisationProcessorResponse::CreatePaymentAuthorisation(_)));
        assert_eq!(response.sca_status(), ScaStatus::Started);
        assert_eq!(response.error_holder().unwrap().first_error_code(), Some(MessageErrorCode::ServiceBlocked));
    }
}
