use xs2a_common::Secret;

use crate::{
    error_holder::MessageErrorCode,
    processor::{
        payment_processor::{PaymentAuthorisationFlow, PaymentRequest},
        PaymentAuthorisationProcessor,
    },
    spi::{
        PaymentCancellationSpi,
        SpiAuthorisationDecoupledScaResponse,
        SpiAuthorizationCodeResult,
        SpiAvailableScaMethodsResponse,
        SpiContextData,
        SpiPaymentExecutionResponse,
        SpiPsuAuthorisationResponse,
        SpiResponse,
        SpiScaConfirmation,
        SpiStartAuthorisationResponse,
    },
    traits::{ConsentManagementError, PaymentManagement},
    xs2a_types::{
        AuthorisationType,
        CommonPayment,
        CurrencyConversionInfo,
        PaymentType,
        PsuIdData,
        ScaApproach,
        ScaStatus,
        TransactionStatus,
    },
};

pub type PisCancellationAuthorisationProcessorService<P, S, A> =
    PaymentAuthorisationProcessor<PisCancellationAuthorisationFlow<P, S>, A>;

/// Payment cancellation. Executing the flow cancels the payment, so a successful step leaves it `CANC`.
///
/// Only a PSU of the payment may identify themselves for a cancellation, and cancellations are never exempted from
/// SCA. Cancellation steps carry no currency conversion details.
#[derive(Debug, Clone)]
pub struct PisCancellationAuthorisationFlow<P, S> {
    payments: P,
    spi: S,
}

impl<P, S> PisCancellationAuthorisationFlow<P, S> {
    pub fn new(payments: P, spi: S) -> Self {
        Self { payments, spi }
    }

    pub fn spi(&self) -> &S {
        &self.spi
    }
}

fn cancelled(response: SpiResponse<()>) -> SpiResponse<SpiPaymentExecutionResponse> {
    response.map(|_| SpiPaymentExecutionResponse::new(TransactionStatus::Canc))
}

impl<P, S> PaymentAuthorisationFlow for PisCancellationAuthorisationFlow<P, S>
where
    P: PaymentManagement,
    S: PaymentCancellationSpi,
{
    fn authorisation_type(&self) -> AuthorisationType {
        AuthorisationType::PisCancellation
    }

    fn need_process_exempted_sca(&self, _payment_type: PaymentType, _sca_exempted: bool) -> bool {
        false
    }

    /// A decoupled cancellation always goes straight to authorisation.
    fn is_identification_request(&self, request: &PaymentRequest) -> bool {
        request.parameters().update_psu_identification &&
            request.authorisation.chosen_sca_approach != ScaApproach::Decoupled
    }

    fn requires_known_psu(&self) -> bool {
        true
    }

    fn supports_exempted_status(&self) -> bool {
        false
    }

    fn empty_authorisation_code_error(&self) -> MessageErrorCode {
        MessageErrorCode::ScaMethodUnknown
    }

    async fn fetch_payment(&self, payment_id: &str) -> Result<Option<CommonPayment>, ConsentManagementError> {
        self.payments.fetch_payment(payment_id).await
    }

    async fn fetch_internal_payment_id(&self, payment_id: &str) -> Result<Option<String>, ConsentManagementError> {
        self.payments.fetch_internal_payment_id(payment_id).await
    }

    async fn update_payment_status(
        &self,
        payment_id: &str,
        status: TransactionStatus,
    ) -> Result<(), ConsentManagementError> {
        self.payments.update_payment_status(payment_id, status).await
    }

    async fn update_multilevel_sca(
        &self,
        payment_id: &str,
        multilevel_sca_required: bool,
    ) -> Result<(), ConsentManagementError> {
        self.payments.update_multilevel_sca(payment_id, multilevel_sca_required).await
    }

    async fn start_authorisation(
        &self,
        context: &SpiContextData,
        sca_approach: ScaApproach,
        sca_status: ScaStatus,
        authorisation_id: &str,
        payment: &CommonPayment,
    ) -> SpiResponse<SpiStartAuthorisationResponse> {
        self.spi.start_authorisation(context, sca_approach, sca_status, authorisation_id, payment).await
    }

    async fn authorise_psu(
        &self,
        context: &SpiContextData,
        authorisation_id: &str,
        psu_data: &PsuIdData,
        password: &Option<Secret<String>>,
        payment: &CommonPayment,
    ) -> SpiResponse<SpiPsuAuthorisationResponse> {
        self.spi.authorise_psu(context, authorisation_id, psu_data, password, payment).await
    }

    async fn request_available_sca_methods(
        &self,
        context: &SpiContextData,
        payment: &CommonPayment,
    ) -> SpiResponse<SpiAvailableScaMethodsResponse> {
        self.spi.request_available_sca_methods(context, payment).await
    }

    async fn request_authorisation_code(
        &self,
        context: &SpiContextData,
        authentication_method_id: &str,
        payment: &CommonPayment,
    ) -> SpiResponse<SpiAuthorizationCodeResult> {
        self.spi.request_authorisation_code(context, authentication_method_id, payment).await
    }

    async fn start_sca_decoupled(
        &self,
        context: &SpiContextData,
        authorisation_id: &str,
        authentication_method_id: &str,
        payment: &CommonPayment,
    ) -> SpiResponse<SpiAuthorisationDecoupledScaResponse> {
        self.spi.start_sca_decoupled(context, authorisation_id, authentication_method_id, payment).await
    }

    async fn verify_sca_authorisation_and_execute(
        &self,
        context: &SpiContextData,
        confirmation: &SpiScaConfirmation,
        payment: &CommonPayment,
    ) -> SpiResponse<SpiPaymentExecutionResponse> {
        cancelled(self.spi.verify_sca_authorisation_and_cancel_payment(context, confirmation, payment).await)
    }

    async fn execute_without_sca(
        &self,
        context: &SpiContextData,
        payment: &CommonPayment,
    ) -> SpiResponse<SpiPaymentExecutionResponse> {
        cancelled(self.spi.cancel_payment_without_sca(context, payment).await)
    }

    async fn get_currency_conversion_info(
        &self,
        _context: &SpiContextData,
        _payment: &CommonPayment,
        _authorisation_id: &str,
    ) -> Option<SpiResponse<CurrencyConversionInfo>> {
        None
    }
}
