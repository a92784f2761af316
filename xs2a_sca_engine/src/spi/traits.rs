use xs2a_common::Secret;

use crate::{
    spi::objects::{
        SpiAuthorisationDecoupledScaResponse,
        SpiAuthorizationCodeResult,
        SpiAvailableScaMethodsResponse,
        SpiContextData,
        SpiPaymentExecutionResponse,
        SpiPsuAuthorisationResponse,
        SpiResponse,
        SpiScaConfirmation,
        SpiStartAuthorisationResponse,
        SpiVerifyScaAuthorisationResponse,
    },
    xs2a_types::{AisConsent, CommonPayment, CurrencyConversionInfo, PiisConsent, PsuIdData, ScaApproach, ScaStatus},
};

/// Authorisation calls shared by every business object type `T`.
#[allow(async_fn_in_trait)]
pub trait AuthorisationSpi<T> {
    async fn start_authorisation(
        &self,
        context: &SpiContextData,
        sca_approach: ScaApproach,
        sca_status: ScaStatus,
        authorisation_id: &str,
        business_object: &T,
    ) -> SpiResponse<SpiStartAuthorisationResponse>;

    /// Checks the PSU's login credentials.
    async fn authorise_psu(
        &self,
        context: &SpiContextData,
        authorisation_id: &str,
        psu_data: &PsuIdData,
        password: &Option<Secret<String>>,
        business_object: &T,
    ) -> SpiResponse<SpiPsuAuthorisationResponse>;

    async fn request_available_sca_methods(
        &self,
        context: &SpiContextData,
        business_object: &T,
    ) -> SpiResponse<SpiAvailableScaMethodsResponse>;

    /// Asks the backend to send a challenge (OTP, TAN) for the given SCA method.
    async fn request_authorisation_code(
        &self,
        context: &SpiContextData,
        authentication_method_id: &str,
        business_object: &T,
    ) -> SpiResponse<SpiAuthorizationCodeResult>;

    async fn start_sca_decoupled(
        &self,
        context: &SpiContextData,
        authorisation_id: &str,
        authentication_method_id: &str,
        business_object: &T,
    ) -> SpiResponse<SpiAuthorisationDecoupledScaResponse>;
}

#[allow(async_fn_in_trait)]
pub trait AisConsentSpi: AuthorisationSpi<AisConsent> {
    async fn verify_sca_authorisation(
        &self,
        context: &SpiContextData,
        confirmation: &SpiScaConfirmation,
        consent: &AisConsent,
    ) -> SpiResponse<SpiVerifyScaAuthorisationResponse>;
}

#[allow(async_fn_in_trait)]
pub trait PiisConsentSpi: AuthorisationSpi<PiisConsent> {
    async fn verify_sca_authorisation(
        &self,
        context: &SpiContextData,
        confirmation: &SpiScaConfirmation,
        consent: &PiisConsent,
    ) -> SpiResponse<SpiVerifyScaAuthorisationResponse>;
}

#[allow(async_fn_in_trait)]
pub trait PaymentSpi: AuthorisationSpi<CommonPayment> {
    async fn verify_sca_authorisation_and_execute_payment(
        &self,
        context: &SpiContextData,
        confirmation: &SpiScaConfirmation,
        payment: &CommonPayment,
    ) -> SpiResponse<SpiPaymentExecutionResponse>;

    async fn execute_payment_without_sca(
        &self,
        context: &SpiContextData,
        payment: &CommonPayment,
    ) -> SpiResponse<SpiPaymentExecutionResponse>;

    async fn get_currency_conversion_info(
        &self,
        context: &SpiContextData,
        payment: &CommonPayment,
        authorisation_id: &str,
    ) -> SpiResponse<CurrencyConversionInfo>;
}

/// The SPI for cancelling a payment. Cancellation calls carry no payload on success.
#[allow(async_fn_in_trait)]
pub trait PaymentCancellationSpi: AuthorisationSpi<CommonPayment> {
    async fn verify_sca_authorisation_and_cancel_payment(
        &self,
        context: &SpiContextData,
        confirmation: &SpiScaConfirmation,
        payment: &CommonPayment,
    ) -> SpiResponse<()>;

    async fn cancel_payment_without_sca(&self, context: &SpiContextData, payment: &CommonPayment) -> SpiResponse<()>;
}
