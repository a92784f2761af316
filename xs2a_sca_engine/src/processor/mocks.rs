use mockall::mock;
use xs2a_common::Secret;

use crate::{
    spi::{
        AisConsentSpi,
        AuthorisationSpi,
        PaymentCancellationSpi,
        PaymentSpi,
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
    xs2a_types::{AisConsent, CommonPayment, CurrencyConversionInfo, PsuIdData, ScaApproach, ScaStatus},
};

mock! {
    pub AisSpi {}
    impl AuthorisationSpi<AisConsent> for AisSpi {
        async fn start_authorisation(&self, context: &SpiContextData, sca_approach: ScaApproach, sca_status: ScaStatus, authorisation_id: &str, business_object: &AisConsent) -> SpiResponse<SpiStartAuthorisationResponse>;
        async fn authorise_psu(&self, context: &SpiContextData, authorisation_id: &str, psu_data: &PsuIdData, password: &Option<Secret<String>>, business_object: &AisConsent) -> SpiResponse<SpiPsuAuthorisationResponse>;
        async fn request_available_sca_methods(&self, context: &SpiContextData, business_object: &AisConsent) -> SpiResponse<SpiAvailableScaMethodsResponse>;
        async fn request_authorisation_code(&self, context: &SpiContextData, authentication_method_id: &str, business_object: &AisConsent) -> SpiResponse<SpiAuthorizationCodeResult>;
        async fn start_sca_decoupled(&self, context: &SpiContextData, authorisation_id: &str, authentication_method_id: &str, business_object: &AisConsent) -> SpiResponse<SpiAuthorisationDecoupledScaResponse>;
    }
    impl AisConsentSpi for AisSpi {
        async fn verify_sca_authorisation(&self, context: &SpiContextData, confirmation: &SpiScaConfirmation, consent: &AisConsent) -> SpiResponse<SpiVerifyScaAuthorisationResponse>;
    }
}

mock! {
    pub PisSpi {}
    impl AuthorisationSpi<CommonPayment> for PisSpi {
        async fn start_authorisation(&self, context: &SpiContextData, sca_approach: ScaApproach, sca_status: ScaStatus, authorisation_id: &str, business_object: &CommonPayment) -> SpiResponse<SpiStartAuthorisationResponse>;
        async fn authorise_psu(&self, context: &SpiContextData, authorisation_id: &str, psu_data: &PsuIdData, password: &Option<Secret<String>>, business_object: &CommonPayment) -> SpiResponse<SpiPsuAuthorisationResponse>;
        async fn request_available_sca_methods(&self, context: &SpiContextData, business_object: &CommonPayment) -> SpiResponse<SpiAvailableScaMethodsResponse>;
        async fn request_authorisation_code(&self, context: &SpiContextData, authentication_method_id: &str, business_object: &CommonPayment) -> SpiResponse<SpiAuthorizationCodeResult>;
        async fn start_sca_decoupled(&self, context: &SpiContextData, authorisation_id: &str, authentication_method_id: &str, business_object: &CommonPayment) -> SpiResponse<SpiAuthorisationDecoupledScaResponse>;
    }
    impl PaymentSpi for PisSpi {
        async fn verify_sca_authorisation_and_execute_payment(&self, context: &SpiContextData, confirmation: &SpiScaConfirmation, payment: &CommonPayment) -> SpiResponse<SpiPaymentExecutionResponse>;
        async fn execute_payment_without_sca(&self, context: &SpiContextData, payment: &CommonPayment) -> SpiResponse<SpiPaymentExecutionResponse>;
        async fn get_currency_conversion_info(&self, context: &SpiContextData, payment: &CommonPayment, authorisation_id: &str) -> SpiResponse<CurrencyConversionInfo>;
    }
}

mock! {
    pub CancellationSpi {}
    impl AuthorisationSpi<CommonPayment> for CancellationSpi {
        async fn start_authorisation(&self, context: &SpiContextData, sca_approach: ScaApproach, sca_status: ScaStatus, authorisation_id: &str, business_object: &CommonPayment) -> SpiResponse<SpiStartAuthorisationResponse>;
        async fn authorise_psu(&self, context: &SpiContextData, authorisation_id: &str, psu_data: &PsuIdData, password: &Option<Secret<String>>, business_object: &CommonPayment) -> SpiResponse<SpiPsuAuthorisationResponse>;
        async fn request_available_sca_methods(&self, context: &SpiContextData, business_object: &CommonPayment) -> SpiResponse<SpiAvailableScaMethodsResponse>;
        async fn request_authorisation_code(&self, context: &SpiContextData, authentication_method_id: &str, business_object: &CommonPayment) -> SpiResponse<SpiAuthorizationCodeResult>;
        async fn start_sca_decoupled(&self, context: &SpiContextData, authorisation_id: &str, authentication_method_id: &str, business_object: &CommonPayment) -> SpiResponse<SpiAuthorisationDecoupledScaResponse>;
    }
    impl PaymentCancellationSpi for CancellationSpi {
        async fn verify_sca_authorisation_and_cancel_payment(&self, context: &SpiContextData, confirmation: &SpiScaConfirmation, payment: &CommonPayment) -> SpiResponse<()>;
        async fn cancel_payment_without_sca(&self, context: &SpiContextData, payment: &CommonPayment) -> SpiResponse<()>;
    }
}
