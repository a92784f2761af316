use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use xs2a_common::Secret;

use crate::{
    error_holder::MessageErrorCode,
    spi::{
        AisConsentSpi,
        AuthorisationSpi,
        PaymentCancellationSpi,
        PaymentSpi,
        PiisConsentSpi,
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
        SpiVerifyScaAuthorisationResponse,
    },
    test_utils::fixtures::{challenge, sca_method, sms_otp},
    xs2a_types::{
        AisConsent,
        CommonPayment,
        ConsentStatus,
        CurrencyConversionInfo,
        PiisConsent,
        PsuIdData,
        ScaApproach,
        ScaStatus,
        TransactionStatus,
    },
};

/// The canned responses of a [`ScriptedSpi`]. The defaults describe a backend where everything succeeds with a
/// single SMS OTP method and no currency conversion.
#[derive(Debug, Clone)]
pub struct SpiScript {
    /// `None` echoes the requested approach and status back.
    pub start_authorisation: Option<SpiResponse<SpiStartAuthorisationResponse>>,
    pub authorise_psu: SpiResponse<SpiPsuAuthorisationResponse>,
    pub available_sca_methods: SpiResponse<SpiAvailableScaMethodsResponse>,
    /// `None` returns the requested fixture method with a challenge.
    pub authorisation_code: Option<SpiResponse<SpiAuthorizationCodeResult>>,
    pub decoupled_sca: SpiResponse<SpiAuthorisationDecoupledScaResponse>,
    pub verify_consent: SpiResponse<SpiVerifyScaAuthorisationResponse>,
    pub execute_payment: SpiResponse<SpiPaymentExecutionResponse>,
    pub execute_payment_without_sca: SpiResponse<SpiPaymentExecutionResponse>,
    pub cancel_payment: SpiResponse<()>,
    pub cancel_payment_without_sca: SpiResponse<()>,
    pub currency_conversion: SpiResponse<CurrencyConversionInfo>,
}

impl Default for SpiScript {
    fn default() -> Self {
        Self {
            start_authorisation: None,
            authorise_psu: SpiResponse::success(SpiPsuAuthorisationResponse::new(SpiAuthorisationStatus::Success)),
            available_sca_methods: SpiResponse::success(SpiAvailableScaMethodsResponse::new(vec![sms_otp()])),
            authorisation_code: None,
            decoupled_sca: SpiResponse::success(SpiAuthorisationDecoupledScaResponse {
                sca_status: ScaStatus::ScaMethodSelected,
                psu_message: Some("Please confirm the request in your banking app".into()),
            }),
            verify_consent: SpiResponse::success(SpiVerifyScaAuthorisationResponse::new(ConsentStatus::Valid)),
            execute_payment: SpiResponse::success(SpiPaymentExecutionResponse::new(TransactionStatus::Acsc)),
            execute_payment_without_sca: SpiResponse::success(SpiPaymentExecutionResponse::new(TransactionStatus::Acsc)),
            cancel_payment: SpiResponse::success(()),
            cancel_payment_without_sca: SpiResponse::success(()),
            currency_conversion: SpiResponse::error_code(MessageErrorCode::ResourceUnknown404),
        }
    }
}

/// A fake banking backend that answers every SPI call from an [`SpiScript`] and records the calls it received.
///
/// Clones share the script and the call log, so a test can keep a handle after moving the SPI into a flow.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSpi {
    script: Arc<Mutex<SpiScript>>,
    calls: Arc<Mutex<Vec<&'static str>>>,
    confirmations: Arc<Mutex<Vec<SpiScaConfirmation>>>,
}

impl ScriptedSpi {
    pub fn new(script: SpiScript) -> Self {
        Self { script: Arc::new(Mutex::new(script)), ..Default::default() }
    }

    /// Edit the script in place.
    pub fn script(&self) -> MutexGuard<'_, SpiScript> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The names of the SPI calls received so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn was_called(&self, call: &str) -> bool {
        self.calls().iter().any(|c| *c == call)
    }

    pub fn last_confirmation(&self) -> Option<SpiScaConfirmation> {
        self.confirmations.lock().unwrap_or_else(PoisonError::into_inner).last().cloned()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(call);
    }

    fn record_confirmation(&self, confirmation: &SpiScaConfirmation) {
        self.confirmations.lock().unwrap_or_else(PoisonError::into_inner).push(confirmation.clone());
    }

    fn start(&self, sca_approach: ScaApproach, sca_status: ScaStatus) -> SpiResponse<SpiStartAuthorisationResponse> {
        self.record("start_authorisation");
        self.script().start_authorisation.clone().unwrap_or_else(|| {
            SpiResponse::success(SpiStartAuthorisationResponse {
                sca_approach,
                sca_status,
                psu_message: None,
                tpp_messages: Vec::new(),
            })
        })
    }

    fn authorise(&self) -> SpiResponse<SpiPsuAuthorisationResponse> {
        self.record("authorise_psu");
        self.script().authorise_psu.clone()
    }

    fn methods(&self) -> SpiResponse<SpiAvailableScaMethodsResponse> {
        self.record("request_available_sca_methods");
        self.script().available_sca_methods.clone()
    }

    fn code(&self, authentication_method_id: &str) -> SpiResponse<SpiAuthorizationCodeResult> {
        self.record("request_authorisation_code");
        self.script().authorisation_code.clone().unwrap_or_else(|| match sca_method(authentication_method_id) {
            Some(method) => SpiResponse::success(SpiAuthorizationCodeResult::new(method, challenge())),
            None => SpiResponse::error_code(MessageErrorCode::ScaMethodUnknown),
        })
    }

    fn decoupled(&self) -> SpiResponse<SpiAuthorisationDecoupledScaResponse> {
        self.record("start_sca_decoupled");
        self.script().decoupled_sca.clone()
    }

    fn conversion(&self) -> SpiResponse<CurrencyConversionInfo> {
        self.record("get_currency_conversion_info");
        self.script().currency_conversion.clone()
    }
}

macro_rules! scripted_authorisation_spi {
    ($object:ty) => {
        impl AuthorisationSpi<$object> for ScriptedSpi {
            async fn start_authorisation(
                &self,
                _context: &SpiContextData,
                sca_approach: ScaApproach,
                sca_status: ScaStatus,
                _authorisation_id: &str,
                _business_object: &$object,
            ) -> SpiResponse<SpiStartAuthorisationResponse> {
                self.start(sca_approach, sca_status)
            }

            async fn authorise_psu(
                &self,
                _context: &SpiContextData,
                _authorisation_id: &str,
                _psu_data: &PsuIdData,
                _password: &Option<Secret<String>>,
                _business_object: &$object,
            ) -> SpiResponse<SpiPsuAuthorisationResponse> {
                self.authorise()
            }

            async fn request_available_sca_methods(
                &self,
                _context: &SpiContextData,
                _business_object: &$object,
            ) -> SpiResponse<SpiAvailableScaMethodsResponse> {
                self.methods()
            }

            async fn request_authorisation_code(
                &self,
                _context: &SpiContextData,
                authentication_method_id: &str,
                _business_object: &$object,
            ) -> SpiResponse<SpiAuthorizationCodeResult> {
                self.code(authentication_method_id)
            }

            async fn start_sca_decoupled(
                &self,
                _context: &SpiContextData,
                _authorisation_id: &str,
                _authentication_method_id: &str,
                _business_object: &$object,
            ) -> SpiResponse<SpiAuthorisationDecoupledScaResponse> {
                self.decoupled()
            }
        }
    };
}

scripted_authorisation_spi!(AisConsent);
scripted_authorisation_spi!(PiisConsent);
scripted_authorisation_spi!(CommonPayment);

impl AisConsentSpi for ScriptedSpi {
    async fn verify_sca_authorisation(
        &self,
        _context: &SpiContextData,
        confirmation: &SpiScaConfirmation,
        _consent: &AisConsent,
    ) -> SpiResponse<SpiVerifyScaAuthorisationResponse> {
        self.record("verify_sca_authorisation");
        self.record_confirmation(confirmation);
        self.script().verify_consent.clone()
    }
}

impl PiisConsentSpi for ScriptedSpi {
    async fn verify_sca_authorisation(
        &self,
        _context: &SpiContextData,
        confirmation: &SpiScaConfirmation,
        _consent: &PiisConsent,
    ) -> SpiResponse<SpiVerifyScaAuthorisationResponse> {
        self.record("verify_sca_authorisation");
        self.record_confirmation(confirmation);
        self.script().verify_consent.clone()
    }
}

impl PaymentSpi for ScriptedSpi {
    async fn verify_sca_authorisation_and_execute_payment(
        &self,
        _context: &SpiContextData,
        confirmation: &SpiScaConfirmation,
        _payment: &CommonPayment,
    ) -> SpiResponse<SpiPaymentExecutionResponse> {
        self.record("verify_sca_authorisation_and_execute_payment");
        self.record_confirmation(confirmation);
        self.script().execute_payment.clone()
    }

    async fn execute_payment_without_sca(
        &self,
        _context: &SpiContextData,
        _payment: &CommonPayment,
    ) -> SpiResponse<SpiPaymentExecutionResponse> {
        self.record("execute_payment_without_sca");
        self.script().execute_payment_without_sca.clone()
    }

    async fn get_currency_conversion_info(
        &self,
        _context: &SpiContextData,
        _payment: &CommonPayment,
        _authorisation_id: &str,
    ) -> SpiResponse<CurrencyConversionInfo> {
        self.conversion()
    }
}

impl PaymentCancellationSpi for ScriptedSpi {
    async fn verify_sca_authorisation_and_cancel_payment(
        &self,
        _context: &SpiContextData,
        confirmation: &SpiScaConfirmation,
        _payment: &CommonPayment,
    ) -> SpiResponse<()> {
        self.record("verify_sca_authorisation_and_cancel_payment");
        self.record_confirmation(confirmation);
        self.script().cancel_payment.clone()
    }

    async fn cancel_payment_without_sca(&self, _context: &SpiContextData, _payment: &CommonPayment) -> SpiResponse<()> {
        self.record("cancel_payment_without_sca");
        self.script().cancel_payment_without_sca.clone()
    }
}
