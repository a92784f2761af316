use serde::{Deserialize, Serialize};

use crate::{
    error_holder::{ErrorHolder, TppMessageInformation},
    xs2a_types::{AuthenticationObject, ChallengeData, CurrencyConversionInfo, PsuIdData, ScaApproach, ScaStatus},
};

//-------------------------------------- StartAuthorisationResponse ---------------------------------------------------
/// The outcome of starting an authorisation (the `STARTED` step).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartAuthorisationResponse {
    sca_status: ScaStatus,
    sca_approach: ScaApproach,
    business_object_id: String,
    authorisation_id: String,
    psu_data: Option<PsuIdData>,
    psu_message: Option<String>,
    tpp_messages: Vec<TppMessageInformation>,
    error_holder: Option<ErrorHolder>,
}

impl StartAuthorisationResponse {
    pub fn new<S: Into<String>>(
        sca_status: ScaStatus,
        sca_approach: ScaApproach,
        business_object_id: S,
        authorisation_id: S,
        psu_data: Option<PsuIdData>,
    ) -> Self {
        Self {
            sca_status,
            sca_approach,
            business_object_id: business_object_id.into(),
            authorisation_id: authorisation_id.into(),
            psu_data,
            psu_message: None,
            tpp_messages: Vec::new(),
            error_holder: None,
        }
    }

    /// A failed start keeps the status it was dispatched on.
    pub fn error<S: Into<String>>(
        error_holder: ErrorHolder,
        sca_status: ScaStatus,
        sca_approach: ScaApproach,
        business_object_id: S,
        authorisation_id: S,
        psu_data: Option<PsuIdData>,
    ) -> Self {
        Self {
            error_holder: Some(error_holder),
            ..Self::new(sca_status, sca_approach, business_object_id, authorisation_id, psu_data)
        }
    }

    pub fn with_psu_message(mut self, psu_message: Option<String>) -> Self {
        self.psu_message = psu_message;
        self
    }

    pub fn with_tpp_messages(mut self, tpp_messages: Vec<TppMessageInformation>) -> Self {
        self.tpp_messages = tpp_messages;
        self
    }

    pub fn sca_status(&self) -> ScaStatus {
        self.sca_status
    }

    pub fn sca_approach(&self) -> ScaApproach {
        self.sca_approach
    }

    pub fn business_object_id(&self) -> &str {
        &self.business_object_id
    }

    pub fn authorisation_id(&self) -> &str {
        &self.authorisation_id
    }

    pub fn psu_data(&self) -> Option<&PsuIdData> {
        self.psu_data.as_ref()
    }

    pub fn psu_message(&self) -> Option<&str> {
        self.psu_message.as_deref()
    }

    pub fn tpp_messages(&self) -> &[TppMessageInformation] {
        &self.tpp_messages
    }

    pub fn error_holder(&self) -> Option<&ErrorHolder> {
        self.error_holder.as_ref()
    }
}

//--------------------------------------  UpdatePsuDataResponse  ------------------------------------------------------
/// The outcome of every step after `STARTED`.
///
/// A response either carries the next status and its optional details, or an [`ErrorHolder`]. Error responses
/// report `FAILED` unless they were built with [`UpdatePsuDataResponse::error_with_status`], which keeps the
/// current status so that the PSU can retry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePsuDataResponse {
    sca_status: ScaStatus,
    business_object_id: String,
    authorisation_id: String,
    psu_data: Option<PsuIdData>,
    error_holder: Option<ErrorHolder>,
    chosen_sca_method: Option<AuthenticationObject>,
    challenge_data: Option<ChallengeData>,
    available_sca_methods: Vec<AuthenticationObject>,
    psu_message: Option<String>,
    currency_conversion_info: Option<CurrencyConversionInfo>,
}

impl UpdatePsuDataResponse {
    pub fn new<S: Into<String>>(
        sca_status: ScaStatus,
        business_object_id: S,
        authorisation_id: S,
        psu_data: Option<PsuIdData>,
    ) -> Self {
        Self {
            sca_status,
            business_object_id: business_object_id.into(),
            authorisation_id: authorisation_id.into(),
            psu_data,
            error_holder: None,
            chosen_sca_method: None,
            challenge_data: None,
            available_sca_methods: Vec::new(),
            psu_message: None,
            currency_conversion_info: None,
        }
    }

    pub fn error<S: Into<String>>(
        error_holder: ErrorHolder,
        business_object_id: S,
        authorisation_id: S,
        psu_data: Option<PsuIdData>,
    ) -> Self {
        Self::error_with_status(ScaStatus::Failed, error_holder, business_object_id, authorisation_id, psu_data)
    }

    pub fn error_with_status<S: Into<String>>(
        sca_status: ScaStatus,
        error_holder: ErrorHolder,
        business_object_id: S,
        authorisation_id: S,
        psu_data: Option<PsuIdData>,
    ) -> Self {
        Self { error_holder: Some(error_holder), ..Self::new(sca_status, business_object_id, authorisation_id, psu_data) }
    }

    pub fn with_chosen_sca_method(mut self, method: Option<AuthenticationObject>) -> Self {
        self.chosen_sca_method = method;
        self
    }

    pub fn with_challenge_data(mut self, challenge_data: Option<ChallengeData>) -> Self {
        self.challenge_data = challenge_data;
        self
    }

    pub fn with_available_sca_methods(mut self, methods: Vec<AuthenticationObject>) -> Self {
        self.available_sca_methods = methods;
        self
    }

    pub fn with_psu_message(mut self, psu_message: Option<String>) -> Self {
        self.psu_message = psu_message;
        self
    }

    pub fn with_currency_conversion_info(mut self, info: Option<CurrencyConversionInfo>) -> Self {
        self.currency_conversion_info = info;
        self
    }

    pub fn sca_status(&self) -> ScaStatus {
        self.sca_status
    }

    pub fn business_object_id(&self) -> &str {
        &self.business_object_id
    }

    pub fn authorisation_id(&self) -> &str {
        &self.authorisation_id
    }

    pub fn psu_data(&self) -> Option<&PsuIdData> {
        self.psu_data.as_ref()
    }

    pub fn error_holder(&self) -> Option<&ErrorHolder> {
        self.error_holder.as_ref()
    }

    pub fn chosen_sca_method(&self) -> Option<&AuthenticationObject> {
        self.chosen_sca_method.as_ref()
    }

    pub fn challenge_data(&self) -> Option<&ChallengeData> {
        self.challenge_data.as_ref()
    }

    pub fn available_sca_methods(&self) -> &[AuthenticationObject] {
        &self.available_sca_methods
    }

    pub fn psu_message(&self) -> Option<&str> {
        self.psu_message.as_deref()
    }

    pub fn currency_conversion_info(&self) -> Option<&CurrencyConversionInfo> {
        self.currency_conversion_info.as_ref()
    }
}

//------------------------------------ AuthorisationProcessorResponse -------------------------------------------------
/// The result of a single processing step, one variant per flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthorisationProcessorResponse {
    CreateConsentAuthorisation(StartAuthorisationResponse),
    UpdateConsentPsuData(UpdatePsuDataResponse),
    CreatePaymentAuthorisation(StartAuthorisationResponse),
    UpdatePaymentPsuData(UpdatePsuDataResponse),
}

impl AuthorisationProcessorResponse {
    pub fn sca_status(&self) -> ScaStatus {
        match self {
            Self::CreateConsentAuthorisation(r) | Self::CreatePaymentAuthorisation(r) => r.sca_status(),
            Self::UpdateConsentPsuData(r) | Self::UpdatePaymentPsuData(r) => r.sca_status(),
        }
    }

    pub fn error_holder(&self) -> Option<&ErrorHolder> {
        match self {
            Self::CreateConsentAuthorisation(r) | Self::CreatePaymentAuthorisation(r) => r.error_holder(),
            Self::UpdateConsentPsuData(r) | Self::UpdatePaymentPsuData(r) => r.error_holder(),
        }
    }

    /// An error-bearing response must not advance the business object beyond what it reports.
    pub fn has_error(&self) -> bool {
        self.error_holder().is_some()
    }

    pub fn business_object_id(&self) -> &str {
        match self {
            Self::CreateConsentAuthorisation(r) | Self::CreatePaymentAuthorisation(r) => r.business_object_id(),
            Self::UpdateConsentPsuData(r) | Self::UpdatePaymentPsuData(r) => r.business_object_id(),
        }
    }

    pub fn authorisation_id(&self) -> &str {
        match self {
            Self::CreateConsentAuthorisation(r) | Self::CreatePaymentAuthorisation(r) => r.authorisation_id(),
            Self::UpdateConsentPsuData(r) | Self::UpdatePaymentPsuData(r) => r.authorisation_id(),
        }
    }

    pub fn psu_data(&self) -> Option<&PsuIdData> {
        match self {
            Self::CreateConsentAuthorisation(r) | Self::CreatePaymentAuthorisation(r) => r.psu_data(),
            Self::UpdateConsentPsuData(r) | Self::UpdatePaymentPsuData(r) => r.psu_data(),
        }
    }

    pub fn psu_message(&self) -> Option<&str> {
        match self {
            Self::CreateConsentAuthorisation(r) | Self::CreatePaymentAuthorisation(r) => r.psu_message(),
            Self::UpdateConsentPsuData(r) | Self::UpdatePaymentPsuData(r) => r.psu_message(),
        }
    }

    /// The approach reported by the backend when the authorisation was started. Update steps do not change it.
    pub fn sca_approach(&self) -> Option<ScaApproach> {
        match self {
            Self::CreateConsentAuthorisation(r) | Self::CreatePaymentAuthorisation(r) => Some(r.sca_approach()),
            Self::UpdateConsentPsuData(_) | Self::UpdatePaymentPsuData(_) => None,
        }
    }

    pub fn update_psu_data(&self) -> Option<&UpdatePsuDataResponse> {
        match self {
            Self::UpdateConsentPsuData(r) | Self::UpdatePaymentPsuData(r) => Some(r),
            _ => None,
        }
    }

    pub fn start_authorisation(&self) -> Option<&StartAuthorisationResponse> {
        match self {
            Self::CreateConsentAuthorisation(r) | Self::CreatePaymentAuthorisation(r) => Some(r),
            _ => None,
        }
    }

    pub fn chosen_sca_method(&self) -> Option<&AuthenticationObject> {
        self.update_psu_data().and_then(UpdatePsuDataResponse::chosen_sca_method)
    }

    pub fn challenge_data(&self) -> Option<&ChallengeData> {
        self.update_psu_data().and_then(UpdatePsuDataResponse::challenge_data)
    }

    pub fn available_sca_methods(&self) -> &[AuthenticationObject] {
        self.update_psu_data().map(UpdatePsuDataResponse::available_sca_methods).unwrap_or_default()
    }

    pub fn currency_conversion_info(&self) -> Option<&CurrencyConversionInfo> {
        self.update_psu_data().and_then(UpdatePsuDataResponse::currency_conversion_info)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error_holder::{ErrorType, MessageErrorCode};

    #[test]
    fn error_responses_default_to_failed() {
        let holder = ErrorHolder::single(ErrorType::AIS_400, MessageErrorCode::FormatErrorNoPsu);
        let response = UpdatePsuDataResponse::error(holder.clone(), "consent", "auth", None);
        assert_eq!(response.sca_status(), ScaStatus::Failed);
        assert_eq!(response.error_holder(), Some(&holder));

        let retry = UpdatePsuDataResponse::error_with_status(ScaStatus::PsuIdentified, holder, "consent", "auth", None);
        assert_eq!(retry.sca_status(), ScaStatus::PsuIdentified);
    }

    #[test]
    fn accessors_dispatch_over_variants() {
        let methods = vec![AuthenticationObject::new("SMS_OTP", "sms"), AuthenticationObject::new("PUSH_OTP", "push")];
        let inner = UpdatePsuDataResponse::new(ScaStatus::PsuAuthenticated, "payment", "auth", None)
            .with_available_sca_methods(methods.clone());
        let response = AuthorisationProcessorResponse::UpdatePaymentPsuData(inner);
        assert_eq!(response.sca_status(), ScaStatus::PsuAuthenticated);
        assert_eq!(response.available_sca_methods(), methods.as_slice());
        assert!(!response.has_error());
        assert!(response.sca_approach().is_none());

        let start = StartAuthorisationResponse::new(ScaStatus::Received, ScaApproach::Embedded, "consent", "auth", None)
            .with_psu_message(Some("hello".into()));
        let response = AuthorisationProcessorResponse::CreateConsentAuthorisation(start);
        assert_eq!(response.psu_message(), Some("hello"));
        assert_eq!(response.sca_approach(), Some(ScaApproach::Embedded));
        assert!(response.available_sca_methods().is_empty());
    }
}
