use serde::{Deserialize, Serialize};
use xs2a_common::Secret;

use crate::{
    error_holder::{MessageErrorCode, TppMessageInformation},
    xs2a_types::{
        AuthenticationObject,
        ChallengeData,
        ConsentStatus,
        PsuIdData,
        ScaApproach,
        ScaStatus,
        TransactionStatus,
    },
};

//--------------------------------------     SpiResponse      ---------------------------------------------------------
/// The error/payload envelope returned by every SPI call.
#[derive(Debug, Clone, PartialEq)]
pub struct SpiResponse<T> {
    payload: Option<T>,
    errors: Vec<TppMessageInformation>,
}

impl<T> SpiResponse<T> {
    pub fn success(payload: T) -> Self {
        Self { payload: Some(payload), errors: Vec::new() }
    }

    pub fn error(errors: Vec<TppMessageInformation>) -> Self {
        Self { payload: None, errors }
    }

    /// Shorthand for a failed call with a single message code.
    pub fn error_code(code: MessageErrorCode) -> Self {
        Self::error(vec![TppMessageInformation::of(code)])
    }

    /// A failed call that still reports a payload, e.g. the authorisation status of a failed OTP attempt.
    pub fn error_with_payload(payload: T, errors: Vec<TppMessageInformation>) -> Self {
        Self { payload: Some(payload), errors }
    }

    pub fn has_error(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[TppMessageInformation] {
        &self.errors
    }

    pub fn payload(&self) -> Option<&T> {
        self.payload.as_ref()
    }

    pub fn into_payload(self) -> Option<T> {
        self.payload
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> SpiResponse<U> {
        SpiResponse { payload: self.payload.map(f), errors: self.errors }
    }
}

//--------------------------------------    SpiContextData    ---------------------------------------------------------
/// Request context passed to every SPI call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpiContextData {
    pub psu_data: Option<PsuIdData>,
    pub tpp_authorisation_number: Option<String>,
}

impl SpiContextData {
    pub fn with_psu_id_data(psu_data: Option<PsuIdData>) -> Self {
        Self { psu_data, tpp_authorisation_number: None }
    }
}

//-------------------------------------- SpiAuthorisationStatus -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpiAuthorisationStatus {
    Success,
    /// The attempt failed, but the PSU may try again (e.g. a mistyped OTP with retries left).
    AttemptFailure,
    Failure,
}

//-------------------------------------- SPI response payloads  -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpiStartAuthorisationResponse {
    pub sca_approach: ScaApproach,
    pub sca_status: ScaStatus,
    pub psu_message: Option<String>,
    pub tpp_messages: Vec<TppMessageInformation>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpiPsuAuthorisationResponse {
    pub sca_exempted: bool,
    pub authorisation_status: SpiAuthorisationStatus,
}

impl SpiPsuAuthorisationResponse {
    pub fn new(authorisation_status: SpiAuthorisationStatus) -> Self {
        Self { sca_exempted: false, authorisation_status }
    }

    pub fn exempted(mut self) -> Self {
        self.sca_exempted = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpiAvailableScaMethodsResponse {
    pub sca_exempted: bool,
    pub available_sca_methods: Vec<AuthenticationObject>,
}

impl SpiAvailableScaMethodsResponse {
    pub fn new(available_sca_methods: Vec<AuthenticationObject>) -> Self {
        Self { sca_exempted: false, available_sca_methods }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpiAuthorizationCodeResult {
    pub selected_sca_method: Option<AuthenticationObject>,
    pub challenge_data: Option<ChallengeData>,
    /// The status the ASPSP wants the authorisation to move to. `None` means "method selected".
    pub sca_status: Option<ScaStatus>,
    pub sca_exempted: bool,
}

impl SpiAuthorizationCodeResult {
    pub fn new(selected_sca_method: AuthenticationObject, challenge_data: ChallengeData) -> Self {
        Self { selected_sca_method: Some(selected_sca_method), challenge_data: Some(challenge_data), ..Default::default() }
    }

    /// True when the backend neither selected a method nor produced a challenge.
    pub fn is_empty(&self) -> bool {
        self.selected_sca_method.is_none() && self.challenge_data.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpiVerifyScaAuthorisationResponse {
    pub consent_status: ConsentStatus,
    pub authorisation_status: SpiAuthorisationStatus,
}

impl SpiVerifyScaAuthorisationResponse {
    pub fn new(consent_status: ConsentStatus) -> Self {
        Self { consent_status, authorisation_status: SpiAuthorisationStatus::Success }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpiPaymentExecutionResponse {
    pub transaction_status: TransactionStatus,
    pub authorisation_status: SpiAuthorisationStatus,
}

impl SpiPaymentExecutionResponse {
    pub fn new(transaction_status: TransactionStatus) -> Self {
        Self { transaction_status, authorisation_status: SpiAuthorisationStatus::Success }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpiAuthorisationDecoupledScaResponse {
    pub sca_status: ScaStatus,
    pub psu_message: Option<String>,
}

//--------------------------------------  SpiScaConfirmation  ---------------------------------------------------------
/// The TAN/OTP the PSU entered, with enough context for the backend to check it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpiScaConfirmation {
    pub business_object_id: String,
    pub authorisation_id: String,
    pub psu_data: Option<PsuIdData>,
    pub tan_number: Option<Secret<String>>,
}
