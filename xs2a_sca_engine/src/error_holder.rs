//! The TPP-facing error envelope.
//!
//! Expected business failures (unknown consent, invalid credentials, no SCA methods and so on) are never raised as
//! Rust errors by the SCA processor. They are returned inside a successful response as an [`ErrorHolder`], which
//! pairs an [`ErrorType`] (service type and HTTP status class, e.g. `AIS_400`) with the ordered set of
//! [`TppMessageInformation`] codes the TPP will see.
use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::xs2a_types::ServiceType;

//--------------------------------------   MessageErrorCode   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageErrorCode {
    FormatError,
    FormatErrorNoPsu,
    PsuCredentialsInvalid,
    ScaMethodUnknown,
    ScaInvalid,
    PaymentFailed,
    ConsentUnknown400,
    ConsentUnknown403,
    ConsentInvalid,
    ResourceUnknown400,
    ResourceUnknown404,
    UnauthorizedNoPsu,
    ServiceBlocked,
    ServiceInvalid405,
    InternalServerError,
}

impl MessageErrorCode {
    pub fn http_code(&self) -> u16 {
        match self {
            MessageErrorCode::FormatError
            | MessageErrorCode::FormatErrorNoPsu
            | MessageErrorCode::ScaMethodUnknown
            | MessageErrorCode::PaymentFailed
            | MessageErrorCode::ConsentUnknown400
            | MessageErrorCode::ResourceUnknown400 => 400,
            MessageErrorCode::PsuCredentialsInvalid
            | MessageErrorCode::ConsentInvalid
            | MessageErrorCode::UnauthorizedNoPsu => 401,
            MessageErrorCode::ScaInvalid | MessageErrorCode::ConsentUnknown403 | MessageErrorCode::ServiceBlocked => 403,
            MessageErrorCode::ResourceUnknown404 => 404,
            MessageErrorCode::ServiceInvalid405 => 405,
            MessageErrorCode::InternalServerError => 500,
        }
    }
}

impl Display for MessageErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MessageErrorCode::FormatError => "FORMAT_ERROR",
            MessageErrorCode::FormatErrorNoPsu => "FORMAT_ERROR_NO_PSU",
            MessageErrorCode::PsuCredentialsInvalid => "PSU_CREDENTIALS_INVALID",
            MessageErrorCode::ScaMethodUnknown => "SCA_METHOD_UNKNOWN",
            MessageErrorCode::ScaInvalid => "SCA_INVALID",
            MessageErrorCode::PaymentFailed => "PAYMENT_FAILED",
            MessageErrorCode::ConsentUnknown400 => "CONSENT_UNKNOWN_400",
            MessageErrorCode::ConsentUnknown403 => "CONSENT_UNKNOWN_403",
            MessageErrorCode::ConsentInvalid => "CONSENT_INVALID",
            MessageErrorCode::ResourceUnknown400 => "RESOURCE_UNKNOWN_400",
            MessageErrorCode::ResourceUnknown404 => "RESOURCE_UNKNOWN_404",
            MessageErrorCode::UnauthorizedNoPsu => "UNAUTHORIZED_NO_PSU",
            MessageErrorCode::ServiceBlocked => "SERVICE_BLOCKED",
            MessageErrorCode::ServiceInvalid405 => "SERVICE_INVALID_405",
            MessageErrorCode::InternalServerError => "INTERNAL_SERVER_ERROR",
        };
        f.write_str(s)
    }
}

//--------------------------------------      ErrorType       ---------------------------------------------------------
/// A service type paired with an HTTP status class. Displays as e.g. `PIS_401`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorType {
    pub service_type: ServiceType,
    pub http_code: u16,
}

impl ErrorType {
    pub const AIS_400: ErrorType = ErrorType::new(ServiceType::Ais, 400);
    pub const AIS_401: ErrorType = ErrorType::new(ServiceType::Ais, 401);
    pub const AIS_500: ErrorType = ErrorType::new(ServiceType::Ais, 500);
    pub const PIIS_400: ErrorType = ErrorType::new(ServiceType::Piis, 400);
    pub const PIIS_401: ErrorType = ErrorType::new(ServiceType::Piis, 401);
    pub const PIIS_500: ErrorType = ErrorType::new(ServiceType::Piis, 500);
    pub const PIS_400: ErrorType = ErrorType::new(ServiceType::Pis, 400);
    pub const PIS_401: ErrorType = ErrorType::new(ServiceType::Pis, 401);
    pub const PIS_500: ErrorType = ErrorType::new(ServiceType::Pis, 500);

    pub const fn new(service_type: ServiceType, http_code: u16) -> Self {
        Self { service_type, http_code }
    }
}

impl Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.service_type, self.http_code)
    }
}

//--------------------------------------  TppMessageInformation  -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageCategory {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TppMessageInformation {
    pub category: MessageCategory,
    pub message_error_code: MessageErrorCode,
    pub text: Option<String>,
}

impl TppMessageInformation {
    pub fn of(message_error_code: MessageErrorCode) -> Self {
        Self { category: MessageCategory::Error, message_error_code, text: None }
    }

    pub fn with_text<S: Into<String>>(message_error_code: MessageErrorCode, text: S) -> Self {
        Self { category: MessageCategory::Error, message_error_code, text: Some(text.into()) }
    }

    pub fn warning(message_error_code: MessageErrorCode) -> Self {
        Self { category: MessageCategory::Warning, message_error_code, text: None }
    }
}

impl Display for TppMessageInformation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.text {
            Some(text) => write!(f, "{}: {text}", self.message_error_code),
            None => write!(f, "{}", self.message_error_code),
        }
    }
}

//--------------------------------------     ErrorHolder      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorHolder {
    error_type: ErrorType,
    tpp_messages: Vec<TppMessageInformation>,
}

impl ErrorHolder {
    /// Builds a new error holder. Messages keep their order; repeated messages are dropped.
    pub fn new<I>(error_type: ErrorType, messages: I) -> Self
    where I: IntoIterator<Item = TppMessageInformation> {
        let mut tpp_messages: Vec<TppMessageInformation> = Vec::new();
        for message in messages {
            if !tpp_messages.contains(&message) {
                tpp_messages.push(message);
            }
        }
        Self { error_type, tpp_messages }
    }

    /// Shorthand for an error holder carrying a single message code without text.
    pub fn single(error_type: ErrorType, code: MessageErrorCode) -> Self {
        Self::new(error_type, [TppMessageInformation::of(code)])
    }

    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }

    pub fn tpp_messages(&self) -> &[TppMessageInformation] {
        &self.tpp_messages
    }

    pub fn first_error_code(&self) -> Option<MessageErrorCode> {
        self.tpp_messages.first().map(|m| m.message_error_code)
    }

    pub fn has_code(&self, code: MessageErrorCode) -> bool {
        self.tpp_messages.iter().any(|m| m.message_error_code == code)
    }
}

impl Display for ErrorHolder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let messages = self.tpp_messages.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
        write!(f, "{} [{messages}]", self.error_type)
    }
}
