//! # Service Provider Interface
//!
//! The SPI is the contract an ASPSP implements to plug its banking backend into the gateway. Every call returns a
//! [`SpiResponse`], which carries either a payload, a list of TPP-facing error messages, or both (a failed attempt
//! can still report its authorisation status).
//!
//! * [`AuthorisationSpi`] is shared by all business objects: start authorisation, authorise the PSU, list SCA
//!   methods, request an authorisation code and start decoupled SCA.
//! * [`AisConsentSpi`] and [`PiisConsentSpi`] add SCA verification for consents.
//! * [`PaymentSpi`] verifies SCA and executes the payment in one call, and can execute payments without SCA.
//! * [`PaymentCancellationSpi`] does the same for payment cancellations.
//!
//! SPI errors are translated into an [`crate::error_holder::ErrorHolder`] by [`SpiErrorMapper`].
mod error_mapper;
mod objects;
mod traits;

pub use error_mapper::SpiErrorMapper;
pub use objects::{
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
};
pub use traits::{AisConsentSpi, AuthorisationSpi, PaymentCancellationSpi, PaymentSpi, PiisConsentSpi};
