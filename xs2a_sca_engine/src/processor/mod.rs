//! # SCA authorisation processors
//!
//! An authorisation moves through the SCA statuses one request at a time. Each request carries the stored
//! [`crate::xs2a_types::Authorisation`], the status to process and the new data from the PSU. The processor runs the
//! step for that status and returns an [`AuthorisationProcessorResponse`] with the next status.
//!
//! ```text
//! STARTED ──► RECEIVED ──► PSUIDENTIFIED ──► PSUAUTHENTICATED ──► SCAMETHODSELECTED ──► FINALISED
//!                 │                                │
//!                 └─── no SCA needed ──────────────┴──► FINALISED / EXEMPTED        (any step) ──► FAILED
//! ```
//!
//! There are two engines. [`ConsentAuthorisationProcessor`] handles consents and [`PaymentAuthorisationProcessor`]
//! handles payments. Each is parameterised by a flow from [`flows`], which supplies the business object store, the
//! SPI and the few rules that differ between AIS, PIIS, PIS and PIS cancellation.
//!
//! Once a step has been processed, [`AuthorisationProcessorService::update_authorisation`] hands the response to the
//! [`ScaApproachHandler`] registered for the request's SCA approach.
mod approach;
mod base;
mod consent_processor;
mod errors;
pub mod flows;
mod objects;
mod payment_processor;
mod response;
mod service;

#[cfg(test)]
mod mocks;

pub use approach::{ApproachRegistry, ScaApproachHandler, StoredAuthorisationHandler};
pub use base::{extract_psu_id_data, is_multiple_sca_methods, is_psu_exist, is_single_sca_method};
pub use consent_processor::{ConsentAuthorisationFlow, ConsentAuthorisationProcessor};
pub use errors::{ApproachRegistryError, AuthorisationProcessorError};
pub use objects::{
    AuthorisationParameters,
    AuthorisationProcessorRequest,
    CommonAuthorisationParameters,
    PaymentAuthorisationParameters,
};
pub use payment_processor::{PaymentAuthorisationFlow, PaymentAuthorisationProcessor, PaymentRequest};
pub use response::{AuthorisationProcessorResponse, StartAuthorisationResponse, UpdatePsuDataResponse};
pub use service::{AuthorisationProcessorService, ProcessorResult};
