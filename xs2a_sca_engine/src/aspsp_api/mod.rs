//! # ASPSP-facing consent management API
//!
//! [`AspspConsentApi`] is what the bank's own back office uses, as opposed to the TPP-facing authorisation flows.
//! It exports consents and payments for a TPP or a PSU, creates and terminates PIIS consents and maintains the TPP
//! stop list.
//!
//! ```rust,ignore
//! use xs2a_sca_engine::{AspspConsentApi, InMemoryConsentManagement};
//! let api = AspspConsentApi::new(InMemoryConsentManagement::new());
//! let consents = api.consents_for_psu(&PsuIdData::new("alice")).await?;
//! ```
mod aspsp_consent_api;
mod errors;
mod export_objects;

pub use aspsp_consent_api::AspspConsentApi;
pub use errors::AspspApiError;
pub use export_objects::PsuConsents;
