//! XS2A SCA authorisation engine
//!
//! This library is the core of a PSD2 "access to account" (XS2A) gateway. It drives the Strong Customer
//! Authentication (SCA) of consents and payments through a bank's backend, and keeps the consent records that the
//! gateway needs to do so.
//!
//! The library is divided into these sections:
//! 1. The SCA authorisation processors ([`mod@processor`]). One processor per business object flow (AIS consents,
//!    PIIS consents, payment initiation, payment cancellation) moves an authorisation through its SCA statuses.
//! 2. The Service Provider Interface ([`mod@spi`]). The bank plugs its backend in by implementing these traits.
//! 3. The consent management contracts ([`mod@traits`]). The processors read and update consents, payments and
//!    authorisations only through these traits. [`InMemoryConsentManagement`] implements all of them.
//! 4. The ASPSP API ([`AspspConsentApi`]), used by the bank's back office to export consents, manage PIIS consents
//!    and block TPPs.
//!
//! # Usage
//!
//! ```rust,ignore
//! let settings = AspspSettings::from_env_or_default();
//! let backend = InMemoryConsentManagement::new();
//! let flow = AisAuthorisationFlow::new(backend.clone(), my_ais_spi, settings.clone());
//! let processor = AisAuthorisationProcessorService::with_stored_handlers(flow, backend.clone(), &settings)?;
//! let request = AuthorisationProcessorRequest::new(ServiceType::Ais, authorisation, parameters);
//! let response = processor.process(&request).await?;
//! processor.update_authorisation(&request, &response).await?;
//! ```
mod aspsp_api;
mod memory;

pub mod config;
pub mod error_holder;
pub mod processor;
pub mod spi;
pub mod traits;
pub mod xs2a_types;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use aspsp_api::{AspspApiError, AspspConsentApi, PsuConsents};
pub use config::AspspSettings;
pub use memory::InMemoryConsentManagement;
pub use processor::{
    flows::{
        AisAuthorisationFlow,
        AisAuthorisationProcessorService,
        PiisAuthorisationFlow,
        PiisAuthorisationProcessorService,
        PisAuthorisationFlow,
        PisAuthorisationProcessorService,
        PisCancellationAuthorisationFlow,
        PisCancellationAuthorisationProcessorService,
    },
    AuthorisationProcessorError,
    AuthorisationProcessorRequest,
    AuthorisationProcessorResponse,
    AuthorisationProcessorService,
    ConsentAuthorisationProcessor,
    PaymentAuthorisationProcessor,
};
