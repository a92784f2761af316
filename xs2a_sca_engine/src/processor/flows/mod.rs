//! The four concrete authorisation flows.
//!
//! Each flow binds one of the two generic engines to a business object store and the matching SPI:
//!
//! | Flow | Engine | Store | SPI |
//! |---|---|---|---|
//! | [`AisAuthorisationFlow`] | consent | [`ConsentManagement<AisConsent>`] | [`AisConsentSpi`] |
//! | [`PiisAuthorisationFlow`] | consent | [`ConsentManagement<PiisConsent>`] | [`PiisConsentSpi`] |
//! | [`PisAuthorisationFlow`] | payment | [`PaymentManagement`] | [`PaymentSpi`] |
//! | [`PisCancellationAuthorisationFlow`] | payment | [`PaymentManagement`] | [`PaymentCancellationSpi`] |
//!
//! [`ConsentManagement<AisConsent>`]: crate::traits::ConsentManagement
//! [`ConsentManagement<PiisConsent>`]: crate::traits::ConsentManagement
//! [`PaymentManagement`]: crate::traits::PaymentManagement
//! [`AisConsentSpi`]: crate::spi::AisConsentSpi
//! [`PiisConsentSpi`]: crate::spi::PiisConsentSpi
//! [`PaymentSpi`]: crate::spi::PaymentSpi
//! [`PaymentCancellationSpi`]: crate::spi::PaymentCancellationSpi
mod ais;
mod piis;
mod pis;
mod pis_cancellation;

pub use ais::{AisAuthorisationFlow, AisAuthorisationProcessorService};
pub use piis::{PiisAuthorisationFlow, PiisAuthorisationProcessorService};
pub use pis::{PisAuthorisationFlow, PisAuthorisationProcessorService};
pub use pis_cancellation::{PisCancellationAuthorisationFlow, PisCancellationAuthorisationProcessorService};
