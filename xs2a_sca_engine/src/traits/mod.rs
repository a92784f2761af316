//! # Consent management contracts
//!
//! The SCA processor never touches storage directly. It works through the collaborator traits defined here, which a
//! consent management backend implements. [`crate::InMemoryConsentManagement`] is the implementation shipped with
//! this crate.
//!
//! ## Traits
//! * [`AuthorisationManagement`] reads and mutates SCA authorisation records: status, offered SCA methods and the
//!   chosen SCA approach.
//! * [`ConsentManagement`] looks up AIS or PIIS consents and updates their status and multilevel-SCA flag. It also
//!   terminates consents that a newly authorised consent supersedes.
//! * [`PaymentManagement`] does the same for payments, and resolves the internal id behind an encrypted payment id.
//! * [`ConsentExport`] and [`PiisConsentManagement`] are the ASPSP-facing queries and PIIS consent lifecycle.
//! * [`TppStopListManagement`] maintains the list of blocked TPPs.
mod authorisation_management;
mod consent_export;
mod consent_management;
mod data_objects;
mod payment_management;
mod tpp_stop_list;

pub use authorisation_management::AuthorisationManagement;
pub use consent_export::{ConsentExport, PiisConsentManagement};
pub use consent_management::{ConsentManagement, ConsentManagementError};
pub use data_objects::{AuthorisationUpdate, CreatePiisConsentRequest, TppStopListRecord};
pub use payment_management::PaymentManagement;
pub use tpp_stop_list::TppStopListManagement;
