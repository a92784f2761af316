//! An in-memory consent management backend.
//!
//! [`InMemoryConsentManagement`] implements every collaborator trait in [`crate::traits`]. It keeps all records in a
//! single store behind a `tokio` read-write lock, so clones share the same data. It is intended for tests, demos and
//! ASPSPs that bring their own persistence through the traits.
mod authorisations;
mod consents;
mod payments;
mod stop_list;
mod store;

use std::{fmt::Debug, sync::Arc};

use log::*;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::xs2a_types::{AisConsent, Authorisation, CommonPayment, PiisConsent};
use store::ConsentStore;

#[derive(Clone, Default)]
pub struct InMemoryConsentManagement {
    store: Arc<RwLock<ConsentStore>>,
}

impl Debug for InMemoryConsentManagement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "InMemoryConsentManagement")
    }
}

impl InMemoryConsentManagement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the consent, replacing any consent with the same id.
    pub async fn insert_ais_consent(&self, consent: AisConsent) {
        debug!("🗃️ AIS consent {} stored for TPP {}", consent.id, consent.tpp_authorisation_number);
        self.write().await.ais_consents.insert(consent.id.clone(), consent);
    }

    pub async fn insert_piis_consent(&self, consent: PiisConsent) {
        debug!("🗃️ PIIS consent {} stored for TPP {}", consent.id, consent.tpp_authorisation_number);
        self.write().await.piis_consents.insert(consent.id.clone(), consent);
    }

    pub async fn insert_payment(&self, payment: CommonPayment) {
        debug!("🗃️ Payment {} stored for TPP {}", payment.payment_id, payment.tpp_authorisation_number);
        self.write().await.payments.insert(payment.payment_id.clone(), payment);
    }

    /// Stores the payment and maps its encrypted id to the ASPSP's internal id.
    pub async fn insert_payment_with_internal_id(&self, payment: CommonPayment, internal_id: &str) {
        let mut store = self.write().await;
        debug!("🗃️ Payment {} stored with internal id {internal_id}", payment.payment_id);
        store.internal_payment_ids.insert(payment.payment_id.clone(), internal_id.to_string());
        store.payments.insert(payment.payment_id.clone(), payment);
    }

    pub async fn insert_authorisation(&self, authorisation: Authorisation) {
        debug!(
            "🗃️ {} authorisation {} stored for {}",
            authorisation.authorisation_type, authorisation.authorisation_id, authorisation.parent_id
        );
        self.write().await.authorisations.insert(authorisation.authorisation_id.clone(), authorisation);
    }

    async fn read(&self) -> RwLockReadGuard<'_, ConsentStore> {
        self.store.read().await
    }

    async fn write(&self) -> RwLockWriteGuard<'_, ConsentStore> {
        self.store.write().await
    }
}
