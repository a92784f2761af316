use chrono::Utc;
use log::*;

use super::{
    store::{new_id, ConsentRecord},
    InMemoryConsentManagement,
};
use crate::{
    traits::{ConsentExport, ConsentManagement, ConsentManagementError, CreatePiisConsentRequest, PiisConsentManagement},
    xs2a_types::{AisConsent, CommonPayment, ConsentStatus, PiisConsent, PsuIdData},
};

impl InMemoryConsentManagement {
    async fn fetch<C: ConsentRecord>(&self, consent_id: &str) -> Option<C> {
        C::table(&*self.read().await).get(consent_id).cloned()
    }

    async fn set_status<C: ConsentRecord>(
        &self,
        consent_id: &str,
        status: ConsentStatus,
    ) -> Result<(), ConsentManagementError> {
        self.write().await.update_consent_status::<C>(consent_id, status)?;
        debug!("🗃️ Consent {consent_id} is now {status}");
        Ok(())
    }

    async fn set_multilevel<C: ConsentRecord>(&self, consent_id: &str, required: bool) -> Result<(), ConsentManagementError> {
        let mut store = self.write().await;
        let consent = C::table_mut(&mut store)
            .get_mut(consent_id)
            .ok_or_else(|| ConsentManagementError::ConsentNotFound(consent_id.to_string()))?;
        consent.set_multilevel_sca_required(required);
        trace!("🗃️ Consent {consent_id} multilevel SCA required: {required}");
        Ok(())
    }

    async fn terminate_old<C: ConsentRecord>(&self, new_consent_id: &str) -> Result<Vec<String>, ConsentManagementError> {
        let terminated = self.write().await.terminate_old_consents::<C>(new_consent_id)?;
        if !terminated.is_empty() {
            info!("🗃️ Consent {new_consent_id} supersedes {} old consent(s): {}", terminated.len(), terminated.join(", "));
        }
        Ok(terminated)
    }
}

impl ConsentManagement<AisConsent> for InMemoryConsentManagement {
    async fn fetch_consent(&self, consent_id: &str) -> Result<Option<AisConsent>, ConsentManagementError> {
        Ok(self.fetch::<AisConsent>(consent_id).await)
    }

    async fn update_consent_status(&self, consent_id: &str, status: ConsentStatus) -> Result<(), ConsentManagementError> {
        self.set_status::<AisConsent>(consent_id, status).await
    }

    async fn update_multilevel_sca_required(
        &self,
        consent_id: &str,
        multilevel_sca_required: bool,
    ) -> Result<(), ConsentManagementError> {
        self.set_multilevel::<AisConsent>(consent_id, multilevel_sca_required).await
    }

    async fn find_and_terminate_old_consents(&self, new_consent_id: &str) -> Result<Vec<String>, ConsentManagementError> {
        self.terminate_old::<AisConsent>(new_consent_id).await
    }
}

impl ConsentManagement<PiisConsent> for InMemoryConsentManagement {
    async fn fetch_consent(&self, consent_id: &str) -> Result<Option<PiisConsent>, ConsentManagementError> {
        Ok(self.fetch::<PiisConsent>(consent_id).await)
    }

    async fn update_consent_status(&self, consent_id: &str, status: ConsentStatus) -> Result<(), ConsentManagementError> {
        self.set_status::<PiisConsent>(consent_id, status).await
    }

    async fn update_multilevel_sca_required(
        &self,
        consent_id: &str,
        multilevel_sca_required: bool,
    ) -> Result<(), ConsentManagementError> {
        self.set_multilevel::<PiisConsent>(consent_id, multilevel_sca_required).await
    }

    async fn find_and_terminate_old_consents(&self, new_consent_id: &str) -> Result<Vec<String>, ConsentManagementError> {
        self.terminate_old::<PiisConsent>(new_consent_id).await
    }
}

impl ConsentExport for InMemoryConsentManagement {
    async fn export_ais_consents_by_tpp(
        &self,
        tpp_authorisation_number: &str,
    ) -> Result<Vec<AisConsent>, ConsentManagementError> {
        let store = self.read().await;
        let mut consents = store
            .ais_consents
            .values()
            .filter(|c| c.tpp_authorisation_number == tpp_authorisation_number)
            .cloned()
            .collect::<Vec<_>>();
        consents.sort_by_key(|c| c.creation_timestamp);
        Ok(consents)
    }

    async fn export_ais_consents_by_psu(&self, psu: &PsuIdData) -> Result<Vec<AisConsent>, ConsentManagementError> {
        let store = self.read().await;
        let mut consents =
            store.ais_consents.values().filter(|c| has_psu(&c.psu_id_data, psu)).cloned().collect::<Vec<_>>();
        consents.sort_by_key(|c| c.creation_timestamp);
        Ok(consents)
    }

    async fn export_piis_consents_by_psu(&self, psu: &PsuIdData) -> Result<Vec<PiisConsent>, ConsentManagementError> {
        let store = self.read().await;
        let mut consents =
            store.piis_consents.values().filter(|c| has_psu(&c.psu_id_data, psu)).cloned().collect::<Vec<_>>();
        consents.sort_by_key(|c| c.creation_timestamp);
        Ok(consents)
    }

    async fn export_payments_by_psu(&self, psu: &PsuIdData) -> Result<Vec<CommonPayment>, ConsentManagementError> {
        let store = self.read().await;
        let mut payments = store.payments.values().filter(|p| p.has_psu(psu)).cloned().collect::<Vec<_>>();
        payments.sort_by_key(|p| p.creation_timestamp);
        Ok(payments)
    }
}

fn has_psu(psus: &[PsuIdData], psu: &PsuIdData) -> bool {
    psus.iter().any(|p| p.content_equals(psu))
}

impl PiisConsentManagement for InMemoryConsentManagement {
    /// Consents created by the ASPSP are valid straight away.
    async fn create_piis_consent(&self, request: CreatePiisConsentRequest) -> Result<PiisConsent, ConsentManagementError> {
        if request.psu_id_data.is_empty() {
            return Err(ConsentManagementError::InvalidRequest("A PIIS consent needs a PSU".into()));
        }
        let now = Utc::now();
        let consent = PiisConsent {
            id: new_id(),
            tpp_authorisation_number: request.tpp_authorisation_number,
            psu_id_data: vec![request.psu_id_data],
            consent_status: ConsentStatus::Valid,
            account_reference: request.account_reference,
            card_number: request.card_number,
            card_expiry_date: request.card_expiry_date,
            valid_until: request.valid_until,
            multilevel_sca_required: false,
            creation_timestamp: now,
            status_change_timestamp: now,
        };
        self.insert_piis_consent(consent.clone()).await;
        info!("🗃️ PIIS consent {} created for TPP {}", consent.id, consent.tpp_authorisation_number);
        Ok(consent)
    }

    async fn terminate_piis_consent(&self, consent_id: &str) -> Result<bool, ConsentManagementError> {
        let mut store = self.write().await;
        let consent = store
            .piis_consents
            .get_mut(consent_id)
            .ok_or_else(|| ConsentManagementError::ConsentNotFound(consent_id.to_string()))?;
        if consent.consent_status.is_finalised_status() {
            debug!("🗃️ PIIS consent {consent_id} is already {}", consent.consent_status);
            return Ok(false);
        }
        consent.set_consent_status(ConsentStatus::TerminatedByAspsp, Utc::now());
        info!("🗃️ PIIS consent {consent_id} terminated by the ASPSP");
        Ok(true)
    }
}
