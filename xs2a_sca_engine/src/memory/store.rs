use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::{
    traits::{ConsentManagementError, TppStopListRecord},
    xs2a_types::{AisConsent, Authorisation, CommonPayment, Consent, ConsentStatus, PiisConsent, PsuIdData},
};

/// Everything the in-memory backend holds, keyed by id.
#[derive(Debug, Default)]
pub(crate) struct ConsentStore {
    pub ais_consents: HashMap<String, AisConsent>,
    pub piis_consents: HashMap<String, PiisConsent>,
    /// Keyed by the encrypted payment id.
    pub payments: HashMap<String, CommonPayment>,
    /// Encrypted payment id to the ASPSP's internal payment id.
    pub internal_payment_ids: HashMap<String, String>,
    pub authorisations: HashMap<String, Authorisation>,
    pub stop_list: HashMap<String, TppStopListRecord>,
}

/// A consent type that the store can hold and mutate.
pub(crate) trait ConsentRecord: Consent + Clone {
    /// Whether a newly valid consent of this type revokes the TPP's earlier consents for the same PSUs.
    const SUPERSEDES_OLD_CONSENTS: bool;

    fn table(store: &ConsentStore) -> &HashMap<String, Self>;

    fn table_mut(store: &mut ConsentStore) -> &mut HashMap<String, Self>;

    fn set_consent_status(&mut self, status: ConsentStatus, at: DateTime<Utc>);

    fn set_multilevel_sca_required(&mut self, required: bool);

    fn is_one_off(&self) -> bool;
}

impl ConsentRecord for AisConsent {
    const SUPERSEDES_OLD_CONSENTS: bool = true;

    fn table(store: &ConsentStore) -> &HashMap<String, Self> {
        &store.ais_consents
    }

    fn table_mut(store: &mut ConsentStore) -> &mut HashMap<String, Self> {
        &mut store.ais_consents
    }

    fn set_consent_status(&mut self, status: ConsentStatus, at: DateTime<Utc>) {
        self.consent_status = status;
        self.status_change_timestamp = at;
    }

    fn set_multilevel_sca_required(&mut self, required: bool) {
        self.multilevel_sca_required = required;
    }

    fn is_one_off(&self) -> bool {
        self.is_one_access_type()
    }
}

impl ConsentRecord for PiisConsent {
    const SUPERSEDES_OLD_CONSENTS: bool = false;

    fn table(store: &ConsentStore) -> &HashMap<String, Self> {
        &store.piis_consents
    }

    fn table_mut(store: &mut ConsentStore) -> &mut HashMap<String, Self> {
        &mut store.piis_consents
    }

    fn set_consent_status(&mut self, status: ConsentStatus, at: DateTime<Utc>) {
        self.consent_status = status;
        self.status_change_timestamp = at;
    }

    fn set_multilevel_sca_required(&mut self, required: bool) {
        self.multilevel_sca_required = required;
    }

    fn is_one_off(&self) -> bool {
        false
    }
}

impl ConsentStore {
    pub fn update_consent_status<C: ConsentRecord>(
        &mut self,
        consent_id: &str,
        status: ConsentStatus,
    ) -> Result<(), ConsentManagementError> {
        let consent = C::table_mut(self)
            .get_mut(consent_id)
            .ok_or_else(|| ConsentManagementError::ConsentNotFound(consent_id.to_string()))?;
        let current = consent.consent_status();
        if current.is_finalised_status() {
            return Err(ConsentManagementError::ConsentFinalised { id: consent_id.to_string(), status: current });
        }
        consent.set_consent_status(status, Utc::now());
        Ok(())
    }

    /// Revokes the non-finalised consents of the same TPP that were given by exactly the same PSUs as
    /// `new_consent_id`. Returns the revoked ids, sorted.
    pub fn terminate_old_consents<C: ConsentRecord>(
        &mut self,
        new_consent_id: &str,
    ) -> Result<Vec<String>, ConsentManagementError> {
        let consents = C::table_mut(self);
        let new_consent = consents
            .get(new_consent_id)
            .ok_or_else(|| ConsentManagementError::ConsentNotFound(new_consent_id.to_string()))?;
        if !C::SUPERSEDES_OLD_CONSENTS || new_consent.is_one_off() {
            return Ok(Vec::new());
        }
        let psus = new_consent.psu_id_data_list().to_vec();
        if psus.is_empty() {
            return Err(ConsentManagementError::InvalidRequest(format!(
                "Consent {new_consent_id} has no PSU, so it cannot supersede other consents"
            )));
        }
        let tpp = new_consent.tpp_authorisation_number().to_string();
        let now = Utc::now();
        let mut terminated = consents
            .values_mut()
            .filter(|c| {
                c.consent_id() != new_consent_id &&
                    c.tpp_authorisation_number() == tpp &&
                    !c.consent_status().is_finalised_status() &&
                    same_psus(c.psu_id_data_list(), &psus)
            })
            .map(|c| {
                c.set_consent_status(ConsentStatus::RevokedByPsu, now);
                c.consent_id().to_string()
            })
            .collect::<Vec<_>>();
        terminated.sort();
        Ok(terminated)
    }
}

/// Both lists name the same PSUs, ignoring order and IP addresses.
pub(crate) fn same_psus(a: &[PsuIdData], b: &[PsuIdData]) -> bool {
    a.len() == b.len() &&
        a.iter().all(|p| b.iter().any(|q| p.content_equals(q))) &&
        b.iter().all(|q| a.iter().any(|p| p.content_equals(q)))
}

pub(crate) fn new_id() -> String {
    format!("{:032x}", rand::random::<u128>())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::fixtures::ais_consent;

    fn store_with(consents: Vec<AisConsent>) -> ConsentStore {
        let mut store = ConsentStore::default();
        for consent in consents {
            store.ais_consents.insert(consent.id.clone(), consent);
        }
        store
    }

    fn status(store: &ConsentStore, id: &str) -> ConsentStatus {
        store.ais_consents[id].consent_status
    }

    #[test]
    fn psu_lists_match_regardless_of_order() {
        let alice = PsuIdData::new("alice");
        let bob = PsuIdData::new("bob");
        assert!(same_psus(&[alice.clone(), bob.clone()], &[bob.clone(), alice.clone()]));
        assert!(same_psus(&[alice.clone().with_ip_address("1.1.1.1")], &[alice.clone()]));
        assert!(!same_psus(&[alice.clone()], &[alice.clone(), bob.clone()]));
        assert!(!same_psus(&[alice], &[bob]));
    }

    #[test]
    fn old_consents_of_the_same_psu_and_tpp_are_revoked() {
        let alice = PsuIdData::new("alice");
        let mut finalised = ais_consent("finalised", "tpp-1", &[alice.clone()]);
        finalised.consent_status = ConsentStatus::TerminatedByAspsp;
        let mut valid = ais_consent("valid", "tpp-1", &[alice.clone()]);
        valid.consent_status = ConsentStatus::Valid;
        let mut store = store_with(vec![
            ais_consent("new", "tpp-1", &[alice.clone()]),
            ais_consent("received", "tpp-1", &[alice.clone()]),
            valid,
            finalised,
            ais_consent("other-tpp", "tpp-2", &[alice.clone()]),
            ais_consent("other-psu", "tpp-1", &[PsuIdData::new("bob")]),
            ais_consent("shared", "tpp-1", &[alice, PsuIdData::new("bob")]),
        ]);

        let revoked = store.terminate_old_consents::<AisConsent>("new").unwrap();
        assert_eq!(revoked, vec!["received".to_string(), "valid".to_string()]);
        assert_eq!(status(&store, "received"), ConsentStatus::RevokedByPsu);
        assert_eq!(status(&store, "valid"), ConsentStatus::RevokedByPsu);
        assert_eq!(status(&store, "finalised"), ConsentStatus::TerminatedByAspsp);
        assert_eq!(status(&store, "other-tpp"), ConsentStatus::Received);
        assert_eq!(status(&store, "other-psu"), ConsentStatus::Received);
        assert_eq!(status(&store, "shared"), ConsentStatus::Received);
        assert_eq!(status(&store, "new"), ConsentStatus::Received);

        assert!(store.terminate_old_consents::<AisConsent>("new").unwrap().is_empty());
    }

    #[test]
    fn one_off_consents_supersede_nothing() {
        let alice = PsuIdData::new("alice");
        let mut one_off = ais_consent("new", "tpp-1", &[alice.clone()]);
        one_off.recurring_indicator = false;
        let mut store = store_with(vec![one_off, ais_consent("old", "tpp-1", &[alice])]);
        assert!(store.terminate_old_consents::<AisConsent>("new").unwrap().is_empty());
        assert_eq!(status(&store, "old"), ConsentStatus::Received);
    }

    #[test]
    fn termination_needs_a_known_consent_with_psus() {
        let mut store = store_with(vec![ais_consent("anonymous", "tpp-1", &[])]);
        let err = store.terminate_old_consents::<AisConsent>("missing").unwrap_err();
        assert_eq!(err, ConsentManagementError::ConsentNotFound("missing".into()));
        let err = store.terminate_old_consents::<AisConsent>("anonymous").unwrap_err();
        assert!(matches!(err, ConsentManagementError::InvalidRequest(_)));
    }

    #[test]
    fn finalised_consents_cannot_change_status() {
        let mut store = store_with(vec![ais_consent("c1", "tpp-1", &[])]);
        store.update_consent_status::<AisConsent>("c1", ConsentStatus::Valid).unwrap();
        store.update_consent_status::<AisConsent>("c1", ConsentStatus::TerminatedByTpp).unwrap();
        let err = store.update_consent_status::<AisConsent>("c1", ConsentStatus::Valid).unwrap_err();
        assert_eq!(err, ConsentManagementError::ConsentFinalised {
            id: "c1".into(),
            status: ConsentStatus::TerminatedByTpp
        });
        assert_eq!(
            store.update_consent_status::<AisConsent>("nope", ConsentStatus::Valid).unwrap_err(),
            ConsentManagementError::ConsentNotFound("nope".into())
        );
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(new_id(), new_id());
        assert_eq!(new_id().len(), 32);
    }
}
