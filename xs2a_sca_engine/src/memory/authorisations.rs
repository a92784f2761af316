use log::*;

use super::InMemoryConsentManagement;
use crate::{
    traits::{AuthorisationManagement, AuthorisationUpdate, ConsentManagementError},
    xs2a_types::{AuthenticationObject, Authorisation, ScaApproach, ScaStatus},
};

fn not_found(authorisation_id: &str) -> ConsentManagementError {
    ConsentManagementError::AuthorisationNotFound(authorisation_id.to_string())
}

/// A finalised authorisation only accepts a repeat of its own status.
fn check_not_finalised(authorisation: &Authorisation, new_status: ScaStatus) -> Result<(), ConsentManagementError> {
    let current = authorisation.sca_status;
    if current.is_finalised_status() && current != new_status {
        return Err(ConsentManagementError::AuthorisationFinalised {
            id: authorisation.authorisation_id.clone(),
            status: current,
        });
    }
    Ok(())
}

impl AuthorisationManagement for InMemoryConsentManagement {
    async fn fetch_authorisation(&self, authorisation_id: &str) -> Result<Option<Authorisation>, ConsentManagementError> {
        Ok(self.read().await.authorisations.get(authorisation_id).cloned())
    }

    async fn update_authorisation_status(
        &self,
        authorisation_id: &str,
        status: ScaStatus,
    ) -> Result<(), ConsentManagementError> {
        let mut store = self.write().await;
        let authorisation = store.authorisations.get_mut(authorisation_id).ok_or_else(|| not_found(authorisation_id))?;
        check_not_finalised(authorisation, status)?;
        authorisation.sca_status = status;
        debug!("🗃️ Authorisation {authorisation_id} is now {status}");
        Ok(())
    }

    async fn save_authentication_methods(
        &self,
        authorisation_id: &str,
        methods: &[AuthenticationObject],
    ) -> Result<(), ConsentManagementError> {
        let mut store = self.write().await;
        let authorisation = store.authorisations.get_mut(authorisation_id).ok_or_else(|| not_found(authorisation_id))?;
        authorisation.authentication_methods = methods.to_vec();
        trace!("🗃️ Authorisation {authorisation_id} offers {} SCA method(s)", methods.len());
        Ok(())
    }

    async fn update_sca_approach(
        &self,
        authorisation_id: &str,
        approach: ScaApproach,
    ) -> Result<(), ConsentManagementError> {
        let mut store = self.write().await;
        let authorisation = store.authorisations.get_mut(authorisation_id).ok_or_else(|| not_found(authorisation_id))?;
        authorisation.chosen_sca_approach = approach;
        debug!("🗃️ Authorisation {authorisation_id} now uses the {approach} approach");
        Ok(())
    }

    async fn is_authentication_method_decoupled(
        &self,
        authorisation_id: &str,
        authentication_method_id: &str,
    ) -> Result<bool, ConsentManagementError> {
        let store = self.read().await;
        let authorisation = store.authorisations.get(authorisation_id).ok_or_else(|| not_found(authorisation_id))?;
        let decoupled = authorisation
            .authentication_methods
            .iter()
            .find(|m| m.authentication_method_id == authentication_method_id)
            .map(AuthenticationObject::is_decoupled)
            .unwrap_or(false);
        Ok(decoupled)
    }

    async fn update_authorisation(&self, update: AuthorisationUpdate) -> Result<(), ConsentManagementError> {
        let mut store = self.write().await;
        let id = update.authorisation_id.as_str();
        let authorisation = store.authorisations.get_mut(id).ok_or_else(|| not_found(id))?;
        check_not_finalised(authorisation, update.sca_status)?;
        authorisation.sca_status = update.sca_status;
        if let Some(psu) = update.psu_id_data.filter(|p| p.is_not_empty()) {
            authorisation.psu_id_data = Some(psu);
        }
        if let Some(method_id) = update.authentication_method_id {
            authorisation.authentication_method_id = Some(method_id);
        }
        if let Some(approach) = update.sca_approach {
            authorisation.chosen_sca_approach = approach;
        }
        debug!("🗃️ Authorisation {id} updated to {}", authorisation.sca_status);
        Ok(())
    }
}
