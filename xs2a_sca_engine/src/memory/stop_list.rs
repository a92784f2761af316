use chrono::{DateTime, Utc};
use log::*;

use super::InMemoryConsentManagement;
use crate::traits::{ConsentManagementError, TppStopListManagement, TppStopListRecord};

impl TppStopListManagement for InMemoryConsentManagement {
    async fn block_tpp(
        &self,
        tpp_authorisation_number: &str,
        blocked_until: Option<DateTime<Utc>>,
    ) -> Result<TppStopListRecord, ConsentManagementError> {
        if tpp_authorisation_number.is_empty() {
            return Err(ConsentManagementError::InvalidRequest("The TPP authorisation number is empty".into()));
        }
        let record = TppStopListRecord {
            tpp_authorisation_number: tpp_authorisation_number.to_string(),
            blocked_at: Utc::now(),
            blocked_until,
        };
        self.write().await.stop_list.insert(tpp_authorisation_number.to_string(), record.clone());
        match blocked_until {
            Some(until) => info!("🗃️ TPP {tpp_authorisation_number} blocked until {until}"),
            None => info!("🗃️ TPP {tpp_authorisation_number} blocked"),
        }
        Ok(record)
    }

    async fn unblock_tpp(&self, tpp_authorisation_number: &str) -> Result<bool, ConsentManagementError> {
        let removed = self.write().await.stop_list.remove(tpp_authorisation_number).is_some();
        if removed {
            info!("🗃️ TPP {tpp_authorisation_number} unblocked");
        }
        Ok(removed)
    }

    async fn fetch_stop_list_record(
        &self,
        tpp_authorisation_number: &str,
    ) -> Result<Option<TppStopListRecord>, ConsentManagementError> {
        Ok(self.read().await.stop_list.get(tpp_authorisation_number).cloned())
    }
}
