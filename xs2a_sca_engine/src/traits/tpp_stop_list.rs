use chrono::{DateTime, Utc};

use crate::traits::{ConsentManagementError, TppStopListRecord};

#[allow(async_fn_in_trait)]
pub trait TppStopListManagement {
    /// Block the TPP. A `None` expiry blocks it until it is explicitly unblocked.
    async fn block_tpp(
        &self,
        tpp_authorisation_number: &str,
        blocked_until: Option<DateTime<Utc>>,
    ) -> Result<TppStopListRecord, ConsentManagementError>;

    /// Remove the TPP from the stop list. Returns false if the TPP was not blocked.
    async fn unblock_tpp(&self, tpp_authorisation_number: &str) -> Result<bool, ConsentManagementError>;

    async fn fetch_stop_list_record(
        &self,
        tpp_authorisation_number: &str,
    ) -> Result<Option<TppStopListRecord>, ConsentManagementError>;
}
