use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::xs2a_types::{PsuIdData, ScaApproach, ScaStatus};

/// The fields of an authorisation record that change after a processing step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorisationUpdate {
    pub authorisation_id: String,
    pub sca_status: ScaStatus,
    pub psu_id_data: Option<PsuIdData>,
    pub authentication_method_id: Option<String>,
    pub sca_approach: Option<ScaApproach>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePiisConsentRequest {
    pub psu_id_data: PsuIdData,
    pub tpp_authorisation_number: String,
    pub account_reference: String,
    pub card_number: Option<String>,
    pub card_expiry_date: Option<NaiveDate>,
    pub valid_until: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TppStopListRecord {
    pub tpp_authorisation_number: String,
    pub blocked_at: DateTime<Utc>,
    pub blocked_until: Option<DateTime<Utc>>,
}

impl TppStopListRecord {
    pub fn is_blocked_at(&self, now: DateTime<Utc>) -> bool {
        self.blocked_until.map(|until| now < until).unwrap_or(true)
    }
}
