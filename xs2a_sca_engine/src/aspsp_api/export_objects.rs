use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::xs2a_types::{AisConsent, PiisConsent, PsuIdData};

/// Every consent a PSU has given, across consent types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PsuConsents {
    pub psu_id_data: PsuIdData,
    pub ais_consents: Vec<AisConsent>,
    pub piis_consents: Vec<PiisConsent>,
}

impl PsuConsents {
    pub fn total(&self) -> usize {
        self.ais_consents.len() + self.piis_consents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

impl Display for PsuConsents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => write!(f, "PsuConsents ({}, {} consents)", self.psu_id_data, self.total()),
        }
    }
}
