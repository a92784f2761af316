use std::env;

use log::*;
use xs2a_common::{parse_boolean_flag, parse_list};

use crate::xs2a_types::ScaApproach;

const DEFAULT_SCA_APPROACHES: [ScaApproach; 3] = [ScaApproach::Redirect, ScaApproach::Embedded, ScaApproach::Decoupled];
const DEFAULT_SCA_BY_ONE_TIME_AVAILABLE_ACCOUNTS_CONSENT_REQUIRED: bool = true;

/// The ASPSP profile settings the SCA processor consults.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AspspSettings {
    /// The SCA approaches the ASPSP supports, in order of preference. Every one of these needs an approach handler
    /// when a processor is built.
    pub supported_sca_approaches: Vec<ScaApproach>,
    /// When false, a one-off consent for the list of available accounts is authorised without SCA once the PSU has
    /// been authenticated.
    pub sca_by_one_time_available_accounts_consent_required: bool,
}

impl Default for AspspSettings {
    fn default() -> Self {
        Self {
            supported_sca_approaches: DEFAULT_SCA_APPROACHES.to_vec(),
            sca_by_one_time_available_accounts_consent_required:
                DEFAULT_SCA_BY_ONE_TIME_AVAILABLE_ACCOUNTS_CONSENT_REQUIRED,
        }
    }
}

impl AspspSettings {
    /// Reads the settings from the environment, falling back to the defaults for anything missing or invalid.
    ///
    /// | Variable | Default |
    /// |---|---|
    /// | `XS2A_SCA_APPROACHES` | `REDIRECT,EMBEDDED,DECOUPLED` |
    /// | `XS2A_SCA_BY_ONE_TIME_AVAILABLE_ACCOUNTS_CONSENT_REQUIRED` | `true` |
    pub fn from_env_or_default() -> Self {
        let supported_sca_approaches = match parse_list::<ScaApproach>(env::var("XS2A_SCA_APPROACHES").ok()) {
            Ok(Some(approaches)) if !approaches.is_empty() => approaches,
            Ok(_) => DEFAULT_SCA_APPROACHES.to_vec(),
            Err(e) => {
                error!("🪛️ XS2A_SCA_APPROACHES is invalid. {e}. Using the default approaches instead.");
                DEFAULT_SCA_APPROACHES.to_vec()
            },
        };
        let sca_by_one_time_available_accounts_consent_required = parse_boolean_flag(
            env::var("XS2A_SCA_BY_ONE_TIME_AVAILABLE_ACCOUNTS_CONSENT_REQUIRED").ok(),
            DEFAULT_SCA_BY_ONE_TIME_AVAILABLE_ACCOUNTS_CONSENT_REQUIRED,
        );
        debug!(
            "🪛️ ASPSP settings loaded. Approaches: {supported_sca_approaches:?}. SCA required for one-off \
             available-accounts consents: {sca_by_one_time_available_accounts_consent_required}"
        );
        Self { supported_sca_approaches, sca_by_one_time_available_accounts_consent_required }
    }

    pub fn with_sca_approaches(mut self, approaches: &[ScaApproach]) -> Self {
        self.supported_sca_approaches = approaches.to_vec();
        self
    }

    pub fn with_sca_by_one_time_available_accounts_consent_required(mut self, required: bool) -> Self {
        self.sca_by_one_time_available_accounts_consent_required = required;
        self
    }
}
