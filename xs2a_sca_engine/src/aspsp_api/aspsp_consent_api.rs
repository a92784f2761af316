use std::fmt::Debug;

use chrono::{Duration, Utc};
use log::*;

use crate::{
    aspsp_api::{errors::AspspApiError, export_objects::PsuConsents},
    traits::{ConsentExport, CreatePiisConsentRequest, PiisConsentManagement, TppStopListManagement, TppStopListRecord},
    xs2a_types::{AisConsent, CommonPayment, PiisConsent, PsuIdData},
};

/// The back-office API over a consent management backend `B`.
pub struct AspspConsentApi<B> {
    backend: B,
}

impl<B: Debug> Debug for AspspConsentApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AspspConsentApi ({:?})", self.backend)
    }
}

impl<B> AspspConsentApi<B>
where B: ConsentExport + PiisConsentManagement + TppStopListManagement
{
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// All AIS consents issued to the TPP, oldest first.
    pub async fn consents_for_tpp(&self, tpp_authorisation_number: &str) -> Result<Vec<AisConsent>, AspspApiError> {
        let consents = self.backend.export_ais_consents_by_tpp(tpp_authorisation_number).await?;
        trace!("🏦️ {} AIS consents exported for TPP {tpp_authorisation_number}", consents.len());
        Ok(consents)
    }

    /// The AIS and PIIS consents given by the PSU. The PSU is matched on its identifying fields only.
    pub async fn consents_for_psu(&self, psu: &PsuIdData) -> Result<PsuConsents, AspspApiError> {
        if psu.is_empty() {
            return Err(AspspApiError::EmptyPsu);
        }
        let ais_consents = self.backend.export_ais_consents_by_psu(psu).await?;
        let piis_consents = self.backend.export_piis_consents_by_psu(psu).await?;
        let result = PsuConsents { psu_id_data: psu.clone(), ais_consents, piis_consents };
        trace!("🏦️ {} consents exported for PSU {psu}", result.total());
        Ok(result)
    }

    pub async fn payments_for_psu(&self, psu: &PsuIdData) -> Result<Vec<CommonPayment>, AspspApiError> {
        if psu.is_empty() {
            return Err(AspspApiError::EmptyPsu);
        }
        let payments = self.backend.export_payments_by_psu(psu).await?;
        trace!("🏦️ {} payments exported for PSU {psu}", payments.len());
        Ok(payments)
    }

    pub async fn create_piis_consent(&self, request: CreatePiisConsentRequest) -> Result<PiisConsent, AspspApiError> {
        if request.psu_id_data.is_empty() {
            return Err(AspspApiError::EmptyPsu);
        }
        let consent = self.backend.create_piis_consent(request).await?;
        info!("🏦️ PIIS consent {} created for account {}", consent.id, consent.account_reference);
        Ok(consent)
    }

    /// Terminates the PIIS consent. Returns false, and changes nothing, if the consent was already finalised.
    pub async fn terminate_piis_consent(&self, consent_id: &str) -> Result<bool, AspspApiError> {
        let terminated = self.backend.terminate_piis_consent(consent_id).await?;
        if !terminated {
            debug!("🏦️ PIIS consent {consent_id} was already finalised");
        }
        Ok(terminated)
    }

    /// Blocks the TPP for the given duration, or indefinitely if no duration is given.
    pub async fn block_tpp(
        &self,
        tpp_authorisation_number: &str,
        duration: Option<Duration>,
    ) -> Result<TppStopListRecord, AspspApiError> {
        let blocked_until = match duration {
            Some(d) if d <= Duration::zero() => return Err(AspspApiError::InvalidBlockDuration),
            Some(d) => Some(Utc::now() + d),
            None => None,
        };
        let record = self.backend.block_tpp(tpp_authorisation_number, blocked_until).await?;
        warn!("🏦️ TPP {tpp_authorisation_number} has been added to the stop list");
        Ok(record)
    }

    pub async fn unblock_tpp(&self, tpp_authorisation_number: &str) -> Result<bool, AspspApiError> {
        Ok(self.backend.unblock_tpp(tpp_authorisation_number).await?)
    }

    /// True if the TPP is on the stop list and its block has not expired.
    pub async fn is_tpp_blocked(&self, tpp_authorisation_number: &str) -> Result<bool, AspspApiError> {
        let record = self.backend.fetch_stop_list_record(tpp_authorisation_number).await?;
        Ok(record.map(|r| r.is_blocked_at(Utc::now())).unwrap_or(false))
    }
}
