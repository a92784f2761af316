use cucumber::World;
use log::*;
use xs2a_sca_engine::{
    processor::{CommonAuthorisationParameters, PaymentAuthorisationParameters},
    test_utils::scripted_spi::ScriptedSpi,
    traits::{AuthorisationManagement, ConsentManagement, PaymentManagement},
    xs2a_types::{AisConsent, Authorisation, AuthorisationType, PaymentType, PiisConsent, ServiceType},
    AisAuthorisationFlow,
    AisAuthorisationProcessorService,
    AspspSettings,
    AuthorisationProcessorRequest,
    AuthorisationProcessorResponse,
    AuthorisationProcessorService,
    InMemoryConsentManagement,
    PiisAuthorisationFlow,
    PiisAuthorisationProcessorService,
    PisAuthorisationFlow,
    PisAuthorisationProcessorService,
    PisCancellationAuthorisationFlow,
    PisCancellationAuthorisationProcessorService,
};

type Backend = InMemoryConsentManagement;

/// A gateway wired to an in-memory consent store and a scripted bank backend.
#[derive(Debug, World)]
#[world(init = Self::new)]
pub struct ScaWorld {
    pub backend: Backend,
    pub spi: ScriptedSpi,
    pub settings: AspspSettings,
    pub response: Option<AuthorisationProcessorResponse>,
}

impl ScaWorld {
    pub fn new() -> Self {
        let settings = xs2a_sca_engine::test_utils::prepare_env::prepare_test_env();
        Self { backend: Backend::new(), spi: ScriptedSpi::default(), settings, response: None }
    }

    pub fn response(&self) -> &AuthorisationProcessorResponse {
        self.response.as_ref().expect("No authorisation step has been processed yet")
    }

    pub async fn authorisation(&self, authorisation_id: &str) -> Authorisation {
        self.backend
            .fetch_authorisation(authorisation_id)
            .await
            .expect("Error fetching authorisation")
            .unwrap_or_else(|| panic!("Authorisation {authorisation_id} does not exist"))
    }

    /// Runs the step matching the stored status of the authorisation and persists the outcome.
    pub async fn process(&mut self, authorisation_id: &str, parameters: CommonAuthorisationParameters) {
        let authorisation = self.authorisation(authorisation_id).await;
        debug!(
            "🚀️ Processing {} authorisation {authorisation_id} in {}",
            authorisation.authorisation_type, authorisation.sca_status
        );
        let response = match authorisation.authorisation_type {
            AuthorisationType::Consent if self.is_ais_consent(&authorisation.parent_id).await => {
                let request = AuthorisationProcessorRequest::new(ServiceType::Ais, authorisation, parameters);
                run(&self.ais_processor(), &request).await
            },
            AuthorisationType::Consent => {
                let request = AuthorisationProcessorRequest::new(ServiceType::Piis, authorisation, parameters);
                run(&self.piis_processor(), &request).await
            },
            AuthorisationType::PisCreation => {
                let parameters = self.payment_parameters(parameters).await;
                let request = AuthorisationProcessorRequest::new(ServiceType::Pis, authorisation, parameters);
                run(&self.pis_processor(), &request).await
            },
            AuthorisationType::PisCancellation => {
                let parameters = self.payment_parameters(parameters).await;
                let request = AuthorisationProcessorRequest::new(ServiceType::Pis, authorisation, parameters);
                run(&self.cancellation_processor(), &request).await
            },
        };
        trace!("🚀️ Response: {response:?}");
        self.response = Some(response);
    }

    async fn is_ais_consent(&self, consent_id: &str) -> bool {
        ConsentManagement::<AisConsent>::fetch_consent(&self.backend, consent_id)
            .await
            .expect("Error fetching consent")
            .is_some()
    }

    pub async fn piis_consent(&self, consent_id: &str) -> Option<PiisConsent> {
        ConsentManagement::<PiisConsent>::fetch_consent(&self.backend, consent_id).await.expect("Error fetching consent")
    }

    async fn payment_parameters(&self, common: CommonAuthorisationParameters) -> PaymentAuthorisationParameters {
        let payment = self.backend.fetch_payment(&common.business_object_id).await.expect("Error fetching payment");
        match payment {
            Some(p) => PaymentAuthorisationParameters::new(common, p.payment_type, p.payment_product),
            None => PaymentAuthorisationParameters::new(common, PaymentType::Single, "sepa-credit-transfers".to_string()),
        }
    }

    fn ais_processor(&self) -> AisAuthorisationProcessorService<Backend, ScriptedSpi, Backend> {
        let flow = AisAuthorisationFlow::new(self.backend.clone(), self.spi.clone(), self.settings.clone());
        AisAuthorisationProcessorService::with_stored_handlers(flow, self.backend.clone(), &self.settings)
            .expect("Could not build the AIS processor")
    }

    fn piis_processor(&self) -> PiisAuthorisationProcessorService<Backend, ScriptedSpi, Backend> {
        let flow = PiisAuthorisationFlow::new(self.backend.clone(), self.spi.clone());
        PiisAuthorisationProcessorService::with_stored_handlers(flow, self.backend.clone(), &self.settings)
            .expect("Could not build the PIIS processor")
    }

    fn pis_processor(&self) -> PisAuthorisationProcessorService<Backend, ScriptedSpi, Backend> {
        let flow = PisAuthorisationFlow::new(self.backend.clone(), self.spi.clone());
        PisAuthorisationProcessorService::with_stored_handlers(flow, self.backend.clone(), &self.settings)
            .expect("Could not build the PIS processor")
    }

    fn cancellation_processor(&self) -> PisCancellationAuthorisationProcessorService<Backend, ScriptedSpi, Backend> {
        let flow = PisCancellationAuthorisationFlow::new(self.backend.clone(), self.spi.clone());
        PisCancellationAuthorisationProcessorService::with_stored_handlers(flow, self.backend.clone(), &self.settings)
            .expect("Could not build the PIS cancellation processor")
    }
}

async fn run<P: AuthorisationProcessorService>(
    processor: &P,
    request: &AuthorisationProcessorRequest<P::Parameters>,
) -> AuthorisationProcessorResponse {
    let response = processor.process(request).await.expect("The processor could not handle the request");
    processor.update_authorisation(request, &response).await.expect("Error persisting the authorisation step");
    response
}
