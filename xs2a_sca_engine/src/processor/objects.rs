use serde::{Deserialize, Serialize};
use xs2a_common::Secret;

use crate::xs2a_types::{Authorisation, PaymentType, PsuIdData, ScaApproach, ScaStatus, ServiceType};

/// The parameters of an incoming authorisation step, common to consents and payments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonAuthorisationParameters {
    /// The consent or payment id.
    pub business_object_id: String,
    pub authorisation_id: String,
    pub psu_data: Option<PsuIdData>,
    pub password: Option<Secret<String>>,
    pub authentication_method_id: Option<String>,
    /// The OTP/TAN the PSU entered.
    pub sca_authentication_data: Option<Secret<String>>,
    /// True when this step only identifies the PSU, without authenticating them.
    pub update_psu_identification: bool,
}

impl CommonAuthorisationParameters {
    pub fn new<S: Into<String>>(business_object_id: S, authorisation_id: S) -> Self {
        Self { business_object_id: business_object_id.into(), authorisation_id: authorisation_id.into(), ..Default::default() }
    }

    pub fn with_psu_data(mut self, psu_data: PsuIdData) -> Self {
        self.psu_data = Some(psu_data);
        self
    }

    pub fn with_password<S: Into<String>>(mut self, password: S) -> Self {
        self.password = Some(Secret::new(password.into()));
        self
    }

    pub fn with_authentication_method_id<S: Into<String>>(mut self, method_id: S) -> Self {
        self.authentication_method_id = Some(method_id.into());
        self
    }

    pub fn with_sca_authentication_data<S: Into<String>>(mut self, tan: S) -> Self {
        self.sca_authentication_data = Some(Secret::new(tan.into()));
        self
    }

    pub fn psu_identification_only(mut self) -> Self {
        self.update_psu_identification = true;
        self
    }
}

/// Payment steps also carry the payment id and payment service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentAuthorisationParameters {
    pub common: CommonAuthorisationParameters,
    pub payment_id: String,
    pub payment_service: PaymentType,
    pub payment_product: String,
}

impl PaymentAuthorisationParameters {
    /// The payment id doubles as the business object id.
    pub fn new<S: Into<String>>(
        common: CommonAuthorisationParameters,
        payment_service: PaymentType,
        payment_product: S,
    ) -> Self {
        let payment_id = common.business_object_id.clone();
        Self { common, payment_id, payment_service, payment_product: payment_product.into() }
    }
}

/// Gives the processor uniform access to the common parameters of either parameter type.
pub trait AuthorisationParameters {
    fn common(&self) -> &CommonAuthorisationParameters;
}

impl AuthorisationParameters for CommonAuthorisationParameters {
    fn common(&self) -> &CommonAuthorisationParameters {
        self
    }
}

impl AuthorisationParameters for PaymentAuthorisationParameters {
    fn common(&self) -> &CommonAuthorisationParameters {
        &self.common
    }
}

/// One processing step: the stored authorisation together with the incoming parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorisationProcessorRequest<P> {
    pub service_type: ServiceType,
    pub sca_approach: ScaApproach,
    /// The status the step is dispatched on. Usually the authorisation's current status.
    pub sca_status: ScaStatus,
    pub authorisation: Authorisation,
    pub update_authorisation_request: P,
}

impl<P: AuthorisationParameters> AuthorisationProcessorRequest<P> {
    /// Builds a request from the stored authorisation, taking the status and approach from it.
    pub fn new(service_type: ServiceType, authorisation: Authorisation, update_authorisation_request: P) -> Self {
        Self {
            service_type,
            sca_approach: authorisation.chosen_sca_approach,
            sca_status: authorisation.sca_status,
            authorisation,
            update_authorisation_request,
        }
    }

    pub fn parameters(&self) -> &CommonAuthorisationParameters {
        self.update_authorisation_request.common()
    }
}
