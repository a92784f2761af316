//! Helpers shared by the consent and payment engines.
use log::*;

use crate::{
    error_holder::{ErrorHolder, MessageErrorCode},
    processor::objects::{AuthorisationParameters, AuthorisationProcessorRequest, CommonAuthorisationParameters},
    spi::{SpiAuthorisationStatus, SpiErrorMapper, SpiResponse},
    xs2a_types::{AuthenticationObject, Authorisation, PsuIdData, ScaApproach, ServiceType},
};

/// True if a PSU was supplied and at least one of its identifying fields carries a value.
pub fn is_psu_exist(psu: Option<&PsuIdData>) -> bool {
    psu.map(PsuIdData::is_not_empty).unwrap_or(false)
}

pub fn is_single_sca_method(methods: &[AuthenticationObject]) -> bool {
    methods.len() == 1
}

pub fn is_multiple_sca_methods(methods: &[AuthenticationObject]) -> bool {
    methods.len() > 1
}

/// The PSU in the request takes precedence. If it is missing or empty, the PSU stored on the authorisation is used.
pub fn extract_psu_id_data(
    parameters: &CommonAuthorisationParameters,
    authorisation: &Authorisation,
) -> Option<PsuIdData> {
    if is_psu_exist(parameters.psu_data.as_ref()) {
        return parameters.psu_data.clone();
    }
    if is_psu_exist(authorisation.psu_id_data.as_ref()) {
        return authorisation.psu_id_data.clone();
    }
    parameters.psu_data.clone()
}

/// The backend rejected the PSU's credentials outright. The authorisation cannot be retried.
pub fn is_credentials_invalid(error_holder: &ErrorHolder) -> bool {
    error_holder.first_error_code() == Some(MessageErrorCode::PsuCredentialsInvalid)
}

/// A failed SPI call: the TPP-facing error plus whatever payload the backend still reported.
#[derive(Debug, Clone)]
pub struct SpiFailure<T> {
    pub error_holder: ErrorHolder,
    pub payload: Option<T>,
}

/// Splits an SPI response into its payload or an [`SpiFailure`]. A response with neither errors nor a payload is
/// treated as an internal error.
pub fn into_spi_result<T>(response: SpiResponse<T>, service_type: ServiceType) -> Result<T, SpiFailure<T>> {
    if response.has_error() {
        let error_holder = SpiErrorMapper::map_to_error_holder(&response, service_type);
        return Err(SpiFailure { error_holder, payload: response.into_payload() });
    }
    response
        .into_payload()
        .ok_or_else(|| SpiFailure { error_holder: SpiErrorMapper::map_messages(&[], service_type), payload: None })
}

/// True if the authorisation was already moved to the decoupled approach by an earlier step.
pub fn is_decoupled_authorisation(authorisation: &Authorisation) -> bool {
    authorisation.chosen_sca_approach == ScaApproach::Decoupled
}

/// The method a decoupled SCA is started with: the one in the request, else the one stored on the authorisation.
/// Empty if neither is known, in which case the backend picks the method.
pub fn decoupled_method_id<P: AuthorisationParameters>(request: &AuthorisationProcessorRequest<P>) -> String {
    request
        .parameters()
        .authentication_method_id
        .clone()
        .or_else(|| request.authorisation.authentication_method_id.clone())
        .unwrap_or_default()
}

pub fn is_attempt_failure(status: Option<SpiAuthorisationStatus>) -> bool {
    status == Some(SpiAuthorisationStatus::AttemptFailure)
}

fn business_object_label(service_type: ServiceType) -> &'static str {
    match service_type {
        ServiceType::Pis => "Payment-ID",
        ServiceType::Ais | ServiceType::Piis => "Consent-ID",
    }
}

pub fn write_error_log<P: AuthorisationParameters>(
    request: &AuthorisationProcessorRequest<P>,
    psu_data: Option<&PsuIdData>,
    error_holder: &ErrorHolder,
    message: &str,
) {
    let params = request.parameters();
    warn!(
        "🔐️ {} [{}], Authorisation-ID [{}], PSU-ID [{}], SCA Approach [{}]. {message} Error msg: [{error_holder}]",
        business_object_label(request.service_type),
        params.business_object_id,
        params.authorisation_id,
        psu_label(psu_data),
        request.sca_approach,
    );
}

pub fn write_info_log<P: AuthorisationParameters>(
    request: &AuthorisationProcessorRequest<P>,
    psu_data: Option<&PsuIdData>,
    message: &str,
) {
    let params = request.parameters();
    info!(
        "🔐️ {} [{}], Authorisation-ID [{}], PSU-ID [{}], SCA Approach [{}]. {message}",
        business_object_label(request.service_type),
        params.business_object_id,
        params.authorisation_id,
        psu_label(psu_data),
        request.sca_approach,
    );
}

fn psu_label(psu_data: Option<&PsuIdData>) -> &str {
    psu_data.and_then(|p| p.psu_id.as_deref()).unwrap_or("-")
}
