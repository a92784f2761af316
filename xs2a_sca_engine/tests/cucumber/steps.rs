use std::str::FromStr;

use cucumber::{given, then, when};
use xs2a_sca_engine::{
    processor::CommonAuthorisationParameters,
    spi::{
        SpiAuthorisationStatus,
        SpiAvailableScaMethodsResponse,
        SpiPaymentExecutionResponse,
        SpiPsuAuthorisationResponse,
        SpiResponse,
        SpiVerifyScaAuthorisationResponse,
    },
    test_utils::fixtures::{ais_consent, available_accounts_consent, payment, piis_consent, sca_method},
    traits::{ConsentManagement, PaymentManagement},
    xs2a_types::{
        AisConsent,
        Authorisation,
        AuthorisationType,
        ConsentStatus,
        PaymentType,
        PsuIdData,
        ScaApproach,
        ScaStatus,
        TransactionStatus,
    },
};

use crate::cucumber::ScaWorld;

//------------------------------------------------   Given   -----------------------------------------------------------

#[given(expr = "an AIS consent {word} from TPP {word} for PSU {word}")]
async fn given_ais_consent(world: &mut ScaWorld, consent_id: String, tpp: String, psu: String) {
    world.backend.insert_ais_consent(ais_consent(&consent_id, &tpp, &[PsuIdData::new(psu)])).await;
}

#[given(expr = "a one-off available accounts consent {word} from TPP {word} for PSU {word}")]
async fn given_available_accounts_consent(world: &mut ScaWorld, consent_id: String, tpp: String, psu: String) {
    let consent = available_accounts_consent(&consent_id, &tpp, &[PsuIdData::new(psu)]);
    world.backend.insert_ais_consent(consent).await;
}

#[given(expr = "a PIIS consent {word} from TPP {word} for PSU {word}")]
async fn given_piis_consent(world: &mut ScaWorld, consent_id: String, tpp: String, psu: String) {
    world.backend.insert_piis_consent(piis_consent(&consent_id, &tpp, &[PsuIdData::new(psu)])).await;
}

#[given(expr = "a {word} payment {word} for PSU {word}")]
async fn given_payment(world: &mut ScaWorld, payment_type: String, payment_id: String, psu: String) {
    let payment_type = PaymentType::from_str(&payment_type).expect("Not a valid payment type");
    world.backend.insert_payment(payment(&payment_id, payment_type, &[PsuIdData::new(psu)])).await;
}

#[given(expr = "a {word} payment {word} for PSU {word} known to the bank as {word}")]
async fn given_payment_with_internal_id(
    world: &mut ScaWorld,
    payment_type: String,
    payment_id: String,
    psu: String,
    internal_id: String,
) {
    let payment_type = PaymentType::from_str(&payment_type).expect("Not a valid payment type");
    let payment = payment(&payment_id, payment_type, &[PsuIdData::new(psu)]);
    world.backend.insert_payment_with_internal_id(payment, &internal_id).await;
}

//  Given a consent authorisation auth-1 for consent-1 in status RECEIVED
#[given(expr = "a {word} authorisation {word} for {word} in status {word}")]
async fn given_authorisation(
    world: &mut ScaWorld,
    kind: String,
    authorisation_id: String,
    parent_id: String,
    status: String,
) {
    let authorisation_type = match kind.as_str() {
        "consent" => AuthorisationType::Consent,
        "payment" => AuthorisationType::PisCreation,
        "cancellation" => AuthorisationType::PisCancellation,
        _ => panic!("Unknown authorisation kind: {kind}"),
    };
    let status = ScaStatus::from_str(&status).expect("Not a valid SCA status");
    let authorisation =
        Authorisation::new(authorisation_id, parent_id, authorisation_type, status, ScaApproach::Embedded);
    world.backend.insert_authorisation(authorisation).await;
}

#[given(expr = "the bank offers the SCA methods {string}")]
async fn given_sca_methods(world: &mut ScaWorld, method_ids: String) {
    let methods = method_ids
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| sca_method(id).unwrap_or_else(|| panic!("No SCA method fixture for {id}")))
        .collect();
    world.spi.script().available_sca_methods = SpiResponse::success(SpiAvailableScaMethodsResponse::new(methods));
}

#[given(expr = "the bank rejects the PSU credentials")]
async fn given_credentials_rejected(world: &mut ScaWorld) {
    world.spi.script().authorise_psu =
        SpiResponse::success(SpiPsuAuthorisationResponse::new(SpiAuthorisationStatus::Failure));
}

#[given(expr = "the bank exempts the payment from SCA")]
async fn given_sca_exemption(world: &mut ScaWorld) {
    world.spi.script().authorise_psu =
        SpiResponse::success(SpiPsuAuthorisationResponse::new(SpiAuthorisationStatus::Success).exempted());
}

#[given(expr = "the bank reports executed payments as {word}")]
async fn given_execution_status(world: &mut ScaWorld, status: String) {
    let status = TransactionStatus::from_str(&status).expect("Not a valid transaction status");
    let mut script = world.spi.script();
    script.execute_payment = SpiResponse::success(SpiPaymentExecutionResponse::new(status));
    script.execute_payment_without_sca = SpiResponse::success(SpiPaymentExecutionResponse::new(status));
}

#[given(expr = "the bank reports verified consents as {word}")]
async fn given_verification_status(world: &mut ScaWorld, status: String) {
    let status = ConsentStatus::from_str(&status).expect("Not a valid consent status");
    world.spi.script().verify_consent = SpiResponse::success(SpiVerifyScaAuthorisationResponse::new(status));
}

#[given(expr = "one-off available accounts consents need no second factor")]
async fn given_one_factor_consents(world: &mut ScaWorld) {
    world.settings.sca_by_one_time_available_accounts_consent_required = false;
}

//------------------------------------------------   When   ------------------------------------------------------------

/// Request parameters addressed to the business object that owns the authorisation.
async fn parameters(world: &ScaWorld, authorisation_id: &str) -> CommonAuthorisationParameters {
    let parent = world.authorisation(authorisation_id).await.parent_id;
    CommonAuthorisationParameters::new(parent, authorisation_id.to_string())
}

#[when(expr = "authorisation {word} is started")]
async fn start_authorisation(world: &mut ScaWorld, authorisation_id: String) {
    let params = parameters(world, &authorisation_id).await;
    world.process(&authorisation_id, params).await;
}

#[when(expr = "PSU {word} identifies for authorisation {word}")]
async fn identify(world: &mut ScaWorld, psu: String, authorisation_id: String) {
    let params = parameters(world, &authorisation_id).await.with_psu_data(PsuIdData::new(psu)).psu_identification_only();
    world.process(&authorisation_id, params).await;
}

#[when(expr = "an anonymous PSU identifies for authorisation {word}")]
async fn identify_anonymously(world: &mut ScaWorld, authorisation_id: String) {
    let params = parameters(world, &authorisation_id).await.with_psu_data(PsuIdData::default()).psu_identification_only();
    world.process(&authorisation_id, params).await;
}

#[when(expr = "PSU {word} logs in to authorisation {word} with password {string}")]
async fn login(world: &mut ScaWorld, psu: String, authorisation_id: String, password: String) {
    let params = parameters(world, &authorisation_id).await.with_psu_data(PsuIdData::new(psu)).with_password(password);
    world.process(&authorisation_id, params).await;
}

#[when(expr = "PSU {word} selects SCA method {word} for authorisation {word}")]
async fn select_method(world: &mut ScaWorld, psu: String, method_id: String, authorisation_id: String) {
    let params = parameters(world, &authorisation_id)
        .await
        .with_psu_data(PsuIdData::new(psu))
        .with_authentication_method_id(method_id);
    world.process(&authorisation_id, params).await;
}

#[when(expr = "PSU {word} sends the TAN {string} for authorisation {word}")]
async fn send_tan(world: &mut ScaWorld, psu: String, tan: String, authorisation_id: String) {
    let params = parameters(world, &authorisation_id)
        .await
        .with_psu_data(PsuIdData::new(psu))
        .with_sca_authentication_data(tan);
    world.process(&authorisation_id, params).await;
}

//------------------------------------------------   Then   ------------------------------------------------------------

#[then(expr = "the step succeeds with status {word}")]
async fn step_succeeds(world: &mut ScaWorld, status: String) {
    let response = world.response();
    assert!(response.error_holder().is_none(), "Unexpected error: {:?}", response.error_holder());
    let status = ScaStatus::from_str(&status).expect("Not a valid SCA status");
    assert_eq!(response.sca_status(), status, "SCA status is incorrect");
}

#[then(expr = "the step fails with {word} {word}")]
async fn step_fails(world: &mut ScaWorld, error_type: String, code: String) {
    let error = world.response().error_holder().expect("The step did not fail");
    assert_eq!(error.error_type().to_string(), error_type, "Error type is incorrect");
    let first = error.first_error_code().map(|c| c.to_string());
    assert_eq!(first.as_deref(), Some(code.as_str()), "Error code is incorrect");
}

#[then(expr = "the response status is {word}")]
async fn response_status(world: &mut ScaWorld, status: String) {
    let status = ScaStatus::from_str(&status).expect("Not a valid SCA status");
    assert_eq!(world.response().sca_status(), status);
}

#[then(expr = "the response offers {int} SCA methods")]
async fn offered_methods(world: &mut ScaWorld, count: usize) {
    assert_eq!(world.response().available_sca_methods().len(), count);
}

#[then(expr = "the response asks for the {word} TAN")]
async fn chosen_method(world: &mut ScaWorld, method_id: String) {
    let method = world.response().chosen_sca_method().expect("No SCA method was chosen");
    assert_eq!(method.authentication_method_id, method_id);
    assert!(world.response().challenge_data().is_some(), "No challenge was sent");
}

#[then(expr = "the PSU is told {string}")]
async fn psu_message(world: &mut ScaWorld, message: String) {
    assert_eq!(world.response().psu_message(), Some(message.as_str()));
}

#[then(expr = "authorisation {word} is stored as {word}")]
async fn stored_status(world: &mut ScaWorld, authorisation_id: String, status: String) {
    let status = ScaStatus::from_str(&status).expect("Not a valid SCA status");
    assert_eq!(world.authorisation(&authorisation_id).await.sca_status, status);
}

#[then(expr = "authorisation {word} uses the {word} approach")]
async fn stored_approach(world: &mut ScaWorld, authorisation_id: String, approach: String) {
    let approach = ScaApproach::from_str(&approach).expect("Not a valid SCA approach");
    assert_eq!(world.authorisation(&authorisation_id).await.chosen_sca_approach, approach);
}

#[then(expr = "consent {word} is {word}")]
async fn consent_status(world: &mut ScaWorld, consent_id: String, status: String) {
    let status = ConsentStatus::from_str(&status).expect("Not a valid consent status");
    let ais = ConsentManagement::<AisConsent>::fetch_consent(&world.backend, &consent_id)
        .await
        .expect("Error fetching consent")
        .map(|c| c.consent_status);
    let actual = match ais {
        Some(status) => status,
        None => world.piis_consent(&consent_id).await.expect("Consent does not exist").consent_status,
    };
    assert_eq!(actual, status, "Consent status is incorrect");
}

#[then(expr = "payment {word} is {word}")]
async fn payment_status(world: &mut ScaWorld, payment_id: String, status: String) {
    let status = TransactionStatus::from_str(&status).expect("Not a valid transaction status");
    let payment = world.backend.fetch_payment(&payment_id).await.expect("Error fetching payment");
    assert_eq!(payment.expect("Payment does not exist").transaction_status, status);
}

#[then(expr = "payment {word} requires multilevel SCA")]
async fn payment_multilevel(world: &mut ScaWorld, payment_id: String) {
    let payment = world.backend.fetch_payment(&payment_id).await.expect("Error fetching payment");
    assert!(payment.expect("Payment does not exist").multilevel_sca_required);
}

#[then(expr = "the bank was asked to {word}")]
async fn spi_called(world: &mut ScaWorld, call: String) {
    assert!(world.spi.was_called(&call), "{call} was not called. Calls: {:?}", world.spi.calls());
}

#[then(expr = "the bank was not asked to {word}")]
async fn spi_not_called(world: &mut ScaWorld, call: String) {
    assert!(!world.spi.was_called(&call), "{call} was called. Calls: {:?}", world.spi.calls());
}

#[then(expr = "the bank verified the TAN {string} for {word}")]
async fn verified_tan(world: &mut ScaWorld, tan: String, business_object_id: String) {
    let confirmation = world.spi.last_confirmation().expect("No TAN was sent to the bank");
    assert_eq!(confirmation.business_object_id, business_object_id);
    assert_eq!(confirmation.tan_number.as_ref().map(|t| t.reveal().as_str()), Some(tan.as_str()));
}
