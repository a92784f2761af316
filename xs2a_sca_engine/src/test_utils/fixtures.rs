use chrono::{Days, Utc};

use crate::xs2a_types::{
    AccountAccess,
    AisConsent,
    AisConsentRequestType,
    Amount,
    AuthenticationObject,
    ChallengeData,
    CommonPayment,
    ConsentStatus,
    CurrencyConversionInfo,
    PaymentType,
    PiisConsent,
    PsuIdData,
    TransactionStatus,
};

/// A recurring, dedicated-accounts AIS consent in `RECEIVED`.
pub fn ais_consent(id: &str, tpp: &str, psus: &[PsuIdData]) -> AisConsent {
    let now = Utc::now();
    AisConsent {
        id: id.to_string(),
        tpp_authorisation_number: tpp.to_string(),
        psu_id_data: psus.to_vec(),
        consent_status: ConsentStatus::Received,
        request_type: AisConsentRequestType::DedicatedAccounts,
        access: AccountAccess { accounts: vec!["DE89370400440532013000".into()], ..Default::default() },
        recurring_indicator: true,
        frequency_per_day: 4,
        valid_until: now.date_naive().checked_add_days(Days::new(90)).unwrap_or(now.date_naive()),
        multilevel_sca_required: false,
        creation_timestamp: now,
        status_change_timestamp: now,
    }
}

/// A one-off consent for the list of available accounts.
pub fn available_accounts_consent(id: &str, tpp: &str, psus: &[PsuIdData]) -> AisConsent {
    AisConsent {
        request_type: AisConsentRequestType::AllAvailableAccounts,
        access: AccountAccess { available_accounts: Some("allAccounts".into()), ..Default::default() },
        recurring_indicator: false,
        frequency_per_day: 1,
        ..ais_consent(id, tpp, psus)
    }
}

pub fn piis_consent(id: &str, tpp: &str, psus: &[PsuIdData]) -> PiisConsent {
    let now = Utc::now();
    PiisConsent {
        id: id.to_string(),
        tpp_authorisation_number: tpp.to_string(),
        psu_id_data: psus.to_vec(),
        consent_status: ConsentStatus::Received,
        account_reference: "DE89370400440532013000".into(),
        card_number: None,
        card_expiry_date: None,
        valid_until: None,
        multilevel_sca_required: false,
        creation_timestamp: now,
        status_change_timestamp: now,
    }
}

/// A `RCVD` SEPA credit transfer issued by `tpp-1`.
pub fn payment(id: &str, payment_type: PaymentType, psus: &[PsuIdData]) -> CommonPayment {
    let now = Utc::now();
    CommonPayment {
        payment_id: id.to_string(),
        payment_type,
        payment_product: "sepa-credit-transfers".into(),
        transaction_status: TransactionStatus::Rcvd,
        psu_id_data: psus.to_vec(),
        tpp_authorisation_number: "tpp-1".into(),
        multilevel_sca_required: false,
        payment_data: None,
        creation_timestamp: now,
        status_change_timestamp: now,
    }
}

pub fn sms_otp() -> AuthenticationObject {
    AuthenticationObject::new("SMS_OTP", "sms").with_name("SMS OTP on phone +49 160 xxxxx 28")
}

pub fn chip_otp() -> AuthenticationObject {
    AuthenticationObject::new("CHIP_OTP", "chip").with_name("chipTAN")
}

pub fn push_otp() -> AuthenticationObject {
    AuthenticationObject::new("PUSH_OTP", "push").with_name("Banking app").decoupled()
}

/// Looks up one of the fixture SCA methods by its method id.
pub fn sca_method(method_id: &str) -> Option<AuthenticationObject> {
    [sms_otp(), chip_otp(), push_otp()].into_iter().find(|m| m.authentication_method_id == method_id)
}

pub fn challenge() -> ChallengeData {
    ChallengeData {
        data: vec!["Enter the OTP sent to your phone".into()],
        otp_max_length: Some(6),
        otp_format: Some("integer".into()),
        ..Default::default()
    }
}

pub fn conversion_info() -> CurrencyConversionInfo {
    CurrencyConversionInfo {
        transaction_fees: Some(Amount::new("EUR", "0.50")),
        estimated_total_amount: Some(Amount::new("EUR", "100.50")),
        ..Default::default()
    }
}
