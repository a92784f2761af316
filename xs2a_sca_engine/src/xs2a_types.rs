use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Type conversion error: {0}")]
pub struct ConversionError(pub String);

/// Lower-cases the value and strips separators so that `"psuIdentified"`, `"PSUIDENTIFIED"` and `"PSU_IDENTIFIED"`
/// all compare equal.
fn normalise(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_alphanumeric()).map(|c| c.to_ascii_lowercase()).collect()
}

//--------------------------------------      ScaStatus       ---------------------------------------------------------
/// The status of a single SCA authorisation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScaStatus {
    Received,
    PsuIdentified,
    PsuAuthenticated,
    ScaMethodSelected,
    Started,
    Unconfirmed,
    Finalised,
    Failed,
    Exempted,
}

impl ScaStatus {
    pub fn is_finalised_status(&self) -> bool {
        matches!(self, ScaStatus::Finalised | ScaStatus::Failed | ScaStatus::Exempted)
    }
}

impl Display for ScaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ScaStatus::Received => "received",
            ScaStatus::PsuIdentified => "psuIdentified",
            ScaStatus::PsuAuthenticated => "psuAuthenticated",
            ScaStatus::ScaMethodSelected => "scaMethodSelected",
            ScaStatus::Started => "started",
            ScaStatus::Unconfirmed => "unconfirmed",
            ScaStatus::Finalised => "finalised",
            ScaStatus::Failed => "failed",
            ScaStatus::Exempted => "exempted",
        };
        f.write_str(s)
    }
}

impl FromStr for ScaStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalise(s).as_str() {
            "received" => Ok(Self::Received),
            "psuidentified" => Ok(Self::PsuIdentified),
            "psuauthenticated" => Ok(Self::PsuAuthenticated),
            "scamethodselected" => Ok(Self::ScaMethodSelected),
            "started" => Ok(Self::Started),
            "unconfirmed" => Ok(Self::Unconfirmed),
            "finalised" => Ok(Self::Finalised),
            "failed" => Ok(Self::Failed),
            "exempted" => Ok(Self::Exempted),
            _ => Err(ConversionError(format!("Invalid SCA status: {s}"))),
        }
    }
}

//--------------------------------------     ScaApproach      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScaApproach {
    Embedded,
    Decoupled,
    Redirect,
    Oauth,
}

impl Display for ScaApproach {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScaApproach::Embedded => write!(f, "EMBEDDED"),
            ScaApproach::Decoupled => write!(f, "DECOUPLED"),
            ScaApproach::Redirect => write!(f, "REDIRECT"),
            ScaApproach::Oauth => write!(f, "OAUTH"),
        }
    }
}

impl FromStr for ScaApproach {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalise(s).as_str() {
            "embedded" => Ok(Self::Embedded),
            "decoupled" => Ok(Self::Decoupled),
            "redirect" => Ok(Self::Redirect),
            "oauth" => Ok(Self::Oauth),
            _ => Err(ConversionError(format!("Invalid SCA approach: {s}"))),
        }
    }
}

//--------------------------------------    ConsentStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConsentStatus {
    /// The consent was created, but is not yet authorised by the PSU.
    Received,
    /// The PSU denied the consent, or SCA could not be performed.
    Rejected,
    /// Some, but not all, of the PSUs required to authorise the consent have done so.
    PartiallyAuthorised,
    /// The consent is authorised and can be used.
    Valid,
    RevokedByPsu,
    Expired,
    TerminatedByTpp,
    TerminatedByAspsp,
}

impl ConsentStatus {
    /// A finalised consent can never change status again.
    pub fn is_finalised_status(&self) -> bool {
        !matches!(self, ConsentStatus::Received | ConsentStatus::PartiallyAuthorised | ConsentStatus::Valid)
    }
}

impl Display for ConsentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConsentStatus::Received => "received",
            ConsentStatus::Rejected => "rejected",
            ConsentStatus::PartiallyAuthorised => "partiallyAuthorised",
            ConsentStatus::Valid => "valid",
            ConsentStatus::RevokedByPsu => "revokedByPsu",
            ConsentStatus::Expired => "expired",
            ConsentStatus::TerminatedByTpp => "terminatedByTpp",
            ConsentStatus::TerminatedByAspsp => "terminatedByAspsp",
        };
        f.write_str(s)
    }
}

impl FromStr for ConsentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalise(s).as_str() {
            "received" => Ok(Self::Received),
            "rejected" => Ok(Self::Rejected),
            "partiallyauthorised" => Ok(Self::PartiallyAuthorised),
            "valid" => Ok(Self::Valid),
            "revokedbypsu" => Ok(Self::RevokedByPsu),
            "expired" => Ok(Self::Expired),
            "terminatedbytpp" => Ok(Self::TerminatedByTpp),
            "terminatedbyaspsp" => Ok(Self::TerminatedByAspsp),
            _ => Err(ConversionError(format!("Invalid consent status: {s}"))),
        }
    }
}

//--------------------------------------  TransactionStatus   ---------------------------------------------------------
/// ISO 20022 payment transaction status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    Accc,
    Accp,
    Acsc,
    Acsp,
    Actc,
    Acwc,
    Acwp,
    Acfc,
    Rcvd,
    Pdng,
    Rjct,
    Canc,
    /// Partially accepted technical correct: more PSU authorisations are required.
    Patc,
    Part,
}

impl TransactionStatus {
    pub fn is_finalised_status(&self) -> bool {
        matches!(self, TransactionStatus::Rjct | TransactionStatus::Canc | TransactionStatus::Accc)
    }
}

impl Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TransactionStatus::Accc => "ACCC",
            TransactionStatus::Accp => "ACCP",
            TransactionStatus::Acsc => "ACSC",
            TransactionStatus::Acsp => "ACSP",
            TransactionStatus::Actc => "ACTC",
            TransactionStatus::Acwc => "ACWC",
            TransactionStatus::Acwp => "ACWP",
            TransactionStatus::Acfc => "ACFC",
            TransactionStatus::Rcvd => "RCVD",
            TransactionStatus::Pdng => "PDNG",
            TransactionStatus::Rjct => "RJCT",
            TransactionStatus::Canc => "CANC",
            TransactionStatus::Patc => "PATC",
            TransactionStatus::Part => "PART",
        };
        f.write_str(s)
    }
}

impl FromStr for TransactionStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ACCC" => Ok(Self::Accc),
            "ACCP" => Ok(Self::Accp),
            "ACSC" => Ok(Self::Acsc),
            "ACSP" => Ok(Self::Acsp),
            "ACTC" => Ok(Self::Actc),
            "ACWC" => Ok(Self::Acwc),
            "ACWP" => Ok(Self::Acwp),
            "ACFC" => Ok(Self::Acfc),
            "RCVD" => Ok(Self::Rcvd),
            "PDNG" => Ok(Self::Pdng),
            "RJCT" => Ok(Self::Rjct),
            "CANC" => Ok(Self::Canc),
            "PATC" => Ok(Self::Patc),
            "PART" => Ok(Self::Part),
            _ => Err(ConversionError(format!("Invalid transaction status: {s}"))),
        }
    }
}

//--------------------------------------     PaymentType      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentType {
    #[serde(rename = "payments")]
    Single,
    #[serde(rename = "bulk-payments")]
    Bulk,
    #[serde(rename = "periodic-payments")]
    Periodic,
}

impl Display for PaymentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentType::Single => write!(f, "payments"),
            PaymentType::Bulk => write!(f, "bulk-payments"),
            PaymentType::Periodic => write!(f, "periodic-payments"),
        }
    }
}

impl FromStr for PaymentType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalise(s).as_str() {
            "payments" | "single" => Ok(Self::Single),
            "bulkpayments" | "bulk" => Ok(Self::Bulk),
            "periodicpayments" | "periodic" => Ok(Self::Periodic),
            _ => Err(ConversionError(format!("Invalid payment type: {s}"))),
        }
    }
}

//--------------------------------------     ServiceType      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ServiceType {
    Ais,
    Pis,
    Piis,
}

impl Display for ServiceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceType::Ais => write!(f, "AIS"),
            ServiceType::Pis => write!(f, "PIS"),
            ServiceType::Piis => write!(f, "PIIS"),
        }
    }
}

//--------------------------------------  AuthorisationType   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthorisationType {
    Consent,
    PisCreation,
    PisCancellation,
}

impl Display for AuthorisationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthorisationType::Consent => write!(f, "CONSENT"),
            AuthorisationType::PisCreation => write!(f, "PIS_CREATION"),
            AuthorisationType::PisCancellation => write!(f, "PIS_CANCELLATION"),
        }
    }
}

//--------------------------------------      PsuIdData       ---------------------------------------------------------
/// The identity of a Payment Service User, as supplied by the TPP in request headers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PsuIdData {
    pub psu_id: Option<String>,
    pub psu_id_type: Option<String>,
    pub psu_corporate_id: Option<String>,
    pub psu_corporate_id_type: Option<String>,
    pub psu_ip_address: Option<String>,
}

impl PsuIdData {
    pub fn new<S: Into<String>>(psu_id: S) -> Self {
        Self { psu_id: Some(psu_id.into()), ..Default::default() }
    }

    pub fn with_psu_id_type<S: Into<String>>(mut self, psu_id_type: S) -> Self {
        self.psu_id_type = Some(psu_id_type.into());
        self
    }

    pub fn with_corporate_id<S: Into<String>>(mut self, corporate_id: S) -> Self {
        self.psu_corporate_id = Some(corporate_id.into());
        self
    }

    pub fn with_ip_address<S: Into<String>>(mut self, ip_address: S) -> Self {
        self.psu_ip_address = Some(ip_address.into());
        self
    }

    /// True when none of the identifying fields carry a value. The IP address does not identify a PSU.
    pub fn is_empty(&self) -> bool {
        [&self.psu_id, &self.psu_id_type, &self.psu_corporate_id, &self.psu_corporate_id_type]
            .iter()
            .all(|v| v.as_deref().map(str::is_empty).unwrap_or(true))
    }

    pub fn is_not_empty(&self) -> bool {
        !self.is_empty()
    }

    /// Compares the identifying fields only.
    pub fn content_equals(&self, other: &PsuIdData) -> bool {
        self.psu_id == other.psu_id
            && self.psu_id_type == other.psu_id_type
            && self.psu_corporate_id == other.psu_corporate_id
            && self.psu_corporate_id_type == other.psu_corporate_id_type
    }
}

impl Display for PsuIdData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.psu_id.as_deref().unwrap_or("-"))
    }
}

//-------------------------------------- AuthenticationObject ---------------------------------------------------------
/// An SCA method offered to the PSU by the ASPSP, e.g. an SMS OTP or a push-TAN app.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticationObject {
    pub authentication_type: String,
    pub authentication_version: Option<String>,
    pub authentication_method_id: String,
    pub name: Option<String>,
    pub explanation: Option<String>,
    /// If true, the method completes SCA out of band (decoupled approach).
    pub decoupled: bool,
}

impl AuthenticationObject {
    pub fn new<S: Into<String>>(authentication_type: S, authentication_method_id: S) -> Self {
        Self {
            authentication_type: authentication_type.into(),
            authentication_method_id: authentication_method_id.into(),
            ..Default::default()
        }
    }

    pub fn decoupled(mut self) -> Self {
        self.decoupled = true;
        self
    }

    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn is_decoupled(&self) -> bool {
        self.decoupled
    }
}

//--------------------------------------    ChallengeData     ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeData {
    pub image: Option<Vec<u8>>,
    pub data: Vec<String>,
    pub image_link: Option<String>,
    pub otp_max_length: Option<u32>,
    pub otp_format: Option<String>,
    pub additional_information: Option<String>,
}

impl ChallengeData {
    pub fn is_empty(&self) -> bool {
        self.image.is_none()
            && self.data.is_empty()
            && self.image_link.is_none()
            && self.otp_max_length.is_none()
            && self.otp_format.is_none()
            && self.additional_information.is_none()
    }
}

//--------------------------------------    Authorisation     ---------------------------------------------------------
/// A single SCA attempt against a consent or payment. Owned by the consent-management collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorisation {
    pub authorisation_id: String,
    /// The consent or payment id this authorisation belongs to.
    pub parent_id: String,
    pub authorisation_type: AuthorisationType,
    pub psu_id_data: Option<PsuIdData>,
    pub sca_status: ScaStatus,
    pub chosen_sca_approach: ScaApproach,
    pub authentication_methods: Vec<AuthenticationObject>,
    pub authentication_method_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Authorisation {
    pub fn new<S: Into<String>>(
        authorisation_id: S,
        parent_id: S,
        authorisation_type: AuthorisationType,
        sca_status: ScaStatus,
        chosen_sca_approach: ScaApproach,
    ) -> Self {
        Self {
            authorisation_id: authorisation_id.into(),
            parent_id: parent_id.into(),
            authorisation_type,
            psu_id_data: None,
            sca_status,
            chosen_sca_approach,
            authentication_methods: Vec::new(),
            authentication_method_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_psu_id_data(mut self, psu_id_data: PsuIdData) -> Self {
        self.psu_id_data = Some(psu_id_data);
        self
    }

    pub fn with_authentication_methods(mut self, methods: Vec<AuthenticationObject>) -> Self {
        self.authentication_methods = methods;
        self
    }
}

//--------------------------------------       Consent        ---------------------------------------------------------
/// Behaviour shared by AIS and PIIS consents that the SCA processor relies on.
pub trait Consent {
    fn consent_id(&self) -> &str;
    fn consent_status(&self) -> ConsentStatus;
    fn is_multilevel_sca_required(&self) -> bool;
    fn psu_id_data_list(&self) -> &[PsuIdData];
    fn tpp_authorisation_number(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AisConsentRequestType {
    GlobalConsent,
    AllAvailableAccounts,
    DedicatedAccounts,
    BankOffered,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountAccess {
    pub accounts: Vec<String>,
    pub balances: Vec<String>,
    pub transactions: Vec<String>,
    pub available_accounts: Option<String>,
    pub all_psd2: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AisConsent {
    pub id: String,
    pub tpp_authorisation_number: String,
    pub psu_id_data: Vec<PsuIdData>,
    pub consent_status: ConsentStatus,
    pub request_type: AisConsentRequestType,
    pub access: AccountAccess,
    /// A one-off consent has this set to false.
    pub recurring_indicator: bool,
    pub frequency_per_day: u32,
    pub valid_until: NaiveDate,
    pub multilevel_sca_required: bool,
    pub creation_timestamp: DateTime<Utc>,
    pub status_change_timestamp: DateTime<Utc>,
}

impl AisConsent {
    /// A consent that can be used for a single access only.
    pub fn is_one_access_type(&self) -> bool {
        !self.recurring_indicator
    }
}

impl Consent for AisConsent {
    fn consent_id(&self) -> &str {
        &self.id
    }

    fn consent_status(&self) -> ConsentStatus {
        self.consent_status
    }

    fn is_multilevel_sca_required(&self) -> bool {
        self.multilevel_sca_required
    }

    fn psu_id_data_list(&self) -> &[PsuIdData] {
        &self.psu_id_data
    }

    fn tpp_authorisation_number(&self) -> &str {
        &self.tpp_authorisation_number
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PiisConsent {
    pub id: String,
    pub tpp_authorisation_number: String,
    pub psu_id_data: Vec<PsuIdData>,
    pub consent_status: ConsentStatus,
    pub account_reference: String,
    pub card_number: Option<String>,
    pub card_expiry_date: Option<NaiveDate>,
    pub valid_until: Option<NaiveDate>,
    pub multilevel_sca_required: bool,
    pub creation_timestamp: DateTime<Utc>,
    pub status_change_timestamp: DateTime<Utc>,
}

impl Consent for PiisConsent {
    fn consent_id(&self) -> &str {
        &self.id
    }

    fn consent_status(&self) -> ConsentStatus {
        self.consent_status
    }

    fn is_multilevel_sca_required(&self) -> bool {
        self.multilevel_sca_required
    }

    fn psu_id_data_list(&self) -> &[PsuIdData] {
        &self.psu_id_data
    }

    fn tpp_authorisation_number(&self) -> &str {
        &self.tpp_authorisation_number
    }
}

//--------------------------------------    CommonPayment     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommonPayment {
    /// The (encrypted) payment id exposed to the TPP.
    pub payment_id: String,
    pub payment_type: PaymentType,
    pub payment_product: String,
    pub transaction_status: TransactionStatus,
    pub psu_id_data: Vec<PsuIdData>,
    pub tpp_authorisation_number: String,
    pub multilevel_sca_required: bool,
    pub payment_data: Option<serde_json::Value>,
    pub creation_timestamp: DateTime<Utc>,
    pub status_change_timestamp: DateTime<Utc>,
}

impl CommonPayment {
    pub fn has_psu(&self, psu: &PsuIdData) -> bool {
        self.psu_id_data.iter().any(|p| p.content_equals(psu))
    }
}

//------------------------------------ CurrencyConversionInfo ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    pub currency: String,
    pub amount: String,
}

impl Amount {
    pub fn new<S: Into<String>>(currency: S, amount: S) -> Self {
        Self { currency: currency.into(), amount: amount.into() }
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}

/// Fees and estimated totals that apply when a payment requires currency conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyConversionInfo {
    pub transaction_fees: Option<Amount>,
    pub currency_conversion_fees: Option<Amount>,
    pub estimated_total_amount: Option<Amount>,
    pub estimated_interbank_settlement_amount: Option<Amount>,
}
