use crate::domain::DetectionResult;
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use tracing::warn;
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString, EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum SubscriptionCategory {
    News,
    Entertainment,
    Music,
    Shopping,
    Productivity,
    Utilities,
    #[serde(rename = "Health & Fitness")]
    #[strum(serialize = "Health & Fitness")]
    HealthAndFitness,
    Education,
    Finance,
    Other,
}

impl SubscriptionCategory {
    /// Maps a free-form label (e.g. classifier output) onto the closed set,
    /// falling back to `Other`.
    pub fn coerce(label: &str) -> Self {
        label.trim().parse().unwrap_or(Self::Other)
    }

    pub fn labels() -> Vec<String> {
        Self::iter().map(|c| c.to_string()).collect()
    }
}

impl Default for SubscriptionCategory {
    fn default() -> Self {
        Self::Other
    }
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString, EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum PaymentMethod {
    Card,
    PayPal,
    Free,
    #[serde(rename = "Apple Pay")]
    #[strum(serialize = "Apple Pay")]
    ApplePay,
    #[serde(rename = "Google Pay")]
    #[strum(serialize = "Google Pay")]
    GooglePay,
    #[serde(rename = "Bank Transfer")]
    #[strum(serialize = "Bank Transfer")]
    BankTransfer,
    Unknown,
}

impl PaymentMethod {
    pub fn coerce(label: &str) -> Self {
        label.trim().parse().unwrap_or(Self::Unknown)
    }

    pub fn labels() -> Vec<String> {
        Self::iter().map(|m| m.to_string()).collect()
    }
}

impl Default for PaymentMethod {
    fn default() -> Self {
        Self::Unknown
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum RenewalPeriod {
    Monthly,
    Yearly,
    Weekly,
    Custom,
}

/// A tracked recurring (or trial/free) charge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct Subscription {
    pub id: Uuid,
    #[validate(length(min = 1, message = "service name must not be empty"))]
    pub service_name: String,
    /// Start of the current billing cycle or signup date.
    pub billing_date: Option<NaiveDate>,
    pub next_billing_date: Option<NaiveDate>,
    pub renewal_period: Option<RenewalPeriod>,
    #[validate(range(min = 0.0, message = "price must not be negative"))]
    pub price: f64,
    #[validate(custom = "validate_currency")]
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub trial_end_date: Option<NaiveDate>,
    pub category: SubscriptionCategory,
    pub auto_renew: bool,
    #[validate(url)]
    pub service_url: Option<String>,
    pub notes: Option<String>,
    pub notifications_enabled: bool,
    pub user_id: String,
    pub linked_account_id: Option<String>,
    #[serde(default)]
    pub detected_from_email: bool,
}

fn validate_currency(currency: &str) -> Result<(), ValidationError> {
    if currency.len() == 3 && currency.chars().all(|c| c.is_ascii_uppercase()) {
        Ok(())
    } else {
        Err(ValidationError::new("currency_code"))
    }
}

impl Subscription {
    /// Builds the record for a service name the detector extracted from an email.
    ///
    /// A scan cannot determine the price, so it starts at zero and the user is
    /// expected to review the entry.
    pub fn from_detection(
        service_name: &str,
        detection: &DetectionResult,
        category: SubscriptionCategory,
        user_id: &str,
        currency: &str,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            service_name: service_name.trim().to_string(),
            billing_date: detection.billing_date.as_deref().and_then(parse_detected_date),
            next_billing_date: None,
            renewal_period: None,
            price: 0.0,
            currency: currency.to_string(),
            payment_method: detection
                .payment_method
                .as_deref()
                .map(PaymentMethod::coerce)
                .unwrap_or_default(),
            trial_end_date: detection
                .trial_end_date
                .as_deref()
                .and_then(parse_detected_date),
            category,
            auto_renew: true,
            service_url: None,
            notes: Some(format!(
                "Detected from email. Marketing: {}, Receipt: {}, Terms Change: {}.",
                detection.is_marketing_email, detection.is_receipt, detection.is_terms_change
            )),
            notifications_enabled: true,
            user_id: user_id.to_string(),
            linked_account_id: None,
            detected_from_email: true,
        }
    }

    /// A future (or today's) trial end date wins over price.
    pub fn is_in_trial(&self, as_of: NaiveDate) -> bool {
        self.trial_end_date.is_some_and(|end| end >= as_of)
    }
}

const DETECTED_DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%B %d, %Y", "%b %d, %Y", "%m/%d/%Y"];

/// Accepts the date shapes the AI service has been seen to return. Anything
/// else is dropped so a fuzzy date never fails an otherwise good scan.
pub fn parse_detected_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.date_naive());
    }

    let parsed = DETECTED_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok());

    if parsed.is_none() {
        warn!(value = raw, "Dropping unparseable detected date");
    }
    parsed
}

/// Payload of the manual add/edit form.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionDraft {
    pub service_name: String,
    pub billing_date: Option<NaiveDate>,
    pub next_billing_date: Option<NaiveDate>,
    pub renewal_period: Option<RenewalPeriod>,
    pub price: f64,
    pub currency: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub trial_end_date: Option<NaiveDate>,
    pub category: Option<SubscriptionCategory>,
    pub auto_renew: bool,
    pub service_url: Option<String>,
    pub notes: Option<String>,
    pub notifications_enabled: bool,
    pub linked_account_id: Option<String>,
}

impl SubscriptionDraft {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            billing_date: None,
            next_billing_date: None,
            renewal_period: None,
            price: 0.0,
            currency: None,
            payment_method: None,
            trial_end_date: None,
            category: None,
            auto_renew: true,
            service_url: None,
            notes: None,
            notifications_enabled: true,
            linked_account_id: None,
        }
    }

    pub fn into_subscription(self, id: Uuid, user_id: &str, default_currency: &str) -> Subscription {
        Subscription {
            id,
            service_name: self.service_name.trim().to_string(),
            billing_date: self.billing_date,
            next_billing_date: self.next_billing_date,
            renewal_period: self.renewal_period,
            price: self.price,
            currency: self
                .currency
                .map(|c| c.trim().to_ascii_uppercase())
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| default_currency.to_string()),
            payment_method: self.payment_method.unwrap_or_default(),
            trial_end_date: self.trial_end_date,
            category: self.category.unwrap_or_default(),
            auto_renew: self.auto_renew,
            service_url: self.service_url.filter(|u| !u.trim().is_empty()),
            notes: self.notes.filter(|n| !n.trim().is_empty()),
            notifications_enabled: self.notifications_enabled,
            user_id: user_id.to_string(),
            linked_account_id: self.linked_account_id,
            detected_from_email: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_coerce_accepts_labels_and_falls_back() {
        assert_eq!(
            SubscriptionCategory::coerce("health & fitness"),
            SubscriptionCategory::HealthAndFitness
        );
        assert_eq!(SubscriptionCategory::coerce(" Music "), SubscriptionCategory::Music);
        assert_eq!(SubscriptionCategory::coerce("Gaming"), SubscriptionCategory::Other);
        assert_eq!(SubscriptionCategory::HealthAndFitness.to_string(), "Health & Fitness");
    }

    #[test]
    fn payment_method_coerce_falls_back_to_unknown() {
        assert_eq!(PaymentMethod::coerce("Apple Pay"), PaymentMethod::ApplePay);
        assert_eq!(PaymentMethod::coerce("paypal"), PaymentMethod::PayPal);
        assert_eq!(PaymentMethod::coerce("Visa ending 4242"), PaymentMethod::Unknown);
    }

    #[test]
    fn category_serializes_with_human_label() {
        let json = serde_json::to_string(&SubscriptionCategory::HealthAndFitness).unwrap();
        assert_eq!(json, "\"Health & Fitness\"");
        let parsed: RenewalPeriod = serde_json::from_str("\"yearly\"").unwrap();
        assert_eq!(parsed, RenewalPeriod::Yearly);
    }

    #[test]
    fn parse_detected_date_handles_common_shapes() {
        let expected = NaiveDate::from_ymd_opt(2024, 6, 15);
        assert_eq!(parse_detected_date("2024-06-15"), expected);
        assert_eq!(parse_detected_date("2024-06-15T10:00:00Z"), expected);
        assert_eq!(parse_detected_date("June 15, 2024"), expected);
        assert_eq!(parse_detected_date("next month"), None);
        assert_eq!(parse_detected_date("  "), None);
    }

    #[test]
    fn from_detection_fills_scan_defaults() {
        let detection = DetectionResult {
            is_subscription_related: true,
            service_name: Some("Netflix".to_string()),
            billing_date: Some("2024-06-15".to_string()),
            payment_method: Some("PayPal".to_string()),
            trial_end_date: None,
            is_marketing_email: false,
            is_receipt: true,
            is_terms_change: false,
        };

        let sub = Subscription::from_detection(
            "Netflix",
            &detection,
            SubscriptionCategory::Entertainment,
            "user123",
            "USD",
        );

        assert_eq!(sub.price, 0.0);
        assert!(sub.detected_from_email);
        assert!(sub.auto_renew);
        assert!(sub.notifications_enabled);
        assert_eq!(sub.payment_method, PaymentMethod::PayPal);
        assert_eq!(sub.billing_date, NaiveDate::from_ymd_opt(2024, 6, 15));
        assert_eq!(
            sub.notes.as_deref(),
            Some("Detected from email. Marketing: false, Receipt: true, Terms Change: false.")
        );
        assert!(sub.validate().is_ok());
    }

    #[test]
    fn validation_rejects_bad_records() {
        let mut sub = SubscriptionDraft::new("Spotify").into_subscription(Uuid::new_v4(), "u1", "USD");
        assert!(sub.validate().is_ok());

        sub.price = -1.0;
        sub.currency = "usd1".to_string();
        let errors = sub.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("price"));
        assert!(fields.contains_key("currency"));
    }

    #[test]
    fn draft_applies_defaults() {
        let mut draft = SubscriptionDraft::new("  Netflix ");
        draft.currency = Some("eur".to_string());
        draft.notes = Some("   ".to_string());

        let sub = draft.into_subscription(Uuid::new_v4(), "u1", "USD");
        assert_eq!(sub.service_name, "Netflix");
        assert_eq!(sub.currency, "EUR");
        assert_eq!(sub.category, SubscriptionCategory::Other);
        assert_eq!(sub.payment_method, PaymentMethod::Unknown);
        assert!(sub.notes.is_none());
        assert!(sub.auto_renew);
        assert!(sub.notifications_enabled);
        assert!(!sub.detected_from_email);
    }

    #[test]
    fn trial_is_inclusive_of_today() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let mut sub = SubscriptionDraft::new("Daily").into_subscription(Uuid::new_v4(), "u1", "USD");
        sub.trial_end_date = Some(today);
        assert!(sub.is_in_trial(today));
        assert!(!sub.is_in_trial(today.succ_opt().unwrap()));
    }
}
