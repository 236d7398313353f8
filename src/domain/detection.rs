use serde::{Deserialize, Serialize};

/// What the detection service extracted from one email.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub is_subscription_related: bool,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub billing_date: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub trial_end_date: Option<String>,
    #[serde(default)]
    pub is_marketing_email: bool,
    #[serde(default)]
    pub is_receipt: bool,
    #[serde(default)]
    pub is_terms_change: bool,
}

impl DetectionResult {
    /// Extracted service name, ignoring blank output.
    pub fn service_name(&self) -> Option<&str> {
        self.service_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    /// Description handed to the category classifier alongside the name.
    pub fn category_description(&self) -> String {
        format!(
            "Detected from email. Billing: {}. Payment: {}. Trial: {}",
            or_na(self.billing_date.as_deref()),
            or_na(self.payment_method.as_deref()),
            or_na(self.trial_end_date.as_deref()),
        )
    }
}

fn or_na(value: Option<&str>) -> &str {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => "N/A",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryResult {
    pub category: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn description_substitutes_missing_fields() {
        let detection = DetectionResult {
            is_subscription_related: true,
            service_name: Some("Hulu".to_string()),
            payment_method: Some("Card".to_string()),
            ..Default::default()
        };

        assert_eq!(
            detection.category_description(),
            "Detected from email. Billing: N/A. Payment: Card. Trial: N/A"
        );
    }

    #[test]
    fn blank_service_name_counts_as_missing() {
        let detection = DetectionResult {
            is_subscription_related: true,
            service_name: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(detection.service_name().is_none());
    }

    #[test]
    fn deserializes_camel_case_wire_shape() {
        let detection: DetectionResult = serde_json::from_str(
            r#"{"isSubscriptionRelated":true,"serviceName":"Spotify","isReceipt":true}"#,
        )
        .unwrap();

        assert_eq!(detection.service_name(), Some("Spotify"));
        assert!(detection.is_receipt);
        assert!(!detection.is_marketing_email);
    }
}
