use super::http_types::SubscriptionRequest;
use crate::domain::{
    AccountProvider, PaymentMethod, RenewalPeriod, SubscriptionCategory, SubscriptionDraft,
};
use serde_json::{json, Value};

/// Form values are a closed set: unknown labels are rejected here rather than coerced.
pub(super) fn parse_category(category: &str) -> Option<SubscriptionCategory> {
    category.trim().parse().ok()
}

pub(super) fn parse_payment_method(method: &str) -> Option<PaymentMethod> {
    method.trim().parse().ok()
}

pub(super) fn parse_renewal_period(period: &str) -> Option<RenewalPeriod> {
    period.trim().parse().ok()
}

pub(super) fn parse_provider(provider: &str) -> Option<AccountProvider> {
    provider.trim().parse().ok()
}

fn invalid(field: &str, allowed: Vec<String>) -> Value {
    json!({
        "error": format!("Invalid {}", field),
        "allowed": allowed,
    })
}

/// Builds a draft from the form, or the 400 body naming the bad field.
pub(super) fn parse_subscription_request(req: SubscriptionRequest) -> Result<SubscriptionDraft, Value> {
    let category = match req.category.as_deref() {
        Some(c) => Some(
            parse_category(c).ok_or_else(|| invalid("category", SubscriptionCategory::labels()))?,
        ),
        None => None,
    };

    let payment_method = match req.payment_method.as_deref() {
        Some(m) => Some(
            parse_payment_method(m)
                .ok_or_else(|| invalid("payment_method", PaymentMethod::labels()))?,
        ),
        None => None,
    };

    let renewal_period = match req.renewal_period.as_deref() {
        Some(p) => Some(parse_renewal_period(p).ok_or_else(|| {
            invalid(
                "renewal_period",
                ["monthly", "yearly", "weekly", "custom"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            )
        })?),
        None => None,
    };

    let mut draft = SubscriptionDraft::new(req.service_name);
    draft.billing_date = req.billing_date;
    draft.next_billing_date = req.next_billing_date;
    draft.renewal_period = renewal_period;
    draft.price = req.price;
    draft.currency = req.currency;
    draft.payment_method = payment_method;
    draft.trial_end_date = req.trial_end_date;
    draft.category = category;
    draft.auto_renew = req.auto_renew.unwrap_or(true);
    draft.service_url = req.service_url;
    draft.notes = req.notes;
    draft.notifications_enabled = req.notifications_enabled.unwrap_or(true);
    draft.linked_account_id = req.linked_account_id;
    Ok(draft)
}
