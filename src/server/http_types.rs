use crate::application::{ScanProgress, SubscriptionView};
use crate::domain::{LinkedAccount, StatusInfo, Subscription, UserProfile};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Serialize, ToSchema)]
pub(super) struct HealthResponse {
    pub(super) status: String,
}

#[derive(Deserialize, ToSchema)]
pub(super) struct LoginRequest {
    #[schema(example = "user@example.com")]
    pub(super) email: String,
    #[schema(example = "password")]
    pub(super) password: String,
}

#[derive(Deserialize, Debug, Default, IntoParams)]
pub(super) struct ListParams {
    /// Category label or `all`
    #[serde(default)]
    pub(super) category: Option<String>,
    /// Case-insensitive substring of the service name
    #[serde(default)]
    pub(super) search: Option<String>,
}

/// Manual add/edit form.
#[derive(Deserialize, ToSchema)]
pub(super) struct SubscriptionRequest {
    #[schema(example = "Netflix")]
    pub(super) service_name: String,
    pub(super) billing_date: Option<NaiveDate>,
    pub(super) next_billing_date: Option<NaiveDate>,
    #[schema(example = "monthly")]
    pub(super) renewal_period: Option<String>,
    #[serde(default)]
    #[schema(example = 15.99)]
    pub(super) price: f64,
    #[schema(example = "USD")]
    pub(super) currency: Option<String>,
    #[schema(example = "Card")]
    pub(super) payment_method: Option<String>,
    pub(super) trial_end_date: Option<NaiveDate>,
    #[schema(example = "Entertainment")]
    pub(super) category: Option<String>,
    pub(super) auto_renew: Option<bool>,
    pub(super) service_url: Option<String>,
    pub(super) notes: Option<String>,
    pub(super) notifications_enabled: Option<bool>,
    pub(super) linked_account_id: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub(super) struct NotificationRequest {
    pub(super) enabled: bool,
}

#[derive(Deserialize, ToSchema)]
pub(super) struct ScanRequest {
    pub(super) email_content: String,
}

#[derive(Deserialize, ToSchema)]
pub(super) struct LinkAccountRequest {
    #[schema(example = "gmail")]
    pub(super) provider: String,
    #[schema(example = "alex.ryder@gmail.com")]
    pub(super) email: String,
}

#[derive(Serialize, ToSchema)]
pub(super) struct SubscriptionResponse {
    pub(super) id: Uuid,
    pub(super) service_name: String,
    pub(super) billing_date: Option<NaiveDate>,
    pub(super) next_billing_date: Option<NaiveDate>,
    pub(super) renewal_period: Option<String>,
    pub(super) price: f64,
    pub(super) currency: String,
    pub(super) payment_method: String,
    pub(super) trial_end_date: Option<NaiveDate>,
    pub(super) category: String,
    pub(super) auto_renew: bool,
    pub(super) service_url: Option<String>,
    pub(super) notes: Option<String>,
    pub(super) notifications_enabled: bool,
    pub(super) user_id: String,
    pub(super) linked_account_id: Option<String>,
    pub(super) detected_from_email: bool,
}

impl From<Subscription> for SubscriptionResponse {
    fn from(sub: Subscription) -> Self {
        Self {
            id: sub.id,
            service_name: sub.service_name,
            billing_date: sub.billing_date,
            next_billing_date: sub.next_billing_date,
            renewal_period: sub.renewal_period.map(|p| p.to_string()),
            price: sub.price,
            currency: sub.currency,
            payment_method: sub.payment_method.to_string(),
            trial_end_date: sub.trial_end_date,
            category: sub.category.to_string(),
            auto_renew: sub.auto_renew,
            service_url: sub.service_url,
            notes: sub.notes,
            notifications_enabled: sub.notifications_enabled,
            user_id: sub.user_id,
            linked_account_id: sub.linked_account_id,
            detected_from_email: sub.detected_from_email,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub(super) struct StatusResponse {
    #[schema(example = "Trial")]
    pub(super) label: String,
    #[schema(example = "normal")]
    pub(super) urgency: String,
    #[schema(example = "Ends in 5 days")]
    pub(super) days_remaining_text: Option<String>,
}

impl From<StatusInfo> for StatusResponse {
    fn from(status: StatusInfo) -> Self {
        Self {
            label: status.label.to_string(),
            urgency: status.urgency.to_string(),
            days_remaining_text: status.days_remaining_text,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub(super) struct SubscriptionRowResponse {
    pub(super) subscription: SubscriptionResponse,
    pub(super) status: StatusResponse,
    pub(super) display_date: Option<NaiveDate>,
}

impl From<SubscriptionView> for SubscriptionRowResponse {
    fn from(view: SubscriptionView) -> Self {
        Self {
            subscription: view.subscription.into(),
            status: view.status.into(),
            display_date: view.display_date,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub(super) struct LinkedAccountResponse {
    pub(super) id: String,
    pub(super) provider: String,
    pub(super) email: String,
    pub(super) last_scan: Option<DateTime<Utc>>,
}

impl From<&LinkedAccount> for LinkedAccountResponse {
    fn from(account: &LinkedAccount) -> Self {
        Self {
            id: account.id.clone(),
            provider: account.provider.to_string(),
            email: account.email.clone(),
            last_scan: account.last_scan,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub(super) struct ProfileResponse {
    pub(super) id: String,
    pub(super) email: String,
    pub(super) name: Option<String>,
    pub(super) avatar_url: Option<String>,
    pub(super) is_premium: bool,
    #[schema(example = "Free")]
    pub(super) plan: String,
    pub(super) free_scans_used: u32,
    /// Absent for unlimited (premium) profiles
    pub(super) scans_remaining: Option<u32>,
    pub(super) linked_accounts: Vec<LinkedAccountResponse>,
}

impl ProfileResponse {
    pub(super) fn new(profile: &UserProfile, scans_remaining: Option<u32>) -> Self {
        Self {
            id: profile.id.clone(),
            email: profile.email.clone(),
            name: profile.name.clone(),
            avatar_url: profile.avatar_url.clone(),
            is_premium: profile.is_premium,
            plan: profile.plan().to_string(),
            free_scans_used: profile.free_scans_used,
            scans_remaining,
            linked_accounts: profile.linked_accounts.iter().map(Into::into).collect(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub(super) struct ScanResponse {
    #[schema(example = "added")]
    pub(super) outcome: String,
    pub(super) message: String,
    pub(super) subscription: Option<SubscriptionResponse>,
    pub(super) scans_remaining: Option<u32>,
}

#[derive(Serialize, ToSchema)]
pub(super) struct ScanProgressResponse {
    #[schema(example = "detecting")]
    pub(super) state: String,
    #[schema(example = 30)]
    pub(super) percent: u8,
    pub(super) is_scanning: bool,
}

impl ScanProgressResponse {
    pub(super) fn new(progress: ScanProgress, is_scanning: bool) -> Self {
        Self {
            state: progress.state.to_string(),
            percent: progress.percent,
            is_scanning,
        }
    }
}
