//! Demo data for a fresh session (there is no persistence layer).

use crate::domain::{
    AccountProvider, LinkedAccount, PaymentMethod, RenewalPeriod, Subscription,
    SubscriptionCategory, UserProfile,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use uuid::Uuid;

pub const DEMO_USER_ID: &str = "user123";

pub fn placeholder_user(now: DateTime<Utc>) -> UserProfile {
    UserProfile {
        id: DEMO_USER_ID.to_string(),
        email: "user@example.com".to_string(),
        name: Some("Alex Ryder".to_string()),
        avatar_url: Some("https://placehold.co/100x100.png".to_string()),
        linked_accounts: vec![LinkedAccount {
            id: "gmail1".to_string(),
            provider: AccountProvider::Gmail,
            email: "alex.ryder@gmail.com".to_string(),
            last_scan: Some(now - Duration::days(2)),
        }],
        is_premium: false,
        free_scans_used: 0,
    }
}

struct Seed {
    name: &'static str,
    started_days_ago: i64,
    next_in_days: Option<i64>,
    trial_in_days: Option<i64>,
    period: RenewalPeriod,
    price: f64,
    method: PaymentMethod,
    category: SubscriptionCategory,
    auto_renew: bool,
    url: Option<&'static str>,
    notifications: bool,
    detected: bool,
}

const SEEDS: [Seed; 5] = [
    Seed {
        name: "Netflix",
        started_days_ago: 15,
        next_in_days: Some(15),
        trial_in_days: None,
        period: RenewalPeriod::Monthly,
        price: 15.99,
        method: PaymentMethod::Card,
        category: SubscriptionCategory::Entertainment,
        auto_renew: true,
        url: Some("https://netflix.com"),
        notifications: true,
        detected: true,
    },
    Seed {
        name: "Spotify Premium",
        started_days_ago: 5,
        next_in_days: Some(25),
        trial_in_days: None,
        period: RenewalPeriod::Monthly,
        price: 9.99,
        method: PaymentMethod::PayPal,
        category: SubscriptionCategory::Music,
        auto_renew: true,
        url: None,
        notifications: true,
        detected: false,
    },
    Seed {
        name: "Amazon Prime",
        started_days_ago: 180,
        next_in_days: Some(185),
        trial_in_days: None,
        period: RenewalPeriod::Yearly,
        price: 139.0,
        method: PaymentMethod::Card,
        category: SubscriptionCategory::Shopping,
        auto_renew: true,
        url: None,
        notifications: false,
        detected: true,
    },
    Seed {
        name: "The Daily Times",
        started_days_ago: 2,
        next_in_days: None,
        trial_in_days: Some(5),
        period: RenewalPeriod::Monthly,
        price: 5.0,
        method: PaymentMethod::Free,
        category: SubscriptionCategory::News,
        auto_renew: true,
        url: None,
        notifications: true,
        detected: false,
    },
    Seed {
        name: "Cloud Storage Pro",
        started_days_ago: 300,
        next_in_days: Some(65),
        trial_in_days: None,
        period: RenewalPeriod::Yearly,
        price: 99.99,
        method: PaymentMethod::Card,
        category: SubscriptionCategory::Productivity,
        auto_renew: false,
        url: None,
        notifications: true,
        detected: false,
    },
];

/// Five sample subscriptions dated relative to `today`, newest-first order.
pub fn placeholder_subscriptions(today: NaiveDate, currency: &str) -> Vec<Subscription> {
    SEEDS
        .iter()
        .map(|seed| Subscription {
            id: Uuid::new_v4(),
            service_name: seed.name.to_string(),
            billing_date: Some(today - Duration::days(seed.started_days_ago)),
            next_billing_date: seed.next_in_days.map(|d| today + Duration::days(d)),
            renewal_period: Some(seed.period),
            price: seed.price,
            currency: currency.to_string(),
            payment_method: seed.method,
            trial_end_date: seed.trial_in_days.map(|d| today + Duration::days(d)),
            category: seed.category,
            auto_renew: seed.auto_renew,
            service_url: seed.url.map(str::to_string),
            notes: None,
            notifications_enabled: seed.notifications,
            user_id: DEMO_USER_ID.to_string(),
            linked_account_id: None,
            detected_from_email: seed.detected,
        })
        .collect()
}
