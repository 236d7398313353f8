use crate::application::{ScanError, SubscriptionError};
use crate::domain::{ProfileError, SessionError};
use crate::infrastructure::StoreError;
use axum::http::StatusCode;
use serde_json::json;

pub(super) fn map_session_error(err: &SessionError) -> (StatusCode, serde_json::Value) {
    match err {
        SessionError::Unauthenticated => (
            StatusCode::UNAUTHORIZED,
            json!({ "error": "Please log in first" }),
        ),
        SessionError::InvalidCredentials => (
            StatusCode::UNAUTHORIZED,
            json!({ "error": "Invalid email or password." }),
        ),
        SessionError::Invalid(errors) => (
            StatusCode::BAD_REQUEST,
            json!({ "error": "Invalid login form", "details": errors }),
        ),
    }
}

pub(super) fn map_scan_error(err: &ScanError) -> (StatusCode, serde_json::Value) {
    match err {
        ScanError::EmptyInput => (
            StatusCode::BAD_REQUEST,
            json!({ "error": "Email content is empty. Please paste email content to scan." }),
        ),
        ScanError::QuotaExceeded { limit } => (
            StatusCode::PAYMENT_REQUIRED,
            json!({
                "error": format!(
                    "You've used your {} free AI email scan(s). Upgrade to Premium for unlimited scans.",
                    limit
                )
            }),
        ),
        ScanError::DetectionFailed(_) => (
            StatusCode::BAD_GATEWAY,
            json!({ "error": "Scan failed: an error occurred during AI processing. Please try again." }),
        ),
        ScanError::ScanInProgress => (
            StatusCode::CONFLICT,
            json!({ "error": "A scan is already in progress" }),
        ),
        ScanError::Session(e) => map_session_error(e),
        ScanError::Store(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": "Failed to record detected subscription" }),
        ),
    }
}

pub(super) fn map_subscription_error(err: &SubscriptionError) -> (StatusCode, serde_json::Value) {
    match err {
        SubscriptionError::Invalid(errors) => (
            StatusCode::BAD_REQUEST,
            json!({ "error": "Invalid subscription", "details": errors }),
        ),
        SubscriptionError::Store(StoreError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            json!({ "error": "Subscription not found" }),
        ),
        SubscriptionError::Session(e) => map_session_error(e),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": "Failed to save subscription" }),
        ),
    }
}

pub(super) fn map_profile_error(err: &ProfileError) -> (StatusCode, serde_json::Value) {
    match err {
        ProfileError::LinkedAccountLimit(max) => (
            StatusCode::FORBIDDEN,
            json!({
                "error": format!("Linked account limit reached: maximum {} on your plan", max)
            }),
        ),
        ProfileError::AlreadyLinked(_) => (
            StatusCode::CONFLICT,
            json!({ "error": "Account already linked" }),
        ),
    }
}
