use super::http_errors::{
    map_profile_error, map_scan_error, map_session_error, map_subscription_error,
};
use super::http_parse::{parse_provider, parse_subscription_request};
use super::http_types::{
    HealthResponse, LinkAccountRequest, LinkedAccountResponse, ListParams, LoginRequest,
    NotificationRequest, ProfileResponse, ScanProgressResponse, ScanRequest, ScanResponse,
    StatusResponse, SubscriptionRequest, SubscriptionResponse, SubscriptionRowResponse,
};
use super::state::{scan_in_workspace, AppState};
use crate::application::{ScanError, ScanOutcome};
use crate::domain::{Credentials, SubscriptionCategory};
use crate::infrastructure::{CategoryFilter, ListFilter};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/session/login", post(login))
        .route("/session/logout", post(logout))
        .route("/profile", get(get_profile))
        .route("/profile/linked-accounts", post(link_account))
        .route("/profile/linked-accounts/:id", delete(unlink_account))
        .route("/billing/upgrade", post(upgrade))
        .route("/subscriptions", get(list_subscriptions).post(create_subscription))
        .route(
            "/subscriptions/:id",
            put(update_subscription).delete(delete_subscription),
        )
        .route("/subscriptions/:id/notifications", post(set_notifications))
        .route("/scan", post(scan_email))
        .route("/scan/progress", get(scan_progress))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        login,
        logout,
        get_profile,
        link_account,
        unlink_account,
        upgrade,
        list_subscriptions,
        create_subscription,
        update_subscription,
        delete_subscription,
        set_notifications,
        scan_email,
        scan_progress,
    ),
    components(
        schemas(
            HealthResponse,
            LoginRequest,
            SubscriptionRequest,
            NotificationRequest,
            ScanRequest,
            LinkAccountRequest,
            SubscriptionResponse,
            StatusResponse,
            SubscriptionRowResponse,
            LinkedAccountResponse,
            ProfileResponse,
            ScanResponse,
            ScanProgressResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Session", description = "Mock login and profile endpoints"),
        (name = "Subscriptions", description = "Manual subscription management"),
        (name = "Scan", description = "AI email scanning"),
    ),
    info(
        title = "SubScribe API",
        version = "0.1.0",
        description = "Track subscriptions and detect new ones from pasted emails",
        license(name = "MIT")
    )
)]
struct ApiDoc;

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses((status = 200, description = "Service is healthy", body = HealthResponse))
)]
async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
        }),
    )
}

#[utoipa::path(
    post,
    path = "/session/login",
    tag = "Session",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = Object),
        (status = 400, description = "Invalid login form", body = Object),
        (status = 401, description = "Invalid email or password", body = Object)
    )
)]
async fn login(State(state): State<AppState>, Json(req): Json<LoginRequest>) -> impl IntoResponse {
    let credentials = Credentials::new(req.email, req.password);
    let mut ws = state.workspace.lock().await;

    match ws.session.login(&credentials, &state.credentials) {
        Ok(()) => {
            info!(user_id = %ws.session.profile.id, "Login successful");
            (StatusCode::OK, Json(json!({ "status": "logged_in" })))
        }
        Err(e) => {
            warn!(error = %e, "Login failed");
            let (status, body) = map_session_error(&e);
            (status, Json(body))
        }
    }
}

#[utoipa::path(
    post,
    path = "/session/logout",
    tag = "Session",
    responses((status = 200, description = "Logged out", body = Object))
)]
async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    state.workspace.lock().await.session.logout();
    (StatusCode::OK, Json(json!({ "status": "logged_out" })))
}

#[utoipa::path(
    get,
    path = "/profile",
    tag = "Session",
    responses(
        (status = 200, description = "Current profile", body = ProfileResponse),
        (status = 401, description = "Not logged in", body = Object)
    )
)]
async fn get_profile(State(state): State<AppState>) -> impl IntoResponse {
    let ws = state.workspace.lock().await;
    if let Err(e) = ws.session.require_authenticated() {
        let (status, body) = map_session_error(&e);
        return (status, Json(body));
    }

    let remaining = state.scanner.policy().scans_remaining(&ws.session.profile);
    (
        StatusCode::OK,
        Json(json!(ProfileResponse::new(&ws.session.profile, remaining))),
    )
}

#[utoipa::path(
    post,
    path = "/profile/linked-accounts",
    tag = "Session",
    request_body = LinkAccountRequest,
    responses(
        (status = 201, description = "Account linked", body = LinkedAccountResponse),
        (status = 400, description = "Unknown provider", body = Object),
        (status = 403, description = "Plan limit reached", body = Object),
        (status = 409, description = "Already linked", body = Object)
    )
)]
async fn link_account(
    State(state): State<AppState>,
    Json(req): Json<LinkAccountRequest>,
) -> impl IntoResponse {
    let provider = match parse_provider(&req.provider) {
        Some(p) => p,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Invalid provider", "allowed": ["gmail"] })),
            );
        }
    };

    let mut ws = state.workspace.lock().await;
    if let Err(e) = ws.session.require_authenticated() {
        let (status, body) = map_session_error(&e);
        return (status, Json(body));
    }

    match ws.session.profile.link_account(provider, &req.email) {
        Ok(account) => (
            StatusCode::CREATED,
            Json(json!(LinkedAccountResponse::from(&account))),
        ),
        Err(e) => {
            warn!(error = %e, "Failed to link account");
            let (status, body) = map_profile_error(&e);
            (status, Json(body))
        }
    }
}

#[utoipa::path(
    delete,
    path = "/profile/linked-accounts/{id}",
    tag = "Session",
    params(("id" = String, Path, description = "Linked account ID")),
    responses(
        (status = 200, description = "Unlinked (idempotent)", body = Object),
        (status = 401, description = "Not logged in", body = Object)
    )
)]
async fn unlink_account(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    let mut ws = state.workspace.lock().await;
    if let Err(e) = ws.session.require_authenticated() {
        let (status, body) = map_session_error(&e);
        return (status, Json(body));
    }

    let removed = ws.session.profile.unlink_account(&id);
    (StatusCode::OK, Json(json!({ "removed": removed })))
}

#[utoipa::path(
    post,
    path = "/billing/upgrade",
    tag = "Session",
    responses(
        (status = 200, description = "Now on the Premium plan", body = ProfileResponse),
        (status = 401, description = "Not logged in", body = Object)
    )
)]
async fn upgrade(State(state): State<AppState>) -> impl IntoResponse {
    let mut ws = state.workspace.lock().await;
    if let Err(e) = ws.session.require_authenticated() {
        let (status, body) = map_session_error(&e);
        return (status, Json(body));
    }

    ws.session.upgrade_to_premium();
    info!(user_id = %ws.session.profile.id, "Upgraded to Premium");
    let remaining = state.scanner.policy().scans_remaining(&ws.session.profile);
    (
        StatusCode::OK,
        Json(json!(ProfileResponse::new(&ws.session.profile, remaining))),
    )
}

#[utoipa::path(
    get,
    path = "/subscriptions",
    tag = "Subscriptions",
    params(ListParams),
    responses(
        (status = 200, description = "Subscriptions, newest first", body = [SubscriptionRowResponse]),
        (status = 400, description = "Unknown category", body = Object),
        (status = 401, description = "Not logged in", body = Object)
    )
)]
async fn list_subscriptions(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> impl IntoResponse {
    let category = match CategoryFilter::parse(params.category.as_deref().unwrap_or("all")) {
        Some(c) => c,
        None => {
            let mut allowed = vec!["all".to_string()];
            allowed.extend(SubscriptionCategory::labels());
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Invalid category", "allowed": allowed })),
            );
        }
    };
    let filter = ListFilter::new(category, params.search.unwrap_or_default());

    let ws = state.workspace.lock().await;
    match state
        .subscriptions
        .list(&ws.session, &ws.store, &filter, state.clock.today())
    {
        Ok(rows) => {
            let rows: Vec<SubscriptionRowResponse> = rows.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(json!(rows)))
        }
        Err(e) => {
            let (status, body) = map_subscription_error(&e);
            (status, Json(body))
        }
    }
}

#[utoipa::path(
    post,
    path = "/subscriptions",
    tag = "Subscriptions",
    request_body = SubscriptionRequest,
    responses(
        (status = 201, description = "Subscription added", body = SubscriptionResponse),
        (status = 400, description = "Invalid subscription", body = Object),
        (status = 401, description = "Not logged in", body = Object)
    )
)]
async fn create_subscription(
    State(state): State<AppState>,
    Json(req): Json<SubscriptionRequest>,
) -> impl IntoResponse {
    let draft = match parse_subscription_request(req) {
        Ok(d) => d,
        Err(body) => return (StatusCode::BAD_REQUEST, Json(body)),
    };

    let mut guard = state.workspace.lock().await;
    let ws = &mut *guard;
    match state.subscriptions.create(&ws.session, &mut ws.store, draft) {
        Ok(sub) => (
            StatusCode::CREATED,
            Json(json!(SubscriptionResponse::from(sub))),
        ),
        Err(e) => {
            warn!(error = %e, "Failed to add subscription");
            let (status, body) = map_subscription_error(&e);
            (status, Json(body))
        }
    }
}

#[utoipa::path(
    put,
    path = "/subscriptions/{id}",
    tag = "Subscriptions",
    params(("id" = Uuid, Path, description = "Subscription ID")),
    request_body = SubscriptionRequest,
    responses(
        (status = 200, description = "Subscription updated", body = SubscriptionResponse),
        (status = 400, description = "Invalid subscription", body = Object),
        (status = 404, description = "Subscription not found", body = Object)
    )
)]
async fn update_subscription(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SubscriptionRequest>,
) -> impl IntoResponse {
    let draft = match parse_subscription_request(req) {
        Ok(d) => d,
        Err(body) => return (StatusCode::BAD_REQUEST, Json(body)),
    };

    let mut guard = state.workspace.lock().await;
    let ws = &mut *guard;
    match state.subscriptions.edit(&ws.session, &mut ws.store, id, draft) {
        Ok(sub) => (StatusCode::OK, Json(json!(SubscriptionResponse::from(sub)))),
        Err(e) => {
            warn!(error = %e, "Failed to update subscription");
            let (status, body) = map_subscription_error(&e);
            (status, Json(body))
        }
    }
}

#[utoipa::path(
    delete,
    path = "/subscriptions/{id}",
    tag = "Subscriptions",
    params(("id" = Uuid, Path, description = "Subscription ID")),
    responses(
        (status = 200, description = "Deleted (idempotent)", body = Object),
        (status = 401, description = "Not logged in", body = Object)
    )
)]
async fn delete_subscription(State(state): State<AppState>, Path(id): Path<Uuid>) -> impl IntoResponse {
    let mut guard = state.workspace.lock().await;
    let ws = &mut *guard;
    match state.subscriptions.delete(&ws.session, &mut ws.store, id) {
        Ok(removed) => (StatusCode::OK, Json(json!({ "removed": removed }))),
        Err(e) => {
            let (status, body) = map_subscription_error(&e);
            (status, Json(body))
        }
    }
}

#[utoipa::path(
    post,
    path = "/subscriptions/{id}/notifications",
    tag = "Subscriptions",
    params(("id" = Uuid, Path, description = "Subscription ID")),
    request_body = NotificationRequest,
    responses(
        (status = 200, description = "Notification preference updated", body = Object),
        (status = 404, description = "Subscription not found", body = Object)
    )
)]
async fn set_notifications(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<NotificationRequest>,
) -> impl IntoResponse {
    let mut guard = state.workspace.lock().await;
    let ws = &mut *guard;
    match state
        .subscriptions
        .set_notifications(&ws.session, &mut ws.store, id, req.enabled)
    {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ok" }))),
        Err(e) => {
            let (status, body) = map_subscription_error(&e);
            (status, Json(body))
        }
    }
}

#[utoipa::path(
    post,
    path = "/scan",
    tag = "Scan",
    request_body = ScanRequest,
    responses(
        (status = 200, description = "Scan finished", body = ScanResponse),
        (status = 400, description = "Email content is empty", body = Object),
        (status = 401, description = "Not logged in", body = Object),
        (status = 402, description = "Free scan quota used up", body = Object),
        (status = 409, description = "A scan is already in progress", body = Object),
        (status = 502, description = "AI service failed, try again", body = Object)
    )
)]
async fn scan_email(State(state): State<AppState>, Json(req): Json<ScanRequest>) -> impl IntoResponse {
    let result =
        scan_in_workspace(&state.workspace, state.scanner.as_ref(), &req.email_content).await;

    let response = match result {
        Ok((ScanOutcome::Added(sub), remaining)) => ScanResponse {
            outcome: "added".to_string(),
            message: format!(
                "{} added. Please review and update details.",
                sub.service_name
            ),
            subscription: Some(sub.into()),
            scans_remaining: remaining,
        },
        Ok((ScanOutcome::PartialDetection, remaining)) => ScanResponse {
            outcome: "partial_detection".to_string(),
            message: "Could not extract full details. Please add manually.".to_string(),
            subscription: None,
            scans_remaining: remaining,
        },
        Ok((ScanOutcome::NoSubscriptionDetected, remaining)) => ScanResponse {
            outcome: "no_subscription_detected".to_string(),
            message: "The email doesn't seem to be subscription-related.".to_string(),
            subscription: None,
            scans_remaining: remaining,
        },
        Err(e) => {
            log_scan_rejection(&e);
            let (status, body) = map_scan_error(&e);
            return (status, Json(body));
        }
    };

    (StatusCode::OK, Json(json!(response)))
}

fn log_scan_rejection(err: &ScanError) {
    match scan_rejection_level(err) {
        Some(level) if level == Level::WARN => warn!(error = %err, "Scan request rejected"),
        Some(_) => info!(error = %err, "Scan request rejected"),
        None => {}
    }
}

/// `None` when the scanner already logged the failure itself.
pub(super) fn scan_rejection_level(err: &ScanError) -> Option<Level> {
    match err {
        ScanError::DetectionFailed(_) | ScanError::Store(_) | ScanError::QuotaExceeded { .. } => {
            None
        }
        ScanError::EmptyInput => Some(Level::INFO),
        ScanError::ScanInProgress | ScanError::Session(_) => Some(Level::WARN),
    }
}

#[utoipa::path(
    get,
    path = "/scan/progress",
    tag = "Scan",
    responses((status = 200, description = "Current scan progress", body = ScanProgressResponse))
)]
async fn scan_progress(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(ScanProgressResponse::new(
            state.scanner.current_progress(),
            state.scanner.is_scanning(),
        )),
    )
}
