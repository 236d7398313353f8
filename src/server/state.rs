use crate::application::{
    QuotaPolicy, ScanError, ScanOrchestrator, ScanOutcome, SubscriptionService,
};
use crate::domain::{Credentials, SessionContext, UserProfile};
use crate::infrastructure::{
    placeholder_subscriptions, placeholder_user, AiServiceClient, AppConfig, CategoryClassifier,
    Clock, SubscriptionDetector, SubscriptionStore, SystemClock, DEMO_USER_ID,
};
use anyhow::Context;
use std::sync::Arc;
use tokio::sync::Mutex;

pub type ScanOrchestratorType = ScanOrchestrator<AiServiceClient, AiServiceClient>;

/// Everything one interaction mutates: who is logged in and their list.
pub struct Workspace {
    pub session: SessionContext,
    pub store: SubscriptionStore,
}

#[derive(Clone)]
pub struct AppState {
    pub workspace: Arc<Mutex<Workspace>>,
    pub scanner: Arc<ScanOrchestratorType>,
    pub subscriptions: Arc<SubscriptionService>,
    pub clock: Arc<dyn Clock>,
    pub credentials: Arc<Credentials>,
}

/// Build state from config with an explicit clock.
///
/// Intended for embedding, where the host may want to pin "today".
pub fn build_state_with_clock(config: AppConfig, clock: Arc<dyn Clock>) -> anyhow::Result<AppState> {
    let ai_client = Arc::new(
        AiServiceClient::new(
            config.ai_base_url.clone(),
            config.ai_api_key.as_deref(),
            config.ai_timeout(),
        )
        .context("init AI service client")?,
    );

    let scanner = Arc::new(ScanOrchestrator::new(
        ai_client.clone(),
        ai_client,
        QuotaPolicy::new(config.free_scan_limit),
        config.default_currency.clone(),
    ));

    let (profile, store) = if config.seed_demo_data {
        let seeds = placeholder_subscriptions(clock.today(), &config.default_currency);
        let store = SubscriptionStore::with_items(seeds).context("seed demo subscriptions")?;
        (placeholder_user(clock.now()), store)
    } else {
        (
            UserProfile::new(DEMO_USER_ID.to_string(), config.demo_email.clone()),
            SubscriptionStore::new(),
        )
    };

    Ok(AppState {
        workspace: Arc::new(Mutex::new(Workspace {
            session: SessionContext::new(profile),
            store,
        })),
        scanner,
        subscriptions: Arc::new(SubscriptionService::new(config.default_currency.clone())),
        credentials: Arc::new(config.demo_credentials()),
        clock,
    })
}

/// Build state for the standalone server.
pub fn build_state_from_env(config: AppConfig) -> anyhow::Result<AppState> {
    build_state_with_clock(config, Arc::new(SystemClock))
}

/// Runs one scan against the shared workspace.
///
/// The lock is held for the entry checks and for the commit, never across the
/// remote calls, so other requests proceed while the AI service works. Returns
/// the outcome with the scans left afterwards.
pub async fn scan_in_workspace<D, C>(
    workspace: &Mutex<Workspace>,
    scanner: &ScanOrchestrator<D, C>,
    email_text: &str,
) -> Result<(ScanOutcome, Option<u32>), ScanError>
where
    D: SubscriptionDetector,
    C: CategoryClassifier,
{
    let attempt = {
        let ws = workspace.lock().await;
        scanner.start(email_text, &ws.session)?
    };

    let finding = attempt.analyze().await?;

    let mut guard = workspace.lock().await;
    let ws = &mut *guard;
    let outcome = attempt.commit(finding, &mut ws.session, &mut ws.store)?;
    Ok((outcome, scanner.policy().scans_remaining(&ws.session.profile)))
}
