use crate::application::QuotaPolicy;
use crate::domain::{
    DetectionResult, SessionContext, SessionError, Subscription, SubscriptionCategory,
};
use crate::infrastructure::{
    CategoryClassifier, ServiceError, StoreError, SubscriptionDetector, SubscriptionStore,
};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use strum::Display;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{error, info, warn};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Email content is empty")]
    EmptyInput,
    #[error("Free scan quota used up ({limit} scan(s) on the free plan)")]
    QuotaExceeded { limit: u32 },
    #[error("Detection failed: {0}")]
    DetectionFailed(#[source] ServiceError),
    #[error("A scan is already in progress")]
    ScanInProgress,
    #[error("Session error: {0}")]
    Session(#[from] SessionError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    NoSubscriptionDetected,
    /// Subscription-related but no service name; the user should add it by hand.
    PartialDetection,
    Added(Subscription),
}

/// One scan attempt moves strictly forward through these states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ScanState {
    Idle,
    Detecting,
    Categorizing,
    Recording,
    Rejected,
    CompletedNoMatch,
    CompletedPartial,
    CompletedAdded,
}

impl ScanState {
    pub fn percent(&self) -> u8 {
        match self {
            ScanState::Idle => 0,
            ScanState::Detecting => 30,
            ScanState::Categorizing => 70,
            ScanState::Recording => 90,
            _ => 100,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ScanState::Rejected
                | ScanState::CompletedNoMatch
                | ScanState::CompletedPartial
                | ScanState::CompletedAdded
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScanProgress {
    pub state: ScanState,
    pub percent: u8,
}

impl From<ScanState> for ScanProgress {
    fn from(state: ScanState) -> Self {
        Self {
            state,
            percent: state.percent(),
        }
    }
}

/// What the remote calls produced, before anything is committed.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanFinding {
    NoSubscriptionDetected,
    PartialDetection,
    Candidate(Subscription),
}

/// Clears the in-flight flag and resets progress when an attempt ends, on every path.
struct InFlight<'a> {
    flag: &'a AtomicBool,
    progress: &'a watch::Sender<ScanProgress>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.progress.send_replace(ScanState::Idle.into());
        self.flag.store(false, Ordering::Release);
    }
}

/// Drives email text through detection, categorization and the store.
pub struct ScanOrchestrator<D, C>
where
    D: SubscriptionDetector,
    C: CategoryClassifier,
{
    detector: Arc<D>,
    classifier: Arc<C>,
    policy: QuotaPolicy,
    currency: String,
    in_flight: AtomicBool,
    progress: watch::Sender<ScanProgress>,
}

impl<D, C> ScanOrchestrator<D, C>
where
    D: SubscriptionDetector,
    C: CategoryClassifier,
{
    pub fn new(detector: Arc<D>, classifier: Arc<C>, policy: QuotaPolicy, currency: String) -> Self {
        let (progress, _) = watch::channel(ScanState::Idle.into());
        Self {
            detector,
            classifier,
            policy,
            currency,
            in_flight: AtomicBool::new(false),
            progress,
        }
    }

    pub fn policy(&self) -> &QuotaPolicy {
        &self.policy
    }

    pub fn is_scanning(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Progress side channel; the latest value is always available.
    pub fn subscribe_progress(&self) -> watch::Receiver<ScanProgress> {
        self.progress.subscribe()
    }

    pub fn current_progress(&self) -> ScanProgress {
        *self.progress.borrow()
    }

    /// Runs one scan attempt end to end.
    ///
    /// Callers sharing the session and store across tasks should drive
    /// [`start`](Self::start), [`ScanAttempt::analyze`] and
    /// [`ScanAttempt::commit`] themselves so nothing is locked during the
    /// remote calls.
    pub async fn scan(
        &self,
        email_text: &str,
        session: &mut SessionContext,
        store: &mut SubscriptionStore,
    ) -> Result<ScanOutcome, ScanError> {
        let attempt = self.start(email_text, session)?;
        let finding = attempt.analyze().await?;
        attempt.commit(finding, session, store)
    }

    /// Entry checks: non-empty input, a logged-in session, no other attempt
    /// in flight, quota left. On success the attempt holds the in-flight slot.
    pub fn start(
        &self,
        email_text: &str,
        session: &SessionContext,
    ) -> Result<ScanAttempt<'_, D, C>, ScanError> {
        if email_text.trim().is_empty() {
            return Err(ScanError::EmptyInput);
        }
        session.require_authenticated()?;

        let in_flight = self.begin()?;
        self.check_quota(session)?;

        Ok(ScanAttempt {
            scanner: self,
            email_text: email_text.to_string(),
            user_id: session.profile.id.clone(),
            _in_flight: in_flight,
        })
    }

    fn check_quota(&self, session: &SessionContext) -> Result<(), ScanError> {
        if self.policy.can_scan(&session.profile) {
            return Ok(());
        }
        warn!(
            user_id = %session.profile.id,
            used = session.profile.free_scans_used,
            "Scan rejected: free quota used up"
        );
        self.report(ScanState::Rejected);
        Err(ScanError::QuotaExceeded {
            limit: self.policy.free_scan_limit,
        })
    }

    fn begin(&self) -> Result<InFlight<'_>, ScanError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ScanError::ScanInProgress)?;
        Ok(InFlight {
            flag: &self.in_flight,
            progress: &self.progress,
        })
    }

    fn report(&self, state: ScanState) {
        self.progress.send_replace(state.into());
    }

    /// Best effort: a classifier failure degrades to `Other`.
    async fn categorize(&self, name: &str, detection: &DetectionResult) -> SubscriptionCategory {
        match self
            .classifier
            .classify(name, &detection.category_description())
            .await
        {
            Ok(result) => SubscriptionCategory::coerce(&result.category),
            Err(e) => {
                warn!(service = name, error = %e, "Categorization failed, using Other");
                SubscriptionCategory::Other
            }
        }
    }
}

/// A scan attempt that passed the entry checks.
///
/// Dropping it at any point ends the attempt and frees the in-flight slot.
pub struct ScanAttempt<'a, D, C>
where
    D: SubscriptionDetector,
    C: CategoryClassifier,
{
    scanner: &'a ScanOrchestrator<D, C>,
    email_text: String,
    user_id: String,
    _in_flight: InFlight<'a>,
}

impl<D, C> ScanAttempt<'_, D, C>
where
    D: SubscriptionDetector,
    C: CategoryClassifier,
{
    /// Detection then categorization. Reads and writes neither session nor store.
    pub async fn analyze(&self) -> Result<ScanFinding, ScanError> {
        let scanner = self.scanner;

        scanner.report(ScanState::Detecting);
        let detection = match scanner.detector.detect(&self.email_text).await {
            Ok(d) => d,
            Err(e) => {
                error!(error = %e, "Subscription detection failed");
                scanner.report(ScanState::Rejected);
                return Err(ScanError::DetectionFailed(e));
            }
        };

        if !detection.is_subscription_related {
            info!("Email is not subscription-related");
            return Ok(ScanFinding::NoSubscriptionDetected);
        }

        let Some(service_name) = detection.service_name() else {
            info!("Subscription email found but no service name extracted");
            return Ok(ScanFinding::PartialDetection);
        };

        scanner.report(ScanState::Categorizing);
        let category = scanner.categorize(service_name, &detection).await;

        Ok(ScanFinding::Candidate(Subscription::from_detection(
            service_name,
            &detection,
            category,
            &self.user_id,
            &scanner.currency,
        )))
    }

    /// Applies a finding. The store insertion and the quota charge happen
    /// together or not at all; login and quota are checked again here since
    /// the session may have changed while the remote calls ran.
    pub fn commit(
        self,
        finding: ScanFinding,
        session: &mut SessionContext,
        store: &mut SubscriptionStore,
    ) -> Result<ScanOutcome, ScanError> {
        let scanner = self.scanner;

        let record = match finding {
            ScanFinding::NoSubscriptionDetected => {
                scanner.report(ScanState::CompletedNoMatch);
                return Ok(ScanOutcome::NoSubscriptionDetected);
            }
            ScanFinding::PartialDetection => {
                scanner.report(ScanState::CompletedPartial);
                return Ok(ScanOutcome::PartialDetection);
            }
            ScanFinding::Candidate(record) => record,
        };

        scanner.report(ScanState::Recording);
        if let Err(e) = session.require_authenticated() {
            scanner.report(ScanState::Rejected);
            return Err(e.into());
        }
        scanner.check_quota(session)?;

        if let Err(e) = store.add(record.clone()) {
            error!(error = %e, "Failed to record detected subscription");
            scanner.report(ScanState::Rejected);
            return Err(e.into());
        }
        scanner.policy.charge(&mut session.profile);

        scanner.report(ScanState::CompletedAdded);
        info!(
            id = %record.id,
            service = %record.service_name,
            category = %record.category,
            free_scans_used = session.profile.free_scans_used,
            "Subscription detected from email"
        );

        Ok(ScanOutcome::Added(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CategoryResult, UserProfile};
    use crate::infrastructure::{ListFilter, MockCategoryClassifier, MockSubscriptionDetector};

    fn session() -> SessionContext {
        let mut session = SessionContext::new(UserProfile::new(
            "user123".to_string(),
            "user@example.com".to_string(),
        ));
        session.authenticated = true;
        session
    }

    fn netflix_detection() -> DetectionResult {
        DetectionResult {
            is_subscription_related: true,
            service_name: Some("Netflix".to_string()),
            billing_date: Some("2024-06-15".to_string()),
            is_receipt: true,
            ..Default::default()
        }
    }

    fn orchestrator(
        detector: MockSubscriptionDetector,
        classifier: MockCategoryClassifier,
    ) -> ScanOrchestrator<MockSubscriptionDetector, MockCategoryClassifier> {
        ScanOrchestrator::new(
            Arc::new(detector),
            Arc::new(classifier),
            QuotaPolicy::default(),
            "USD".to_string(),
        )
    }

    #[tokio::test]
    async fn empty_input_makes_no_calls() {
        let mut detector = MockSubscriptionDetector::new();
        detector.expect_detect().never();
        let mut classifier = MockCategoryClassifier::new();
        classifier.expect_classify().never();

        let scanner = orchestrator(detector, classifier);
        let mut session = session();
        let mut store = SubscriptionStore::new();

        let result = scanner.scan("  \n\t ", &mut session, &mut store).await;
        assert!(matches!(result, Err(ScanError::EmptyInput)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn named_detection_adds_record_and_charges_quota() {
        let mut detector = MockSubscriptionDetector::new();
        detector
            .expect_detect()
            .times(1)
            .returning(|_| Ok(netflix_detection()));
        let mut classifier = MockCategoryClassifier::new();
        classifier
            .expect_classify()
            .withf(|name, description| {
                name.eq_ignore_ascii_case("Netflix")
                    && description.contains("Billing: 2024-06-15")
                    && description.contains("Payment: N/A")
            })
            .times(1)
            .returning(|_, _| {
                Ok(CategoryResult {
                    category: "Entertainment".to_string(),
                })
            });

        let scanner = orchestrator(detector, classifier);
        let mut session = session();
        let mut store = SubscriptionStore::new();

        let outcome = scanner
            .scan("Your Netflix receipt", &mut session, &mut store)
            .await
            .unwrap();

        let ScanOutcome::Added(record) = outcome else {
            panic!("expected a new subscription");
        };
        assert_eq!(record.category, SubscriptionCategory::Entertainment);
        assert_eq!(record.user_id, "user123");
        assert_eq!(session.profile.free_scans_used, 1);
        assert_eq!(store.list(&ListFilter::all()).next(), Some(&record));
        assert_eq!(scanner.current_progress(), ScanState::Idle.into());
        assert!(!scanner.is_scanning());
    }

    #[tokio::test]
    async fn classifier_failure_degrades_to_other_and_still_charges() {
        let mut detector = MockSubscriptionDetector::new();
        detector
            .expect_detect()
            .returning(|_| Ok(netflix_detection()));
        let mut classifier = MockCategoryClassifier::new();
        classifier
            .expect_classify()
            .returning(|_, _| Err(ServiceError::RateLimited));

        let scanner = orchestrator(detector, classifier);
        let mut session = session();
        let mut store = SubscriptionStore::new();

        let outcome = scanner
            .scan("Your Netflix receipt", &mut session, &mut store)
            .await
            .unwrap();

        match outcome {
            ScanOutcome::Added(record) => {
                assert_eq!(record.category, SubscriptionCategory::Other)
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(session.profile.free_scans_used, 1);
    }

    #[tokio::test]
    async fn unrecognised_category_label_is_coerced() {
        let mut detector = MockSubscriptionDetector::new();
        detector
            .expect_detect()
            .returning(|_| Ok(netflix_detection()));
        let mut classifier = MockCategoryClassifier::new();
        classifier.expect_classify().returning(|_, _| {
            Ok(CategoryResult {
                category: "Streaming Video".to_string(),
            })
        });

        let scanner = orchestrator(detector, classifier);
        let mut session = session();
        let mut store = SubscriptionStore::new();

        let outcome = scanner.scan("receipt", &mut session, &mut store).await.unwrap();
        assert!(matches!(
            outcome,
            ScanOutcome::Added(Subscription {
                category: SubscriptionCategory::Other,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn partial_detection_leaves_state_untouched() {
        let mut detector = MockSubscriptionDetector::new();
        detector.expect_detect().returning(|_| {
            Ok(DetectionResult {
                is_subscription_related: true,
                ..Default::default()
            })
        });
        let mut classifier = MockCategoryClassifier::new();
        classifier.expect_classify().never();

        let scanner = orchestrator(detector, classifier);
        let mut session = session();
        let mut store = SubscriptionStore::new();

        let outcome = scanner.scan("Your plan", &mut session, &mut store).await.unwrap();
        assert_eq!(outcome, ScanOutcome::PartialDetection);
        assert!(store.is_empty());
        assert_eq!(session.profile.free_scans_used, 0);
    }

    #[tokio::test]
    async fn detection_failure_commits_nothing() {
        let mut detector = MockSubscriptionDetector::new();
        detector
            .expect_detect()
            .returning(|_| Err(ServiceError::RequestFailed("boom".to_string())));
        let mut classifier = MockCategoryClassifier::new();
        classifier.expect_classify().never();

        let scanner = orchestrator(detector, classifier);
        let mut session = session();
        let mut store = SubscriptionStore::new();

        let result = scanner.scan("email", &mut session, &mut store).await;
        assert!(matches!(result, Err(ScanError::DetectionFailed(_))));
        assert!(store.is_empty());
        assert_eq!(session.profile.free_scans_used, 0);
        assert!(!scanner.is_scanning());
    }

    #[tokio::test]
    async fn quota_is_enforced_before_detection() {
        let mut detector = MockSubscriptionDetector::new();
        detector.expect_detect().never();
        let mut classifier = MockCategoryClassifier::new();
        classifier.expect_classify().never();

        let scanner = orchestrator(detector, classifier);
        let mut session = session();
        session.profile.free_scans_used = 1;
        let mut store = SubscriptionStore::new();

        let result = scanner.scan("email", &mut session, &mut store).await;
        assert!(matches!(result, Err(ScanError::QuotaExceeded { limit: 1 })));
        assert_eq!(session.profile.free_scans_used, 1);
        assert_eq!(scanner.current_progress().percent, 0);
    }

    #[tokio::test]
    async fn unauthenticated_session_is_rejected() {
        let mut detector = MockSubscriptionDetector::new();
        detector.expect_detect().never();
        let scanner = orchestrator(detector, MockCategoryClassifier::new());

        let mut session = session();
        session.logout();
        let mut store = SubscriptionStore::new();

        let result = scanner.scan("email", &mut session, &mut store).await;
        assert!(matches!(
            result,
            Err(ScanError::Session(SessionError::Unauthenticated))
        ));
    }

    #[test]
    fn second_attempt_while_in_flight_is_rejected() {
        let scanner = orchestrator(MockSubscriptionDetector::new(), MockCategoryClassifier::new());

        let guard = scanner.begin().unwrap();
        assert!(scanner.is_scanning());
        assert!(matches!(scanner.begin(), Err(ScanError::ScanInProgress)));

        drop(guard);
        assert!(!scanner.is_scanning());
        assert!(scanner.begin().is_ok());
    }

    #[tokio::test]
    async fn commit_rechecks_quota_spent_while_detecting() {
        let mut detector = MockSubscriptionDetector::new();
        detector
            .expect_detect()
            .returning(|_| Ok(netflix_detection()));
        let mut classifier = MockCategoryClassifier::new();
        classifier.expect_classify().returning(|_, _| {
            Ok(CategoryResult {
                category: "Entertainment".to_string(),
            })
        });

        let scanner = orchestrator(detector, classifier);
        let mut session = session();
        let mut store = SubscriptionStore::new();

        let attempt = scanner.start("Netflix receipt", &session).unwrap();
        let finding = attempt.analyze().await.unwrap();
        assert!(matches!(finding, ScanFinding::Candidate(_)));

        session.profile.free_scans_used = 1;
        let result = attempt.commit(finding, &mut session, &mut store);

        assert!(matches!(result, Err(ScanError::QuotaExceeded { limit: 1 })));
        assert!(store.is_empty());
        assert_eq!(session.profile.free_scans_used, 1);
        assert!(!scanner.is_scanning());
    }

    #[tokio::test]
    async fn commit_after_logout_records_nothing() {
        let mut detector = MockSubscriptionDetector::new();
        detector
            .expect_detect()
            .returning(|_| Ok(netflix_detection()));
        let mut classifier = MockCategoryClassifier::new();
        classifier.expect_classify().returning(|_, _| {
            Ok(CategoryResult {
                category: "Entertainment".to_string(),
            })
        });

        let scanner = orchestrator(detector, classifier);
        let mut session = session();
        let mut store = SubscriptionStore::new();

        let attempt = scanner.start("Netflix receipt", &session).unwrap();
        let finding = attempt.analyze().await.unwrap();
        session.logout();

        let result = attempt.commit(finding, &mut session, &mut store);
        assert!(matches!(
            result,
            Err(ScanError::Session(SessionError::Unauthenticated))
        ));
        assert!(store.is_empty());
        assert_eq!(session.profile.free_scans_used, 0);
    }

    #[test]
    fn state_percentages() {
        assert_eq!(ScanState::Detecting.percent(), 30);
        assert_eq!(ScanState::Categorizing.percent(), 70);
        assert_eq!(ScanState::Recording.percent(), 90);
        assert_eq!(ScanState::CompletedAdded.percent(), 100);
        assert!(ScanState::Rejected.is_terminal());
        assert!(!ScanState::Detecting.is_terminal());
    }
}
