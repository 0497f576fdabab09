use crate::contact::{ContactForm, ContactSubmission, SubmissionMetrics, ValidationErrors};
use crate::i18n::{Locale, Messages};
use crate::store::{ContactRecord, ContactStore};
use chrono::Utc;
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// How long a status notice stays visible.
pub const DEFAULT_NOTICE_TTL: Duration = Duration::from_millis(5000);

/// What the visitor is told, independent of what the store did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The store write succeeded
    Accepted,
    /// The store write failed; the visitor still sees a received notice
    AcceptedWithFallbackNotice,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Accepted => "accepted",
            Outcome::AcceptedWithFallbackNotice => "accepted_with_fallback_notice",
        }
    }

    pub fn clears_form(self) -> bool {
        matches!(self, Outcome::Accepted)
    }

    pub fn notice_key(self) -> &'static str {
        match self {
            Outcome::Accepted => "contact.notice.accepted",
            Outcome::AcceptedWithFallbackNotice => "contact.notice.fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown submission outcome '{0}'")]
pub struct UnknownOutcome(pub String);

/// Parses the form returned by `Outcome::as_str`.
impl FromStr for Outcome {
    type Err = UnknownOutcome;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "accepted" => Ok(Outcome::Accepted),
            "accepted_with_fallback_notice" => Ok(Outcome::AcceptedWithFallbackNotice),
            other => Err(UnknownOutcome(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusNotice {
    pub outcome: Outcome,
    pub text: String,
}

#[derive(Debug, Default)]
struct NoticeSlot {
    generation: u64,
    current: Option<StatusNotice>,
}

/// Sends validated submissions to the contact store.
///
/// Store errors never reach the caller. They are logged, counted, and turned
/// into `Outcome::AcceptedWithFallbackNotice`. Each submission replaces the
/// status notice, which clears itself after the notice TTL.
pub struct ContactGateway {
    store: Arc<dyn ContactStore>,
    messages: Arc<Messages>,
    metrics: Arc<SubmissionMetrics>,
    notice: Arc<Mutex<NoticeSlot>>,
    notice_ttl: Duration,
}

impl ContactGateway {
    pub fn new(
        store: Arc<dyn ContactStore>,
        messages: Arc<Messages>,
        metrics: Arc<SubmissionMetrics>,
    ) -> Self {
        Self {
            store,
            messages,
            metrics,
            notice: Arc::new(Mutex::new(NoticeSlot::default())),
            notice_ttl: DEFAULT_NOTICE_TTL,
        }
    }

    pub fn with_notice_ttl(mut self, ttl: Duration) -> Self {
        self.notice_ttl = ttl;
        self
    }

    pub fn notice_ttl(&self) -> Duration {
        self.notice_ttl
    }

    pub fn current_notice(&self) -> Option<StatusNotice> {
        self.notice
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .current
            .clone()
    }

    /// Write `submission` once and classify the result for the visitor.
    pub async fn submit(&self, submission: &ContactSubmission, locale: Locale) -> Outcome {
        let record = ContactRecord::from_submission(submission, Utc::now());
        self.metrics.record_submission();

        let outcome = match self.store.insert(&record).await {
            Ok(()) => {
                self.metrics.record_store_success();
                info!(backend = self.store.backend(), "Contact submission stored");
                Outcome::Accepted
            }
            Err(e) => {
                self.metrics.record_store_failure();
                warn!(
                    backend = self.store.backend(),
                    error = %e,
                    "Contact store write failed, showing fallback notice"
                );
                Outcome::AcceptedWithFallbackNotice
            }
        };

        self.show_notice(outcome, locale);
        outcome
    }

    /// Validate `form`, submit it, and clear it if the store accepted it.
    ///
    /// On a fallback outcome the form keeps its contents.
    pub async fn submit_form(
        &self,
        form: &mut ContactForm,
        locale: Locale,
    ) -> Result<Outcome, ValidationErrors> {
        let submission = match form.validate() {
            Ok(submission) => submission,
            Err(errors) => {
                self.metrics.record_validation_rejection();
                return Err(errors);
            }
        };

        let outcome = self.submit(&submission, locale).await;
        if outcome.clears_form() {
            form.clear();
        }
        Ok(outcome)
    }

    fn show_notice(&self, outcome: Outcome, locale: Locale) {
        let text = self.messages.translate(locale, outcome.notice_key());

        let generation = {
            let mut slot = self.notice.lock().unwrap_or_else(PoisonError::into_inner);
            slot.generation += 1;
            slot.current = Some(StatusNotice { outcome, text });
            slot.generation
        };

        let slot = Arc::clone(&self.notice);
        let deadline = tokio::time::Instant::now() + self.notice_ttl;
        tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let mut slot = slot.lock().unwrap_or_else(PoisonError::into_inner);
            // A newer notice owns its own timer
            if slot.generation == generation {
                slot.current = None;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::LocaleRegistry;
    use crate::store::StoreError;
    use futures::future::BoxFuture;
    use futures::FutureExt;

    struct RecordingStore {
        records: Mutex<Vec<ContactRecord>>,
        fail: bool,
    }

    impl RecordingStore {
        fn ok() -> Arc<Self> {
            Arc::new(Self {
                records: Mutex::new(Vec::new()),
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                records: Mutex::new(Vec::new()),
                fail: true,
            })
        }
    }

    impl ContactStore for RecordingStore {
        fn backend(&self) -> &'static str {
            "recording"
        }

        fn insert<'a>(&'a self, record: &'a ContactRecord) -> BoxFuture<'a, Result<(), StoreError>> {
            async move {
                self.records.lock().unwrap().push(record.clone());
                if self.fail {
                    Err(StoreError::Rejected {
                        status: 500,
                        body: "boom".to_string(),
                    })
                } else {
                    Ok(())
                }
            }
            .boxed()
        }
    }

    fn gateway(store: Arc<RecordingStore>) -> (ContactGateway, Arc<SubmissionMetrics>) {
        let registry = LocaleRegistry::standard();
        let messages = Arc::new(Messages::embedded(&registry).unwrap());
        let metrics = Arc::new(SubmissionMetrics::new());
        (
            ContactGateway::new(store, messages, Arc::clone(&metrics)),
            metrics,
        )
    }

    fn form() -> ContactForm {
        ContactForm {
            name: "A".to_string(),
            email: "a@b.com".to_string(),
            company: String::new(),
            message: "hi".to_string(),
        }
    }

    fn ja() -> Locale {
        LocaleRegistry::standard().resolve("ja")
    }

    // ==================== Outcome Tests ====================

    #[tokio::test]
    async fn test_store_success_is_accepted_and_clears_form() {
        let store = RecordingStore::ok();
        let (gateway, metrics) = gateway(Arc::clone(&store));
        let mut form = form();

        let outcome = gateway.submit_form(&mut form, ja()).await.unwrap();

        assert_eq!(outcome, Outcome::Accepted);
        assert!(form.is_empty());
        assert_eq!(metrics.store_successes(), 1);

        let records = store.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].email, "a@b.com");
        assert_eq!(records[0].company, None);
    }

    #[tokio::test]
    async fn test_store_failure_is_fallback_and_keeps_form() {
        let (gateway, metrics) = gateway(RecordingStore::failing());
        let mut form = form();

        let outcome = gateway.submit_form(&mut form, ja()).await.unwrap();

        assert_eq!(outcome, Outcome::AcceptedWithFallbackNotice);
        assert_eq!(form.name, "A");
        assert_eq!(metrics.store_failures(), 1);
        assert_eq!(metrics.submissions(), 1);
    }

    #[tokio::test]
    async fn test_invalid_form_never_reaches_store() {
        let store = RecordingStore::ok();
        let (gateway, metrics) = gateway(Arc::clone(&store));
        let mut form = ContactForm::default();

        assert!(gateway.submit_form(&mut form, ja()).await.is_err());
        assert!(store.records.lock().unwrap().is_empty());
        assert_eq!(metrics.validation_rejections(), 1);
        assert_eq!(metrics.submissions(), 0);
        assert!(gateway.current_notice().is_none());
    }

    #[test]
    fn test_outcome_strings_roundtrip() {
        for outcome in [Outcome::Accepted, Outcome::AcceptedWithFallbackNotice] {
            assert_eq!(outcome.as_str().parse::<Outcome>(), Ok(outcome));
        }
        assert_eq!(
            "nope".parse::<Outcome>(),
            Err(UnknownOutcome("nope".to_string()))
        );
        assert!(Outcome::Accepted.clears_form());
        assert!(!Outcome::AcceptedWithFallbackNotice.clears_form());
    }

    // ==================== Notice Tests ====================

    #[tokio::test(start_paused = true)]
    async fn test_fallback_notice_clears_after_five_seconds() {
        let (gateway, _) = gateway(RecordingStore::failing());
        let submission = form().validate().unwrap();

        gateway.submit(&submission, ja()).await;

        let notice = gateway.current_notice().expect("notice shown");
        assert_eq!(notice.outcome, Outcome::AcceptedWithFallbackNotice);
        assert_eq!(
            notice.text,
            "お問い合わせを受け付けました。（メール送信機能は開発中です）"
        );

        tokio::time::advance(Duration::from_millis(4_990)).await;
        tokio::task::yield_now().await;
        assert!(gateway.current_notice().is_some());

        tokio::time::advance(Duration::from_millis(20)).await;
        tokio::task::yield_now().await;
        assert!(gateway.current_notice().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_notice_not_cleared_by_older_timer() {
        let (gateway, _) = gateway(RecordingStore::ok());
        let submission = form().validate().unwrap();
        let en = LocaleRegistry::standard().resolve("en");

        gateway.submit(&submission, ja()).await;
        tokio::time::advance(Duration::from_millis(3_000)).await;
        gateway.submit(&submission, en).await;

        // First timer fires here; the second notice must survive it
        tokio::time::advance(Duration::from_millis(2_500)).await;
        tokio::task::yield_now().await;
        let notice = gateway.current_notice().expect("second notice still shown");
        assert_eq!(notice.text, "Your inquiry has been received. Thank you!");

        tokio::time::advance(Duration::from_millis(3_000)).await;
        tokio::task::yield_now().await;
        assert!(gateway.current_notice().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_notice_ttl() {
        let (gateway, _) = gateway(RecordingStore::ok());
        let gateway = gateway.with_notice_ttl(Duration::from_millis(100));
        assert_eq!(gateway.notice_ttl(), Duration::from_millis(100));

        gateway.submit(&form().validate().unwrap(), ja()).await;
        tokio::time::advance(Duration::from_millis(150)).await;
        tokio::task::yield_now().await;
        assert!(gateway.current_notice().is_none());
    }
}
