//! Alert dispatch with best-effort channel fan-out
//!
//! Per-alert state machine: pending -> sent or pending -> failed, both
//! terminal. Channel delivery is the pipeline's only point of concurrency:
//! enabled channels run as independent tasks awaited jointly, each failure
//! isolated and recorded, never fatal to the other channels.

use std::sync::Arc;
use tokio::task::JoinSet;

pub mod channels;

pub use channels::{ChannelSender, InAppNotification, InAppSender};

use crate::error::{CoreError, DeliveryError};
use crate::event::{DataEvent, EventBus};
use crate::models::alert::{Alert, AlertConfig, AlertStatus, Channel};
use crate::store::AlertStore;

/// One channel attempt's result
#[derive(Debug, Clone)]
pub struct ChannelAttempt {
    pub channel: Channel,
    pub result: Result<(), DeliveryError>,
}

/// Per-channel outcomes of one dispatch
///
/// The explicit record of the best-effort contract: logging a failure is
/// not the ledger, this is.
#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    pub attempts: Vec<ChannelAttempt>,
}

impl DispatchReport {
    pub fn succeeded(&self) -> usize {
        self.attempts.iter().filter(|a| a.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.attempts.len() - self.succeeded()
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    /// Failures only, for inspection
    pub fn failures(&self) -> impl Iterator<Item = &DeliveryError> {
        self.attempts
            .iter()
            .filter_map(|a| a.result.as_ref().err())
    }
}

/// Result of a dispatch call
#[derive(Debug, Clone)]
pub enum DispatchOutcome {
    /// Severity not subscribed: no channel was contacted and the alert
    /// status did not change
    Suppressed,
    /// Fan-out ran; the alert reached `sent` regardless of individual
    /// channel failures
    Delivered(DispatchReport),
}

/// Fans one alert out to a user's enabled channels
pub struct AlertDispatcher {
    senders: Vec<Arc<dyn ChannelSender>>,
    events: EventBus,
}

impl AlertDispatcher {
    pub fn new(senders: Vec<Arc<dyn ChannelSender>>) -> Self {
        Self {
            senders,
            events: EventBus::default_capacity(),
        }
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    /// Dispatch one pending alert
    ///
    /// 1. A malformed alert flips to `failed` (best-effort write) and
    ///    surfaces `Validation`.
    /// 2. A severity the user has not subscribed to is a no-op:
    ///    `Suppressed`, no channel calls, no status change.
    /// 3. Otherwise every enabled channel is attempted concurrently; each
    ///    failure is logged and recorded, none aborts the rest.
    /// 4. After all attempts the alert is persisted `sent`. Only a failure
    ///    persisting that final status flips it to `failed` and propagates.
    pub async fn dispatch(
        &self,
        alert: &mut Alert,
        config: &AlertConfig,
        store: &dyn AlertStore,
    ) -> Result<DispatchOutcome, CoreError> {
        if let Err(validation) = validate(alert) {
            // Terminal statuses are one-way: only a pending alert flips
            if alert.status == AlertStatus::Pending {
                let _ = store.update_alert_status(alert.id, AlertStatus::Failed).await;
                alert.status = AlertStatus::Failed;
            }
            return Err(validation);
        }

        if !config.notify_on.for_severity(alert.severity) {
            tracing::debug!(
                alert_id = %alert.id,
                severity = %alert.severity,
                "severity not subscribed, suppressing dispatch"
            );
            return Ok(DispatchOutcome::Suppressed);
        }

        let mut tasks: JoinSet<ChannelAttempt> = JoinSet::new();
        for sender in &self.senders {
            let channel = sender.channel();
            if !config.channels.is_enabled(channel) {
                continue;
            }

            let sender = Arc::clone(sender);
            let target = alert.user_id.clone();
            let title = alert.title.clone();
            let body = alert.message.clone();
            tasks.spawn(async move {
                ChannelAttempt {
                    channel,
                    result: sender.send(&target, &title, &body).await,
                }
            });
        }

        let mut report = DispatchReport::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(attempt) => {
                    if let Err(err) = &attempt.result {
                        tracing::warn!(
                            alert_id = %alert.id,
                            channel = %attempt.channel,
                            error = %err,
                            "channel delivery failed, continuing"
                        );
                    }
                    report.attempts.push(attempt);
                }
                Err(join_err) => {
                    // A panicked sender is still just one channel down
                    tracing::warn!(alert_id = %alert.id, error = %join_err, "sender task panicked");
                }
            }
        }

        if let Err(persist_err) = store.update_alert_status(alert.id, AlertStatus::Sent).await {
            let _ = store.update_alert_status(alert.id, AlertStatus::Failed).await;
            alert.status = AlertStatus::Failed;
            return Err(persist_err);
        }
        alert.status = AlertStatus::Sent;

        self.events.publish(DataEvent::AlertDispatched(alert.id));

        Ok(DispatchOutcome::Delivered(report))
    }
}

fn validate(alert: &Alert) -> Result<(), CoreError> {
    if alert.user_id.trim().is_empty() {
        return Err(CoreError::validation("alert has no user id"));
    }
    if alert.title.trim().is_empty() {
        return Err(CoreError::validation("alert has no title"));
    }
    if alert.status.is_terminal() {
        return Err(CoreError::validation(format!(
            "alert {} already reached terminal status",
            alert.id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    use crate::models::anomaly::AnomalySeverity;
    use crate::store::MemoryStore;

    /// Sender that counts calls and optionally fails every one
    struct StubSender {
        channel: Channel,
        calls: AtomicUsize,
        fail: bool,
    }

    impl StubSender {
        fn ok(channel: Channel) -> Arc<Self> {
            Arc::new(Self {
                channel,
                calls: AtomicUsize::new(0),
                fail: false,
            })
        }

        fn failing(channel: Channel) -> Arc<Self> {
            Arc::new(Self {
                channel,
                calls: AtomicUsize::new(0),
                fail: true,
            })
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ChannelSender for StubSender {
        fn channel(&self) -> Channel {
            self.channel
        }

        async fn send(&self, _: &str, _: &str, _: &str) -> Result<(), DeliveryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(DeliveryError::new(self.channel, "stub failure"))
            } else {
                Ok(())
            }
        }
    }

    fn alert(severity: AnomalySeverity) -> Alert {
        Alert {
            id: Uuid::new_v4(),
            user_id: "u1".to_string(),
            kind: crate::models::alert::AlertKind::CostAnomaly,
            severity,
            title: "cost anomaly".to_string(),
            message: "spend doubled".to_string(),
            metadata: HashMap::new(),
            status: AlertStatus::Pending,
            created_at: Utc::now(),
        }
    }

    fn all_channels_config() -> AlertConfig {
        let mut config = AlertConfig::default();
        config.channels.chat = true;
        config
    }

    #[tokio::test]
    async fn test_dispatch_reaches_sent_across_all_channels() {
        let email = StubSender::ok(Channel::Email);
        let chat = StubSender::ok(Channel::Chat);
        let in_app = StubSender::ok(Channel::InApp);
        let dispatcher = AlertDispatcher::new(vec![
            email.clone(),
            chat.clone(),
            in_app.clone(),
        ]);
        let store = MemoryStore::new();
        let mut alert = alert(AnomalySeverity::Critical);

        let outcome = dispatcher
            .dispatch(&mut alert, &all_channels_config(), &store)
            .await
            .unwrap();

        assert_eq!(alert.status, AlertStatus::Sent);
        assert_eq!(store.alert_status(alert.id), Some(AlertStatus::Sent));
        assert_eq!(email.call_count(), 1);
        assert_eq!(chat.call_count(), 1);
        assert_eq!(in_app.call_count(), 1);

        let DispatchOutcome::Delivered(report) = outcome else {
            panic!("expected delivery");
        };
        assert_eq!(report.succeeded(), 3);
        assert!(!report.has_failures());
    }

    #[tokio::test]
    async fn test_one_failing_channel_does_not_block_the_rest() {
        let email = StubSender::ok(Channel::Email);
        let chat = StubSender::failing(Channel::Chat);
        let in_app = StubSender::ok(Channel::InApp);
        let dispatcher = AlertDispatcher::new(vec![
            email.clone(),
            chat.clone(),
            in_app.clone(),
        ]);
        let store = MemoryStore::new();
        let mut alert = alert(AnomalySeverity::Critical);

        let outcome = dispatcher
            .dispatch(&mut alert, &all_channels_config(), &store)
            .await
            .unwrap();

        // the failing chat send must not stop email or in-app
        assert_eq!(email.call_count(), 1);
        assert_eq!(in_app.call_count(), 1);
        assert_eq!(alert.status, AlertStatus::Sent);

        let DispatchOutcome::Delivered(report) = outcome else {
            panic!("expected delivery");
        };
        assert_eq!(report.failed(), 1);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failures().next().unwrap().channel, Channel::Chat);
    }

    #[tokio::test]
    async fn test_unsubscribed_severity_is_suppressed_noop() {
        let email = StubSender::ok(Channel::Email);
        let dispatcher = AlertDispatcher::new(vec![email.clone()]);
        let store = MemoryStore::new();

        let mut config = all_channels_config();
        config.notify_on.critical = false;

        let mut alert = alert(AnomalySeverity::Critical);
        let outcome = dispatcher
            .dispatch(&mut alert, &config, &store)
            .await
            .unwrap();

        assert!(matches!(outcome, DispatchOutcome::Suppressed));
        assert_eq!(email.call_count(), 0);
        assert_eq!(alert.status, AlertStatus::Pending);
        assert_eq!(store.alert_status(alert.id), None);
    }

    #[tokio::test]
    async fn test_disabled_channel_not_contacted() {
        let email = StubSender::ok(Channel::Email);
        let chat = StubSender::ok(Channel::Chat);
        let dispatcher = AlertDispatcher::new(vec![email.clone(), chat.clone()]);
        let store = MemoryStore::new();

        // default config: chat disabled
        let mut alert = alert(AnomalySeverity::High);
        dispatcher
            .dispatch(&mut alert, &AlertConfig::default(), &store)
            .await
            .unwrap();

        assert_eq!(email.call_count(), 1);
        assert_eq!(chat.call_count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_alert_fails_before_fanout() {
        let email = StubSender::ok(Channel::Email);
        let dispatcher = AlertDispatcher::new(vec![email.clone()]);
        let store = MemoryStore::new();

        let mut alert = alert(AnomalySeverity::Critical);
        alert.user_id = String::new();

        let result = dispatcher
            .dispatch(&mut alert, &all_channels_config(), &store)
            .await;

        assert!(matches!(result, Err(CoreError::Validation { .. })));
        assert_eq!(email.call_count(), 0);
        assert_eq!(alert.status, AlertStatus::Failed);
        assert_eq!(store.alert_status(alert.id), Some(AlertStatus::Failed));
    }

    #[tokio::test]
    async fn test_terminal_alert_not_redispatched() {
        let email = StubSender::ok(Channel::Email);
        let dispatcher = AlertDispatcher::new(vec![email.clone()]);
        let store = MemoryStore::new();

        let mut alert = alert(AnomalySeverity::Critical);
        alert.status = AlertStatus::Sent;

        let result = dispatcher
            .dispatch(&mut alert, &all_channels_config(), &store)
            .await;

        assert!(matches!(result, Err(CoreError::Validation { .. })));
        assert_eq!(email.call_count(), 0);
        // a terminal status never changes
        assert_eq!(alert.status, AlertStatus::Sent);
        assert_eq!(store.alert_status(alert.id), None);
    }
}
