//! Channel sender capability seam
//!
//! One implementation per delivery mechanism. Email and chat senders live
//! with the platform's integration layer; the in-app sender is in-process
//! and backs the dashboard notification feed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::error::DeliveryError;
use crate::models::alert::Channel;

/// A notification delivery mechanism
#[async_trait]
pub trait ChannelSender: Send + Sync {
    /// Which channel this sender implements
    fn channel(&self) -> Channel;

    /// Deliver one notification to a target. Target resolution (user id,
    /// address, or room) is the implementation's concern.
    async fn send(&self, target: &str, title: &str, body: &str) -> Result<(), DeliveryError>;
}

/// An in-app notification as shown in the dashboard feed
#[derive(Debug, Clone, PartialEq)]
pub struct InAppNotification {
    pub title: String,
    pub body: String,
    pub received_at: DateTime<Utc>,
}

/// In-process sender backing the in-app notification feed
#[derive(Default)]
pub struct InAppSender {
    inbox: DashMap<String, Vec<InAppNotification>>,
}

impl InAppSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications delivered to a target so far
    pub fn notifications_for(&self, target: &str) -> Vec<InAppNotification> {
        self.inbox
            .get(target)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChannelSender for InAppSender {
    fn channel(&self) -> Channel {
        Channel::InApp
    }

    async fn send(&self, target: &str, title: &str, body: &str) -> Result<(), DeliveryError> {
        self.inbox
            .entry(target.to_string())
            .or_default()
            .push(InAppNotification {
                title: title.to_string(),
                body: body.to_string(),
                received_at: Utc::now(),
            });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_app_sender_appends_to_inbox() {
        let sender = InAppSender::new();

        sender.send("u1", "first", "body").await.unwrap();
        sender.send("u1", "second", "body").await.unwrap();

        let inbox = sender.notifications_for("u1");
        assert_eq!(inbox.len(), 2);
        assert_eq!(inbox[0].title, "first");
        assert!(sender.notifications_for("u2").is_empty());
    }
}
