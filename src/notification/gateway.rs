//! Outbound notification pipeline
//!
//! Pushes are bounded by an in-flight limit, de-duplicated against the last
//! value sent per key, and never retried. A failed push resolves to
//! [`SendOutcome::Failed`] so one bad push cannot block later ones.

use serde_json::Value;
use tokio::sync::{Mutex, Semaphore};

use super::cache::SensorValueCache;
use super::keys::NotificationKeyResolver;
use super::message::{NotificationMessage, NotificationPayload};
use crate::brain::BrainApi;
use crate::config::NotificationConfig;
use crate::{Error, Result};

/// Result of pushing one payload
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// Brain accepted the push
    Sent(Value),
    /// Same value was already sent for this key
    Duplicate,
    /// Push failed; the error was logged
    Failed(String),
}

/// Sends notifications for one adapter
#[derive(Debug)]
pub struct NotificationGateway {
    api: BrainApi,
    resolver: NotificationKeyResolver,
    in_flight: Semaphore,
    max_queue_size: usize,
    cache: Mutex<SensorValueCache>,
}

impl NotificationGateway {
    #[must_use]
    pub fn new(api: BrainApi, resolver: NotificationKeyResolver, config: &NotificationConfig) -> Self {
        Self {
            api,
            resolver,
            in_flight: Semaphore::new(config.max_queue_size),
            max_queue_size: config.max_queue_size,
            cache: Mutex::new(SensorValueCache::new(config.max_cached_values)),
        }
    }

    /// Adapter this gateway sends for
    #[must_use]
    pub fn adapter_name(&self) -> &str {
        self.resolver.adapter_name()
    }

    /// Number of pushes currently in flight
    #[must_use]
    pub fn queue_size(&self) -> usize {
        self.max_queue_size - self.in_flight.available_permits()
    }

    /// Send one message
    ///
    /// Raw messages are forwarded as-is. Mapped messages fan out into one
    /// push per resolved event key.
    ///
    /// # Errors
    ///
    /// Returns `INVALID_NOTIFICATION_DATA` for malformed messages, a key
    /// resolution error, or `MAX_QUEUESIZE_REACHED` when the in-flight
    /// limit rejects every push. A fan-out that delivered some keys
    /// resolves instead, with the rejected keys reported as `Failed`.
    pub async fn send(&self, message: NotificationMessage) -> Result<Vec<SendOutcome>> {
        if message.raw {
            let payload = message.raw_payload()?;
            return Ok(vec![self.push(payload).await?]);
        }

        let target = message.target()?;
        let keys = self
            .resolver
            .get_notification_keys(target.unique_device_id, target.device_id, target.component)
            .await?;

        let pushes = keys.iter().map(|key| self.push_unique(target.payload(key)));
        let mut results = futures::future::join_all(pushes).await;

        // The batch only rejects when no key got through; otherwise per-key
        // errors are reported as `Failed` next to the delivered outcomes
        if results.iter().all(Result::is_err) {
            if let Some(Err(e)) = results.pop() {
                return Err(e);
            }
            return Ok(Vec::new());
        }
        Ok(results
            .into_iter()
            .map(|result| result.unwrap_or_else(|e| SendOutcome::Failed(e.to_string())))
            .collect())
    }

    async fn push_unique(&self, payload: NotificationPayload) -> Result<SendOutcome> {
        let key = payload.cache_key().to_string();
        let duplicate = self.cache.lock().await.is_duplicate(&key, &payload.data);
        if duplicate {
            tracing::debug!(key = %key, "skipping duplicate notification");
            return Ok(SendOutcome::Duplicate);
        }

        let data = payload.data.clone();
        let outcome = self.push(payload).await?;
        if matches!(outcome, SendOutcome::Sent(_)) {
            self.cache.lock().await.insert(key, data);
        }
        Ok(outcome)
    }

    async fn push(&self, payload: NotificationPayload) -> Result<SendOutcome> {
        let Ok(_permit) = self.in_flight.try_acquire() else {
            tracing::warn!(
                adapter = self.adapter_name(),
                max = self.max_queue_size,
                "notification queue full"
            );
            return Err(Error::MaxQueueSizeReached);
        };

        let body = serde_json::to_value(&payload)?;
        match self.api.notify(&body).await {
            Ok(response) => Ok(SendOutcome::Sent(response)),
            Err(e) => {
                tracing::warn!(
                    adapter = self.adapter_name(),
                    kind = %payload.kind,
                    error = %e,
                    "notification failed"
                );
                Ok(SendOutcome::Failed(e.to_string()))
            }
        }
    }
}
