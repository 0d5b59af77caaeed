//! Subscription list fetch with fixed-delay retry

use std::time::Duration;

use serde_json::Value;

use crate::brain::BrainApi;
use crate::{Error, Result};

/// Retry policy for pull-style calls to the brain
///
/// Only the subscription fetch retries; pushes fail fast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one
    pub max_retries: u32,
    /// Pause between attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            delay: Duration::from_millis(2_500),
        }
    }
}

/// Device ids the brain subscribed to for one adapter device
///
/// # Errors
///
/// Returns the last failure once all retries are used up, or
/// `INVALID_SERVER_RESPONSE` when the brain answers with something other
/// than a list of strings
pub async fn fetch_subscriptions(
    api: &BrainApi,
    adapter_name: &str,
    device_id: &str,
    policy: RetryPolicy,
) -> Result<Vec<String>> {
    let mut attempt = 0;
    loop {
        let result = api
            .subscriptions(adapter_name, device_id)
            .await
            .and_then(parse_subscriptions);

        match result {
            Ok(ids) => return Ok(ids),
            Err(e) if attempt < policy.max_retries => {
                attempt += 1;
                tracing::warn!(
                    adapter = adapter_name,
                    attempt,
                    error = %e,
                    "subscription fetch failed, retrying"
                );
                tokio::time::sleep(policy.delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

fn parse_subscriptions(response: Value) -> Result<Vec<String>> {
    let Value::Array(items) = response else {
        return Err(Error::InvalidServerResponse(format!(
            "expected subscription list, got {response}"
        )));
    };

    items
        .into_iter()
        .map(|item| match item {
            Value::String(id) => Ok(id),
            other => Err(Error::InvalidServerResponse(format!(
                "subscription entry is not a string: {other}"
            ))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::brain::RestClient;

    /// Fails a fixed number of GETs before answering
    struct Flaky {
        failures: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl RestClient for Flaky {
        async fn get_json(&self, _url: &str) -> Result<Value> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(Error::BrainRequest("503 Service Unavailable - ".into()));
            }
            Ok(json!(["d1", "d2"]))
        }

        async fn post_json(&self, _url: &str, _body: &Value) -> Result<Value> {
            Ok(Value::Null)
        }
    }

    fn api(failures: u32) -> (BrainApi, Arc<Flaky>) {
        let client = Arc::new(Flaky {
            failures,
            calls: AtomicU32::new(0),
        });
        (BrainApi::new(client.clone(), "http://brain:3000"), client)
    }

    #[tokio::test(start_paused = true)]
    async fn retries_twice_with_fixed_delay() {
        let (api, client) = api(2);
        let started = tokio::time::Instant::now();

        let ids = fetch_subscriptions(&api, "apt-1", "default", RetryPolicy::default())
            .await
            .unwrap();

        assert_eq!(ids, vec!["d1", "d2"]);
        assert_eq!(client.calls.load(Ordering::SeqCst), 3);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(5_000));
        assert!(elapsed < Duration::from_millis(7_500));
    }

    #[tokio::test(start_paused = true)]
    async fn surfaces_failure_after_retries() {
        let (api, client) = api(5);

        let err = fetch_subscriptions(&api, "apt-1", "default", RetryPolicy::default())
            .await
            .unwrap_err();

        assert_eq!(err.code(), "BRAIN_REQUEST_FAILED");
        assert_eq!(client.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn rejects_non_string_entries() {
        assert!(parse_subscriptions(json!(["a", 1])).is_err());
        assert!(parse_subscriptions(json!({})).is_err());
        assert_eq!(parse_subscriptions(json!([])).unwrap(), Vec::<String>::new());
    }
}
