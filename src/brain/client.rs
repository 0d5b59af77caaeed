//! REST client for the brain
//!
//! [`RestClient`] is the transport seam: JSON in, JSON out, with a timeout.
//! [`BrainApi`] knows the brain's endpoints and is what the rest of the
//! crate talks to.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use crate::{Error, Result};

/// JSON-over-HTTP transport
#[async_trait]
pub trait RestClient: Send + Sync {
    /// GET `url` and decode the JSON body
    async fn get_json(&self, url: &str) -> Result<Value>;

    /// POST `body` to `url` and decode the JSON body
    async fn post_json(&self, url: &str, body: &Value) -> Result<Value>;
}

/// `reqwest`-backed [`RestClient`]
#[derive(Debug, Clone)]
pub struct HttpRestClient {
    client: Client,
}

impl HttpRestClient {
    /// Create a client whose requests time out after `timeout`
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client }
    }

    async fn decode(response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(Error::BrainRequest(format!("{status} - {body}")));
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl RestClient for HttpRestClient {
    async fn get_json(&self, url: &str) -> Result<Value> {
        let response = self.client.get(url).send().await?;
        Self::decode(response).await
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<Value> {
        let response = self.client.post(url).json(body).send().await?;
        Self::decode(response).await
    }
}

/// Endpoints of one brain
#[derive(Clone)]
pub struct BrainApi {
    client: Arc<dyn RestClient>,
    base_url: String,
}

impl std::fmt::Debug for BrainApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrainApi")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl BrainApi {
    /// Talk to the brain at `base_url` (e.g. `http://10.0.0.2:3000`)
    #[must_use]
    pub fn new(client: Arc<dyn RestClient>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Base URL of the brain
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Underlying transport
    #[must_use]
    pub fn client(&self) -> Arc<dyn RestClient> {
        self.client.clone()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Announce an adapter server to the brain
    ///
    /// # Errors
    ///
    /// Returns an error if the brain is unreachable or rejects the call
    pub async fn register_adapter(&self, name: &str, adapter_base_url: &str) -> Result<Value> {
        let body = json!({ "name": name, "baseUrl": adapter_base_url });
        self.client
            .post_json(&self.url("/v1/api/registerSdkDeviceAdapter"), &body)
            .await
    }

    /// Withdraw an adapter server from the brain
    ///
    /// # Errors
    ///
    /// Returns an error if the brain is unreachable or rejects the call
    pub async fn unregister_adapter(&self, name: &str) -> Result<Value> {
        let body = json!({ "name": name });
        self.client
            .post_json(&self.url("/v1/api/unregisterSdkDeviceAdapter"), &body)
            .await
    }

    /// Component descriptions of one device, including event keys
    ///
    /// # Errors
    ///
    /// Returns an error if the brain is unreachable or rejects the call
    pub async fn notification_keys(
        &self,
        adapter_name: &str,
        device_id: &str,
        unique_device_id: &str,
    ) -> Result<Value> {
        let url = self.url(&format!(
            "/v1/api/notificationkey/{}/{}/{}",
            urlencoding::encode(adapter_name),
            urlencoding::encode(device_id),
            urlencoding::encode(unique_device_id),
        ));
        self.client.get_json(&url).await
    }

    /// Device ids the brain has subscribed to for one device
    ///
    /// # Errors
    ///
    /// Returns an error if the brain is unreachable or rejects the call
    pub async fn subscriptions(&self, adapter_name: &str, device_id: &str) -> Result<Value> {
        let url = self.url(&format!(
            "/v1/api/subscriptions/{}/{}",
            urlencoding::encode(adapter_name),
            urlencoding::encode(device_id),
        ));
        self.client.get_json(&url).await
    }

    /// Push one notification
    ///
    /// # Errors
    ///
    /// Returns an error if the brain is unreachable or rejects the call
    pub async fn notify(&self, payload: &Value) -> Result<Value> {
        self.client
            .post_json(&self.url("/v1/notifications"), payload)
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Records requests and answers with a canned value
    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(String, Option<Value>)>>,
    }

    #[async_trait]
    impl RestClient for Recorder {
        async fn get_json(&self, url: &str) -> Result<Value> {
            self.calls.lock().unwrap().push((url.to_string(), None));
            Ok(json!([]))
        }

        async fn post_json(&self, url: &str, body: &Value) -> Result<Value> {
            self.calls
                .lock()
                .unwrap()
                .push((url.to_string(), Some(body.clone())));
            Ok(json!({ "success": true }))
        }
    }

    #[tokio::test]
    async fn endpoints_and_bodies() {
        let recorder = Arc::new(Recorder::default());
        let api = BrainApi::new(recorder.clone(), "http://brain:3000/");

        api.register_adapter("apt-1", "http://10.0.0.5:6336")
            .await
            .unwrap();
        api.unregister_adapter("apt-1").await.unwrap();
        api.notification_keys("apt-1", "default", "dev 1")
            .await
            .unwrap();
        api.subscriptions("apt-1", "default").await.unwrap();

        let calls = recorder.calls.lock().unwrap();
        assert_eq!(
            calls[0],
            (
                "http://brain:3000/v1/api/registerSdkDeviceAdapter".to_string(),
                Some(json!({ "name": "apt-1", "baseUrl": "http://10.0.0.5:6336" }))
            )
        );
        assert_eq!(
            calls[1].0,
            "http://brain:3000/v1/api/unregisterSdkDeviceAdapter"
        );
        assert_eq!(
            calls[2].0,
            "http://brain:3000/v1/api/notificationkey/apt-1/default/dev%201"
        );
        assert_eq!(calls[3].0, "http://brain:3000/v1/api/subscriptions/apt-1/default");
    }
}
