//! Brain session lifecycle
//!
//! A session owns everything that lives while adapters are served: the
//! device database, the HTTP server and one notification gateway per
//! adapter. Nothing is global, so several sessions can run side by side.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::client::{BrainApi, HttpRestClient, RestClient};
use super::discovery::DiscoveryEngine;
use super::mdns::MdnsBrowser;
use crate::api::{ApiServer, ApiState};
use crate::config::Config;
use crate::database::DeviceDatabase;
use crate::device::{DeviceAdapter, DeviceBuilder};
use crate::notification::{
    DEFAULT_DEVICE_ID, NotificationGateway, NotificationHandle, NotificationKeyResolver,
    RetryPolicy, fetch_subscriptions,
};
use crate::{Error, Result};

/// Running adapter server registered with a brain
pub struct BrainSession {
    name: String,
    brain: BrainApi,
    base_url: String,
    local_addr: SocketAddr,
    database: Arc<DeviceDatabase>,
    handles: HashMap<String, NotificationHandle>,
    shutdown: oneshot::Sender<()>,
    server: JoinHandle<Result<()>>,
}

impl std::fmt::Debug for BrainSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrainSession")
            .field("name", &self.name)
            .field("brain", &self.brain)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl BrainSession {
    /// Build `devices`, serve them and register with a brain
    ///
    /// When `brain` is `None` the brain comes from the configured host or,
    /// failing that, from mDNS discovery.
    ///
    /// # Errors
    ///
    /// Returns a build error of any device, a discovery failure, a bind
    /// failure or the brain's refusal to register the adapter server
    pub async fn start(
        config: &Config,
        name: &str,
        devices: Vec<DeviceBuilder>,
        brain: Option<BrainApi>,
    ) -> Result<Self> {
        let adapters = devices
            .into_iter()
            .map(DeviceBuilder::build)
            .collect::<Result<Vec<DeviceAdapter>>>()?;

        let brain = match brain {
            Some(brain) => brain,
            None => locate_brain(config).await?,
        };

        let database = Arc::new(DeviceDatabase::new(adapters));
        let state = Arc::new(ApiState::new(database.clone(), name));
        let server = ApiServer::bind(state, config.server.port).await?;
        let local_addr = server.local_addr()?;
        let (shutdown, shutdown_rx) = oneshot::channel();
        let server = server.spawn(shutdown_rx);

        let base_url = config
            .server
            .base_url
            .clone()
            .unwrap_or_else(|| format!("http://{}:{}", local_ip(), local_addr.port()));

        if let Err(e) = brain.register_adapter(name, &base_url).await {
            tracing::error!(name, brain = brain.base_url(), error = %e, "adapter registration failed");
            let _ = shutdown.send(());
            let _ = server.await;
            return Err(e);
        }
        tracing::info!(name, brain = brain.base_url(), base_url = %base_url, "adapter server registered");

        let mut handles = HashMap::new();
        for adapter in database.adapters() {
            let handle = notification_handle(config, &brain, &adapter.adapter_name);
            initialize_device_list(&brain, adapter).await;
            adapter.notify_subscription(handle.clone());
            handles.insert(adapter.adapter_name.clone(), handle);
        }

        Ok(Self {
            name: name.to_string(),
            brain,
            base_url,
            local_addr,
            database,
            handles,
            shutdown,
            server,
        })
    }

    /// Name the adapter server registered under
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Base URL announced to the brain
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Address the adapter server is bound to
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Brain this session is registered with
    #[must_use]
    pub const fn brain(&self) -> &BrainApi {
        &self.brain
    }

    #[must_use]
    pub fn database(&self) -> &DeviceDatabase {
        &self.database
    }

    /// Notification handle of one adapter
    #[must_use]
    pub fn handle(&self, adapter_name: &str) -> Option<&NotificationHandle> {
        self.handles.get(adapter_name)
    }

    /// Unregister from the brain and stop the adapter server
    ///
    /// A failed unregister is logged; the server is stopped regardless.
    ///
    /// # Errors
    ///
    /// Returns error if the server task failed
    pub async fn stop(self) -> Result<()> {
        if let Err(e) = self.brain.unregister_adapter(&self.name).await {
            tracing::warn!(name = %self.name, error = %e, "adapter unregistration failed");
        }

        let _ = self.shutdown.send(());
        self.server
            .await
            .map_err(|e| Error::Config(format!("adapter server task failed: {e}")))??;

        tracing::info!(name = %self.name, "adapter server stopped");
        Ok(())
    }
}

/// Brain from the configured host, or the first one discovery finds
async fn locate_brain(config: &Config) -> Result<BrainApi> {
    let client: Arc<dyn RestClient> = Arc::new(HttpRestClient::new(config.brain.request_timeout));

    if let Some(host) = &config.brain.host {
        return Ok(BrainApi::new(
            client,
            format!("http://{host}:{}", config.brain.port),
        ));
    }

    let engine = DiscoveryEngine::new(
        Arc::new(MdnsBrowser),
        client.clone(),
        &config.discovery.version_satisfaction,
    )?;
    let record = engine
        .find_first_brain(
            config.discovery.interface.as_deref(),
            config.discovery.lookup_duration,
        )
        .await?;

    let url = record.http_url().ok_or_else(|| {
        Error::InvalidServerResponse(format!("brain {} advertised no address", record.name))
    })?;
    Ok(BrainApi::new(client, url))
}

fn notification_handle(config: &Config, brain: &BrainApi, adapter_name: &str) -> NotificationHandle {
    let resolver = NotificationKeyResolver::new(adapter_name, brain.clone());
    let gateway = NotificationGateway::new(brain.clone(), resolver, &config.notifications);
    NotificationHandle::new(Arc::new(gateway))
}

async fn initialize_device_list(brain: &BrainApi, adapter: &DeviceAdapter) {
    let Some(initialize) = adapter
        .subscription_controller()
        .and_then(|c| c.initialize_device_list)
    else {
        return;
    };

    let ids = match fetch_subscriptions(
        brain,
        &adapter.adapter_name,
        DEFAULT_DEVICE_ID,
        RetryPolicy::default(),
    )
    .await
    {
        Ok(ids) => ids,
        Err(e) => {
            tracing::warn!(adapter = %adapter.adapter_name, error = %e, "could not fetch subscriptions");
            return;
        }
    };

    if let Err(e) = initialize(ids).await {
        tracing::warn!(adapter = %adapter.adapter_name, error = %e, "initializeDeviceList failed");
    }
}

fn local_ip() -> IpAddr {
    local_ip_address::local_ip().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not detect local IP, announcing loopback");
        IpAddr::V4(Ipv4Addr::LOCALHOST)
    })
}
