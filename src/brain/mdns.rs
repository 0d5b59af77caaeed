//! mDNS browsing for brains
//!
//! Brains advertise themselves as `_neeo._tcp.local.`. Each resolved
//! advertisement becomes a [`ServiceRecord`]; the stream ends when the
//! daemon goes away.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use futures::stream::{self, BoxStream, StreamExt};
use mdns_sd::{IfKind, ServiceDaemon, ServiceEvent, ServiceInfo};
use serde::Serialize;

use crate::{Error, Result};

/// mDNS service type advertised by brains
pub const SERVICE_TYPE: &str = "_neeo._tcp.local.";

/// One resolved brain advertisement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceRecord {
    /// Full service instance name
    pub name: String,
    /// Reachable addresses, IPv4 first
    pub addresses: Vec<IpAddr>,
    pub port: u16,
    /// TXT properties
    pub txt: HashMap<String, String>,
}

impl ServiceRecord {
    /// Socket address of the first advertised address
    #[must_use]
    pub fn socket_addr(&self) -> Option<SocketAddr> {
        self.addresses
            .first()
            .map(|&ip| SocketAddr::new(ip, self.port))
    }

    /// HTTP base URL of the first advertised address
    #[must_use]
    pub fn http_url(&self) -> Option<String> {
        self.socket_addr().map(|addr| format!("http://{addr}"))
    }
}

impl From<&ServiceInfo> for ServiceRecord {
    fn from(info: &ServiceInfo) -> Self {
        let mut addresses: Vec<IpAddr> = info.get_addresses().iter().copied().collect();
        addresses.sort_by_key(|ip| (ip.is_ipv6(), *ip));

        let txt = info
            .get_properties()
            .iter()
            .map(|p| (p.key().to_string(), p.val_str().to_string()))
            .collect();

        Self {
            name: info.get_fullname().to_string(),
            addresses,
            port: info.get_port(),
            txt,
        }
    }
}

/// Source of brain advertisements
pub trait ServiceBrowser: Send + Sync {
    /// Start browsing, optionally restricted to one network interface
    ///
    /// # Errors
    ///
    /// Returns an error if browsing cannot be started
    fn browse(&self, interface: Option<&str>) -> Result<BoxStream<'static, ServiceRecord>>;
}

/// [`ServiceBrowser`] backed by an `mdns-sd` daemon
///
/// Every call to [`ServiceBrowser::browse`] starts its own daemon, which is
/// shut down when the returned stream is dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct MdnsBrowser;

/// Shuts the daemon down once browsing stops
struct DaemonGuard {
    daemon: ServiceDaemon,
}

impl Drop for DaemonGuard {
    fn drop(&mut self) {
        let _ = self.daemon.stop_browse(SERVICE_TYPE);
        if let Err(e) = self.daemon.shutdown() {
            tracing::debug!(error = %e, "mDNS daemon shutdown failed");
        }
    }
}

impl ServiceBrowser for MdnsBrowser {
    fn browse(&self, interface: Option<&str>) -> Result<BoxStream<'static, ServiceRecord>> {
        let daemon = ServiceDaemon::new()
            .map_err(|e| Error::Mdns(format!("failed to create mDNS daemon: {e}")))?;

        if let Some(name) = interface {
            daemon
                .disable_interface(IfKind::All)
                .and_then(|()| daemon.enable_interface(IfKind::Name(name.to_string())))
                .map_err(|e| Error::Mdns(format!("failed to select interface {name}: {e}")))?;
        }

        let receiver = daemon
            .browse(SERVICE_TYPE)
            .map_err(|e| Error::Mdns(format!("failed to browse {SERVICE_TYPE}: {e}")))?;

        tracing::info!(
            service_type = SERVICE_TYPE,
            interface = interface.unwrap_or("all"),
            "browsing for brains"
        );

        let guard = DaemonGuard { daemon };
        let records = stream::unfold((guard, receiver), |(guard, receiver)| async move {
            loop {
                match receiver.recv_async().await {
                    Ok(ServiceEvent::ServiceResolved(info)) => {
                        let record = ServiceRecord::from(&info);
                        tracing::debug!(service = %record.name, "brain advertisement resolved");
                        return Some((record, (guard, receiver)));
                    }
                    Ok(_) => {}
                    Err(_) => return None,
                }
            }
        });

        Ok(records.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(addresses: Vec<IpAddr>) -> ServiceRecord {
        ServiceRecord {
            name: "NEEO Living Room._neeo._tcp.local.".to_string(),
            addresses,
            port: 3000,
            txt: HashMap::from([("rel".to_string(), "0.50.1".to_string())]),
        }
    }

    #[test]
    fn http_url_uses_first_address() {
        let record = record(vec!["10.0.0.2".parse().unwrap()]);
        assert_eq!(record.http_url().as_deref(), Some("http://10.0.0.2:3000"));
    }

    #[test]
    fn ipv6_addresses_are_bracketed() {
        let record = record(vec!["fe80::1".parse().unwrap()]);
        assert_eq!(record.http_url().as_deref(), Some("http://[fe80::1]:3000"));
    }

    #[test]
    fn no_address_means_no_url() {
        assert!(record(Vec::new()).http_url().is_none());
    }
}
