//! Brain discovery
//!
//! Advertisements pass through, in order: a timeout bound, a TXT filter,
//! an address filter and a firmware version probe. The first survivor wins.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use semver::{Version, VersionReq};

use super::client::RestClient;
use super::mdns::{ServiceBrowser, ServiceRecord};
use crate::{Error, Result};

/// Finds a brain with compatible firmware on the local network
pub struct DiscoveryEngine {
    browser: Arc<dyn ServiceBrowser>,
    client: Arc<dyn RestClient>,
    version_req: VersionReq,
}

impl std::fmt::Debug for DiscoveryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoveryEngine")
            .field("version_req", &self.version_req)
            .finish_non_exhaustive()
    }
}

impl DiscoveryEngine {
    /// Create an engine accepting firmware that satisfies `version_satisfaction`
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the version range does not parse
    pub fn new(
        browser: Arc<dyn ServiceBrowser>,
        client: Arc<dyn RestClient>,
        version_satisfaction: &str,
    ) -> Result<Self> {
        let version_req = VersionReq::parse(version_satisfaction).map_err(|e| {
            Error::Config(format!(
                "invalid firmware version range {version_satisfaction}: {e}"
            ))
        })?;

        Ok(Self {
            browser,
            client,
            version_req,
        })
    }

    /// First compatible brain seen on `interface` (all interfaces if `None`)
    ///
    /// # Errors
    ///
    /// Returns `No Brain found after {ms}ms!` when nothing compatible shows
    /// up in time, or an mDNS error if browsing cannot start
    pub async fn find_first_brain(
        &self,
        interface: Option<&str>,
        timeout: Duration,
    ) -> Result<ServiceRecord> {
        let records = self.browser.browse(interface)?;

        let candidates = records
            .filter(|record| futures::future::ready(has_txt(record)))
            .filter(|record| futures::future::ready(has_addresses(record)))
            .filter_map(|record| async move {
                self.is_compatible(&record).await.then_some(record)
            });
        futures::pin_mut!(candidates);

        match tokio::time::timeout(timeout, candidates.next()).await {
            Ok(Some(record)) => {
                tracing::info!(service = %record.name, "found brain");
                Ok(record)
            }
            Ok(None) | Err(_) => Err(Error::BrainNotFound(timeout.as_millis())),
        }
    }

    /// Race discovery across `interfaces`, keeping the first brain found
    ///
    /// An empty interface list browses all interfaces at once.
    ///
    /// # Errors
    ///
    /// Returns the first failure if every interface fails
    pub async fn find_first_brain_on_any(
        &self,
        interfaces: &[String],
        timeout: Duration,
    ) -> Result<ServiceRecord> {
        if interfaces.is_empty() {
            return self.find_first_brain(None, timeout).await;
        }

        let mut legs: FuturesUnordered<_> = interfaces
            .iter()
            .map(|name| self.find_first_brain(Some(name), timeout))
            .collect();

        let mut first_error = None;
        while let Some(result) = legs.next().await {
            match result {
                Ok(record) => return Ok(record),
                Err(e) => {
                    tracing::debug!(error = %e, "discovery leg failed");
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        Err(first_error.unwrap_or(Error::BrainNotFound(timeout.as_millis())))
    }

    async fn is_compatible(&self, record: &ServiceRecord) -> bool {
        let Some(addr) = record.socket_addr() else {
            return false;
        };

        let url = format!("http://{addr}/systeminfo");
        let info = match self.client.get_json(&url).await {
            Ok(info) => info,
            Err(e) => {
                tracing::warn!(service = %record.name, error = %e, "brain version probe failed");
                return false;
            }
        };

        let firmware = info
            .get("firmwareVersion")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default();

        match parse_firmware_version(firmware) {
            Some(version) if self.version_req.matches(&version) => true,
            _ => {
                tracing::warn!(
                    service = %record.name,
                    firmware,
                    required = %self.version_req,
                    "skipping brain with incompatible firmware"
                );
                false
            }
        }
    }
}

fn has_txt(record: &ServiceRecord) -> bool {
    !record.txt.is_empty()
}

fn has_addresses(record: &ServiceRecord) -> bool {
    if record.addresses.is_empty() {
        tracing::warn!(service = %record.name, "skipping brain without addresses");
        return false;
    }
    true
}

/// Leading `major.minor.patch` of a firmware version string
///
/// Brains report versions like `0.50.1-20180424-0abc`; anything after the
/// third numeric component is ignored.
#[must_use]
pub fn parse_firmware_version(raw: &str) -> Option<Version> {
    let mut parts = raw
        .trim()
        .split('.')
        .map(|part| {
            let digits: String = part.chars().take_while(char::is_ascii_digit).collect();
            digits.parse::<u64>().ok()
        });

    let major = parts.next()??;
    let minor = parts.next()??;
    let patch = parts.next()??;
    Some(Version::new(major, minor, patch))
}

/// Names of local non-loopback IPv4 interfaces
#[must_use]
pub fn local_interfaces() -> Vec<String> {
    let Ok(interfaces) = local_ip_address::list_afinet_netifas() else {
        return Vec::new();
    };

    let mut names: Vec<String> = interfaces
        .into_iter()
        .filter(|(_, ip)| matches!(ip, IpAddr::V4(v4) if !v4.is_loopback()))
        .map(|(name, _)| name)
        .collect();
    names.sort();
    names.dedup();
    names
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use futures::stream::{self, BoxStream};
    use serde_json::{Value, json};

    use super::*;

    /// Emits fixed records per interface, then stays open
    struct FakeBrowser {
        records: HashMap<String, Vec<ServiceRecord>>,
    }

    impl ServiceBrowser for FakeBrowser {
        fn browse(&self, interface: Option<&str>) -> Result<BoxStream<'static, ServiceRecord>> {
            let records = self
                .records
                .get(interface.unwrap_or("all"))
                .cloned()
                .unwrap_or_default();
            Ok(stream::iter(records).chain(stream::pending()).boxed())
        }
    }

    /// Answers version probes by host
    struct FakeSystemInfo {
        versions: HashMap<String, &'static str>,
    }

    #[async_trait]
    impl RestClient for FakeSystemInfo {
        async fn get_json(&self, url: &str) -> Result<Value> {
            self.versions
                .iter()
                .find(|(host, _)| url.contains(host.as_str()))
                .map(|(_, version)| json!({ "firmwareVersion": version }))
                .ok_or_else(|| Error::BrainRequest("404 Not Found - ".into()))
        }

        async fn post_json(&self, _url: &str, _body: &Value) -> Result<Value> {
            Ok(Value::Null)
        }
    }

    fn record(name: &str, address: Option<&str>, txt: bool) -> ServiceRecord {
        ServiceRecord {
            name: name.to_string(),
            addresses: address.map(|a| a.parse::<IpAddr>().unwrap()).into_iter().collect(),
            port: 3000,
            txt: if txt {
                HashMap::from([("rel".to_string(), "0.50.1".to_string())])
            } else {
                HashMap::new()
            },
        }
    }

    fn engine(records: Vec<(&str, Vec<ServiceRecord>)>) -> DiscoveryEngine {
        let browser = FakeBrowser {
            records: records
                .into_iter()
                .map(|(iface, r)| (iface.to_string(), r))
                .collect(),
        };
        let client = FakeSystemInfo {
            versions: HashMap::from([
                ("10.0.0.2".to_string(), "0.48.20-20171219-1e4e5e3-0201"),
                ("10.0.0.3".to_string(), "0.50.1-20180424-05eb8e2-0201"),
            ]),
        };
        DiscoveryEngine::new(Arc::new(browser), Arc::new(client), ">=0.49.0").unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn picks_first_record_passing_every_filter() {
        let engine = engine(vec![(
            "all",
            vec![
                record("no-txt", Some("10.0.0.3"), false),
                record("no-address", None, true),
                record("old-firmware", Some("10.0.0.2"), true),
                record("good", Some("10.0.0.3"), true),
            ],
        )]);

        let found = engine
            .find_first_brain(None, Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(found.name, "good");
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_with_descriptive_error() {
        let engine = engine(vec![(
            "eth0",
            vec![
                record("no-address", None, true),
                record("old-firmware", Some("10.0.0.2"), true),
            ],
        )]);

        let err = engine
            .find_first_brain(Some("eth0"), Duration::from_millis(30))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No Brain found after 30ms!");
    }

    #[tokio::test(start_paused = true)]
    async fn first_interface_with_a_brain_wins() {
        let engine = engine(vec![
            ("eth0", Vec::new()),
            ("wlan0", vec![record("good", Some("10.0.0.3"), true)]),
        ]);

        let found = engine
            .find_first_brain_on_any(
                &["eth0".to_string(), "wlan0".to_string()],
                Duration::from_secs(1),
            )
            .await
            .unwrap();
        assert_eq!(found.name, "good");
    }

    #[tokio::test(start_paused = true)]
    async fn all_legs_failing_surfaces_an_error() {
        let engine = engine(vec![("eth0", Vec::new()), ("wlan0", Vec::new())]);

        let err = engine
            .find_first_brain_on_any(
                &["eth0".to_string(), "wlan0".to_string()],
                Duration::from_millis(50),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), "BRAIN_NOT_FOUND");
    }

    #[test]
    fn firmware_versions_keep_leading_triple() {
        assert_eq!(
            parse_firmware_version("0.50.1-20180424-05eb8e2-0201"),
            Some(Version::new(0, 50, 1))
        );
        assert_eq!(parse_firmware_version("1.2.3"), Some(Version::new(1, 2, 3)));
        assert_eq!(parse_firmware_version("0.50"), None);
        assert_eq!(parse_firmware_version(""), None);
    }

    #[test]
    fn invalid_version_range_is_a_config_error() {
        let err = DiscoveryEngine::new(
            Arc::new(FakeBrowser {
                records: HashMap::new(),
            }),
            Arc::new(FakeSystemInfo {
                versions: HashMap::new(),
            }),
            "not a range",
        )
        .unwrap_err();
        assert_eq!(err.code(), "CONFIGURATION_ERROR");
    }
}
