//! Startup configuration read from environment variables
//!
//! Read once when the application starts. The resulting endpoint catalog and
//! retry configuration are immutable and shared by reference afterwards.
//!
//! | Variable | Meaning | Default |
//! |---|---|---|
//! | `MIXER_NETWORK` | Active network | `devnet` |
//! | `MIXER_RPC_<NETWORK>` | Comma-separated endpoint URLs, highest priority first | public endpoints |
//! | `MIXER_MAX_RETRIES` | Retries after the first attempt | `3` |
//! | `MIXER_INITIAL_DELAY_MS` | First backoff delay | `1000` |
//! | `MIXER_MAX_DELAY_MS` | Backoff cap | `10000` |
//! | `MIXER_BACKOFF_MULTIPLIER` | Growth factor, at least 1.0 | `2.0` |
//! | `MIXER_RETRY_JITTER` | Jitter delays by ±25% | `true` |
//! | `MIXER_ENABLE_FALLBACK` | Rotate to other endpoints after exhaustion | `true` |
//! | `MIXER_CONNECT_TIMEOUT_MS` | Deadline for one attempt against an endpoint | `15000` |
//! | `MIXER_ASSUME_ONLINE` | Ignore the connectivity flag when classifying | `false` |

use crate::constants::*;
use crate::core::{AlwaysOnline, Classifier, ConnectivityProbe, EndpointCatalog, ResilientRunner};
use crate::models::{EndpointDescriptor, NetworkId};
use crate::utils::retry::RetryConfig;
use crate::utils::ConfigError;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub network: NetworkId,
    pub endpoints: Vec<EndpointDescriptor>,
    pub retry: RetryConfig,
    pub fallback_enabled: bool,
    pub connect_timeout: Duration,
    pub assume_online: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            network: NetworkId::Devnet,
            endpoints: NetworkId::ALL
                .iter()
                .flat_map(|n| build_endpoints(*n, default_urls(*n).iter().copied()))
                .collect(),
            retry: RetryConfig::default(),
            fallback_enabled: true,
            connect_timeout: Duration::from_millis(CONNECT_TIMEOUT_MS),
            assume_online: false,
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, which returns the value of a
    /// variable if it is set
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = RetryConfig::default();

        let network = match get(ENV_NETWORK) {
            Some(raw) => NetworkId::from_str(&raw).map_err(|_| invalid(ENV_NETWORK, &raw, "unknown network"))?,
            None => NetworkId::Devnet,
        };

        let mut endpoints = Vec::new();
        for net in NetworkId::ALL {
            let var = rpc_var(net);
            match get(&var) {
                Some(raw) => {
                    let urls: Vec<&str> = raw
                        .split(',')
                        .map(str::trim)
                        .filter(|u| !u.is_empty())
                        .collect();
                    for url in &urls {
                        if !is_valid_url(url) {
                            return Err(ConfigError::InvalidUrl {
                                var: var.clone(),
                                url: url.to_string(),
                            });
                        }
                    }
                    endpoints.extend(build_endpoints(net, urls.into_iter()));
                }
                None => endpoints.extend(build_endpoints(net, default_urls(net).iter().copied())),
            }
        }

        let max_retries = parse_or(&get, ENV_MAX_RETRIES, defaults.max_retries)?;
        let initial_ms = parse_or(
            &get,
            ENV_INITIAL_DELAY_MS,
            defaults.initial_delay.as_millis() as u64,
        )?;
        let max_ms = parse_or(&get, ENV_MAX_DELAY_MS, defaults.max_delay.as_millis() as u64)?;
        if initial_ms > max_ms {
            return Err(invalid(
                ENV_INITIAL_DELAY_MS,
                &initial_ms.to_string(),
                "must not exceed MIXER_MAX_DELAY_MS",
            ));
        }

        let backoff_multiplier: f64 =
            parse_or(&get, ENV_BACKOFF_MULTIPLIER, defaults.backoff_multiplier)?;
        if !backoff_multiplier.is_finite() || backoff_multiplier < 1.0 {
            return Err(invalid(
                ENV_BACKOFF_MULTIPLIER,
                &backoff_multiplier.to_string(),
                "must be a finite number >= 1.0",
            ));
        }

        let connect_ms = parse_or(&get, ENV_CONNECT_TIMEOUT_MS, CONNECT_TIMEOUT_MS)?;
        if connect_ms == 0 {
            return Err(invalid(ENV_CONNECT_TIMEOUT_MS, "0", "must be greater than zero"));
        }

        let jitter = parse_flag(&get, ENV_RETRY_JITTER, defaults.jitter)?;
        let fallback_enabled = parse_flag(&get, ENV_ENABLE_FALLBACK, true)?;
        let assume_online = parse_flag(&get, ENV_ASSUME_ONLINE, false)?;

        let config = Self {
            network,
            endpoints,
            retry: RetryConfig {
                max_retries,
                initial_delay: Duration::from_millis(initial_ms),
                max_delay: Duration::from_millis(max_ms),
                backoff_multiplier,
                jitter,
                ..defaults
            },
            fallback_enabled,
            connect_timeout: Duration::from_millis(connect_ms),
            assume_online,
        };

        tracing::info!(
            network = %config.network,
            endpoints = config.endpoints.len(),
            max_retries = config.retry.max_retries,
            "configuration loaded"
        );
        Ok(config)
    }

    pub fn catalog(&self) -> Result<EndpointCatalog, ConfigError> {
        EndpointCatalog::new(self.endpoints.clone())
    }

    /// Default classifier fed by `connectivity`, or by [`AlwaysOnline`]
    /// when `MIXER_ASSUME_ONLINE` is set
    pub fn classifier(&self, connectivity: Arc<dyn ConnectivityProbe>) -> Classifier {
        if self.assume_online {
            Classifier::new().with_connectivity(Arc::new(AlwaysOnline))
        } else {
            Classifier::new().with_connectivity(connectivity)
        }
    }

    /// Runner over this configuration's catalog, retry policy, fallback
    /// flag and connect timeout
    pub fn runner(&self, classifier: Classifier) -> Result<ResilientRunner, ConfigError> {
        Ok(ResilientRunner::new(
            Arc::new(self.catalog()?),
            Arc::new(self.retry.clone()),
            Arc::new(classifier),
        )
        .with_fallback(self.fallback_enabled)
        .with_connect_timeout(self.connect_timeout))
    }
}

/// `MIXER_RPC_DEVNET` etc.
pub fn rpc_var(network: NetworkId) -> String {
    format!("{}{}", ENV_RPC_PREFIX, network.as_str().to_uppercase())
}

fn default_urls(network: NetworkId) -> &'static [&'static str] {
    match network {
        NetworkId::Mainnet => DEFAULT_MAINNET_RPC,
        NetworkId::Devnet => DEFAULT_DEVNET_RPC,
        NetworkId::Testnet => DEFAULT_TESTNET_RPC,
        NetworkId::Localnet => DEFAULT_LOCALNET_RPC,
    }
}

/// Ids are `<network>-<index>`; list order gives priority
fn build_endpoints<'a, I>(network: NetworkId, urls: I) -> impl Iterator<Item = EndpointDescriptor> + 'a
where
    I: Iterator<Item = &'a str> + 'a,
{
    urls.enumerate().map(move |(i, url)| {
        EndpointDescriptor::new(format!("{}-{}", network, i), url, network, i as u32)
    })
}

fn is_valid_url(url: &str) -> bool {
    ["https://", "http://", "wss://", "ws://"]
        .iter()
        .find_map(|scheme| url.strip_prefix(scheme))
        .is_some_and(|rest| {
            let host = rest.split(['/', '?', '#']).next().unwrap_or("");
            !host.is_empty() && !host.contains(char::is_whitespace)
        })
}

fn invalid(var: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        var: var.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_or<T, G>(get: &G, var: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(var) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| invalid(var, &raw, &e.to_string())),
        None => Ok(default),
    }
}

fn parse_flag<G>(get: &G, var: &str, default: bool) -> Result<bool, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(var) {
        Some(raw) => match raw.to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(invalid(var, &raw, "expected true/false")),
        },
        None => Ok(default),
    }
}
