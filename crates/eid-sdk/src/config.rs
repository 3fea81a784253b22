//! Client configuration.
//!
//! Built once by the embedding application and handed to
//! [`Portal::new`](crate::Portal::new).

use std::time::Duration;

use eid_models::{ApiRoutes, SuiNetwork};

/// Default API base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:5038";
/// Default block explorer base URL.
pub const DEFAULT_BLOCK_EXPLORER_URL: &str = "https://suiscan.xyz/mainnet";
/// Default voice server address shown to users.
pub const DEFAULT_MUMBLE_SERVER_URL: &str = "mumble.void.scetrov.live";

/// Settings for talking to the portal API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalConfig {
    /// Base URL of the API, without a trailing slash.
    pub api_url: String,
    /// Network wallets must be connected to before linking.
    pub sui_network: SuiNetwork,
    /// Explorer base used for address / object / transaction links.
    pub block_explorer_url: String,
    /// Voice server address shown next to voice credentials.
    pub mumble_server_url: String,
    /// Unauthenticated path probed by the reachability guard.
    pub liveness_path: String,
    /// Timeout of a single liveness probe.
    pub probe_timeout: Duration,
    /// Pause between failed probes.
    pub retry_backoff: Duration,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            sui_network: SuiNetwork::default(),
            block_explorer_url: DEFAULT_BLOCK_EXPLORER_URL.to_string(),
            mumble_server_url: DEFAULT_MUMBLE_SERVER_URL.to_string(),
            liveness_path: ApiRoutes::DEFAULT_LIVENESS.to_string(),
            probe_timeout: Duration::from_secs(5),
            retry_backoff: Duration::from_secs(3),
        }
    }
}

impl PortalConfig {
    /// Configuration pointing at `api_url`, defaults elsewhere.
    pub fn new(api_url: &str) -> Self {
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    /// Build the configuration from environment variables.
    ///
    /// | Variable                 | Default                       | Description                       |
    /// |--------------------------|-------------------------------|-----------------------------------|
    /// | `EID_API_URL`            | `http://localhost:5038`       | API base URL                      |
    /// | `EID_SUI_NETWORK`        | `testnet`                     | Network wallets must be on        |
    /// | `EID_BLOCK_EXPLORER_URL` | `https://suiscan.xyz/mainnet` | Explorer base URL                 |
    /// | `EID_MUMBLE_SERVER_URL`  | `mumble.void.scetrov.live`    | Voice server shown to users       |
    /// | `EID_LIVENESS_PATH`      | `/docs`                       | Path probed by the boot guard     |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let sui_network = var("EID_SUI_NETWORK")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.sui_network);

        let liveness_path = var("EID_LIVENESS_PATH")
            .map(|p| {
                if p.starts_with('/') {
                    p
                } else {
                    format!("/{p}")
                }
            })
            .unwrap_or(defaults.liveness_path);

        Self {
            api_url: var("EID_API_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_url),
            sui_network,
            block_explorer_url: var("EID_BLOCK_EXPLORER_URL").unwrap_or(defaults.block_explorer_url),
            mumble_server_url: var("EID_MUMBLE_SERVER_URL").unwrap_or(defaults.mumble_server_url),
            liveness_path,
            probe_timeout: defaults.probe_timeout,
            retry_backoff: defaults.retry_backoff,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = PortalConfig::from_lookup(lookup(&[]));
        assert_eq!(cfg, PortalConfig::default());
        assert_eq!(cfg.api_url, "http://localhost:5038");
        assert_eq!(cfg.sui_network, SuiNetwork::Testnet);
        assert_eq!(cfg.liveness_path, "/docs");
        assert_eq!(cfg.probe_timeout, Duration::from_secs(5));
        assert_eq!(cfg.retry_backoff, Duration::from_secs(3));
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = PortalConfig::from_lookup(lookup(&[
            ("EID_API_URL", "https://api.example.com/"),
            ("EID_SUI_NETWORK", "Mainnet"),
            ("EID_LIVENESS_PATH", "health"),
        ]));
        assert_eq!(cfg.api_url, "https://api.example.com");
        assert_eq!(cfg.sui_network, SuiNetwork::Mainnet);
        assert_eq!(cfg.liveness_path, "/health");
    }

    #[test]
    fn blank_values_fall_back() {
        let cfg = PortalConfig::from_lookup(lookup(&[("EID_API_URL", "  ")]));
        assert_eq!(cfg.api_url, DEFAULT_API_URL);
    }
}
