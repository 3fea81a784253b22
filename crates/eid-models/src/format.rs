//! Human-readable formatting helpers shared by every front end.

use chrono::{DateTime, Utc};
use strum::Display;
use url::Url;

use crate::identity::DEFAULT_WALLET_NETWORK;

/// Relative time since `then`, e.g. `30s ago`, `5m ago`, `3h ago`, `2d ago`.
pub fn format_time_ago(then: DateTime<Utc>) -> String {
    format_time_ago_at(then, Utc::now())
}

/// [`format_time_ago`] against an explicit `now`.
///
/// Timestamps in the future are reported as `0s ago`.
pub fn format_time_ago_at(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds().max(0);
    if seconds < 60 {
        return format!("{seconds}s ago");
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{minutes}m ago");
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{hours}h ago");
    }
    format!("{}d ago", hours / 24)
}

/// Login timestamp as `YYYY.MM.DD at HH:MM UTC`, or `Never`.
pub fn format_login_date(at: Option<DateTime<Utc>>) -> String {
    match at {
        Some(at) => at.format("%Y.%m.%d at %H:%M UTC").to_string(),
        None => "Never".to_string(),
    }
}

/// What an explorer link points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ExplorerKind {
    /// An account / address page.
    #[strum(serialize = "account")]
    Address,
    /// An on-chain object.
    #[strum(serialize = "object")]
    Object,
    /// A transaction digest.
    #[strum(serialize = "tx")]
    Transaction,
}

const NETWORK_SEGMENTS: [&str; 3] = ["mainnet", "testnet", "devnet"];

/// Build a block-explorer link for `value` on `network`.
///
/// `base` is the configured explorer URL. If its path already names a
/// network (`https://suiscan.xyz/mainnet`) only the origin is kept so
/// the requested network can be substituted. Query and fragment do not
/// count as path. An empty `network` means mainnet.
pub fn explorer_url(base: &str, network: &str, value: &str, kind: ExplorerKind) -> String {
    let root = explorer_root(base);
    let network = if network.is_empty() {
        DEFAULT_WALLET_NETWORK.to_string()
    } else {
        network.to_ascii_lowercase()
    };
    format!("{root}/{network}/{kind}/{value}")
}

fn explorer_root(base: &str) -> String {
    match Url::parse(base) {
        Ok(url) if NETWORK_SEGMENTS.iter().any(|n| url.path().contains(n)) => {
            url.origin().ascii_serialization()
        }
        _ => base.trim_end_matches('/').to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 5, 10, 0, 0).unwrap()
    }

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn time_ago_buckets() {
        assert_eq!(format_time_ago_at(at("2026-02-05T09:59:30Z"), now()), "30s ago");
        assert_eq!(format_time_ago_at(at("2026-02-05T09:55:00Z"), now()), "5m ago");
        assert_eq!(format_time_ago_at(at("2026-02-05T07:00:00Z"), now()), "3h ago");
        assert_eq!(format_time_ago_at(at("2026-02-03T10:00:00Z"), now()), "2d ago");
    }

    #[test]
    fn time_ago_minute_boundary() {
        assert_eq!(format_time_ago_at(at("2026-02-05T09:59:00Z"), now()), "1m ago");
    }

    #[test]
    fn time_ago_future_clamps() {
        assert_eq!(format_time_ago_at(at("2026-02-05T10:00:05Z"), now()), "0s ago");
    }

    #[test]
    fn login_date_format() {
        assert_eq!(
            format_login_date(Some(at("2026-02-05T09:07:00Z"))),
            "2026.02.05 at 09:07 UTC"
        );
        assert_eq!(format_login_date(None), "Never");
    }

    #[test]
    fn explorer_replaces_network_segment() {
        assert_eq!(
            explorer_url("https://suiscan.xyz/mainnet", "testnet", "0xabc", ExplorerKind::Address),
            "https://suiscan.xyz/testnet/account/0xabc"
        );
    }

    #[test]
    fn explorer_keeps_plain_origin() {
        assert_eq!(
            explorer_url("https://suiscan.xyz", "Devnet", "0x1", ExplorerKind::Transaction),
            "https://suiscan.xyz/devnet/tx/0x1"
        );
    }

    #[test]
    fn explorer_ignores_network_names_outside_the_path() {
        assert_eq!(
            explorer_url("https://explorer.example/x?net=testnet", "devnet", "0x1", ExplorerKind::Address),
            "https://explorer.example/x?net=testnet/devnet/account/0x1"
        );
    }

    #[test]
    fn explorer_keeps_unparseable_base() {
        assert_eq!(
            explorer_url("explorer.local/", "testnet", "0x1", ExplorerKind::Object),
            "explorer.local/testnet/object/0x1"
        );
    }

    #[test]
    fn explorer_defaults_to_mainnet() {
        assert_eq!(
            explorer_url("https://explorer.example/", "", "0x2", ExplorerKind::Object),
            "https://explorer.example/mainnet/object/0x2"
        );
    }
}
