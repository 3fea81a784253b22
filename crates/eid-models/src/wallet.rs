//! Wallet addressing types.
//!
//! A [`WalletAddress`] is the chain-specific account string a wallet
//! reports (`0x…` for Sui). A [`WalletId`] is the server-side identifier
//! of a linked wallet and is what unlink requests refer to.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// WalletAddress
// ---------------------------------------------------------------------------

/// Blockchain address of a wallet account.
///
/// # Examples
///
/// ```
/// use eid_models::WalletAddress;
///
/// let addr = WalletAddress::new("0x1234567890abcdef1234567890abcdef12345678");
/// assert_eq!(addr.short(), "0x1234...5678");
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Create a new `WalletAddress` from a string slice.
    pub fn new(address: &str) -> Self {
        Self(address.to_string())
    }

    /// Return the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Truncated display form, see [`format_address`].
    pub fn short(&self) -> String {
        format_address(&self.0)
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WalletAddress {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for WalletAddress {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl FromStr for WalletAddress {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

/// Truncate an address to `0x1234...5678`: the first six characters, an
/// ellipsis, and the last four characters.
///
/// The empty string stays empty. Short inputs are not padded, so the two
/// halves may overlap (`0x1234` becomes `0x1234...1234`).
pub fn format_address(address: &str) -> String {
    if address.is_empty() {
        return String::new();
    }
    let chars: Vec<char> = address.chars().collect();
    let head: String = chars.iter().take(6).collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("{head}...{tail}")
}

// ---------------------------------------------------------------------------
// WalletId
// ---------------------------------------------------------------------------

/// Server-assigned identifier of a linked wallet.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct WalletId(String);

impl WalletId {
    /// Create a new `WalletId` from a string slice.
    pub fn new(id: &str) -> Self {
        Self(id.to_string())
    }

    /// Return the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WalletId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl FromStr for WalletId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
