//! Request and response bodies of the portal REST API.
//!
//! Shared by the SDK (which sends requests) and the stub backend (which
//! answers them) so both sides agree on the wire format.

use serde::{Deserialize, Serialize};

use crate::wallet::WalletAddress;

/// Body of `POST /api/auth/exchange`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ExchangeRequest {
    /// One-time authorization code from the OAuth callback.
    pub code: String,
}

/// Response of `POST /api/auth/exchange`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ExchangeResponse {
    /// Bearer credential for the session.
    pub token: String,
}

/// Body of `POST /api/wallets/link-nonce`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NonceRequest {
    /// Address the nonce will be bound to.
    pub address: WalletAddress,
}

/// Response of `POST /api/wallets/link-nonce`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NonceResponse {
    /// Single-use challenge the wallet must sign.
    pub nonce: String,
}

/// Body of `POST /api/wallets/link-verify`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct VerifyRequest {
    /// Address that signed the nonce.
    pub address: WalletAddress,
    /// Signature produced by the wallet (opaque to the client).
    pub signature: String,
}

/// Free-form JSON message body used by the API for both success
/// confirmations (`message`) and failures (`message` or `error`).
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiMessage {
    /// Human-readable message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Error description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiMessage {
    /// Build a body carrying only `message`.
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            message: Some(text.into()),
            error: None,
        }
    }

    /// Build a body carrying only `error`.
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            message: None,
            error: Some(text.into()),
        }
    }

    /// The first non-empty of `message` and `error`.
    pub fn text(&self) -> Option<&str> {
        self.message
            .as_deref()
            .filter(|m| !m.is_empty())
            .or_else(|| self.error.as_deref().filter(|e| !e.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_request_wire_format() {
        let req = VerifyRequest {
            address: "0xabc".into(),
            signature: "sig1".into(),
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            serde_json::json!({"address": "0xabc", "signature": "sig1"})
        );
    }

    #[test]
    fn api_message_prefers_message_over_error() {
        let body: ApiMessage =
            serde_json::from_str(r#"{"message":"Wallet already linked","error":"x"}"#).unwrap();
        assert_eq!(body.text(), Some("Wallet already linked"));

        let body: ApiMessage = serde_json::from_str(r#"{"error":"User not in required tribe"}"#)
            .unwrap();
        assert_eq!(body.text(), Some("User not in required tribe"));

        assert_eq!(ApiMessage::default().text(), None);
        assert_eq!(ApiMessage::message("").text(), None);
    }
}
