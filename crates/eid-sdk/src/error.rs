//! SDK error types.
//!
//! [`SdkError`] is the single error type returned by every fallible
//! operation in the SDK apart from wallet linking, which reports
//! [`LinkError`](crate::LinkError). Transport failures are folded into
//! [`SdkError::Unreachable`] so callers can tell "the server rejected the
//! credential" apart from "the server could not be reached".

/// Error type for all SDK operations.
#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    /// Invalid or missing configuration (e.g. bad URL).
    #[error("configuration error: {0}")]
    Config(String),

    /// The reachability guard has not reported the API as reachable yet.
    #[error("API not reachable yet")]
    NotReady,

    /// The operation needs a credential and none is stored.
    #[error("not signed in")]
    NotAuthenticated,

    /// The server rejected the credential.
    #[error("authentication rejected: {0}")]
    Unauthorized(String),

    /// The server could not be reached (connection failure or timeout).
    #[error("API unreachable: {0}")]
    Unreachable(String),

    /// The server answered with a non-success status.
    #[error("request failed ({status}): {message}")]
    Protocol {
        /// HTTP status code.
        status: u16,
        /// Server-provided message, or a generic description.
        message: String,
    },

    /// HTTP failure that is neither a transport error nor a status error
    /// (e.g. an undecodable body).
    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),
}

impl SdkError {
    /// `true` for [`SdkError::Unauthorized`].
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    /// `true` for [`SdkError::Unreachable`].
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable(_))
    }

    /// Text suitable for showing next to the control that triggered the
    /// request: the bare server message for protocol errors, the full
    /// description otherwise.
    pub fn user_message(&self) -> String {
        match self {
            Self::Protocol { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for SdkError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() || e.is_request() {
            SdkError::Unreachable(e.to_string())
        } else {
            SdkError::Http(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_user_message_is_bare() {
        let err = SdkError::Protocol {
            status: 400,
            message: "Wallet already linked".into(),
        };
        assert_eq!(err.user_message(), "Wallet already linked");
        assert_eq!(err.to_string(), "request failed (400): Wallet already linked");
    }

    #[test]
    fn classification_helpers() {
        assert!(SdkError::Unauthorized("Invalid Token".into()).is_unauthorized());
        assert!(SdkError::Unreachable("timed out".into()).is_unreachable());
        assert!(!SdkError::NotReady.is_unreachable());
    }
}
