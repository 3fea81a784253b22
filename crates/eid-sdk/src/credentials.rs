//! Bearer credential issued by the portal API.

use std::fmt;

/// Opaque bearer token proving an authenticated session.
///
/// Holding a `Credential` says nothing about its validity; only a
/// successful identity fetch confirms it. The token never appears in
/// `Debug` output.
#[derive(Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    /// Wrap a token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for the `Authorization: Bearer` header.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

impl From<&str> for Credential {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Credential {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_is_redacted() {
        let cred = Credential::new("eyJhbGciOi.secret");
        assert_eq!(format!("{cred:?}"), "Credential(<redacted>)");
        assert_eq!(cred.as_str(), "eyJhbGciOi.secret");
    }
}
