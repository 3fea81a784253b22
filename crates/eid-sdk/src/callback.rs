//! OAuth callback hand-off.
//!
//! After the provider redirects back, the callback URL carries either a
//! one-time `code` (exchanged for a credential) or a ready-made `token`.

use reqwest::Url;

use crate::error::SdkError;

/// Parameters found on the OAuth callback URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackParams {
    /// Authorization code to exchange.
    pub code: Option<String>,
    /// Credential issued directly by the server.
    pub token: Option<String>,
}

impl CallbackParams {
    /// Parameters from a full callback URL.
    pub fn from_url(url: &str) -> Result<Self, SdkError> {
        let url = Url::parse(url).map_err(|e| SdkError::Config(format!("invalid callback URL: {e}")))?;
        Ok(Self::from_pairs(url.query_pairs()))
    }

    /// Parameters from a bare query string (with or without the leading `?`).
    pub fn from_query(query: &str) -> Self {
        let query = query.trim_start_matches('?');
        Self::from_pairs(url_pairs(query))
    }

    fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            let value = value.as_ref();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "code" => params.code = Some(value.to_string()),
                "token" => params.token = Some(value.to_string()),
                _ => {}
            }
        }
        params
    }

    /// `true` if neither a code nor a token is present.
    pub fn is_empty(&self) -> bool {
        self.code.is_none() && self.token.is_none()
    }
}

fn url_pairs(query: &str) -> Vec<(String, String)> {
    // Parse through a throwaway base so the query gets the same decoding
    // rules as a full URL.
    Url::parse(&format!("http://callback.invalid/?{query}"))
        .map(|u| u.query_pairs().into_owned().collect())
        .unwrap_or_default()
}

/// What the callback amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// A credential was stored.
    Authenticated,
    /// Neither a code nor a token arrived; the user has to log in.
    LoginRequired,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_code_from_url() {
        let params = CallbackParams::from_url("http://localhost:5173/auth/callback?code=abc123").unwrap();
        assert_eq!(params.code.as_deref(), Some("abc123"));
        assert_eq!(params.token, None);
    }

    #[test]
    fn parses_token_from_query() {
        let params = CallbackParams::from_query("?token=eyJ%2Ehello");
        assert_eq!(params.token.as_deref(), Some("eyJ.hello"));
    }

    #[test]
    fn empty_values_are_absent() {
        let params = CallbackParams::from_query("code=&token=");
        assert!(params.is_empty());
    }

    #[test]
    fn bad_url_is_config_error() {
        assert!(matches!(
            CallbackParams::from_url("::nope"),
            Err(SdkError::Config(_))
        ));
    }
}
