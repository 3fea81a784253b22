//! Voice-chat (Mumble) account DTOs.

use serde::{Deserialize, Serialize};

/// Response of `GET /api/mumble/status`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct VoiceAccountStatus {
    /// Voice username, if an account exists.
    #[serde(default)]
    pub username: Option<String>,
}

impl VoiceAccountStatus {
    /// `true` if the user already has a voice account.
    pub fn has_account(&self) -> bool {
        self.username.is_some()
    }
}

/// Response of `POST /api/mumble/account`.
///
/// The password is only ever returned once, on creation or reset.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct VoiceAccountCredentials {
    /// Voice username.
    pub username: String,
    /// One-time password.
    pub password: String,
}

impl std::fmt::Debug for VoiceAccountCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceAccountCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_without_account() {
        let status: VoiceAccountStatus = serde_json::from_str(r#"{"username":null}"#).unwrap();
        assert!(!status.has_account());
    }

    #[test]
    fn credentials_debug_hides_password() {
        let creds = VoiceAccountCredentials {
            username: "ember".into(),
            password: "hunter2".into(),
        };
        let debug = format!("{creds:?}");
        assert!(debug.contains("ember"));
        assert!(!debug.contains("hunter2"));
    }
}
