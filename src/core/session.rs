use base64::Engine;
use serde::{Deserialize, Serialize};

/// Literal username/password pair typed into the login form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// A pre-baked session id, injected as a cookie to skip the login form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
    pub session_id: String,
    pub user_id: u64,
}

impl SessionToken {
    pub fn new(session_id: impl Into<String>, user_id: u64) -> Self {
        Self {
            session_id: session_id.into(),
            user_id,
        }
    }

    /// Cookie payload the frontend expects: base64-encoded `{"sessionid": ...}`.
    pub fn cookie_value(&self) -> String {
        let payload = serde_json::json!({ "sessionid": self.session_id });
        base64::engine::general_purpose::STANDARD.encode(payload.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieData {
    pub name: String,
    pub value: String,
    pub path: String,
    pub http_only: bool,
    pub secure: bool,
}

impl CookieData {
    pub fn session(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: "/".to_string(),
            http_only: true,
            secure: false,
        }
    }
}

/// Where the browser session stands after a login attempt.
///
/// Logging in never fails on bad credentials; the caller inspects the
/// rendered page (usually through the message banner) instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthState {
    Anonymous,
    Authenticated { username: String },
    Injected { user_id: u64 },
    Rejected { username: String },
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(
            self,
            AuthState::Authenticated { .. } | AuthState::Injected { .. }
        )
    }
}
