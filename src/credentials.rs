//! Anti-forgery token lookup.
//!
//! The service expects the CSRF token issued to the browser session. The client only
//! reads it; obtaining and refreshing it belongs to whoever manages the session.

use std::collections::HashMap;

/// Key-value store the anti-forgery token is read from
pub trait CredentialStore: Send + Sync {
    /// Look up a value by exact name
    fn get(&self, name: &str) -> Option<String>;
}

/// Cookie-header backed store (`name1=value1; name2=value2`)
///
/// Values are URL-decoded on lookup.
#[derive(Clone, Debug, Default)]
pub struct CookieStore {
    raw: String,
}

impl CookieStore {
    /// Create a store from a raw cookie string
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }
}

impl CredentialStore for CookieStore {
    fn get(&self, name: &str) -> Option<String> {
        if name.is_empty() {
            return None;
        }

        for cookie in self.raw.split(';') {
            let Some(value) = cookie
                .trim()
                .strip_prefix(name)
                .and_then(|rest| rest.strip_prefix('='))
            else {
                continue;
            };

            return match urlencoding::decode(value) {
                Ok(decoded) => Some(decoded.into_owned()),
                Err(e) => {
                    tracing::warn!(cookie = name, error = %e, "cookie value is not valid UTF-8 after decoding");
                    None
                }
            };
        }

        None
    }
}

/// Store with no credentials; requests are sent without a CSRF header
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCredentials;

impl CredentialStore for NoCredentials {
    fn get(&self, _name: &str) -> Option<String> {
        None
    }
}

impl CredentialStore for HashMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        HashMap::get(self, name).cloned()
    }
}
