//! Secure token manager with memory-safe handling and masking capabilities
//!
//! The access token used for cloning and pushing is read from the environment,
//! held as a [`SecretString`] and only exposed when an authenticated URL is
//! handed to git. Anything that is logged goes through [`SecureTokenManager::mask_secret_in`].

use crate::security::credential_injector::encoded_userinfo;
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;

/// Environment variable holding the access token
pub const DEFAULT_TOKEN_ENV: &str = "GITHUB_ACCESS_TOKEN";

/// Stands in for the token in anything that gets logged
pub const REDACTED: &str = "****";

/// Secure token manager for repository authentication
///
/// # Examples
///
/// ```
/// use wiki_pages_sync::SecureTokenManager;
/// use std::collections::HashMap;
///
/// let manager = SecureTokenManager::new();
/// let env = HashMap::from([("GITHUB_ACCESS_TOKEN".to_string(), String::new())]);
/// // An empty variable means "no authentication"
/// assert!(manager.get_token(&env).is_none());
/// ```
#[derive(Debug, Clone)]
pub struct SecureTokenManager {
    token_env: String,
}

impl Default for SecureTokenManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SecureTokenManager {
    /// Creates a manager reading `GITHUB_ACCESS_TOKEN`
    pub fn new() -> Self {
        Self::with_env_var(DEFAULT_TOKEN_ENV)
    }

    /// Creates a manager reading a custom environment variable
    pub fn with_env_var(name: impl Into<String>) -> Self {
        Self {
            token_env: name.into(),
        }
    }

    /// Name of the environment variable this manager reads
    pub fn token_name(&self) -> &str {
        &self.token_env
    }

    /// Retrieves the token from an environment snapshot
    ///
    /// Returns `None` when the variable is unset or empty.
    pub fn get_token(&self, env: &HashMap<String, String>) -> Option<SecretString> {
        env.get(&self.token_env)
            .filter(|value| !value.is_empty())
            .map(|value| SecretString::new(value.clone().into()))
    }

    /// Replaces every occurrence of `token` in `text` with `****`
    ///
    /// Both the raw token and its percent-encoded userinfo form are replaced,
    /// since git echoes URLs back in whichever form it was given.
    pub fn mask_secret_in(&self, text: &str, token: &SecretString) -> String {
        let raw = token.expose_secret();
        if raw.is_empty() {
            return text.to_string();
        }

        let mut masked = Self::replace_literal(text, raw, REDACTED);

        if let Some(encoded) = encoded_userinfo(raw)
            && encoded != raw
        {
            masked = Self::replace_literal(&masked, &encoded, REDACTED);
        }

        masked
    }

    fn replace_literal(text: &str, needle: &str, replacement: &str) -> String {
        match Regex::new(&regex::escape(needle)) {
            Ok(regex) => regex.replace_all(text, regex::NoExpand(replacement)).to_string(),
            Err(_) => text.replace(needle, replacement),
        }
    }
}
