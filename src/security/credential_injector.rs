//! Credential injection for git remote URLs
//!
//! Two URL shapes are supported:
//!
//! - short form `git@github.com:owner/repo.git`: the leading `git` user is
//!   replaced by the token
//! - `https://github...`: the token becomes the userinfo component
//!
//! Anything else is returned unchanged.

use secrecy::{ExposeSecret, SecretString};
use url::Url;

/// Short-form remotes start with this user
const SHORT_FORM_MARKER: &str = "git@";

/// Part of the short-form marker that gets replaced
const SHORT_FORM_USER: &str = "git";

/// Only GitHub HTTPS remotes get a userinfo component
const GITHUB_HTTPS_PREFIX: &str = "https://github";

/// Embed `token` into `url`
///
/// # Examples
///
/// ```
/// use wiki_pages_sync::security::credential_injector::inject_token;
///
/// assert_eq!(
///     inject_token("git@github.com:acme/docs.git", "t0ken"),
///     "t0ken@github.com:acme/docs.git"
/// );
/// assert_eq!(
///     inject_token("https://github.com/acme/docs.wiki.git", "t0ken"),
///     "https://t0ken@github.com/acme/docs.wiki.git"
/// );
/// assert_eq!(
///     inject_token("ssh://gitlab.example.com/acme/docs.git", "t0ken"),
///     "ssh://gitlab.example.com/acme/docs.git"
/// );
/// ```
pub fn inject_token(url: &str, token: &str) -> String {
    if url.starts_with(SHORT_FORM_MARKER) {
        return format!("{}{}", token, &url[SHORT_FORM_USER.len()..]);
    }

    if url.starts_with(GITHUB_HTTPS_PREFIX)
        && let Ok(mut parsed) = Url::parse(url)
        && parsed.set_username(token).is_ok()
    {
        return parsed.into();
    }

    url.to_string()
}

/// Authenticated form of `url`, or `url` itself when there is no token
///
/// The result stays wrapped so it cannot end up in a `Debug` or log line by accident.
pub fn authenticate(url: &str, token: Option<&SecretString>) -> SecretString {
    let authenticated = match token {
        Some(token) => inject_token(url, token.expose_secret()),
        None => url.to_string(),
    };
    SecretString::new(authenticated.into())
}

/// Strip userinfo from a URL for display
///
/// Short-form and unparsable URLs are returned unchanged.
pub fn redact_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) if !parsed.username().is_empty() || parsed.password().is_some() => {
            let _ = parsed.set_password(None);
            let _ = parsed.set_username("");
            parsed.into()
        }
        _ => url.to_string(),
    }
}

/// Percent-encoded form `token` takes when used as a URL username
pub fn encoded_userinfo(token: &str) -> Option<String> {
    let mut probe = Url::parse("https://placeholder.invalid").ok()?;
    probe.set_username(token).ok()?;
    Some(probe.username().to_string())
}
