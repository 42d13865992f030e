//! Avatar URLs: uploaded/linked images with a Gravatar fallback.

use sha2::{Digest, Sha256};

use paperback_core::Email;

use crate::services::auth::AuthError;

/// Default avatar size in pixels.
pub const DEFAULT_AVATAR_SIZE: u32 = 30;

/// Gravatar identicon URL for an email.
#[must_use]
pub fn gravatar_url(email: &Email, size: u32) -> String {
    let hash = hex::encode(Sha256::digest(email.as_str().trim().to_lowercase().as_bytes()));
    format!("https://www.gravatar.com/avatar/{hash}?s={size}&d=identicon")
}

/// The user's own avatar if set, otherwise their Gravatar.
#[must_use]
pub fn avatar_url_for(email: &Email, avatar_url: Option<&str>, size: u32) -> String {
    match avatar_url {
        Some(url) if !url.is_empty() => url.to_owned(),
        _ => gravatar_url(email, size),
    }
}

/// Pick the avatar to store from the account form fields.
///
/// `remove` clears it. A non-empty `avatar` replaces it. Otherwise
/// `avatar_cache` (the value re-submitted after a failed form) wins over the
/// stored `current` value.
///
/// # Errors
///
/// Returns `AuthError::InvalidAvatarUrl` if the chosen value is not an
/// http(s) URL.
pub fn resolve_avatar(
    current: Option<&str>,
    avatar: Option<&str>,
    avatar_cache: Option<&str>,
    remove: bool,
) -> Result<Option<String>, AuthError> {
    if remove {
        return Ok(None);
    }

    fn non_empty(v: Option<&str>) -> Option<&str> {
        v.map(str::trim).filter(|v| !v.is_empty())
    }

    let Some(chosen) = non_empty(avatar)
        .or_else(|| non_empty(avatar_cache))
        .or_else(|| non_empty(current))
    else {
        return Ok(None);
    };

    let url = url::Url::parse(chosen).map_err(|_| AuthError::InvalidAvatarUrl(chosen.to_owned()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(AuthError::InvalidAvatarUrl(chosen.to_owned()));
    }

    Ok(Some(url.into()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_gravatar_url_shape() {
        let email = Email::parse("Reader@Example.com").unwrap();
        let url = gravatar_url(&email, DEFAULT_AVATAR_SIZE);

        assert!(url.starts_with("https://www.gravatar.com/avatar/"));
        assert!(url.ends_with("?s=30&d=identicon"));
        // SHA-256 hex digest
        let hash = url
            .trim_start_matches("https://www.gravatar.com/avatar/")
            .split('?')
            .next()
            .unwrap();
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_gravatar_ignores_case() {
        let a = Email::parse("reader@example.com").unwrap();
        let b = Email::parse("READER@EXAMPLE.COM").unwrap();
        assert_eq!(gravatar_url(&a, 80), gravatar_url(&b, 80));
    }

    #[test]
    fn test_own_avatar_wins() {
        let email = Email::parse("reader@example.com").unwrap();
        assert_eq!(
            avatar_url_for(&email, Some("https://cdn.example.com/me.png"), 30),
            "https://cdn.example.com/me.png"
        );
        assert!(avatar_url_for(&email, Some(""), 30).contains("gravatar.com"));
    }

    #[test]
    fn test_resolve_avatar_precedence() {
        let current = Some("https://cdn.example.com/old.png");
        assert_eq!(resolve_avatar(current, None, None, true).unwrap(), None);
        assert_eq!(
            resolve_avatar(current, Some("https://cdn.example.com/new.png"), None, false).unwrap(),
            Some("https://cdn.example.com/new.png".to_string())
        );
        assert_eq!(
            resolve_avatar(current, Some(" "), Some("https://cdn.example.com/cached.png"), false)
                .unwrap(),
            Some("https://cdn.example.com/cached.png".to_string())
        );
        assert_eq!(
            resolve_avatar(current, None, None, false).unwrap(),
            Some("https://cdn.example.com/old.png".to_string())
        );
    }

    #[test]
    fn test_resolve_avatar_rejects_non_http() {
        assert!(matches!(
            resolve_avatar(None, Some("javascript:alert(1)"), None, false),
            Err(AuthError::InvalidAvatarUrl(_))
        ));
        assert!(resolve_avatar(None, Some("not a url"), None, false).is_err());
    }
}
