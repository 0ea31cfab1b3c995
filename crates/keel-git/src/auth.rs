//! Basic-auth credential embedding for http(s) remotes.

use std::borrow::Cow;

use keel_core::VcsError;
use tracing::debug;
use url::Url;

const MASK: &str = "***";

/// Returns `url` with `username`/`password` embedded as user-info.
///
/// When both credentials are empty the input is returned untouched, without
/// a parse/rebuild round trip. Otherwise the scheme must end in `http` or
/// `https`; this is a suffix match, so schemes such as `git+https` are
/// accepted as well.
///
/// # Errors
///
/// - `VcsError::InvalidUrl` if `url` does not parse or cannot hold user-info
/// - `VcsError::UnsupportedAuthScheme` for any other scheme
pub fn authenticated_url(url: &str, username: &str, password: &str) -> Result<String, VcsError> {
    if username.is_empty() && password.is_empty() {
        return Ok(url.to_string());
    }

    let mut parsed = Url::parse(url).map_err(|e| VcsError::invalid_url(url, e.to_string()))?;

    let scheme = parsed.scheme();
    if !(scheme.ends_with("https") || scheme.ends_with("http")) {
        return Err(VcsError::unsupported_auth_scheme(url));
    }

    parsed
        .set_username(username)
        .map_err(|()| VcsError::invalid_url(url, "url cannot carry a username"))?;
    parsed
        .set_password(Some(password))
        .map_err(|()| VcsError::invalid_url(url, "url cannot carry a password"))?;

    debug!("Embedded credentials in remote url for {}", parsed.host_str().unwrap_or_default());

    // `url` serializes an empty password as none; keep it as `user:@`.
    if password.is_empty() {
        let user = format!("{}://{}", parsed.scheme(), parsed.username());
        let serialized = String::from(parsed);
        return Ok(match serialized.strip_prefix(&format!("{user}@")) {
            Some(rest) => format!("{user}:@{rest}"),
            None => serialized,
        });
    }

    Ok(parsed.into())
}

/// Masks the credentials of a URL carrying user-info.
///
/// The password is masked when present. A username standing alone is masked
/// too, since it is then usually a token. Anything that is not such a URL is
/// returned as is.
pub fn redact_url(text: &str) -> Cow<'_, str> {
    if !text.contains('@') {
        return Cow::Borrowed(text);
    }

    let Ok(mut parsed) = Url::parse(text) else {
        return Cow::Borrowed(text);
    };

    let masked = if parsed.password().is_some() {
        parsed.set_password(Some(MASK))
    } else if !parsed.username().is_empty() {
        parsed.set_username(MASK)
    } else {
        return Cow::Borrowed(text);
    };

    match masked {
        Ok(()) => Cow::Owned(parsed.into()),
        Err(()) => Cow::Borrowed(text),
    }
}
