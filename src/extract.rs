use http::HeaderMap;

use crate::config::AuthConfig;

/// Extracts the raw token from the configured request header.
///
/// Only the first value of the header is considered; additional values are
/// ignored. The token is whatever the configured pattern's first capture
/// group matched. Anything else — header absent, non-UTF-8 value, pattern
/// mismatch — is a silent `None`.
pub(crate) fn extract_token(headers: &HeaderMap, config: &AuthConfig) -> Option<String> {
    let value = headers.get_all(config.header_name()).iter().next()?;
    let value = value.to_str().ok()?;
    let captures = config.header_token_pattern().captures(value)?;
    captures.get(1).map(|token| token.as_str().to_owned())
}
