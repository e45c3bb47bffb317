use regex::Regex;

/// Default header carrying the token. Lookup is case-insensitive; the
/// spelling only shows up verbatim in challenge responses.
pub const DEFAULT_HEADER_NAME: &str = "Authorization";

/// Default pattern for extracting a bearer token from an authorization
/// header. The single capture group holds the token.
pub const DEFAULT_HEADER_TOKEN_PATTERN: &str = r"^Bearer\s+(.*?)$";

/// Default authentication realm reported in challenge responses.
pub const DEFAULT_REALM: &str = "api";

/// Default claim used as the identity key.
pub const DEFAULT_IDENTIFIER: &str = "sub";

/// Configuration of the authentication pipeline.
///
/// `AuthConfig` is an immutable value: every `with_*` mutator leaves the
/// receiver untouched and returns a new configured copy, so a base
/// configuration can be shared across any number of concurrent requests.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    header_name: String,
    header_token_pattern: Regex,
    realm: String,
    identifier: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            header_name: DEFAULT_HEADER_NAME.to_owned(),
            header_token_pattern: Regex::new(DEFAULT_HEADER_TOKEN_PATTERN)
                .expect("default token pattern is a valid regex"),
            realm: DEFAULT_REALM.to_owned(),
            identifier: DEFAULT_IDENTIFIER.to_owned(),
        }
    }
}

impl AuthConfig {
    /// Returns a copy with the given HTTP authentication realm.
    pub fn with_realm(&self, realm: impl Into<String>) -> Self {
        let mut new = self.clone();
        new.realm = realm.into();
        new
    }

    /// Returns a copy that reads the token from the given header instead of
    /// `Authorization`.
    pub fn with_header_name(&self, header_name: impl Into<String>) -> Self {
        let mut new = self.clone();
        new.header_name = header_name.into();
        new
    }

    /// Returns a copy with the given token pattern. The token must match the
    /// pattern's first capture group.
    pub fn with_header_token_pattern(&self, header_token_pattern: Regex) -> Self {
        let mut new = self.clone();
        new.header_token_pattern = header_token_pattern;
        new
    }

    /// Returns a copy that uses the given claim as the identity key instead
    /// of `sub`.
    pub fn with_identifier(&self, identifier: impl Into<String>) -> Self {
        let mut new = self.clone();
        new.identifier = identifier.into();
        new
    }

    pub fn header_name(&self) -> &str {
        &self.header_name
    }

    pub fn header_token_pattern(&self) -> &Regex {
        &self.header_token_pattern
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }
}
