use std::sync::Arc;

use async_trait::async_trait;
use http::header::WWW_AUTHENTICATE;
use http::{HeaderMap, HeaderValue, Response};
use jsonwebtoken::jwk::JwkSet;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::extract::extract_token;
use crate::verify::verify_token;

/// Supplies the current JWK set, or `None` when no keys are available (e.g.
/// the upstream endpoint is unreachable or the set has not been loaded yet).
///
/// Implementations own their caching and refresh policy; the authenticator
/// only asks for one consistent snapshot per authentication attempt.
#[async_trait]
pub trait KeySetProvider: Send + Sync {
    async fn jwk_set(&self) -> Option<JwkSet>;
}

/// A local, static key set is itself a provider.
#[async_trait]
impl KeySetProvider for JwkSet {
    async fn jwk_set(&self) -> Option<JwkSet> {
        Some(self.clone())
    }
}

/// Maps a verified token's identifier claim to an application identity.
///
/// Not-found is a normal outcome and must be `None`, never an error.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    type Identity;

    async fn find_identity(&self, identifier: &str) -> Option<Self::Identity>;
}

/// Authenticates requests by validating a bearer JWT against a JWK set and
/// resolving its identifier claim to an identity.
///
/// Stateless per call: each [`authenticate`](Self::authenticate) runs the
/// whole pipeline — extract token, obtain keys, verify, resolve — and every
/// failure along the way collapses into a missing identity. Callers never see
/// which stage failed; the failure kind is only logged at debug level.
///
/// The `with_*` mutators return a reconfigured copy and leave the receiver
/// untouched, so a base authenticator can be shared across concurrent
/// requests.
pub struct JwtAuthenticator<I> {
    key_set_provider: Arc<dyn KeySetProvider>,
    identity_resolver: Arc<dyn IdentityResolver<Identity = I>>,
    config: AuthConfig,
}

impl<I> Clone for JwtAuthenticator<I> {
    fn clone(&self) -> Self {
        Self {
            key_set_provider: Arc::clone(&self.key_set_provider),
            identity_resolver: Arc::clone(&self.identity_resolver),
            config: self.config.clone(),
        }
    }
}

impl<I> JwtAuthenticator<I> {
    pub fn new<P, R>(key_set_provider: P, identity_resolver: R) -> Self
    where
        P: KeySetProvider + 'static,
        R: IdentityResolver<Identity = I> + 'static,
    {
        Self {
            key_set_provider: Arc::new(key_set_provider),
            identity_resolver: Arc::new(identity_resolver),
            config: AuthConfig::default(),
        }
    }

    /// Replaces the whole configuration.
    pub fn with_config(&self, config: AuthConfig) -> Self {
        Self {
            config,
            ..self.clone()
        }
    }

    /// Returns a copy with the given HTTP authentication realm.
    pub fn with_realm(&self, realm: impl Into<String>) -> Self {
        self.with_config(self.config.with_realm(realm))
    }

    /// Returns a copy that reads the token from the given header.
    pub fn with_header_name(&self, header_name: impl Into<String>) -> Self {
        self.with_config(self.config.with_header_name(header_name))
    }

    /// Returns a copy with the given token pattern; the token must match the
    /// pattern's first capture group.
    pub fn with_header_token_pattern(&self, header_token_pattern: Regex) -> Self {
        self.with_config(self.config.with_header_token_pattern(header_token_pattern))
    }

    /// Returns a copy that uses the given claim as the identity key.
    pub fn with_identifier(&self, identifier: impl Into<String>) -> Self {
        self.with_config(self.config.with_identifier(identifier))
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Authenticates a request by its headers.
    ///
    /// Returns the resolved identity, or `None` when the request carries no
    /// token, no keys are available, the token fails verification, or no
    /// identity matches its identifier claim.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Option<I> {
        match self.try_authenticate(headers).await {
            Ok(identity) => Some(identity),
            Err(error) => {
                debug!(error = %error, "authentication failed");
                None
            }
        }
    }

    async fn try_authenticate(&self, headers: &HeaderMap) -> Result<I, AuthError> {
        let token = extract_token(headers, &self.config).ok_or(AuthError::TokenAbsent)?;

        let jwks = self
            .key_set_provider
            .jwk_set()
            .await
            .ok_or(AuthError::KeysUnavailable)?;

        let claims = verify_token(&token, &jwks)?;

        let identifier = claims
            .get(self.config.identifier())
            .and_then(claim_as_string)
            .ok_or_else(|| AuthError::ClaimMissing {
                claim: self.config.identifier().to_owned(),
            })?;

        self.identity_resolver
            .find_identity(&identifier)
            .await
            .ok_or(AuthError::IdentityNotFound)
    }

    /// Attaches the authentication challenge to a response, for use when
    /// authentication was required but absent or failed.
    ///
    /// Sets the `WWW-Authenticate` header to
    /// `<header name> realm="<realm>"`, replacing any previous value, so the
    /// operation is idempotent.
    pub fn challenge<B>(&self, mut response: Response<B>) -> Response<B> {
        let value = format!(
            "{} realm=\"{}\"",
            self.config.header_name(),
            self.config.realm()
        );
        match HeaderValue::from_str(&value) {
            Ok(value) => {
                response.headers_mut().insert(WWW_AUTHENTICATE, value);
            }
            Err(_) => {
                debug!(%value, "challenge value is not a valid header value, response left unchanged");
            }
        }
        response
    }
}

/// Subject identifiers are strings on the wire, but issuers occasionally emit
/// numeric `sub` claims; those are stringified. Anything non-scalar counts as
/// missing.
fn claim_as_string(claim: &Value) -> Option<String> {
    match claim {
        Value::String(identifier) => Some(identifier.clone()),
        Value::Number(identifier) => Some(identifier.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;
    use std::time::SystemTime;

    use async_trait::async_trait;
    use http::header::{AUTHORIZATION, WWW_AUTHENTICATE};
    use http::{HeaderMap, HeaderValue, Response};
    use jsonwebtoken::jwk::{
        AlgorithmParameters, CommonParameters, Jwk, JwkSet, KeyAlgorithm, OctetKeyParameters,
        OctetKeyType,
    };
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
    use serde_json::json;

    use super::{IdentityResolver, JwtAuthenticator, KeySetProvider};

    const SECRET: &[u8] = b"a-shared-secret-for-tests";
    const KID: &str = "42";

    #[derive(Clone, Debug, PartialEq)]
    struct User {
        id: String,
    }

    struct StaticUsers(HashMap<String, User>);

    impl StaticUsers {
        fn with_subject(subject: &str) -> Self {
            let user = User {
                id: subject.to_owned(),
            };
            Self(HashMap::from([(subject.to_owned(), user)]))
        }
    }

    #[async_trait]
    impl IdentityResolver for StaticUsers {
        type Identity = User;

        async fn find_identity(&self, identifier: &str) -> Option<User> {
            self.0.get(identifier).cloned()
        }
    }

    /// A provider that never has keys.
    struct NoKeys;

    #[async_trait]
    impl KeySetProvider for NoKeys {
        async fn jwk_set(&self) -> Option<JwkSet> {
            None
        }
    }

    fn jwks() -> JwkSet {
        JwkSet {
            keys: vec![Jwk {
                common: CommonParameters {
                    key_algorithm: Some(KeyAlgorithm::HS256),
                    key_id: Some(KID.to_string()),
                    ..CommonParameters::default()
                },
                algorithm: AlgorithmParameters::OctetKey(OctetKeyParameters {
                    key_type: OctetKeyType::Octet,
                    value: base64_url::encode(SECRET),
                }),
            }],
        }
    }

    fn sign(claims: &serde_json::Value) -> String {
        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some(KID.to_string());
        encode(&header, claims, &EncodingKey::from_secret(SECRET)).unwrap()
    }

    fn bearer_headers(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    fn unix_now() -> u64 {
        SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap()
            .as_secs()
    }

    #[tokio::test]
    async fn authenticates_a_valid_token() {
        let authenticator =
            JwtAuthenticator::new(jwks(), StaticUsers::with_subject("1234567890"));
        let token = sign(&json!({ "sub": "1234567890", "exp": unix_now() + 3600 }));

        let identity = authenticator.authenticate(&bearer_headers(&token)).await;

        assert_eq!(
            identity,
            Some(User {
                id: "1234567890".to_owned()
            })
        );
    }

    #[tokio::test]
    async fn resolves_via_a_configured_identifier_claim() {
        let authenticator =
            JwtAuthenticator::new(jwks(), StaticUsers::with_subject("john@example.org"))
                .with_identifier("email");
        let token = sign(&json!({ "sub": "1234567890", "email": "john@example.org" }));

        let identity = authenticator.authenticate(&bearer_headers(&token)).await;

        assert!(identity.is_some());
    }

    #[tokio::test]
    async fn stringifies_a_numeric_identifier_claim() {
        let authenticator = JwtAuthenticator::new(jwks(), StaticUsers::with_subject("1234567890"));
        let token = sign(&json!({ "sub": 1234567890_u64 }));

        let identity = authenticator.authenticate(&bearer_headers(&token)).await;

        assert!(identity.is_some());
    }

    #[tokio::test]
    async fn missing_header_yields_no_identity() {
        let authenticator = JwtAuthenticator::new(jwks(), StaticUsers::with_subject("1234567890"));

        assert_eq!(authenticator.authenticate(&HeaderMap::new()).await, None);
    }

    #[tokio::test]
    async fn non_matching_scheme_yields_no_identity() {
        let authenticator = JwtAuthenticator::new(jwks(), StaticUsers::with_subject("1234567890"));
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Token abc"));

        assert_eq!(authenticator.authenticate(&headers).await, None);
    }

    #[tokio::test]
    async fn unavailable_keys_yield_no_identity() {
        let authenticator =
            JwtAuthenticator::new(NoKeys, StaticUsers::with_subject("1234567890"));
        let token = sign(&json!({ "sub": "1234567890" }));

        assert_eq!(
            authenticator.authenticate(&bearer_headers(&token)).await,
            None
        );
    }

    #[tokio::test]
    async fn expired_token_yields_no_identity() {
        let authenticator = JwtAuthenticator::new(jwks(), StaticUsers::with_subject("1234567890"));
        let token = sign(&json!({ "sub": "1234567890", "exp": unix_now() - 3600 }));

        assert_eq!(
            authenticator.authenticate(&bearer_headers(&token)).await,
            None
        );
    }

    #[tokio::test]
    async fn missing_identifier_claim_yields_no_identity() {
        let authenticator = JwtAuthenticator::new(jwks(), StaticUsers::with_subject("1234567890"));
        let token = sign(&json!({ "name": "John Doe" }));

        assert_eq!(
            authenticator.authenticate(&bearer_headers(&token)).await,
            None
        );
    }

    #[tokio::test]
    async fn unknown_subject_yields_no_identity() {
        let authenticator = JwtAuthenticator::new(jwks(), StaticUsers::with_subject("someone"));
        let token = sign(&json!({ "sub": "someone-else" }));

        assert_eq!(
            authenticator.authenticate(&bearer_headers(&token)).await,
            None
        );
    }

    #[test]
    fn challenge_sets_the_www_authenticate_header() {
        let authenticator =
            JwtAuthenticator::new(jwks(), StaticUsers::with_subject("1234567890"))
                .with_realm("internal");

        let response = authenticator.challenge(Response::new(()));

        assert_eq!(
            response.headers().get(WWW_AUTHENTICATE).unwrap(),
            "Authorization realm=\"internal\""
        );
    }

    #[test]
    fn challenge_is_idempotent() {
        let authenticator = JwtAuthenticator::new(jwks(), StaticUsers::with_subject("1234567890"));

        let response = authenticator.challenge(authenticator.challenge(Response::new(())));

        let values: Vec<_> = response.headers().get_all(WWW_AUTHENTICATE).iter().collect();
        assert_eq!(values, vec!["Authorization realm=\"api\""]);
    }

    #[test]
    fn with_mutators_leave_the_receiver_untouched() {
        let base = JwtAuthenticator::new(jwks(), StaticUsers::with_subject("1234567890"));

        let reconfigured = base.with_realm("internal");

        assert_eq!(reconfigured.config().realm(), "internal");
        assert_eq!(base.config().realm(), "api");
    }
}
