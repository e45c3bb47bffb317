use http::StatusCode;

/// Internal failure taxonomy of the authentication pipeline.
///
/// None of these variants ever reach a caller of
/// [`JwtAuthenticator::authenticate`](crate::JwtAuthenticator::authenticate):
/// every failure collapses to a missing identity there. The distinction only
/// feeds debug logging.
#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub(crate) enum AuthError {
    #[error("no token in the configured request header")]
    TokenAbsent,
    #[error("no JWK set available")]
    KeysUnavailable,
    #[error("no usable JWK matches the token's key id and algorithm")]
    KeyNotFound,
    #[error("failed to build a decoding key from the JWK")]
    InvalidJwk(#[source] jsonwebtoken::errors::Error),
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token has expired")]
    TokenExpired,
    #[error("token is not yet valid")]
    TokenNotYetValid,
    #[error("token is malformed")]
    MalformedToken(#[source] jsonwebtoken::errors::Error),
    #[error("verified payload has no usable `{claim}` claim")]
    ClaimMissing { claim: String },
    #[error("no identity matches the token's identifier claim")]
    IdentityNotFound,
    #[error("failed to fetch JWK set")]
    JwkSetRequest(#[from] reqwest::Error),
    #[error("received error response when fetching JWK set: {status_code}")]
    JwkSetStatus { status_code: StatusCode },
}
