use std::str::FromStr;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};

use crate::error::AuthError;

/// A verified token payload: claim name to claim value. Exists only after
/// signature and time-claim checks have passed.
pub type Claims = Map<String, Value>;

/// Verifies a compact JWT against a JWK set and returns its payload.
///
/// The token header names the key (`kid`) and algorithm; the matching JWK is
/// looked up in the set and must agree on the algorithm if it declares one.
/// `exp` and `nbf` are validated with zero leeway when present; audience and
/// issuer are not this crate's concern. Every way the input can be wrong is
/// an error value, never a panic.
pub(crate) fn verify_token(token: &str, jwks: &JwkSet) -> Result<Claims, AuthError> {
    // First decode just the header, without validating anything, to learn
    // which key signed the token.
    let header = decode_header(token).map_err(map_jwt_error)?;
    let kid = header.kid.ok_or(AuthError::KeyNotFound)?;
    let jwk = jwks.find(&kid).ok_or(AuthError::KeyNotFound)?;
    if !key_matches_algorithm(jwk, header.alg) {
        return Err(AuthError::KeyNotFound);
    }

    let decoding_key = decoding_key(jwk)?;

    let mut validation = Validation::new(header.alg);
    validation.validate_aud = false;
    validation.validate_nbf = true;
    validation.leeway = 0;
    validation.required_spec_claims.clear();

    let token = decode::<Claims>(token, &decoding_key, &validation).map_err(map_jwt_error)?;
    Ok(token.claims)
}

/// A JWK without an `alg` member is usable with whatever algorithm the token
/// header declares; one with `alg` must agree with it.
fn key_matches_algorithm(jwk: &Jwk, token_alg: Algorithm) -> bool {
    match jwk.common.key_algorithm {
        Some(key_alg) => {
            Algorithm::from_str(&key_alg.to_string()).is_ok_and(|alg| alg == token_alg)
        }
        None => true,
    }
}

fn decoding_key(jwk: &Jwk) -> Result<DecodingKey, AuthError> {
    match &jwk.algorithm {
        AlgorithmParameters::RSA(_)
        | AlgorithmParameters::EllipticCurve(_)
        | AlgorithmParameters::OctetKey(_) => {
            DecodingKey::from_jwk(jwk).map_err(AuthError::InvalidJwk)
        }
        _ => Err(AuthError::KeyNotFound),
    }
}

fn map_jwt_error(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        ErrorKind::ImmatureSignature => AuthError::TokenNotYetValid,
        ErrorKind::InvalidSignature => AuthError::InvalidSignature,
        ErrorKind::InvalidAlgorithm => AuthError::KeyNotFound,
        _ => AuthError::MalformedToken(err),
    }
}
