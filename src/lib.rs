//! Bearer JWT authentication [middleware for `axum`](https://docs.rs/axum/latest/axum/middleware/index.html) that
//! verifies tokens against a [JSON Web Key Set (JWKS)](https://datatracker.ietf.org/doc/html/rfc7517) and resolves
//! their subject claim to an application identity.
//!
//! ## Overview
//!
//! Per request, the [`JwtAuthenticator`] runs a short-circuiting pipeline:
//!
//! 1. **Extract** a candidate token from the configured request header (by default the `Authorization` header,
//!    following the bearer scheme).
//! 2. **Obtain keys** from an injected [`KeySetProvider`] — a local [`jsonwebtoken::jwk::JwkSet`] or a
//!    [`RemoteJwkSet`] fetching e.g. your OpenID Connect provider's `.well-known/jwks.json` endpoint.
//! 3. **Verify** the token — its signature against the JWK named by the token's `kid`, plus the standard `exp` and
//!    `nbf` time claims — per the [JWT](https://datatracker.ietf.org/doc/html/rfc7519) and
//!    [JWS](https://datatracker.ietf.org/doc/html/rfc7515) specifications.
//! 4. **Resolve** the token's identifier claim (by default `sub`) to an identity through an injected
//!    [`IdentityResolver`].
//!
//! A failure at any stage — missing header, unavailable keys, unknown key, bad signature, expired token, unknown
//! subject — uniformly yields a missing identity; callers never observe which stage failed. For protected routes, the
//! [`AuthenticationLayer`] turns that missing identity into a `401 Unauthorized` response carrying a
//! `WWW-Authenticate` challenge with the configured realm.
//!
//! The authenticator is an immutable value: its `with_*` methods return a reconfigured copy, so one base instance can
//! be shared across any number of concurrent requests.
//!
//! This crate does not issue tokens, handle refresh flows, or fetch OpenID Connect discovery documents; it verifies
//! already-issued tokens only.
//!
//! ## Quickstart
//!
//! ```rust,no_run
//! use axum::{routing::get, Extension, Router};
//! use axum_jwks_auth::{
//!     AuthenticationLayer, CurrentIdentity, IdentityResolver, JwtAuthenticator, RemoteJwkSet,
//! };
//! use url::Url;
//! use std::time::Duration;
//!
//! #[derive(Clone)]
//! struct User {
//!     name: String,
//! }
//!
//! struct UserDirectory;
//!
//! #[async_trait::async_trait]
//! impl IdentityResolver for UserDirectory {
//!     type Identity = User;
//!
//!     async fn find_identity(&self, identifier: &str) -> Option<User> {
//!         // Look the subject up in your user store.
//!         Some(User { name: identifier.to_owned() })
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Fetch the JWK set from your OpenID Connect provider, re-using it for 30 seconds.
//!     let remote_jwk_set = RemoteJwkSet::builder(Url::parse("https://your.oidc.provider/.well-known/jwks.json")?)
//!         .with_cache(Duration::from_secs(30))
//!         .build();
//!
//!     let authenticator = JwtAuthenticator::new(remote_jwk_set, UserDirectory).with_realm("api");
//!
//!     let router = Router::new()
//!         .route("/protected", get(|Extension(CurrentIdentity(user)): Extension<CurrentIdentity<User>>| async move {
//!             format!("Hello {}!", user.name)
//!         }))
//!         .layer(AuthenticationLayer::new(authenticator));
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//!     axum::serve(listener, router).await?;
//!     Ok(())
//! }
//! ```

pub mod authenticator;
pub mod layer;

pub use authenticator::{IdentityResolver, JwtAuthenticator, KeySetProvider};
pub use config::AuthConfig;
pub use layer::{AuthenticationLayer, CurrentIdentity};
pub use remote_jwk_set::{RemoteJwkSet, RemoteJwkSetBuilder};

mod config;
mod error;
mod extract;
mod remote_jwk_set;
mod verify;
