use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use reqwest::Client;
use tracing::warn;
use url::Url;

use crate::authenticator::KeySetProvider;
use crate::error::AuthError;

const CACHE_KEY: &str = "jwk_set";

/// Builder for configuring a [`RemoteJwkSet`] with optional caching.
pub struct RemoteJwkSetBuilder {
    url: Url,
    cache_time_to_live: Option<Duration>,
}

impl RemoteJwkSetBuilder {
    /// Creates a new builder with the given JWKS URL.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            cache_time_to_live: None,
        }
    }

    /// Enables caching to avoid re-fetching the remote JWK set on every
    /// authentication request. The cache expires after `time_to_live`, which
    /// bounds how long a rotated-out key is still accepted.
    pub fn with_cache(mut self, time_to_live: Duration) -> Self {
        self.cache_time_to_live = Some(time_to_live);
        self
    }

    /// Builds the `RemoteJwkSet` with the configured options.
    pub fn build(self) -> RemoteJwkSet {
        let cache = self.cache_time_to_live.map(|time_to_live| {
            moka::future::Cache::builder()
                .max_capacity(1)
                .time_to_live(time_to_live)
                .build()
        });

        RemoteJwkSet {
            http_client: Client::new(),
            url: self.url,
            cache,
        }
    }
}

/// Key set provider that fetches the JWK set from a remote URL, typically an
/// OpenID Connect provider's `.well-known/jwks.json` endpoint.
///
/// Fetch failures are logged and reported as an absent key set, so an
/// unreachable endpoint fails authentication rather than the request.
#[derive(Clone)]
pub struct RemoteJwkSet {
    http_client: Client,
    url: Url,
    cache: Option<moka::future::Cache<String, JwkSet>>,
}

impl RemoteJwkSet {
    /// Creates a builder for configuring a `RemoteJwkSet`.
    pub fn builder(url: Url) -> RemoteJwkSetBuilder {
        RemoteJwkSetBuilder::new(url)
    }

    async fn fetch(&self) -> Result<JwkSet, AuthError> {
        let response = self.http_client.get(self.url.clone()).send().await?;

        if !response.status().is_success() {
            return Err(AuthError::JwkSetStatus {
                status_code: response.status(),
            });
        }

        let jwk_set: JwkSet = response.json().await?;
        Ok(jwk_set)
    }
}

#[async_trait]
impl KeySetProvider for RemoteJwkSet {
    async fn jwk_set(&self) -> Option<JwkSet> {
        if let Some(cache) = &self.cache {
            if let Some(jwk_set) = cache.get(CACHE_KEY).await {
                return Some(jwk_set);
            }
        }

        match self.fetch().await {
            Ok(jwk_set) => {
                if let Some(cache) = &self.cache {
                    cache.insert(CACHE_KEY.to_owned(), jwk_set.clone()).await;
                }
                Some(jwk_set)
            }
            Err(error) => {
                warn!(url = %self.url, error = %error, "failed to fetch JWK set");
                None
            }
        }
    }
}
