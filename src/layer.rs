use std::sync::Arc;
use std::task::{Context, Poll};

use axum::extract::Request;
use axum::response::{IntoResponse, Response};
use futures::future::BoxFuture;
use http::StatusCode;
use tower::{Layer, Service};

use crate::authenticator::JwtAuthenticator;

/// Request extension carrying the authenticated identity, inserted by
/// [`AuthenticationService`] before the inner service runs.
#[derive(Clone, Debug)]
pub struct CurrentIdentity<I>(pub I);

/// Tower layer that guards its inner service with a [`JwtAuthenticator`].
///
/// Requests that do not authenticate are answered with `401 Unauthorized`
/// and the configured `WWW-Authenticate` challenge; authenticated requests
/// are forwarded with a [`CurrentIdentity`] extension.
pub struct AuthenticationLayer<I> {
    authenticator: Arc<JwtAuthenticator<I>>,
}

impl<I> AuthenticationLayer<I> {
    pub fn new(authenticator: JwtAuthenticator<I>) -> Self {
        Self {
            authenticator: Arc::new(authenticator),
        }
    }
}

impl<I> Clone for AuthenticationLayer<I> {
    fn clone(&self) -> Self {
        Self {
            authenticator: Arc::clone(&self.authenticator),
        }
    }
}

impl<S, I> Layer<S> for AuthenticationLayer<I> {
    type Service = AuthenticationService<S, I>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthenticationService {
            inner,
            authenticator: Arc::clone(&self.authenticator),
        }
    }
}

pub struct AuthenticationService<S, I> {
    inner: S,
    authenticator: Arc<JwtAuthenticator<I>>,
}

impl<S: Clone, I> Clone for AuthenticationService<S, I> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            authenticator: Arc::clone(&self.authenticator),
        }
    }
}

impl<S, I> Service<Request> for AuthenticationService<S, I>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    I: Clone + Send + Sync + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        // Move the original service into the closure instead of its clone. This makes sure that the original service is
        // `call`ed instead of the cloned one, which might not be ready yet (`poll_ready` hasn't been called on the
        // clone yet).
        // See [docs](https://docs.rs/tower/latest/tower/trait.Service.html#be-careful-when-cloning-inner-services).
        let inner_clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, inner_clone);

        let authenticator = Arc::clone(&self.authenticator);
        Box::pin(async move {
            match authenticator.authenticate(req.headers()).await {
                Some(identity) => {
                    req.extensions_mut().insert(CurrentIdentity(identity));
                    inner.call(req).await
                }
                None => Ok(authenticator.challenge(StatusCode::UNAUTHORIZED.into_response())),
            }
        })
    }
}
