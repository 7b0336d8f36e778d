//! Access gate middleware
//!
//! Every protected route revalidates the session's bearer token against the
//! auth service. A missing, expired, or unverifiable token drops the token
//! from the session and redirects the browser to the login form.

use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Redirect, Response},
};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::debug;

use crate::auth::AuthClient;
use crate::session::{SessionId, SessionStore};

/// Access gate layer
#[derive(Clone)]
pub struct AccessGateLayer {
    sessions: Arc<dyn SessionStore>,
    auth: AuthClient,
}

impl AccessGateLayer {
    pub fn new(sessions: Arc<dyn SessionStore>, auth: AuthClient) -> Self {
        Self { sessions, auth }
    }
}

impl<S> Layer<S> for AccessGateLayer {
    type Service = AccessGateMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AccessGateMiddleware {
            inner,
            sessions: self.sessions.clone(),
            auth: self.auth.clone(),
        }
    }
}

/// Access gate middleware service
#[derive(Clone)]
pub struct AccessGateMiddleware<S> {
    inner: S,
    sessions: Arc<dyn SessionStore>,
    auth: AuthClient,
}

impl<S> Service<Request<Body>> for AccessGateMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Send + Clone + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let sessions = self.sessions.clone();
        let auth = self.auth.clone();
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let Some(session_id) = request.extensions().get::<SessionId>().copied() else {
                return Ok(redirect_to_login());
            };

            let Some(mut session) = sessions.load(&session_id).await else {
                return Ok(redirect_to_login());
            };

            let Some(token) = session.auth_token.clone() else {
                return Ok(redirect_to_login());
            };

            if auth.validate(&token).await {
                inner.call(request).await
            } else {
                debug!(session = %session_id, "Dropping invalid auth token");
                session.auth_token = None;
                sessions.save(&session_id, session).await;
                Ok(redirect_to_login())
            }
        })
    }
}

fn redirect_to_login() -> Response {
    Redirect::to("/login").into_response()
}
