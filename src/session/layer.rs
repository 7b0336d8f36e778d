//! Session cookie middleware
//!
//! Ensures every request carries a session id: reads the `sid` cookie when
//! present, mints a fresh id otherwise, and exposes the id to handlers as a
//! request extension. Newly minted ids are set on the response.

use axum::{
    body::Body,
    http::{
        header::{COOKIE, SET_COOKIE},
        HeaderValue, Request,
    },
    response::Response,
};
use futures::future::BoxFuture;
use std::task::{Context, Poll};
use tower::{Layer, Service};

use crate::session::SessionId;

const SESSION_COOKIE: &str = "sid";

/// Session id layer
#[derive(Clone, Default)]
pub struct SessionLayer;

impl SessionLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for SessionLayer {
    type Service = SessionMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SessionMiddleware { inner }
    }
}

/// Session id middleware service
#[derive(Clone)]
pub struct SessionMiddleware<S> {
    inner: S,
}

impl<S> Service<Request<Body>> for SessionMiddleware<S>
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

    fn call(&mut self, mut request: Request<Body>) -> Self::Future {
        let existing = request
            .headers()
            .get(COOKIE)
            .and_then(|h| h.to_str().ok())
            .and_then(parse_session_cookie);

        let (session_id, is_new) = match existing {
            Some(id) => (id, false),
            None => (SessionId::new(), true),
        };

        request.extensions_mut().insert(session_id);

        let future = self.inner.call(request);
        Box::pin(async move {
            let mut response = future.await?;

            if is_new {
                let cookie = format!(
                    "{}={}; Path=/; HttpOnly; SameSite=Lax",
                    SESSION_COOKIE, session_id
                );
                if let Ok(value) = HeaderValue::from_str(&cookie) {
                    response.headers_mut().append(SET_COOKIE, value);
                }
            }

            Ok(response)
        })
    }
}

fn parse_session_cookie(header: &str) -> Option<SessionId> {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == SESSION_COOKIE).then_some(value)
        })
        .next()
        .and_then(SessionId::parse)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_session_cookie() {
        let id = SessionId::new();
        let header = format!("theme=dark; sid={}; lang=en", id);
        assert_eq!(parse_session_cookie(&header), Some(id));
    }

    #[test]
    fn test_parse_session_cookie_missing_or_invalid() {
        assert_eq!(parse_session_cookie("theme=dark"), None);
        assert_eq!(parse_session_cookie("sid=garbage"), None);
        assert_eq!(parse_session_cookie(""), None);
    }
}
