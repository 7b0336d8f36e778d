//! Shared harness: the real router wired to wiremock doubles for every
//! external service, with a temporary asset directory.

// Not every test target uses every helper.
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use image::{ImageBuffer, ImageFormat, Rgba};
use media_gen_gateway::{
    api, auth::AuthClient, config::Settings, provider::ProviderRegistry,
    session::MemorySessionStore, storage::AssetStore, AppState,
};
use serde_json::{json, Value};
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub upstream: MockServer,
    pub assets_path: PathBuf,
    _assets_dir: TempDir,
}

pub async fn spawn_app() -> TestApp {
    let upstream = MockServer::start().await;
    let assets_dir = tempfile::tempdir().unwrap();

    let mut settings = Settings::default();
    settings.auth.api_url = upstream.uri();
    settings.inference.base_url = upstream.uri();
    settings.openai.base_url = upstream.uri();
    settings.predictions.base_url = upstream.uri();
    settings.predictions.poll_interval_ms = 10;
    settings.predictions.poll_deadline_ms = 2_000;
    settings.storage.base_path = assets_dir.path().to_string_lossy().to_string();

    let assets = AssetStore::new(assets_dir.path());
    let providers = Arc::new(ProviderRegistry::from_settings(&settings).unwrap());
    let sessions = Arc::new(MemorySessionStore::new());
    let auth = AuthClient::new(&settings.auth).unwrap();

    let state = Arc::new(AppState {
        settings,
        providers,
        sessions,
        assets,
        auth,
    });
    let router = api::routes::create_router(state.clone()).await;

    TestApp {
        router,
        state,
        upstream,
        assets_path: assets_dir.path().to_path_buf(),
        _assets_dir: assets_dir,
    }
}

/// A small but fully valid PNG
pub fn png_bytes() -> Vec<u8> {
    let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
        ImageBuffer::from_pixel(2, 2, Rgba([120, 10, 200, 255]));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

/// Mock a working auth service: login issues a token, validation accepts it
pub async fn mock_auth_ok(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "tok-1" })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/user_history"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(server)
        .await;
}

/// Mock the premium lookup pair
pub async fn mock_premium(server: &MockServer, premium: bool) {
    Mock::given(method("GET"))
        .and(path("/user/id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 7 })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/user/7/premium/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "premium": premium })))
        .mount(server)
        .await;
}

/// Submit the login form with a raw urlencoded body
pub async fn post_login_form(app: &TestApp, body: &str) -> Response {
    app.router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/login")
                .header(
                    header::CONTENT_TYPE,
                    "application/x-www-form-urlencoded",
                )
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

/// Log in through the real form handler and return the session cookie
pub async fn login(app: &TestApp) -> String {
    let response = post_login_form(app, "email=user%40example.com&password=hunter2").await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER, "login should redirect");

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("login should set a session cookie")
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

pub async fn post_json(app: &TestApp, cookie: &str, uri: &str, body: Value) -> Response {
    app.router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::COOKIE, cookie)
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

pub async fn get(app: &TestApp, cookie: &str, uri: &str) -> Response {
    app.router
        .clone()
        .oneshot(
            Request::builder()
                .uri(uri)
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Number of files currently in the asset directory
pub fn asset_count(app: &TestApp) -> usize {
    match std::fs::read_dir(&app.assets_path) {
        Ok(entries) => entries.count(),
        Err(_) => 0,
    }
}
