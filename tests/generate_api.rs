//! Functional tests for the image generation routes

mod common;

use axum::http::StatusCode;
use serde_json::json;
use wiremock::{
    matchers::{method, path},
    Mock, ResponseTemplate,
};

const FLUX_PATH: &str = "/black-forest-labs/FLUX.1-dev";

#[tokio::test]
async fn test_generate_image_with_flux_succeeds() {
    let app = common::spawn_app().await;
    common::mock_auth_ok(&app.upstream).await;
    common::mock_premium(&app.upstream, true).await;
    Mock::given(method("POST"))
        .and(path(FLUX_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(common::png_bytes()))
        .mount(&app.upstream)
        .await;

    let cookie = common::login(&app).await;
    let response = common::post_json(
        &app,
        &cookie,
        "/generate-image",
        json!({ "prompt": "a cat", "generator": "flux" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    let name = body["image_url"].as_str().unwrap().to_string();
    assert!(name.starts_with("flux_image_"), "got {}", name);
    assert!(name.ends_with(".png"));

    // The stored asset is retrievable and decodes as a valid image
    let download = common::get(&app, &cookie, &format!("/download-image/{}", name)).await;
    assert_eq!(download.status(), StatusCode::OK);
    let bytes = common::body_bytes(download).await;
    assert!(image::load_from_memory(&bytes).is_ok());
}

#[tokio::test]
async fn test_unknown_generator_rejected_before_any_network_call() {
    let app = common::spawn_app().await;
    common::mock_auth_ok(&app.upstream).await;
    // No provider mocks mounted on purpose

    let cookie = common::login(&app).await;
    let response = common::post_json(
        &app,
        &cookie,
        "/generate-image",
        json!({ "prompt": "a cat", "generator": "bogus" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "Invalid generator selected");
    assert_eq!(common::asset_count(&app), 0);
}

#[tokio::test]
async fn test_empty_prompt_rejected() {
    let app = common::spawn_app().await;
    common::mock_auth_ok(&app.upstream).await;

    let cookie = common::login(&app).await;
    let response = common::post_json(
        &app,
        &cookie,
        "/generate-image",
        json!({ "prompt": "   ", "generator": "flux" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_non_premium_gets_403_and_no_file() {
    let app = common::spawn_app().await;
    common::mock_auth_ok(&app.upstream).await;
    common::mock_premium(&app.upstream, false).await;
    // The provider must never be reached
    Mock::given(method("POST"))
        .and(path(FLUX_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(common::png_bytes()))
        .expect(0)
        .mount(&app.upstream)
        .await;

    let cookie = common::login(&app).await;
    let response = common::post_json(
        &app,
        &cookie,
        "/generate-image",
        json!({ "prompt": "a cat", "generator": "flux" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(common::asset_count(&app), 0);
}

#[tokio::test]
async fn test_commercial_provider_allowed_without_premium() {
    let app = common::spawn_app().await;
    common::mock_auth_ok(&app.upstream).await;
    // No premium mocks: the commercial provider never triggers the lookup

    let image_url = format!("{}/downloads/img.png", app.upstream.uri());
    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": [{ "url": image_url }] })),
        )
        .mount(&app.upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/downloads/img.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(common::png_bytes()))
        .mount(&app.upstream)
        .await;

    let cookie = common::login(&app).await;
    let response = common::post_json(
        &app,
        &cookie,
        "/generate-image",
        json!({ "prompt": "a cat", "generator": "openai" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert!(body["image_url"]
        .as_str()
        .unwrap()
        .starts_with("openai_image_"));
}

#[tokio::test]
async fn test_history_grows_by_one_after_generation() {
    let app = common::spawn_app().await;
    common::mock_auth_ok(&app.upstream).await;
    common::mock_premium(&app.upstream, true).await;
    Mock::given(method("POST"))
        .and(path(FLUX_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(common::png_bytes()))
        .mount(&app.upstream)
        .await;

    let cookie = common::login(&app).await;

    let before = common::body_json(common::get(&app, &cookie, "/conversation-history").await)
        .await
        .as_array()
        .unwrap()
        .len();

    let response = common::post_json(
        &app,
        &cookie,
        "/generate-image",
        json!({ "prompt": "a cat", "generator": "flux" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let after = common::body_json(common::get(&app, &cookie, "/conversation-history").await).await;
    let entries = after.as_array().unwrap();
    assert_eq!(entries.len(), before + 1);

    let last = entries.last().unwrap();
    assert_eq!(last["prompt"], "a cat");
    assert_eq!(last["generator"], "flux");
}

#[tokio::test]
async fn test_upstream_failure_maps_to_500_without_detail() {
    let app = common::spawn_app().await;
    common::mock_auth_ok(&app.upstream).await;
    common::mock_premium(&app.upstream, true).await;
    Mock::given(method("POST"))
        .and(path(FLUX_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("model is loading"))
        .mount(&app.upstream)
        .await;

    let cookie = common::login(&app).await;
    let response = common::post_json(
        &app,
        &cookie,
        "/generate-image",
        json!({ "prompt": "a cat", "generator": "flux" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = common::body_json(response).await;
    // Upstream detail stays in the logs
    assert_eq!(body["error"], "Media generation failed");
    assert_eq!(common::asset_count(&app), 0);
}

#[tokio::test]
async fn test_regenerate_perturbs_provider_prompt_but_stores_original() {
    let app = common::spawn_app().await;
    common::mock_auth_ok(&app.upstream).await;
    Mock::given(method("POST"))
        .and(path(FLUX_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(common::png_bytes()))
        .mount(&app.upstream)
        .await;

    let cookie = common::login(&app).await;
    let response = common::post_json(
        &app,
        &cookie,
        "/regenerate-image",
        json!({ "prompt": "a cat", "generator": "flux" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // The provider saw the prompt with a nonce appended
    let requests = app.upstream.received_requests().await.unwrap();
    let sent = requests
        .iter()
        .find(|r| r.url.path() == FLUX_PATH)
        .expect("provider should have been called");
    let payload: serde_json::Value = serde_json::from_slice(&sent.body).unwrap();
    let inputs = payload["inputs"].as_str().unwrap();
    assert!(inputs.starts_with("a cat ["), "got {:?}", inputs);
    assert_ne!(inputs, "a cat");

    // The ledger keeps the original prompt
    let history = common::body_json(common::get(&app, &cookie, "/conversation-history").await).await;
    assert_eq!(history.as_array().unwrap().last().unwrap()["prompt"], "a cat");
}
