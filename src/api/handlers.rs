//! Route handlers

use axum::{
    extract::{Extension, Path, State},
    http::header,
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{AppError, Result};
use crate::provider::{MediaRequest, ProviderId};
use crate::session::{GenerationRecord, HistoryEntry, SessionData, SessionId};
use crate::storage::png_data_url;
use crate::AppState;

#[derive(Deserialize)]
pub struct GenerateImageBody {
    pub prompt: String,
    pub generator: String,
}

#[derive(Deserialize)]
pub struct UpscaleBody {
    pub image_path: String,
}

#[derive(Deserialize)]
pub struct VideoBody {
    pub image_url: String,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct ImageUrlResponse {
    pub image_url: String,
}

#[derive(Serialize)]
pub struct OutputUrlResponse {
    pub output_url: String,
}

#[derive(Serialize)]
pub struct VideoUrlResponse {
    pub video_url: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// GET / - home page, seeds an empty conversation on first visit
pub async fn index(
    State(state): State<Arc<AppState>>,
    Extension(session_id): Extension<SessionId>,
) -> Html<&'static str> {
    if state.sessions.load(&session_id).await.is_none() {
        state
            .sessions
            .save(&session_id, SessionData::default())
            .await;
    }
    Html(include_str!("../../static/index.html"))
}

/// Resolve the `generator` tag, rejecting anything outside the closed set of
/// image generators before any network call happens.
fn resolve_image_generator(tag: &str) -> Result<ProviderId> {
    let provider_id: ProviderId = tag.parse()?;
    if !provider_id.is_image_generator() {
        return Err(AppError::UnknownGenerator);
    }
    Ok(provider_id)
}

async fn run_image_generation(
    state: &AppState,
    provider_id: ProviderId,
    prompt: &str,
) -> Result<String> {
    let provider = state.providers.get(provider_id).ok_or_else(|| {
        AppError::Internal(format!("no adapter registered for {}", provider_id))
    })?;

    let bytes = provider.generate(&MediaRequest::from_prompt(prompt)).await?;
    state.assets.save_image(&bytes, provider_id.as_str()).await
}

/// POST /generate-image
pub async fn generate_image(
    State(state): State<Arc<AppState>>,
    Extension(session_id): Extension<SessionId>,
    Json(body): Json<GenerateImageBody>,
) -> Result<Json<ImageUrlResponse>> {
    let provider_id = resolve_image_generator(&body.generator)?;

    if body.prompt.trim().is_empty() {
        return Err(AppError::InvalidRequest(
            "prompt must not be empty".to_string(),
        ));
    }

    let mut session = state.sessions.load(&session_id).await.unwrap_or_default();

    if provider_id.requires_premium() {
        let token = session.auth_token.clone().ok_or(AppError::AuthRequired)?;
        if !state.auth.is_premium(&token).await {
            return Err(AppError::PremiumRequired);
        }
    }

    let asset_name = run_image_generation(&state, provider_id, &body.prompt).await?;

    session.records.push(GenerationRecord {
        prompt: body.prompt.clone(),
        provider: provider_id,
        asset_name: asset_name.clone(),
    });
    state.sessions.save(&session_id, session).await;

    info!(provider = %provider_id, asset = %asset_name, "Generated image");
    Ok(Json(ImageUrlResponse {
        image_url: asset_name,
    }))
}

/// POST /regenerate-image
///
/// Identical prompts can hit upstream caches and return the same image, so
/// the provider sees the prompt with a short random nonce appended. The
/// stored record keeps the original prompt.
pub async fn regenerate_image(
    State(state): State<Arc<AppState>>,
    Extension(session_id): Extension<SessionId>,
    Json(body): Json<GenerateImageBody>,
) -> Result<Json<ImageUrlResponse>> {
    let provider_id = resolve_image_generator(&body.generator)?;

    if body.prompt.trim().is_empty() {
        return Err(AppError::InvalidRequest(
            "prompt must not be empty".to_string(),
        ));
    }

    let perturbed = format!("{} [{}]", body.prompt, prompt_nonce());
    let asset_name = run_image_generation(&state, provider_id, &perturbed).await?;

    let mut session = state.sessions.load(&session_id).await.unwrap_or_default();
    session.records.push(GenerationRecord {
        prompt: body.prompt.clone(),
        provider: provider_id,
        asset_name: asset_name.clone(),
    });
    state.sessions.save(&session_id, session).await;

    info!(provider = %provider_id, asset = %asset_name, "Regenerated image");
    Ok(Json(ImageUrlResponse {
        image_url: asset_name,
    }))
}

/// POST /upscale-image
pub async fn upscale_image(
    State(state): State<Arc<AppState>>,
    Extension(session_id): Extension<SessionId>,
    Json(body): Json<UpscaleBody>,
) -> Result<Json<OutputUrlResponse>> {
    if body.image_path.trim().is_empty() {
        return Err(AppError::InvalidRequest(
            "image_path must not be empty".to_string(),
        ));
    }

    // 404 on an unknown source asset, before any provider call
    let source = state.assets.read(&body.image_path).await?;

    let provider = state
        .providers
        .get(ProviderId::Upscale)
        .ok_or_else(|| AppError::Internal("no upscale adapter registered".to_string()))?;

    let bytes = provider
        .generate(&MediaRequest::from_image(png_data_url(&source)))
        .await?;
    let asset_name = state.assets.save_image(&bytes, "upscaled").await?;

    let mut session = state.sessions.load(&session_id).await.unwrap_or_default();
    session.records.push(GenerationRecord {
        prompt: body.image_path.clone(),
        provider: ProviderId::Upscale,
        asset_name: asset_name.clone(),
    });
    state.sessions.save(&session_id, session).await;

    info!(asset = %asset_name, source = %body.image_path, "Upscaled image");
    Ok(Json(OutputUrlResponse {
        output_url: asset_name,
    }))
}

/// POST /generate-video
pub async fn generate_video(
    State(state): State<Arc<AppState>>,
    Extension(session_id): Extension<SessionId>,
    Json(body): Json<VideoBody>,
) -> Result<Json<VideoUrlResponse>> {
    if body.image_url.trim().is_empty() {
        return Err(AppError::InvalidRequest(
            "image_url must not be empty".to_string(),
        ));
    }

    let source = match state.assets.read(&body.image_url).await {
        Ok(bytes) => bytes,
        Err(AppError::AssetNotFound(_)) => {
            return Err(AppError::InvalidRequest(
                "unknown source image".to_string(),
            ))
        }
        Err(e) => return Err(e),
    };

    let provider = state
        .providers
        .get(ProviderId::Video)
        .ok_or_else(|| AppError::Internal("no video adapter registered".to_string()))?;

    let bytes = provider
        .generate(&MediaRequest::from_image(png_data_url(&source)))
        .await?;
    let asset_name = state.assets.save_video(&bytes).await?;

    let mut session = state.sessions.load(&session_id).await.unwrap_or_default();
    session.videos.push(asset_name.clone());
    state.sessions.save(&session_id, session).await;

    info!(asset = %asset_name, source = %body.image_url, "Generated video");
    Ok(Json(VideoUrlResponse {
        video_url: asset_name,
    }))
}

/// GET /conversation-history
pub async fn conversation_history(
    State(state): State<Arc<AppState>>,
    Extension(session_id): Extension<SessionId>,
) -> Result<Json<Vec<HistoryEntry>>> {
    let session = state.sessions.load(&session_id).await.unwrap_or_default();
    Ok(Json(session.history()))
}

/// GET /download-image/:name
pub async fn download_image(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Response> {
    let bytes = state.assets.read(&name).await?;

    let content_type = if name.ends_with(".mp4") {
        "video/mp4"
    } else {
        "image/png"
    };

    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}

/// POST /clear-session
///
/// Deletes every asset the session references (best effort), then discards
/// all session state. The auth token goes with it: clearing the
/// conversation also logs the user out.
pub async fn clear_session(
    State(state): State<Arc<AppState>>,
    Extension(session_id): Extension<SessionId>,
) -> Result<Json<MessageResponse>> {
    if let Some(session) = state.sessions.load(&session_id).await {
        for record in &session.records {
            if let Err(e) = state.assets.delete(&record.asset_name).await {
                warn!(asset = %record.asset_name, error = %e, "Failed to delete asset during clear");
            }
        }
        for video in &session.videos {
            if let Err(e) = state.assets.delete(video).await {
                warn!(asset = %video, error = %e, "Failed to delete asset during clear");
            }
        }
    }

    state.sessions.delete(&session_id).await;

    Ok(Json(MessageResponse {
        message: "Session cleared".to_string(),
    }))
}

const LOGIN_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Log in</title><link rel="stylesheet" href="/static/style.css"></head>
<body>
<h1>Log in</h1>
{flash}
<form method="post" action="/login">
  <label>Email <input type="email" name="email" required></label>
  <label>Password <input type="password" name="password" required></label>
  <button type="submit">Log in</button>
</form>
<p>No account? <a href="/register">Register</a></p>
</body>
</html>
"#;

fn render_login(error: Option<&str>) -> Html<String> {
    let flash = match error {
        Some(message) => format!("<p class=\"error\">{}</p>", message),
        None => String::new(),
    };
    Html(LOGIN_PAGE.replace("{flash}", &flash))
}

/// GET /login
pub async fn login_form() -> Html<String> {
    render_login(None)
}

/// POST /login
pub async fn login_submit(
    State(state): State<Arc<AppState>>,
    Extension(session_id): Extension<SessionId>,
    Form(form): Form<LoginForm>,
) -> Response {
    match state.auth.login(&form.email, &form.password).await {
        Ok(token) => {
            let mut session = state.sessions.load(&session_id).await.unwrap_or_default();
            session.auth_token = Some(token);
            state.sessions.save(&session_id, session).await;
            info!(session = %session_id, "Login succeeded");
            Redirect::to("/").into_response()
        }
        Err(AppError::AuthRequired) => {
            render_login(Some("Invalid email or password")).into_response()
        }
        Err(e) => {
            warn!(error = %e, "Login request failed");
            render_login(Some("Login is unavailable right now, try again later")).into_response()
        }
    }
}

/// GET|POST /register - registration lives on the auth provider's site
pub async fn register(State(state): State<Arc<AppState>>) -> Redirect {
    Redirect::to(&state.settings.auth.register_url)
}

fn prompt_nonce() -> String {
    let mut rng = rand::thread_rng();
    format!("{:06x}", rng.gen_range(0..0x1000000))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_image_generator() {
        assert_eq!(
            resolve_image_generator("flux").unwrap(),
            ProviderId::Flux
        );
        assert_eq!(
            resolve_image_generator("phantasma-anime").unwrap(),
            ProviderId::PhantasmaAnime
        );
    }

    #[test]
    fn test_resolve_rejects_unknown_and_non_image_tags() {
        assert!(matches!(
            resolve_image_generator("bogus"),
            Err(AppError::UnknownGenerator)
        ));
        // Dedicated routes exist for these; the generator field rejects them.
        assert!(matches!(
            resolve_image_generator("upscale"),
            Err(AppError::UnknownGenerator)
        ));
        assert!(matches!(
            resolve_image_generator("video"),
            Err(AppError::UnknownGenerator)
        ));
    }

    #[test]
    fn test_prompt_nonce_is_short_hex() {
        let nonce = prompt_nonce();
        assert_eq!(nonce.len(), 6);
        assert!(nonce.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_login_page_flash() {
        let Html(page) = render_login(Some("nope"));
        assert!(page.contains("<p class=\"error\">nope</p>"));

        let Html(page) = render_login(None);
        assert!(!page.contains("class=\"error\""));
    }
}
