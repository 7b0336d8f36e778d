//! Client for the external authentication microservice

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::AuthServiceConfig;
use crate::error::{AppError, Result};

/// Client for the auth service: login, token validation, premium lookup
#[derive(Clone)]
pub struct AuthClient {
    client: Client,
    base_url: String,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    #[serde(alias = "access_token")]
    token: String,
}

#[derive(Deserialize)]
struct UserIdResponse {
    id: u64,
}

#[derive(Deserialize)]
struct PremiumStatusResponse {
    #[serde(alias = "is_premium")]
    premium: bool,
}

impl AuthClient {
    pub fn new(config: &AuthServiceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    /// Exchange credentials for a bearer token
    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        let url = format!("{}/login", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&LoginRequest { email, password })
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AppError::AuthRequired);
        }
        if !status.is_success() {
            warn!(status = %status, "Auth service login failed");
            return Err(AppError::Upstream(format!(
                "auth service returned {}",
                status
            )));
        }

        let parsed: LoginResponse = response.json().await?;
        Ok(parsed.token)
    }

    /// Revalidate a stored token. Expired, rejected, and unreachable all
    /// count as invalid.
    pub async fn validate(&self, token: &str) -> bool {
        let url = format!("{}/user_history", self.base_url);
        match self.client.get(&url).bearer_auth(token).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                debug!(status = %response.status(), "Token rejected by auth service");
                false
            }
            Err(e) => {
                warn!(error = %e, "Auth service unreachable during validation");
                false
            }
        }
    }

    /// Premium flag for the token's user, fetched fresh on every call.
    /// Fails closed: any error downgrades to non-premium.
    pub async fn is_premium(&self, token: &str) -> bool {
        match self.premium_status(token).await {
            Ok(premium) => premium,
            Err(e) => {
                warn!(error = %e, "Premium check failed, treating as non-premium");
                false
            }
        }
    }

    async fn premium_status(&self, token: &str) -> Result<bool> {
        let url = format!("{}/user/id", self.base_url);
        let response = self.client.get(&url).bearer_auth(token).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Upstream(format!(
                "user id lookup returned {}",
                status
            )));
        }
        let user: UserIdResponse = response.json().await?;

        let url = format!("{}/user/{}/premium/status", self.base_url, user.id);
        let response = self.client.get(&url).bearer_auth(token).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Upstream(format!(
                "premium status lookup returned {}",
                status
            )));
        }
        let parsed: PremiumStatusResponse = response.json().await?;
        Ok(parsed.premium)
    }
}
