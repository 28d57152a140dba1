use crate::config::settings::Settings;
use crate::domain::model::ApiKey;
use crate::utils::error::{Result, SbxError};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

const API_PREFIX: &str = "/app-api/v0";

/// Thin JSON-over-POST client for the SBX app API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    settings_url: String,
}

impl ApiClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("sbx-cli/", env!("CARGO_PKG_VERSION")))
            .danger_accept_invalid_certs(!settings.verify_tls)
            .build()?;

        Ok(Self {
            client,
            base_url: settings.api_url.clone(),
            settings_url: settings.settings_url(),
        })
    }

    pub fn endpoint(&self, route: &str) -> String {
        format!("{}{}{}", self.base_url, API_PREFIX, route)
    }

    /// POST `body` to `route` and return the parsed JSON response.
    pub async fn post(&self, key: &ApiKey, route: &str, body: &Value) -> Result<Value> {
        let url = self.endpoint(route);
        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", key.as_str())
            .header("AuthType", "API_KEY")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("API response status: {}", status);

        if status.is_success() {
            return Ok(response.json().await?);
        }

        let text = response.text().await.unwrap_or_default();
        Err(self.status_error(status, text))
    }

    pub async fn post_as<T: DeserializeOwned>(
        &self,
        key: &ApiKey,
        route: &str,
        body: &Value,
    ) -> Result<T> {
        let value = self.post(key, route, body).await?;
        serde_json::from_value(value).map_err(|e| SbxError::UnexpectedResponse {
            message: format!("{} returned an unexpected shape: {}", route, e),
        })
    }

    fn status_error(&self, status: StatusCode, text: String) -> SbxError {
        match status {
            StatusCode::UNAUTHORIZED => SbxError::Unauthorized {
                body: text,
                settings_url: self.settings_url.clone(),
            },
            StatusCode::BAD_REQUEST => {
                let message = serde_json::from_str::<Value>(&text)
                    .ok()
                    .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
                    .unwrap_or(text);
                SbxError::BadRequest { message }
            }
            StatusCode::INTERNAL_SERVER_ERROR => SbxError::ServerError,
            other => SbxError::HttpStatus {
                status: other.as_u16(),
            },
        }
    }
}
