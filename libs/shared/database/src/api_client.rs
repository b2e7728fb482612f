use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    Method, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use shared_config::AppConfig;
use shared_models::auth::{AccessToken, ErrorBody};
use shared_models::error::ApiError;

/// JSON-over-HTTP client for the clinic backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_base_url(&config.schedule_api_url)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn get_headers(&self, auth_token: Option<&AccessToken>) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();

        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = auth_token {
            let value = HeaderValue::from_str(&token.bearer_header())
                .map_err(|_| ApiError::MissingCredential("token is not a valid header value".to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }

        Ok(headers)
    }

    /// Sends a request and decodes the JSON body into `T`.
    ///
    /// An empty success body (e.g. `204 No Content`) is decoded as JSON `null`,
    /// so callers expecting a possibly-empty payload should ask for `Option<_>`
    /// or `Value`.
    pub async fn request<T>(&self, method: Method, path: &str,
                            auth_token: Option<&AccessToken>, body: Option<Value>)
                            -> Result<T, ApiError>
    where T: DeserializeOwned {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let headers = self.get_headers(auth_token)?;

        let mut req = self.client.request(method.clone(), &url)
            .headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await.map_err(|e| {
            error!("Request to {} failed: {}", url, e);
            ApiError::Network(format!("Could not connect to the server: {}", e))
        })?;

        let status = response.status();
        let text = response.text().await
            .map_err(|e| ApiError::Network(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            let detail = error_detail(status, &text);
            error!("API error ({}) on {} {}: {}", status, method, path, detail);
            return Err(ApiError::from_status(status.as_u16(), detail));
        }

        let payload = if text.trim().is_empty() { "null" } else { text.as_str() };
        serde_json::from_str::<T>(payload).map_err(|e| {
            error!("Failed to decode response from {} {}: {}", method, path, e);
            ApiError::Decode(e.to_string())
        })
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}

/// Prefers the backend's `detail` field, then the raw body, then the reason phrase.
fn error_detail(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(message) = parsed.message() {
            return message;
        }
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }

    status.canonical_reason().unwrap_or("Unknown error").to_string()
}
