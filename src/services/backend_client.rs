use std::time::Duration;

use axum::http::StatusCode;
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use crate::config::Config;
use crate::error::{AppError, AppResult};

/// JSON client for the remote billing API. Requests are sent once; failures surface
/// the server's `message` when it provides one.
#[derive(Clone)]
pub struct BackendClient {
    base_url: String,
    client: reqwest::Client,
}

impl BackendClient {
    pub fn new(config: &Config) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get_json(&self, path: &str, fallback: &str) -> AppResult<Value> {
        let response = self
            .client
            .get(self.url(path))
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| {
                tracing::error!(path, error = %e, "Remote API request failed");
                e
            })?;

        read_json(response, fallback).await
    }

    pub async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        fallback: &str,
    ) -> AppResult<Value> {
        let response = self
            .client
            .request(method.clone(), self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(%method, path, error = %e, "Remote API request failed");
                e
            })?;

        read_json(response, fallback).await
    }
}

/// Text carried by an error body, if any.
pub fn error_message(body: &Value) -> Option<String> {
    ["message", "error"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

async fn read_json(response: reqwest::Response, fallback: &str) -> AppResult<Value> {
    let status =
        StatusCode::from_u16(response.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let text = response.text().await?;
    // Bodies that are empty or not JSON are treated as absent.
    let body: Value = serde_json::from_str(&text).unwrap_or(Value::Null);

    if !status.is_success() {
        let message = error_message(&body).unwrap_or_else(|| fallback.to_string());
        tracing::warn!(%status, %message, "Remote API returned an error");
        return Err(AppError::Upstream { status, message });
    }

    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_error_message_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .and(body_json(json!({"identifier": "a", "password": "b"})))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"message": "Wrong password"})),
            )
            .mount(&server)
            .await;

        let client = BackendClient::new(&Config::for_tests(&server.uri())).unwrap();
        let err = client
            .send_json(
                Method::POST,
                "/auth/login",
                &json!({"identifier": "a", "password": "b"}),
                "Invalid credentials",
            )
            .await
            .unwrap_err();

        match err {
            AppError::Upstream { status, message } => {
                assert_eq!(status, StatusCode::UNAUTHORIZED);
                assert_eq!(message, "Wrong password");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fallback_message_when_body_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/plans"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = BackendClient::new(&Config::for_tests(&server.uri())).unwrap();
        let err = client.get_json("plans", "Failed to load plans").await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to load plans");
    }

    #[test]
    fn test_url_joins_slashes() {
        let client = BackendClient::new(&Config::for_tests("http://api.local/")).unwrap();
        assert_eq!(client.url("/customers"), "http://api.local/customers");
    }
}
