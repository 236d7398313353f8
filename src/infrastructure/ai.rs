use crate::domain::{CategoryResult, DetectionResult};
use async_trait::async_trait;
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("AI request failed: {0}")]
    RequestFailed(String),
    #[error("Rate limited")]
    RateLimited,
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Reads an email and reports whether it concerns a subscription.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubscriptionDetector: Send + Sync {
    async fn detect(&self, email_text: &str) -> Result<DetectionResult, ServiceError>;
}

/// Assigns a category label to a named service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoryClassifier: Send + Sync {
    async fn classify(&self, name: &str, description: &str)
        -> Result<CategoryResult, ServiceError>;
}

/// HTTP client for the hosted detection/categorization flows.
///
/// Each call is a single request; retrying is left to the caller.
pub struct AiServiceClient {
    client: Client,
    base_url: String,
}

impl AiServiceClient {
    pub fn new(
        base_url: String,
        api_key: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let mut headers = header::HeaderMap::new();
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            let auth_value = header::HeaderValue::from_str(&format!("Bearer {}", key))
                .map_err(|e| {
                    ServiceError::InvalidConfig(format!("Invalid API key format: {}", e))
                })?;
            headers.insert(header::AUTHORIZATION, auth_value);
        }
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| {
                ServiceError::InvalidConfig(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post_flow<T: DeserializeOwned>(
        &self,
        flow: &str,
        body: serde_json::Value,
    ) -> Result<T, ServiceError> {
        let resp = self
            .client
            .post(format!("{}/{}", self.base_url, flow))
            .json(&body)
            .send()
            .await
            .map_err(|e| ServiceError::RequestFailed(e.to_string()))?;

        let status = resp.status();
        if status.as_u16() == 429 {
            return Err(ServiceError::RateLimited);
        }

        if !status.is_success() {
            let error_text = resp
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ServiceError::RequestFailed(format!(
                "{} returned {}: {}",
                flow, status, error_text
            )));
        }

        resp.json::<T>()
            .await
            .map_err(|e| ServiceError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl SubscriptionDetector for AiServiceClient {
    async fn detect(&self, email_text: &str) -> Result<DetectionResult, ServiceError> {
        self.post_flow("detect-subscription", json!({ "emailContent": email_text }))
            .await
    }
}

#[async_trait]
impl CategoryClassifier for AiServiceClient {
    async fn classify(
        &self,
        name: &str,
        description: &str,
    ) -> Result<CategoryResult, ServiceError> {
        self.post_flow(
            "categorize-subscription",
            json!({
                "subscriptionName": name,
                "subscriptionDescription": description,
            }),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_trims_trailing_slash() {
        let client = AiServiceClient::new(
            "http://localhost:3400/".to_string(),
            Some("key"),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(client.base_url, "http://localhost:3400");
    }

    #[test]
    fn new_rejects_unprintable_api_key() {
        let result = AiServiceClient::new(
            "http://localhost:3400".to_string(),
            Some("bad\nkey"),
            Duration::from_secs(5),
        );
        assert!(matches!(result, Err(ServiceError::InvalidConfig(_))));
    }
}
