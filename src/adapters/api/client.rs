use crate::ports::{RepositoryError, RepositoryResult};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Thin JSON client for the planner backend.
#[derive(Clone)]
pub struct PlannerClient {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

impl PlannerClient {
    pub fn new(base_url: impl Into<String>, api_token: Option<String>) -> RepositoryResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("famcal/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RepositoryError::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.client.request(method, &url);
        match &self.api_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> RepositoryResult<T> {
        let response = self
            .request(Method::GET, path)
            .send()
            .await
            .map_err(|e| RepositoryError::Network(e.to_string()))?;

        let body = Self::check_status(response).await?;
        tracing::debug!("GET {} -> {} bytes", path, body.len());
        serde_json::from_str(&body).map_err(|e| {
            RepositoryError::Serialization(format!(
                "Failed to parse response: {}. Response was: {}",
                e, body
            ))
        })
    }

    /// Sends a JSON body and discards the response payload.
    pub async fn send<R: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &R,
    ) -> RepositoryResult<()> {
        let response = self
            .request(method.clone(), path)
            .json(body)
            .send()
            .await
            .map_err(|e| RepositoryError::Network(e.to_string()))?;

        Self::check_status(response).await?;
        tracing::debug!("{} {} ok", method, path);
        Ok(())
    }

    pub async fn delete(&self, path: &str) -> RepositoryResult<()> {
        let response = self
            .request(Method::DELETE, path)
            .send()
            .await
            .map_err(|e| RepositoryError::Network(e.to_string()))?;

        Self::check_status(response).await?;
        tracing::debug!("DELETE {} ok", path);
        Ok(())
    }

    async fn check_status(response: Response) -> RepositoryResult<String> {
        let status = response.status();

        match status.as_u16() {
            200..=299 => response
                .text()
                .await
                .map_err(|e| RepositoryError::Network(e.to_string())),
            401 | 403 => Err(RepositoryError::Authentication(
                "Backend rejected the API token".to_string(),
            )),
            404 => Err(RepositoryError::NotFound("Resource not found".to_string())),
            429 => {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60);
                Err(RepositoryError::RateLimit(retry_after))
            }
            _ => {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                Err(RepositoryError::Api(format!("HTTP {}: {}", status, error_text)))
            }
        }
    }
}
