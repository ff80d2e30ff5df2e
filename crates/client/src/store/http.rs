//! HTTP session store client
//!
//! Talks to the Pulse AI API with reqwest. Every call is bounded by the
//! configured timeout and failures are normalized into [`ClientError`].

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use uuid::Uuid;

use super::{ChatSession, CreateSessionRequest, SessionPatch, SessionStore, SessionTurn};
use crate::config::ClientConfig;
use crate::error::{ClientError, GENERIC_FAILURE};

/// API error envelope: `{"error": {"code", "message"}}`
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

pub struct HttpSessionStore {
    client: Client,
    base_url: String,
}

impl HttpSessionStore {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ClientError::Connectivity(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        Err(remote_error(status, response).await)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = self.send(request).await?;
        response.json::<T>().await.map_err(|e| {
            if e.is_timeout() {
                ClientError::Timeout
            } else {
                tracing::warn!(error = %e, "Failed to parse session store response");
                ClientError::Remote(GENERIC_FAILURE.to_string())
            }
        })
    }
}

fn transport_error(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        tracing::warn!("Session store request timed out");
        ClientError::Timeout
    } else {
        tracing::warn!(error = %err, "Session store unreachable");
        ClientError::Connectivity(err.to_string())
    }
}

async fn remote_error(status: StatusCode, response: Response) -> ClientError {
    let body = response.text().await.unwrap_or_default();
    tracing::debug!(status = %status, "Session store returned an error");

    match serde_json::from_str::<ErrorResponse>(&body) {
        Ok(parsed) if !parsed.error.message.trim().is_empty() => {
            ClientError::Remote(parsed.error.message)
        }
        _ => ClientError::Remote(GENERIC_FAILURE.to_string()),
    }
}

#[async_trait::async_trait]
impl SessionStore for HttpSessionStore {
    async fn create_session(
        &self,
        request: &CreateSessionRequest,
    ) -> Result<SessionTurn, ClientError> {
        self.send_json(self.client.post(self.url("/api/chat")).json(request))
            .await
    }

    async fn list_sessions(&self) -> Result<Vec<ChatSession>, ClientError> {
        self.send_json(self.client.get(self.url("/api/sessions")))
            .await
    }

    async fn update_session(
        &self,
        id: Uuid,
        patch: &SessionPatch,
    ) -> Result<ChatSession, ClientError> {
        let url = self.url(&format!("/api/sessions/{}", id));
        self.send_json(self.client.patch(url).json(patch)).await
    }

    async fn toggle_pin(&self, id: Uuid) -> Result<ChatSession, ClientError> {
        let url = self.url(&format!("/api/sessions/{}/pin/toggle", id));
        self.send_json(self.client.post(url)).await
    }

    async fn delete_session(&self, id: Uuid) -> Result<(), ClientError> {
        let url = self.url(&format!("/api/sessions/{}", id));
        let response = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            return Ok(());
        }

        Err(remote_error(status, response).await)
    }
}
