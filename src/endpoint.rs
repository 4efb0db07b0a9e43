use reqwest::{Client, StatusCode, Url};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("request to chat endpoint failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("chat endpoint returned status {0} with a body that is not JSON")]
    Status(StatusCode),

    #[error("chat endpoint returned a body that is not JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("chat endpoint returned no usable response")]
    Malformed,
}

impl EndpointError {
    /// True when the endpoint could not be reached or its reply could not be read.
    pub fn is_transport(&self) -> bool {
        !matches!(self, EndpointError::Malformed)
    }
}

#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    url: Url,
}

impl ChatClient {
    pub fn new(url: Url) -> Self {
        Self {
            client: Client::new(),
            url,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// POST `{ "message": ... }` and return the reply text.
    ///
    /// The body decides the outcome whatever the status code; an error status
    /// only matters when its body is not JSON.
    pub async fn send(&self, message: &str) -> Result<String, EndpointError> {
        let response = self
            .client
            .post(self.url.clone())
            .json(&ChatRequest { message })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let body: Value = match serde_json::from_str(&body) {
            Ok(body) => body,
            Err(e) if status.is_success() => return Err(EndpointError::InvalidJson(e)),
            Err(_) => return Err(EndpointError::Status(status)),
        };

        if !status.is_success() {
            tracing::debug!(%status, "Chat endpoint answered with an error status");
        }
        extract_reply(&body).ok_or(EndpointError::Malformed)
    }
}

/// `{ "success": true, "data": { "response": "<non-empty>" } }` → the response text
fn extract_reply(body: &Value) -> Option<String> {
    if body.get("success").and_then(Value::as_bool) != Some(true) {
        return None;
    }

    body.pointer("/data/response")
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .map(str::to_owned)
}
