//! HTTP implementation of the [`StoreGateway`] port.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, trace};

use super::dto::envelope;
use crate::error::SyncError;
use crate::port::{StoreAction, StoreGateway};

/// Posts action envelopes to a single store endpoint.
pub struct HttpStoreGateway {
    client: Client,
    url: String,
    secret: String,
}

impl HttpStoreGateway {
    /// Build a gateway with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(url: String, secret: String, timeout: Duration) -> Result<Self, SyncError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url,
            secret,
        })
    }
}

#[async_trait]
impl StoreGateway for HttpStoreGateway {
    async fn call(&self, action: &StoreAction) -> Result<Value, SyncError> {
        let body = envelope(action)?;
        debug!(action = action.name(), "Calling store");

        let response = self
            .client
            .post(&self.url)
            .header("x-api-key", &self.secret)
            .bearer_auth(&self.secret)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(SyncError::Unauthorized {
                status: status.as_u16(),
            });
        }
        let text = response.text().await?;
        if !status.is_success() {
            return Err(SyncError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        trace!(action = action.name(), bytes = text.len(), "Store responded");
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| SyncError::Response(e.to_string()))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
