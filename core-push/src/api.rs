//! Push Backend Client
//!
//! Thin adapter over the host [`HttpClient`]: builds
//! `{base_url}/{organization}/{application}/{segments..}` URLs, attaches the
//! session's bearer token and maps responses onto [`ApiResponse`] or
//! [`PushError`]. It never retries; retry policy belongs to the callers.

use crate::error::{PushError, Result};
use crate::types::{DeviceId, DeviceRegistration, PushMessage};
use bridge_traits::{HttpClient, HttpMethod, HttpRequest, HttpResponse, SessionProvider};
use core_runtime::config::{ApiEndpoint, PushConfig};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Response envelope shared by every backend endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiResponse {
    #[serde(default)]
    pub entities: Vec<Value>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl ApiResponse {
    /// Decode the first entity, if there is one.
    pub fn first_entity<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        match self.entities.first() {
            Some(entity) if !entity.is_null() => Ok(Some(T::deserialize(entity)?)),
            _ => Ok(None),
        }
    }
}

#[derive(Deserialize)]
struct CreatedDevice {
    #[serde(default)]
    uuid: Option<DeviceId>,
}

#[derive(Clone)]
pub struct PushApi {
    http: Arc<dyn HttpClient>,
    session: Arc<dyn SessionProvider>,
    endpoint: ApiEndpoint,
    timeout: Duration,
}

impl PushApi {
    pub fn new(
        http: Arc<dyn HttpClient>,
        session: Arc<dyn SessionProvider>,
        endpoint: ApiEndpoint,
        timeout: Duration,
    ) -> Self {
        Self {
            http,
            session,
            endpoint,
            timeout,
        }
    }

    pub fn from_config(config: &PushConfig) -> Self {
        Self::new(
            config.http_client.clone(),
            config.session_provider.clone(),
            config.api_endpoint.clone(),
            config.request_timeout,
        )
    }

    /// `POST pushes/devices`
    ///
    /// Only the server-assigned `uuid` is read back; the returned registration
    /// is the request with that id filled in.
    pub async fn create_device(&self, device: &DeviceRegistration) -> Result<DeviceRegistration> {
        let response = self
            .request(HttpMethod::Post, Some(device), &["pushes", "devices"])
            .await?;

        let created: CreatedDevice = response.first_entity()?.ok_or_else(|| {
            PushError::UnknownResult("response contained no device entity".to_string())
        })?;

        let uuid = created.uuid.ok_or_else(|| {
            PushError::UnknownResult("device entity has no uuid".to_string())
        })?;

        Ok(DeviceRegistration {
            uuid: Some(uuid),
            ..device.clone()
        })
    }

    /// `DELETE pushes/devices/{uuid}`
    ///
    /// Any 2xx and 404 count as success (the device is gone either way) and
    /// the body is not inspected. Returns the status.
    pub async fn delete_device(&self, device_id: &DeviceId) -> Result<u16> {
        let id = device_id.to_string();
        let response = self
            .send::<()>(HttpMethod::Delete, None, &["pushes", "devices", &id])
            .await?;

        if response.is_success() || response.status == 404 {
            Ok(response.status)
        } else {
            Err(backend_error(&response))
        }
    }

    /// `POST pushes`
    pub async fn create_push(&self, message: &PushMessage) -> Result<PushMessage> {
        let response = self
            .request(HttpMethod::Post, Some(message), &["pushes"])
            .await?;

        response.first_entity()?.ok_or_else(|| {
            PushError::UnknownResult("response contained no message entity".to_string())
        })
    }

    /// Send a request and decode a successful JSON envelope.
    ///
    /// Non-2xx statuses become [`PushError::Backend`]; a 2xx without a body
    /// is treated as no response.
    pub async fn request<B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        body: Option<&B>,
        segments: &[&str],
    ) -> Result<ApiResponse> {
        let response = self.send(method, body, segments).await?;

        if !response.is_success() {
            return Err(backend_error(&response));
        }

        if response.is_empty() {
            return Err(PushError::Transport("no response data".to_string()));
        }

        Ok(serde_json::from_slice(&response.body)?)
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        body: Option<&B>,
        segments: &[&str],
    ) -> Result<HttpResponse> {
        let url = self.endpoint.url(segments);
        let mut request = HttpRequest::new(method, url.clone())
            .header("Accept", "application/json")
            .timeout(self.timeout);

        if let Some(body) = body {
            request = request
                .json(body)
                .map_err(|e| PushError::Serialization(e.to_string()))?;
        }

        if let Some(token) = self.session.access_token().await {
            request = request.bearer_token(token);
        }

        debug!(method = %method, url = %url, "Calling push backend");

        let response = self.http.execute(request).await.map_err(|e| {
            warn!(method = %method, url = %url, error = %e, "Push backend unreachable");
            PushError::Transport(e.to_string())
        })?;

        debug!(method = %method, url = %url, status = response.status, "Push backend answered");
        Ok(response)
    }
}

fn backend_error(response: &HttpResponse) -> PushError {
    let envelope: ApiResponse = serde_json::from_slice(&response.body).unwrap_or_default();
    PushError::Backend {
        status_code: response.status,
        error: envelope.error,
        description: envelope.error_description,
    }
}
