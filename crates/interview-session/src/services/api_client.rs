//! Interview backend HTTP client.
//!
//! Implements [`TokenService`] and [`TerminationAuthority`] against the REST
//! backend:
//!
//! - `GET  v1/interview/{resumeId}/validate-interview`
//! - `POST v1/interview/{resumeId}/token`
//! - `POST v1/interview/{sessionId}/force-end`
//!
//! Status codes map onto [`PreJoinFailure`] variants. Response bodies and
//! transport errors are logged here and never reach the user.

use crate::config::Config;
use crate::errors::PreJoinFailure;
use crate::observability::metrics;
use crate::services::termination::{TerminationAuthority, TerminationError};
use crate::services::token_service::{Eligibility, SessionCredentials, TokenService};
use common::secret::{ExposeSecret, SecretString};
use common::types::{SessionId, SubjectId};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use std::time::Instant;
use tracing::{debug, error, instrument, warn};

/// Response of the eligibility endpoint.
#[derive(Debug, Clone, Deserialize)]
struct ValidateInterviewResponse {
    can_interview: bool,
    #[serde(default)]
    message: Option<String>,
}

/// Response of the token endpoint.
#[derive(Debug, Clone, Deserialize)]
struct TokenResponse {
    token: SecretString,
    #[serde(rename = "roomName", default)]
    room_name: Option<String>,
    #[serde(rename = "serverUrl", default)]
    server_url: Option<String>,
    #[serde(default)]
    session_id: Option<SessionId>,
}

impl From<TokenResponse> for SessionCredentials {
    fn from(response: TokenResponse) -> Self {
        Self {
            token: response.token,
            endpoint: response.server_url.filter(|url| !url.trim().is_empty()),
            room_name: response.room_name,
            session_id: response.session_id,
        }
    }
}

/// HTTP client for the interview backend.
#[derive(Clone)]
pub struct HttpInterviewApi {
    /// HTTP client with configured timeouts.
    client: Client,

    /// Base URL without trailing slash.
    base_url: String,

    /// Optional bearer token.
    api_token: Option<SecretString>,
}

impl HttpInterviewApi {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `PreJoinFailure::Unknown` if the HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self, PreJoinFailure> {
        let client = Client::builder()
            .timeout(config.api_timeout)
            .connect_timeout(config.api_connect_timeout)
            .build()
            .map_err(|e| {
                error!(target: "session.services.api_client", error = %e, "Failed to build HTTP client");
                PreJoinFailure::Unknown("HTTP client unavailable".to_string())
            })?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    async fn send(
        &self,
        endpoint: &'static str,
        request: RequestBuilder,
    ) -> Result<reqwest::Response, reqwest::Error> {
        let start = Instant::now();
        let result = self.authorize(request).send().await;
        let status = match &result {
            Ok(response) => response.status().as_u16(),
            Err(_) => 0,
        };
        metrics::record_api_request(endpoint, status, start.elapsed());
        result
    }

    /// Map a non-success status to a pre-join failure.
    async fn pre_join_failure(response: reqwest::Response) -> PreJoinFailure {
        let status = response.status();
        match status {
            StatusCode::NOT_FOUND => PreJoinFailure::NotFound,
            StatusCode::BAD_REQUEST => {
                let body = response.text().await.unwrap_or_default();
                debug!(target: "session.services.api_client", body = %body, "Backend returned bad request");
                PreJoinFailure::NotReady(None)
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                warn!(target: "session.services.api_client", status = %status, "Backend rejected credentials");
                PreJoinFailure::Unauthorized
            }
            _ => {
                warn!(target: "session.services.api_client", status = %status, "Unexpected backend response");
                PreJoinFailure::Unknown(format!("unexpected status {status}"))
            }
        }
    }
}

#[async_trait::async_trait]
impl TokenService for HttpInterviewApi {
    #[instrument(skip_all, name = "session.api.validate_interview", fields(subject_id = %subject))]
    async fn validate_interview(&self, subject: SubjectId) -> Result<Eligibility, PreJoinFailure> {
        let url = self.url(&format!("v1/interview/{subject}/validate-interview"));

        let response = self
            .send("validate_interview", self.client.get(&url))
            .await
            .map_err(|e| {
                warn!(target: "session.services.api_client", error = %e, "Eligibility request failed");
                PreJoinFailure::Unknown("backend unreachable".to_string())
            })?;

        if !response.status().is_success() {
            return Err(Self::pre_join_failure(response).await);
        }

        let body: ValidateInterviewResponse = response.json().await.map_err(|e| {
            error!(target: "session.services.api_client", error = %e, "Failed to parse eligibility response");
            PreJoinFailure::Unknown("invalid eligibility response".to_string())
        })?;

        Ok(Eligibility {
            can_interview: body.can_interview,
            message: body.message,
        })
    }

    #[instrument(skip_all, name = "session.api.acquire_session", fields(subject_id = %subject))]
    async fn acquire_session(
        &self,
        subject: SubjectId,
    ) -> Result<SessionCredentials, PreJoinFailure> {
        let url = self.url(&format!("v1/interview/{subject}/token"));

        let response = self
            .send("token", self.client.post(&url))
            .await
            .map_err(|e| {
                warn!(target: "session.services.api_client", error = %e, "Token request failed");
                PreJoinFailure::Unknown("backend unreachable".to_string())
            })?;

        if !response.status().is_success() {
            return Err(Self::pre_join_failure(response).await);
        }

        let body: TokenResponse = response.json().await.map_err(|e| {
            error!(target: "session.services.api_client", error = %e, "Failed to parse token response");
            PreJoinFailure::Unknown("invalid token response".to_string())
        })?;

        debug!(
            target: "session.services.api_client",
            room_name = ?body.room_name,
            session_id = ?body.session_id,
            "Session credentials acquired"
        );

        Ok(body.into())
    }
}

#[async_trait::async_trait]
impl TerminationAuthority for HttpInterviewApi {
    #[instrument(skip_all, name = "session.api.force_end", fields(session_id = %session_id))]
    async fn force_end_session(&self, session_id: SessionId) -> Result<(), TerminationError> {
        let url = self.url(&format!("v1/interview/{session_id}/force-end"));

        let response = self
            .send("force_end", self.client.post(&url))
            .await
            .map_err(|e| {
                warn!(target: "session.services.api_client", error = %e, "Force-end request failed");
                TerminationError::Request(e.to_string())
            })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            warn!(target: "session.services.api_client", status = %status, "Force-end rejected");
            Err(TerminationError::Rejected(status.as_u16()))
        }
    }
}
