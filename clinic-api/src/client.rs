use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

use crate::{
    domain::{Appointment, AppointmentId, Credentials, NewUser, Patient, ProfileData, Session},
    dto::LogoutRequest,
    error::{extract_server_message, ApiError},
    ClinicUrl,
};

/// Outbound port for the clinic backend.
///
/// Every method maps one endpoint. Collection and delete calls attach the
/// bearer token when one is supplied; logout and profile require it.
#[async_trait]
pub trait ClinicApi: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<Session, ApiError>;

    async fn register(&self, new_user: &NewUser) -> Result<Session, ApiError>;

    async fn logout(&self, token: &str) -> Result<(), ApiError>;

    async fn profile(&self, token: &str) -> Result<ProfileData, ApiError>;

    /// The server's current appointment set, in server order.
    async fn appointments(&self, token: Option<&str>) -> Result<Vec<Appointment>, ApiError>;

    async fn delete_appointment(
        &self,
        token: Option<&str>,
        id: AppointmentId,
    ) -> Result<(), ApiError>;

    async fn patients(&self, token: Option<&str>) -> Result<Vec<Patient>, ApiError>;
}

#[derive(Error, Debug)]
pub enum ClientInitError {
    #[error("invalid base URL {0:?}: must start with http:// or https://")]
    InvalidBaseUrl(String),
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct ClinicClient {
    client: Client,
    base_url: ClinicUrl,
}

impl ClinicClient {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ClientInitError> {
        let trimmed = base_url.trim();
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(ClientInitError::InvalidBaseUrl(base_url.to_string()));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: ClinicUrl::new(trimmed),
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_ref()
    }

    fn endpoint(&self, path: &str) -> String {
        self.base_url.append_path(path).as_ref().to_string()
    }

    fn with_bearer(request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder, call_name: &str) -> Result<Response, ApiError> {
        tracing::debug!("calling {}", call_name);

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::network(call_name, e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = ApiError::from_status(call_name, status.as_u16(), extract_server_message(&body));
        tracing::debug!("{} failed: {}", call_name, err);
        Err(err)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        call_name: &str,
    ) -> Result<T, ApiError> {
        let response = self.send(request, call_name).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::network(call_name, e))?;
        serde_json::from_slice::<T>(&bytes).map_err(|e| ApiError::invalid_response(call_name, e))
    }

    async fn send_without_body(
        &self,
        request: RequestBuilder,
        call_name: &str,
    ) -> Result<(), ApiError> {
        let response = self.send(request, call_name).await?;
        let _ = response.bytes().await;
        Ok(())
    }
}

#[async_trait]
impl ClinicApi for ClinicClient {
    async fn login(&self, credentials: &Credentials) -> Result<Session, ApiError> {
        self.get_json(
            self.client
                .post(self.endpoint("/auth/login"))
                .json(credentials),
            "POST /auth/login",
        )
        .await
    }

    async fn register(&self, new_user: &NewUser) -> Result<Session, ApiError> {
        self.get_json(
            self.client
                .post(self.endpoint("/auth/register"))
                .json(new_user),
            "POST /auth/register",
        )
        .await
    }

    async fn logout(&self, token: &str) -> Result<(), ApiError> {
        self.send_without_body(
            self.client
                .post(self.endpoint("/auth/logout"))
                .bearer_auth(token)
                .json(&LogoutRequest {}),
            "POST /auth/logout",
        )
        .await
    }

    async fn profile(&self, token: &str) -> Result<ProfileData, ApiError> {
        self.get_json(
            self.client
                .get(self.endpoint("/auth/profile"))
                .bearer_auth(token),
            "GET /auth/profile",
        )
        .await
    }

    async fn appointments(&self, token: Option<&str>) -> Result<Vec<Appointment>, ApiError> {
        self.get_json(
            Self::with_bearer(self.client.get(self.endpoint("/appointments")), token),
            "GET /appointments",
        )
        .await
    }

    async fn delete_appointment(
        &self,
        token: Option<&str>,
        id: AppointmentId,
    ) -> Result<(), ApiError> {
        self.send_without_body(
            Self::with_bearer(
                self.client
                    .delete(self.endpoint(&format!("/appointments/{}", id))),
                token,
            ),
            "DELETE /appointments/:id",
        )
        .await
    }

    async fn patients(&self, token: Option<&str>) -> Result<Vec<Patient>, ApiError> {
        self.get_json(
            Self::with_bearer(self.client.get(self.endpoint("/patients")), token),
            "GET /patients",
        )
        .await
    }
}
