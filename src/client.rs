//! HTTP client facade over the MES API
//!
//! Owns the `reqwest::Client`, the base URL and, after [`ApiClient::login`],
//! the bearer token attached to every data request. Endpoint paths are joined
//! onto the host with RFC 3986 rules, so `"retrabalho"` is resolved relative to
//! the host path while `"/focco/..."` replaces it.

use crate::config::ApiConfig;
use crate::error::{Error, MISSING_API_MESSAGE, Result};
use crate::types::Envelope;
use crate::utils::api_error_message;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Path of the login endpoint
const LOGIN_PATH: &str = "auth/login";

/// Session key returned by a successful login
#[derive(Debug, Deserialize)]
struct LoginResponse {
    key: String,
}

/// Authenticated client for the MES API (cloneable, the connection pool is shared)
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    login_timeout: Duration,
    token: Option<String>,
}

impl ApiClient {
    /// Create a client for the configured host
    ///
    /// # Errors
    ///
    /// Returns an error if the host is not a valid http(s) URL or the HTTP
    /// client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let base_url = config.base_url()?;

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url,
            login_timeout: config.login_timeout,
            token: None,
        })
    }

    /// Whether a bearer token was obtained
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Resolve an endpoint path against the host
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// Log into the API and keep the returned key as bearer token
    ///
    /// # Errors
    ///
    /// Every failure (connection, non-success status, unexpected body) is
    /// reported as [`Error::Auth`] carrying the API's `mensagem` when it sent one.
    pub async fn login(&mut self, user: &str, password: &str) -> Result<()> {
        let url = self.endpoint(LOGIN_PATH)?;
        debug!(%url, user, "Logging into the API");

        let response = self
            .http
            .post(url)
            .timeout(self.login_timeout)
            .json(&serde_json::json!({
                "user": user,
                "password": password,
            }))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Login request failed");
                auth_error(None)
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to read login response");
            auth_error(None)
        })?;

        if !status.is_success() {
            let message = api_error_message(&body);
            tracing::error!(
                status = status.as_u16(),
                api_message = message.as_deref().unwrap_or_default(),
                "Login rejected by the API"
            );
            return Err(auth_error(message));
        }

        let envelope: Envelope<LoginResponse> = serde_json::from_str(&body).map_err(|e| {
            tracing::error!(error = %e, "Login response has no session key");
            auth_error(None)
        })?;

        self.token = Some(envelope.retorno.key);
        info!(user, "Logged into the API");
        Ok(())
    }

    /// GET an endpoint and decode its JSON body
    ///
    /// `query` pairs are appended in order. The bearer token is attached when
    /// the client is authenticated.
    ///
    /// # Errors
    ///
    /// - [`Error::Status`] for non-success responses (with the API message, if any)
    /// - [`Error::Network`] for connection failures and timeouts
    /// - [`Error::Serialization`] when the body does not match `T`
    pub async fn get_json<T>(&self, path: &str, query: &[(&str, String)]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let mut url = self.endpoint(path)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }

        debug!(%url, "GET");

        let mut request = self.http.get(url.clone());
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                url: url.to_string(),
                message: api_error_message(&body),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

fn auth_error(message: Option<String>) -> Error {
    Error::Auth {
        message: message.unwrap_or_else(|| MISSING_API_MESSAGE.to_string()),
    }
}
