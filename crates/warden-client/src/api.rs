//! HTTP client for the `/api` surface.

use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, warn};

use warden_auth::session::{Authenticator, RoleDirectory, SignIn};
use warden_core::config::ConsoleConfig;
use warden_core::error::{AppError, ErrorKind};
use warden_core::result::AppResult;
use warden_entity::identity::Identity;
use warden_entity::role::Role;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginBody {
    id: i64,
    name: String,
    #[serde(default)]
    role_ids: Vec<i64>,
    token: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Client for the Warden backend.
///
/// Holds the bearer token of the adopted sign-in. `authenticate` and
/// `impersonate` only return the issued token; it replaces the held one when
/// the session adopts it. Transport failures and 5xx answers are
/// `ServiceUnavailable`; a 401 is an `Authentication` error.
#[derive(Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl ApiClient {
    /// Build a client from console settings.
    pub fn new(config: &ConsoleConfig) -> AppResult<Self> {
        Self::with_base_url(
            &config.api_base_url,
            Duration::from_secs(config.request_timeout_seconds),
        )
    }

    /// Build a client for `base_url` (the `/api` prefix included).
    pub fn with_base_url(base_url: &str, timeout: Duration) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Configuration,
                    format!("Failed to build HTTP client: {e}"),
                    e,
                )
            })?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        })
    }

    /// The current bearer token, if signed in.
    pub fn token(&self) -> Option<String> {
        self.token.read().ok().and_then(|t| t.clone())
    }

    fn set_token(&self, token: Option<String>) {
        if let Ok(mut guard) = self.token.write() {
            *guard = token;
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> AppResult<reqwest::RequestBuilder> {
        let token = self
            .token()
            .ok_or_else(|| AppError::authentication("Not signed in"))?;
        Ok(request.bearer_auth(token))
    }

    async fn fetch_roles(&self, ids: &[i64], token: &str) -> AppResult<Vec<Role>> {
        let mut roles = Vec::with_capacity(ids.len());
        for id in ids {
            let request = self
                .http
                .get(self.url(&format!("/roles/{id}")))
                .bearer_auth(token);
            match self.send(request).await {
                Ok(response) => roles.push(decode::<Role>(response).await?),
                Err(e) if e.kind == ErrorKind::NotFound => {
                    warn!(role_id = id, "Assigned role no longer exists");
                }
                Err(e) => return Err(e),
            }
        }
        debug!(requested = ids.len(), found = roles.len(), "Roles loaded");
        Ok(roles)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> AppResult<Response> {
        let response = request.send().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::ServiceUnavailable,
                format!("Backend unreachable: {e}"),
                e,
            )
        })?;
        check_status(response).await
    }

    async fn login_with(&self, request: reqwest::RequestBuilder) -> AppResult<SignIn> {
        let body: LoginBody = decode(self.send(request).await?).await?;
        Ok(SignIn::with_credential(
            Identity::new(body.id, body.name, body.role_ids),
            body.token,
        ))
    }
}

/// Maps a non-success status to the matching error kind.
async fn check_status(response: Response) -> AppResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<ErrorBody>()
        .await
        .map(|b| b.message)
        .unwrap_or_else(|_| status.to_string());

    Err(match status {
        StatusCode::UNAUTHORIZED => AppError::authentication(message),
        StatusCode::FORBIDDEN => AppError::forbidden(message),
        StatusCode::NOT_FOUND => AppError::not_found(message),
        StatusCode::CONFLICT => AppError::conflict(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => AppError::validation(message),
        s if s.is_server_error() => {
            AppError::service_unavailable(format!("Backend error {s}: {message}"))
        }
        s => AppError::external_service(format!("Unexpected status {s}: {message}")),
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> AppResult<T> {
    response.json::<T>().await.map_err(|e| {
        AppError::with_source(
            ErrorKind::ExternalService,
            format!("Malformed backend response: {e}"),
            e,
        )
    })
}

#[async_trait]
impl Authenticator for ApiClient {
    async fn authenticate(&self, name: &str, credential: &str) -> AppResult<SignIn> {
        let request = self
            .http
            .post(self.url("/login"))
            .json(&json!({ "name": name, "password": credential }));
        self.login_with(request).await
    }

    async fn reload(&self, identity: &Identity) -> AppResult<Identity> {
        let request = self.authorized(self.http.get(self.url("/session")))?;
        let current: Identity = decode(self.send(request).await?).await?;
        if current.id != identity.id {
            return Err(AppError::authentication(format!(
                "Token belongs to user {}, not {}",
                current.id, identity.id
            )));
        }
        Ok(current)
    }

    async fn impersonate(&self, user_id: i64) -> AppResult<SignIn> {
        let request = self.authorized(
            self.http
                .post(self.url("/login-as"))
                .json(&json!({ "userId": user_id })),
        )?;
        self.login_with(request).await
    }

    fn adopt(&self, credential: String) {
        self.set_token(Some(credential));
    }

    fn sign_out(&self) {
        self.set_token(None);
    }
}

#[async_trait]
impl RoleDirectory for ApiClient {
    async fn roles_by_ids(&self, ids: &[i64]) -> AppResult<Vec<Role>> {
        let token = self
            .token()
            .ok_or_else(|| AppError::authentication("Not signed in"))?;
        self.fetch_roles(ids, &token).await
    }

    async fn roles_with_credential(
        &self,
        ids: &[i64],
        credential: Option<&str>,
    ) -> AppResult<Vec<Role>> {
        match credential {
            Some(token) => self.fetch_roles(ids, token).await,
            None => self.roles_by_ids(ids).await,
        }
    }
}
