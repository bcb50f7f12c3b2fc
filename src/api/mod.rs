//! API gateway for the remote user-management service.
//!
//! [`ApiClient`] is the only place requests are built. It:
//! - attaches `Authorization: Bearer <token>` whenever the session holds one
//! - enforces a fixed overall request timeout
//! - on 401, optionally clears the stored token and sends the navigator to
//!   the login route before returning [`ApiError::Unauthorized`]
//! - logs 5xx responses and returns every other failure unchanged
//!
//! Endpoint wrappers live in [`auth`] and [`users`].

pub mod auth;
pub mod error;
pub mod users;
pub mod validation;

pub use error::{ApiError, ErrorClass};

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::config::Config;
use crate::guard::Navigator;
use crate::session::SessionStore;

/// Header carrying the optional API key
pub const API_KEY_HEADER: &str = "x-api-key";

pub struct ApiClient {
    http: Client,
    base_url: Url,
    api_key: Option<String>,
    session: Arc<dyn SessionStore>,
    navigator: Navigator,
    clear_on_unauthorized: bool,
}

impl ApiClient {
    pub fn new(
        config: &Config,
        session: Arc<dyn SessionStore>,
        navigator: Navigator,
    ) -> Result<Self, ApiError> {
        let base_url = parse_base_url(&config.api.base_url)?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.api.timeout_secs))
            .user_agent(concat!("userdesk/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url,
            api_key: config.api.api_key.clone().filter(|k| !k.is_empty()),
            session,
            navigator,
            clear_on_unauthorized: config.session.clear_on_unauthorized,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::InvalidUrl(e.to_string()))
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let url = self.endpoint(path)?;
        debug!(%method, %url, "API request");

        let mut builder = self.http.request(method, url);
        if let Some(token) = self.session.get_token() {
            builder = builder.bearer_auth(token);
        }
        if let Some(key) = &self.api_key {
            builder = builder.header(API_KEY_HEADER, key);
        }
        Ok(builder)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder.send().await.map_err(|e| {
            warn!(error = %e, "API request failed");
            ApiError::Transport(e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();

        if status == StatusCode::UNAUTHORIZED {
            self.handle_unauthorized();
        } else if status.is_server_error() {
            error!(%status, body = %body, "Server error. Please try again later.");
        } else {
            debug!(%status, body = %body, "API request rejected");
        }

        Err(ApiError::from_status(status, body))
    }

    fn handle_unauthorized(&self) {
        warn!("Unauthorized! Redirecting to login...");

        if self.clear_on_unauthorized {
            if let Err(e) = self.session.clear_token() {
                warn!(error = %e, "Failed to clear session token");
            }
        }

        self.navigator.redirect_to_login();
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let builder = self.request(Method::GET, path)?.query(query);
        let response = self.send(builder).await?;
        decode(response).await
    }

    pub(crate) async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned + Default,
    {
        let builder = self.request(Method::POST, path)?.json(body);
        let response = self.send(builder).await?;
        decode_or_default(response).await
    }

    pub(crate) async fn post_empty(&self, path: &str) -> Result<(), ApiError> {
        let builder = self.request(Method::POST, path)?;
        self.send(builder).await?;
        Ok(())
    }

    pub(crate) async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned + Default,
    {
        let builder = self.request(Method::PUT, path)?.json(body);
        let response = self.send(builder).await?;
        decode_or_default(response).await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let builder = self.request(Method::DELETE, path)?;
        self.send(builder).await?;
        Ok(())
    }
}

/// Parse the configured base URL, making sure relative joins land under it.
fn parse_base_url(raw: &str) -> Result<Url, ApiError> {
    let mut normalized = raw.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }

    let url = Url::parse(&normalized).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ApiError::InvalidUrl(format!(
            "{}: unsupported scheme '{}'",
            raw, other
        ))),
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Like [`decode`], but an empty body yields `T::default()`.
async fn decode_or_default<T: DeserializeOwned + Default>(response: Response) -> Result<T, ApiError> {
    let bytes = response.bytes().await?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
}
