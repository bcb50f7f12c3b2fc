//! Login and logout flow.
//!
//! Credentials are validated locally before anything is sent. A successful
//! login stores the returned token and moves the navigator to the root
//! route; any failure leaves the session untouched.

use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::api::validation::{validate_credentials, FieldErrors};
use crate::api::{ApiClient, ApiError};
use crate::guard::{Navigator, Route};
use crate::models::Credentials;
use crate::notification::Notification;
use crate::session::{SessionError, SessionStore};

pub const LOGIN_FAILED_MESSAGE: &str = "Login failed. Please check your email and password.";
pub const LOGIN_SUCCESS_MESSAGE: &str = "Login successful!";

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials: {0}")]
    Validation(FieldErrors),

    #[error("Login request failed: {0}")]
    Rejected(#[source] ApiError),

    #[error("Login response did not contain a token")]
    MissingToken,

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl AuthError {
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            AuthError::Validation(errors) => Some(errors),
            _ => None,
        }
    }

    /// The notification shown for this failure. Validation problems are
    /// reported per field instead, so they produce none.
    pub fn notification(&self) -> Option<Notification> {
        match self {
            AuthError::Validation(_) => None,
            _ => Some(Notification::error(LOGIN_FAILED_MESSAGE)),
        }
    }
}

#[derive(Clone)]
pub struct AuthFlow {
    api: Arc<ApiClient>,
    session: Arc<dyn SessionStore>,
    navigator: Navigator,
}

impl AuthFlow {
    pub fn new(api: Arc<ApiClient>) -> Self {
        let session = Arc::clone(api.session());
        let navigator = api.navigator().clone();
        Self {
            api,
            session,
            navigator,
        }
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<Notification, AuthError> {
        validate_credentials(credentials).map_err(AuthError::Validation)?;

        let response = self.api.login(credentials).await.map_err(|e| {
            warn!(email = %credentials.email, error = %e, "Login rejected");
            AuthError::Rejected(e)
        })?;

        let token = response
            .token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                warn!(email = %credentials.email, "Login response had no token");
                AuthError::MissingToken
            })?;

        self.session.set_token(&token)?;
        self.navigator.navigate(Route::root());

        info!(email = %credentials.email, "Login successful");
        Ok(Notification::success(LOGIN_SUCCESS_MESSAGE))
    }

    /// Best-effort logout. The server call may fail; the local session is
    /// cleared and the navigator sent to login either way.
    pub async fn logout(&self) -> Notification {
        let remote = self.api.logout().await;

        if let Err(e) = self.session.clear_token() {
            warn!(error = %e, "Failed to clear session token");
        }
        self.navigator.redirect_to_login();

        match remote {
            Ok(()) => {
                info!("Logged out");
                Notification::success("Logged out")
            }
            Err(e) => {
                warn!(error = %e, "Logout request failed");
                Notification::error("Failed to logout")
            }
        }
    }
}
