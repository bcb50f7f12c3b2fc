pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod directory;
pub mod guard;
pub mod models;
pub mod notification;
pub mod session;

pub use api::{ApiClient, ApiError};

use config::Config;
use std::sync::Arc;

use crate::auth::AuthFlow;
use crate::directory::UserDirectory;
use crate::guard::{Navigator, RouteGuard};
use crate::session::{FileSessionStore, SessionStore};

/// Everything a console run shares: config, session, navigation and the
/// gateway wired to both.
pub struct Console {
    pub config: Config,
    pub session: Arc<dyn SessionStore>,
    pub navigator: Navigator,
    pub api: Arc<ApiClient>,
}

impl Console {
    pub fn new(config: Config, session: Arc<dyn SessionStore>) -> Result<Self, ApiError> {
        let navigator = Navigator::new();
        let api = Arc::new(ApiClient::new(
            &config,
            Arc::clone(&session),
            navigator.clone(),
        )?);

        Ok(Self {
            config,
            session,
            navigator,
            api,
        })
    }

    /// Build a console whose session lives in the configured session file.
    pub fn from_config(config: Config) -> Result<Self, ApiError> {
        let session: Arc<dyn SessionStore> =
            Arc::new(FileSessionStore::new(config.session.resolved_path()));
        Self::new(config, session)
    }

    pub fn guard(&self) -> RouteGuard {
        RouteGuard::new(Arc::clone(&self.session), self.navigator.clone())
    }

    pub fn auth(&self) -> AuthFlow {
        AuthFlow::new(Arc::clone(&self.api))
    }

    pub fn directory(&self) -> UserDirectory {
        UserDirectory::new(Arc::clone(&self.api))
    }
}
