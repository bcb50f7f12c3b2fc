//! Login and logout endpoints.

use super::{ApiClient, ApiError};
use crate::models::{Credentials, LoginResponse};

impl ApiClient {
    /// `POST login`. A response without a token is still `Ok` here; the auth
    /// flow decides what that means.
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        self.post_json("login", credentials).await
    }

    /// `POST logout`.
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.post_empty("logout").await
    }
}
