//! User directory endpoints.

use super::{ApiClient, ApiError};
use crate::models::{MutationReceipt, UserDraft, UserListResponse, UserPage};

impl ApiClient {
    /// `GET users?page=N`
    pub async fn list_users(&self, page: u32) -> Result<UserPage, ApiError> {
        let response: UserListResponse = self
            .get_json("users", &[("page", page.to_string())])
            .await?;
        Ok(response.into_page(page))
    }

    /// `POST users`
    pub async fn create_user(&self, draft: &UserDraft) -> Result<MutationReceipt, ApiError> {
        self.post_json("users", draft).await
    }

    /// `PUT users/{id}`
    pub async fn update_user(&self, id: u64, draft: &UserDraft) -> Result<MutationReceipt, ApiError> {
        self.put_json(&format!("users/{}", id), draft).await
    }

    /// `DELETE delete/{id}`
    pub async fn delete_user(&self, id: u64) -> Result<(), ApiError> {
        self.delete(&format!("delete/{}", id)).await
    }
}
