//! Client-side mirror of one page of the user directory.
//!
//! [`UserDirectory`] owns the page currently shown, the open form (add or
//! edit), the pending delete confirmation and the last notification.
//! Mutations take `&mut self`, so they run one at a time and the local page
//! always reflects the most recent user action.

pub mod reconcile;

use std::sync::Arc;
use tracing::{info, warn};

use crate::api::validation::{validate_user_draft, FieldErrors};
use crate::api::ApiClient;
use crate::auth::AuthFlow;
use crate::models::{User, UserDraft, UserPage};
use crate::notification::Notification;
use reconcile::Mutation;

/// The form currently open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modal {
    Add,
    Edit(User),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    /// Server accepted the write and the local page was patched
    Applied,
    /// Server call failed; the local page is unchanged
    Failed,
    /// Form did not validate; nothing was sent and the form stays open
    Invalid(FieldErrors),
    /// No form or confirmation was open
    Idle,
}

pub struct UserDirectory {
    api: Arc<ApiClient>,
    auth: AuthFlow,
    page: UserPage,
    loaded: bool,
    modal: Option<Modal>,
    pending_delete: Option<u64>,
    notification: Option<Notification>,
}

impl UserDirectory {
    pub fn new(api: Arc<ApiClient>) -> Self {
        let auth = AuthFlow::new(Arc::clone(&api));
        Self {
            api,
            auth,
            page: UserPage::default(),
            loaded: false,
            modal: None,
            pending_delete: None,
            notification: None,
        }
    }

    pub fn page(&self) -> &UserPage {
        &self.page
    }

    pub fn records(&self) -> &[User] {
        &self.page.records
    }

    pub fn page_number(&self) -> u32 {
        self.page.page_number
    }

    pub fn total_count(&self) -> u64 {
        self.page.total_count
    }

    pub fn total_pages(&self) -> u32 {
        self.page.total_pages()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn columns(&self) -> &'static [&'static str] {
        &User::COLUMNS
    }

    pub fn modal(&self) -> Option<&Modal> {
        self.modal.as_ref()
    }

    pub fn pending_delete(&self) -> Option<u64> {
        self.pending_delete
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    pub fn take_notification(&mut self) -> Option<Notification> {
        self.notification.take()
    }

    fn notify(&mut self, notification: Notification) {
        self.notification = Some(notification);
    }

    /// Fetch the current page again.
    pub async fn load(&mut self) -> bool {
        self.fetch(self.page.page_number).await
    }

    /// Switch to `page`. Issues exactly one fetch when the page number
    /// changes; asking for the page already shown does nothing.
    pub async fn set_page(&mut self, page: u32) -> bool {
        if page == 0 {
            return false;
        }
        if self.loaded && page == self.page.page_number {
            return false;
        }
        self.fetch(page).await
    }

    async fn fetch(&mut self, page: u32) -> bool {
        match self.api.list_users(page).await {
            Ok(next) => {
                info!(
                    page = next.page_number,
                    records = next.records.len(),
                    total = next.total_count,
                    "Loaded users"
                );
                // Open forms and confirmations refer to the page being replaced
                self.modal = None;
                self.pending_delete = None;
                self.page = next;
                self.loaded = true;
                true
            }
            Err(e) => {
                warn!(page, error = %e, "Failed to load users");
                self.notify(Notification::error("Failed to load users"));
                false
            }
        }
    }

    pub fn open_add(&mut self) {
        self.modal = Some(Modal::Add);
    }

    /// Open the edit form for a record on the current page.
    pub fn open_edit(&mut self, id: u64) -> bool {
        match self.page.find(id) {
            Some(user) => {
                self.modal = Some(Modal::Edit(user.clone()));
                true
            }
            None => false,
        }
    }

    pub fn close_modal(&mut self) {
        self.modal = None;
    }

    /// Submit the open form.
    pub async fn save(&mut self, draft: UserDraft) -> MutationOutcome {
        let Some(modal) = self.modal.clone() else {
            return MutationOutcome::Idle;
        };

        if let Err(errors) = validate_user_draft(&draft) {
            return MutationOutcome::Invalid(errors);
        }

        let outcome = match modal {
            Modal::Add => self.submit_add(draft).await,
            Modal::Edit(user) => self.submit_edit(user.id, draft).await,
        };

        self.close_modal();
        outcome
    }

    async fn submit_add(&mut self, draft: UserDraft) -> MutationOutcome {
        match self.api.create_user(&draft).await {
            Ok(_) => {
                self.page = reconcile::reconcile(&self.page, &Mutation::Created(draft));
                info!(total = self.page.total_count, "User added");
                self.notify(Notification::success("User added successfully"));
                MutationOutcome::Applied
            }
            Err(e) => {
                warn!(error = %e, "Failed to add user");
                self.notify(Notification::error("Failed to save user"));
                MutationOutcome::Failed
            }
        }
    }

    async fn submit_edit(&mut self, id: u64, draft: UserDraft) -> MutationOutcome {
        match self.api.update_user(id, &draft).await {
            Ok(_) => {
                self.page = reconcile::reconcile(&self.page, &Mutation::Updated { id, draft });
                info!(id, "User updated");
                self.notify(Notification::success("User updated successfully"));
                MutationOutcome::Applied
            }
            Err(e) => {
                warn!(id, error = %e, "Failed to update user");
                self.notify(Notification::error("Failed to save user"));
                MutationOutcome::Failed
            }
        }
    }

    /// Ask for confirmation before deleting a record on the current page.
    pub fn request_delete(&mut self, id: u64) -> bool {
        if self.page.find(id).is_none() {
            return false;
        }
        self.pending_delete = Some(id);
        true
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    pub async fn confirm_delete(&mut self) -> MutationOutcome {
        let Some(id) = self.pending_delete.take() else {
            return MutationOutcome::Idle;
        };

        match self.api.delete_user(id).await {
            Ok(()) => {
                self.page = reconcile::reconcile(&self.page, &Mutation::Deleted(id));
                info!(id, "User deleted");
                self.notify(Notification::success("User deleted successfully"));
                MutationOutcome::Applied
            }
            Err(e) => {
                warn!(id, error = %e, "Failed to delete user");
                self.notify(Notification::error("Failed to delete user"));
                MutationOutcome::Failed
            }
        }
    }

    /// Best-effort logout; see [`AuthFlow::logout`].
    pub async fn logout(&mut self) -> Notification {
        self.modal = None;
        self.pending_delete = None;
        let notification = self.auth.logout().await;
        self.notify(notification.clone());
        notification
    }
}
