//! User records and the paginated list wrapper.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Number of records the directory shows per page.
pub const PAGE_SIZE: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub avatar: String,
}

impl User {
    /// Column order used when rendering a page of users.
    pub const COLUMNS: [&'static str; 5] = ["id", "email", "first_name", "last_name", "avatar"];

    /// Build a record from form fields, for ids synthesized locally.
    pub fn from_draft(id: u64, draft: &UserDraft) -> Self {
        Self {
            id,
            email: draft.email.clone(),
            first_name: draft.first_name.clone(),
            last_name: draft.last_name.clone(),
            avatar: String::new(),
        }
    }

    /// Overlay the form fields on this record. The avatar is kept.
    pub fn merged(&self, draft: &UserDraft) -> Self {
        Self {
            id: self.id,
            email: draft.email.clone(),
            first_name: draft.first_name.clone(),
            last_name: draft.last_name.clone(),
            avatar: self.avatar.clone(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Cell value for one of [`User::COLUMNS`].
    pub fn column(&self, name: &str) -> String {
        match name {
            "id" => self.id.to_string(),
            "email" => self.email.clone(),
            "first_name" => self.first_name.clone(),
            "last_name" => self.last_name.clone(),
            "avatar" => self.avatar.clone(),
            _ => String::new(),
        }
    }
}

/// Form payload for creating or editing a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDraft {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<&User> for UserDraft {
    fn from(user: &User) -> Self {
        Self {
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

/// One page of the user directory as held locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPage {
    pub records: Vec<User>,
    pub page_number: u32,
    pub total_count: u64,
}

impl Default for UserPage {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            page_number: 1,
            total_count: 0,
        }
    }
}

impl UserPage {
    /// Number of pages implied by `total_count`, never less than one.
    pub fn total_pages(&self) -> u32 {
        let pages = self.total_count.div_ceil(PAGE_SIZE as u64).max(1);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    pub fn find(&self, id: u64) -> Option<&User> {
        self.records.iter().find(|user| user.id == id)
    }
}

/// Wire shape of `GET users?page=N`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserListResponse {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub per_page: Option<u32>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub total_pages: Option<u32>,
    #[serde(default)]
    pub data: Vec<User>,
}

impl UserListResponse {
    /// Convert to a local page, falling back to the requested page number
    /// when the server omits it.
    pub fn into_page(self, requested: u32) -> UserPage {
        let mut records = self.data;
        if records.len() > PAGE_SIZE {
            warn!(
                received = records.len(),
                page_size = PAGE_SIZE,
                "Server returned more users than fit on a page, truncating"
            );
            records.truncate(PAGE_SIZE);
        }

        UserPage {
            records,
            page_number: self.page.filter(|p| *p >= 1).unwrap_or(requested),
            total_count: self.total,
        }
    }
}

/// Body returned by create and update calls. The mock backend echoes the
/// fields plus a timestamp and nothing it returns is authoritative.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MutationReceipt {
    #[serde(default, rename = "createdAt")]
    pub created_at: Option<String>,
    #[serde(default, rename = "updatedAt")]
    pub updated_at: Option<String>,
}
