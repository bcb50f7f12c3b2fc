//! Local reconciliation of the directory page after a successful write.
//!
//! The backend acknowledges writes without persisting them, so re-fetching
//! after a mutation would undo it. Instead the page is patched locally.
//! These functions are pure: previous page in, next page out.

use crate::models::{User, UserDraft, UserPage};

/// A write the server has acknowledged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Created(UserDraft),
    Updated { id: u64, draft: UserDraft },
    Deleted(u64),
}

pub fn reconcile(previous: &UserPage, mutation: &Mutation) -> UserPage {
    match mutation {
        Mutation::Created(draft) => apply_created(previous, draft),
        Mutation::Updated { id, draft } => apply_updated(previous, *id, draft),
        Mutation::Deleted(id) => apply_deleted(previous, *id),
    }
}

/// Temporary id for a locally added record: one past the current count,
/// bumped past the largest id on the page if that would collide.
pub fn synthesize_id(records: &[User]) -> u64 {
    let candidate = records.len() as u64 + 1;
    if records.iter().any(|user| user.id == candidate) {
        records.iter().map(|user| user.id).max().unwrap_or(0) + 1
    } else {
        candidate
    }
}

/// Append the new record and count it in the total.
pub fn apply_created(previous: &UserPage, draft: &UserDraft) -> UserPage {
    let mut next = previous.clone();
    let id = synthesize_id(&next.records);
    next.records.push(User::from_draft(id, draft));
    next.total_count += 1;
    next
}

/// Replace the record with `id` by the draft merged over it.
pub fn apply_updated(previous: &UserPage, id: u64, draft: &UserDraft) -> UserPage {
    let mut next = previous.clone();
    for user in next.records.iter_mut().filter(|user| user.id == id) {
        *user = user.merged(draft);
    }
    next
}

/// Drop the record with `id`. The total is left as the server reported it.
pub fn apply_deleted(previous: &UserPage, id: u64) -> UserPage {
    let mut next = previous.clone();
    next.records.retain(|user| user.id != id);
    next
}
