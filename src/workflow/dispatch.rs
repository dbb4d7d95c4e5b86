//! Approval dispatch: turns a reviewer's decision into a store mutation and
//! reconciles the cache afterwards.
//!
//! Editor changes are reconciled by invalidating and refetching the whole
//! project, because the same change can surface through another read path.
//! Generic items are patched in place from the row the store returns.
//! Status never changes locally before the store has acknowledged it.

use std::fmt;
use std::future::Future;

use chrono::Utc;
use serde::Serialize;

use crate::models::approval::{EditorDecision, EditorDecisionRequest, WorkflowItemPatch};

use super::backend::{ApprovalBackend, RemoteError};
use super::cache::WorkflowCache;
use super::gate::can_approve;
use super::normalize::normalize;
use super::roles::RoleState;
use super::types::{Action, ItemKey, ItemStatus, WorkflowItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A transient, user-visible notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, message: message.into() }
    }

    pub fn is_success(&self) -> bool {
        self.level == NoticeLevel::Success
    }
}

/// Answer from the notes dialog shown before reject / request-changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptResponse {
    pub confirmed: bool,
    pub notes: Option<String>,
}

impl PromptResponse {
    /// Cancelled or blank answers mean "no notes"; they never cancel the action.
    pub fn into_notes(self) -> Option<String> {
        if !self.confirmed {
            return None;
        }
        self.notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
    }
}

/// Collects review notes from the reviewer.
pub trait ReviewPrompt {
    fn request_notes(&self, action: Action, items: &[&WorkflowItem]) -> impl Future<Output = PromptResponse>;
}

/// Notes that were already supplied with the request.
#[derive(Debug, Clone, Default)]
pub struct SuppliedNotes(pub Option<String>);

impl ReviewPrompt for SuppliedNotes {
    async fn request_notes(&self, _action: Action, _items: &[&WorkflowItem]) -> PromptResponse {
        PromptResponse {
            confirmed: self.0.is_some(),
            notes: self.0.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    UnknownItem(ItemKey),
    NotPermitted(ItemKey),
    AlreadyDecided { key: ItemKey, status: ItemStatus },
    Remote { key: ItemKey, error: RemoteError },
}

impl DispatchError {
    pub fn key(&self) -> ItemKey {
        match self {
            DispatchError::UnknownItem(key)
            | DispatchError::NotPermitted(key)
            | DispatchError::AlreadyDecided { key, .. }
            | DispatchError::Remote { key, .. } => *key,
        }
    }

    pub fn notice(&self) -> Notice {
        Notice::error(self.to_string())
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::UnknownItem(key) => write!(f, "Item {key} is not in this project's workflow"),
            DispatchError::NotPermitted(key) => write!(f, "You are not allowed to decide on {key}"),
            DispatchError::AlreadyDecided { key, status } => {
                write!(f, "{key} is {} and takes no further decisions", status.label().to_lowercase())
            }
            DispatchError::Remote { key, error } => {
                write!(f, "Decision on {key} failed with status {}: {}", error.status, error.body)
            }
        }
    }
}

/// Outcome of a bulk decision. Failures do not roll back applied items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkReport {
    pub applied: Vec<ItemKey>,
    pub failed: Vec<BulkFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkFailure {
    pub item: ItemKey,
    pub error: String,
}

impl BulkReport {
    /// One aggregate notification for the whole batch.
    pub fn notice(&self, action: Action) -> Notice {
        let total = self.applied.len() + self.failed.len();
        if self.failed.is_empty() {
            Notice::success(format!("{} item(s) {}", self.applied.len(), action.past_tense()))
        } else {
            Notice::error(format!(
                "{} of {total} item(s) {}; {} failed",
                self.applied.len(),
                action.past_tense(),
                self.failed.len()
            ))
        }
    }
}

fn editor_decision(action: Action) -> EditorDecision {
    match action {
        Action::Approve => EditorDecision::Approve,
        Action::Reject => EditorDecision::Reject,
        Action::RequestChanges => EditorDecision::RequestRevision,
    }
}

/// Dispatches decisions for one actor on one project.
pub struct Dispatcher<'a, B> {
    backend: &'a B,
    cache: &'a WorkflowCache,
    project_id: i64,
    actor_id: i64,
    roles: &'a RoleState,
}

impl<'a, B: ApprovalBackend> Dispatcher<'a, B> {
    pub fn new(backend: &'a B, cache: &'a WorkflowCache, project_id: i64, actor_id: i64, roles: &'a RoleState) -> Self {
        Self { backend, cache, project_id, actor_id, roles }
    }

    async fn find_item(&self, key: &ItemKey) -> Option<WorkflowItem> {
        let items = self.cache.get_or_fetch(self.backend, self.project_id).await;
        items.iter().find(|item| item.key == *key).cloned()
    }

    /// Decide on a single item, prompting for notes where the action needs them.
    pub async fn decide(
        &self,
        key: ItemKey,
        action: Action,
        prompt: &impl ReviewPrompt,
    ) -> Result<Notice, DispatchError> {
        let item = self.find_item(&key).await.ok_or(DispatchError::UnknownItem(key))?;
        let notes = if action.prompts_for_notes() {
            prompt.request_notes(action, &[&item]).await.into_notes()
        } else {
            None
        };
        self.decide_with_notes(&item, action, notes).await
    }

    /// Decide on every item in order, one at a time, with a single notes prompt.
    /// Failures are reported in selection order.
    pub async fn decide_many(&self, keys: &[ItemKey], action: Action, prompt: &impl ReviewPrompt) -> BulkReport {
        let mut found = Vec::with_capacity(keys.len());
        for key in keys {
            found.push(self.find_item(key).await.ok_or(DispatchError::UnknownItem(*key)));
        }

        let items: Vec<&WorkflowItem> = found.iter().filter_map(|r| r.as_ref().ok()).collect();
        let notes = if action.prompts_for_notes() && !items.is_empty() {
            prompt.request_notes(action, &items).await.into_notes()
        } else {
            None
        };

        let mut report = BulkReport::default();
        for lookup in &found {
            let outcome = match lookup {
                Ok(item) => self.decide_with_notes(item, action, notes.clone()).await.map(|_| item.key),
                Err(e) => Err(e.clone()),
            };
            match outcome {
                Ok(key) => report.applied.push(key),
                Err(e) => report.failed.push(BulkFailure { item: e.key(), error: e.to_string() }),
            }
        }
        report
    }

    async fn decide_with_notes(
        &self,
        item: &WorkflowItem,
        action: Action,
        notes: Option<String>,
    ) -> Result<Notice, DispatchError> {
        if !can_approve(item, self.roles) {
            return Err(DispatchError::NotPermitted(item.key));
        }
        if !item.status.is_pending() {
            return Err(DispatchError::AlreadyDecided { key: item.key, status: item.status });
        }

        match item.key {
            ItemKey::EditorChange { change_id } => {
                let request = EditorDecisionRequest {
                    pending_change_id: change_id,
                    decision: editor_decision(action),
                    feedback_notes: notes,
                    suggested_changes: None,
                };
                let receipt = self
                    .backend
                    .decide_editor_change(self.project_id, self.actor_id, request)
                    .await
                    .map_err(|error| self.remote_failure(item.key, error))?;
                self.cache.invalidate_and_refetch(self.backend, self.project_id).await;
                Ok(Notice::success(receipt.message))
            }
            ItemKey::Generic { id } => {
                let patch = WorkflowItemPatch {
                    status: action.target_status().as_str().to_string(),
                    review_notes: notes.clone(),
                    priority: Some(item.priority.as_str().to_string()),
                };
                let updated = self
                    .backend
                    .update_workflow_item(self.project_id, self.actor_id, id, patch)
                    .await
                    .map_err(|error| self.remote_failure(item.key, error))?;
                let updated = normalize(&updated);
                self.cache.patch_item(self.project_id, &item.key, |cached| {
                    cached.status = updated.status;
                    cached.approver = updated.approver;
                    cached.review_notes = notes;
                    cached.updated_at = updated.updated_at.or_else(|| Some(Utc::now()));
                });
                Ok(Notice::success(format!(
                    "{} {}",
                    item.title.as_deref().unwrap_or("Item"),
                    action.past_tense()
                )))
            }
        }
    }

    fn remote_failure(&self, key: ItemKey, error: RemoteError) -> DispatchError {
        log::warn!(
            "Decision on {key} in project {} by user {} failed: {error}",
            self.project_id,
            self.actor_id
        );
        DispatchError::Remote { key, error }
    }
}
