use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which table an approval row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExternalSource {
    PendingChange,
    #[default]
    WorkflowItem,
}

/// Profile snapshot embedded in an approval row. Every field may be missing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalProfile {
    pub id: Option<i64>,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub role: Option<String>,
    pub roles: Vec<String>,
}

/// Wire shape of `GET /api/projects/{id}/approvals` items. Heterogeneous:
/// editor changes use external status names (`pending`, `needs_revision`),
/// workflow items use internal ones.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalWorkflowItem {
    pub id: i64,
    pub source: ExternalSource,
    #[serde(rename = "type")]
    pub item_type: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub original_content: Option<String>,
    pub status: String,
    pub priority: Option<String>,
    pub category: Option<String>,
    pub author: Option<ExternalProfile>,
    pub reviewer: Option<ExternalProfile>,
    pub review_notes: Option<String>,
    pub tags: Option<Vec<String>>,
    pub word_count: Option<i64>,
    pub chapter_reference: Option<String>,
    pub content_type: Option<String>,
    pub editor_notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApprovalListResponse {
    pub items: Vec<ExternalWorkflowItem>,
}

/// Decision vocabulary of the editor-change endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditorDecision {
    Approve,
    Reject,
    RequestRevision,
}

impl EditorDecision {
    /// Status stored on the pending change after the decision.
    pub fn stored_status(&self) -> &'static str {
        match self {
            EditorDecision::Approve => "approved",
            EditorDecision::Reject => "rejected",
            EditorDecision::RequestRevision => "needs_revision",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            EditorDecision::Approve => "Change approved and applied",
            EditorDecision::Reject => "Change rejected",
            EditorDecision::RequestRevision => "Revision requested from editor",
        }
    }
}

/// Body of `POST /api/projects/{id}/approvals`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorDecisionRequest {
    pub pending_change_id: i64,
    pub decision: EditorDecision,
    #[serde(default)]
    pub feedback_notes: Option<String>,
    #[serde(default)]
    pub suggested_changes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionReceipt {
    pub message: String,
}

/// Body of `PATCH /api/projects/{id}/workflow-items/{item_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowItemPatch {
    pub status: String,
    #[serde(default)]
    pub review_notes: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
}

/// Insert payload for a new editor change.
#[derive(Debug, Clone, Default)]
pub struct NewPendingChange {
    pub project_id: i64,
    pub editor_id: i64,
    pub content_type: String,
    pub title: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub original_content: Option<String>,
    pub editor_notes: Option<String>,
    pub chapter_reference: Option<String>,
    pub word_count: Option<i64>,
}

/// Insert payload for a new generic workflow item.
#[derive(Debug, Clone, Default)]
pub struct NewWorkflowItem {
    pub project_id: i64,
    pub author_id: i64,
    pub item_type: String,
    pub title: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub priority: String,
    pub category: String,
    pub tags: Vec<String>,
}
