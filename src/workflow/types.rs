use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::roles::Role;

/// Identity of a workflow item, tagged with the record it was projected from.
///
/// Editor changes live in their own table and are decided through the
/// approvals endpoint; generic items are status-patched directly. Keeping the
/// provenance in the key means dispatch never has to sniff an id format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "provenance", rename_all = "snake_case")]
pub enum ItemKey {
    EditorChange { change_id: i64 },
    Generic { id: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    EditorChange,
    Generic,
}

impl ItemKey {
    pub fn provenance(&self) -> Provenance {
        match self {
            ItemKey::EditorChange { .. } => Provenance::EditorChange,
            ItemKey::Generic { .. } => Provenance::Generic,
        }
    }
}

/// Form-friendly encoding: `editor_change:42` / `generic:7`.
impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKey::EditorChange { change_id } => write!(f, "editor_change:{change_id}"),
            ItemKey::Generic { id } => write!(f, "generic:{id}"),
        }
    }
}

impl FromStr for ItemKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, raw_id) = s
            .split_once(':')
            .ok_or_else(|| format!("Malformed item key '{s}'"))?;
        let id: i64 = raw_id
            .parse()
            .map_err(|_| format!("Malformed item id in '{s}'"))?;
        match kind {
            "editor_change" => Ok(ItemKey::EditorChange { change_id: id }),
            "generic" => Ok(ItemKey::Generic { id }),
            other => Err(format!("Unknown item provenance '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Edit,
    Comment,
    Suggestion,
    Translation,
    Review,
    Task,
}

impl ItemType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "edit" => Some(ItemType::Edit),
            "comment" => Some(ItemType::Comment),
            "suggestion" => Some(ItemType::Suggestion),
            "translation" => Some(ItemType::Translation),
            "review" => Some(ItemType::Review),
            "task" => Some(ItemType::Task),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ItemType::Edit => "Edit",
            ItemType::Comment => "Comment",
            ItemType::Suggestion => "Suggestion",
            ItemType::Translation => "Translation",
            ItemType::Review => "Review",
            ItemType::Task => "Task",
        }
    }
}

/// Review state of an item. Approved and rejected are terminal; a
/// re-submission after `NeedsChanges` arrives as a new pending item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    PendingApproval,
    PendingRequest,
    Approved,
    NeedsChanges,
    Rejected,
}

impl ItemStatus {
    pub const ALL: [ItemStatus; 5] = [
        ItemStatus::PendingApproval,
        ItemStatus::PendingRequest,
        ItemStatus::Approved,
        ItemStatus::NeedsChanges,
        ItemStatus::Rejected,
    ];

    /// Parse an internal status name exactly (facet values, form input).
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::PendingApproval => "pending_approval",
            ItemStatus::PendingRequest => "pending_request",
            ItemStatus::Approved => "approved",
            ItemStatus::NeedsChanges => "needs_changes",
            ItemStatus::Rejected => "rejected",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ItemStatus::PendingApproval => "Pending approval",
            ItemStatus::PendingRequest => "Pending request",
            ItemStatus::Approved => "Approved",
            ItemStatus::NeedsChanges => "Needs changes",
            ItemStatus::Rejected => "Rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ItemStatus::Approved | ItemStatus::Rejected)
    }

    /// Only pending items take a decision. `NeedsChanges` waits for a new submission.
    pub fn is_pending(&self) -> bool {
        matches!(self, ItemStatus::PendingApproval | ItemStatus::PendingRequest)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            "urgent" => Some(Priority::Urgent),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Content,
    Structure,
    Language,
    Quality,
    Production,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Content,
        Category::Structure,
        Category::Language,
        Category::Quality,
        Category::Production,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|c| c.as_str() == needle)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Content => "content",
            Category::Structure => "structure",
            Category::Language => "language",
            Category::Quality => "quality",
            Category::Production => "production",
        }
    }
}

/// Snapshot of the submitter taken at fetch time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub id: i64,
    pub name: String,
    pub avatar: Option<String>,
    pub role: Role,
    pub roles: Vec<Role>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Approver {
    pub id: i64,
    pub name: String,
}

/// Correlation fields only meaningful for editor changes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EditorCorrelation {
    pub content_type: Option<String>,
    pub editor_notes: Option<String>,
}

/// Normalized, displayable record awaiting (or having received) a review decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowItem {
    pub key: ItemKey,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub original_content: Option<String>,
    pub author: Author,
    pub status: ItemStatus,
    pub priority: Priority,
    pub category: Category,
    pub review_notes: Option<String>,
    pub approver: Option<Approver>,
    pub tags: Vec<String>,
    pub word_count: Option<i64>,
    pub chapter_reference: Option<String>,
    pub editor: Option<EditorCorrelation>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A reviewer's decision on one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Approve,
    Reject,
    RequestChanges,
}

impl Action {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "approve" => Some(Action::Approve),
            "reject" => Some(Action::Reject),
            "request_changes" => Some(Action::RequestChanges),
            _ => None,
        }
    }

    pub fn target_status(&self) -> ItemStatus {
        match self {
            Action::Approve => ItemStatus::Approved,
            Action::Reject => ItemStatus::Rejected,
            Action::RequestChanges => ItemStatus::NeedsChanges,
        }
    }

    /// Reject and request-changes ask the reviewer for notes first.
    pub fn prompts_for_notes(&self) -> bool {
        !matches!(self, Action::Approve)
    }

    pub fn past_tense(&self) -> &'static str {
        match self {
            Action::Approve => "approved",
            Action::Reject => "rejected",
            Action::RequestChanges => "sent back for changes",
        }
    }
}
