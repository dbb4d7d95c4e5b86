//! Projection of external approval rows into [`WorkflowItem`]s.
//!
//! Malformed rows are defaulted, never rejected: a missing profile becomes
//! "Unknown User", unknown enum values fall back to a safe default.

use crate::models::approval::{ExternalProfile, ExternalSource, ExternalWorkflowItem};

use super::roles::Role;
use super::types::*;

pub const UNKNOWN_USER: &str = "Unknown User";

/// Translate an external status name. Unrecognized names count as pending approval.
pub fn map_status(raw: &str) -> ItemStatus {
    match raw.trim().to_ascii_lowercase().as_str() {
        "pending" | "pending_approval" => ItemStatus::PendingApproval,
        "pending_request" => ItemStatus::PendingRequest,
        "approved" => ItemStatus::Approved,
        "rejected" => ItemStatus::Rejected,
        "needs_revision" | "needs_changes" => ItemStatus::NeedsChanges,
        _ => ItemStatus::PendingApproval,
    }
}

fn author_from(profile: Option<&ExternalProfile>) -> Author {
    let Some(profile) = profile else {
        return Author {
            id: 0,
            name: UNKNOWN_USER.to_string(),
            avatar: None,
            role: Role::Viewer,
            roles: Vec::new(),
        };
    };

    let roles: Vec<Role> = profile.roles.iter().filter_map(|r| Role::parse(r)).collect();
    let role = profile
        .role
        .as_deref()
        .and_then(Role::parse)
        .or_else(|| roles.first().copied())
        .unwrap_or(Role::Viewer);

    Author {
        id: profile.id.unwrap_or(0),
        name: profile
            .full_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(UNKNOWN_USER)
            .to_string(),
        avatar: profile.avatar_url.clone(),
        role,
        roles,
    }
}

fn approver_from(profile: Option<&ExternalProfile>) -> Option<Approver> {
    let profile = profile?;
    Some(Approver {
        id: profile.id?,
        name: profile
            .full_name
            .clone()
            .unwrap_or_else(|| UNKNOWN_USER.to_string()),
    })
}

/// Normalize one external row.
pub fn normalize(raw: &ExternalWorkflowItem) -> WorkflowItem {
    let (key, fallback_type, editor) = match raw.source {
        ExternalSource::PendingChange => (
            ItemKey::EditorChange { change_id: raw.id },
            ItemType::Edit,
            Some(EditorCorrelation {
                content_type: raw.content_type.clone(),
                editor_notes: raw.editor_notes.clone(),
            }),
        ),
        ExternalSource::WorkflowItem => (ItemKey::Generic { id: raw.id }, ItemType::Task, None),
    };

    WorkflowItem {
        key,
        item_type: raw
            .item_type
            .as_deref()
            .and_then(ItemType::parse)
            .unwrap_or(fallback_type),
        title: raw.title.clone(),
        description: raw.description.clone(),
        content: raw.content.clone(),
        original_content: raw.original_content.clone(),
        author: author_from(raw.author.as_ref()),
        status: map_status(&raw.status),
        priority: raw
            .priority
            .as_deref()
            .and_then(Priority::parse)
            .unwrap_or(Priority::Medium),
        category: raw
            .category
            .as_deref()
            .and_then(Category::parse)
            .unwrap_or(Category::Content),
        review_notes: raw.review_notes.clone(),
        approver: approver_from(raw.reviewer.as_ref()),
        tags: raw.tags.clone().unwrap_or_default(),
        word_count: raw.word_count,
        chapter_reference: raw.chapter_reference.clone(),
        editor,
        created_at: raw.created_at,
        updated_at: raw.updated_at,
    }
}

/// Normalize a whole response, preserving order.
pub fn normalize_all(raw: &[ExternalWorkflowItem]) -> Vec<WorkflowItem> {
    raw.iter().map(normalize).collect()
}
