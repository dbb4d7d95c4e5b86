//! Tab and facet filtering over the cached item set.
//!
//! Both stages narrow without reordering: output order is always the cache order.

use serde::{Deserialize, Serialize};

use super::roles::{Role, RoleState};
use super::types::{Category, ItemStatus, WorkflowItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    PendingApprovals,
    AllRequests,
    MySubmissions,
}

impl Tab {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending_approvals" => Some(Tab::PendingApprovals),
            "all_requests" => Some(Tab::AllRequests),
            "my_submissions" => Some(Tab::MySubmissions),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tab::PendingApprovals => "pending_approvals",
            Tab::AllRequests => "all_requests",
            Tab::MySubmissions => "my_submissions",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tab::PendingApprovals => "Pending approvals",
            Tab::AllRequests => "All requests",
            Tab::MySubmissions => "My submissions",
        }
    }
}

/// Initial tab: owners land on pending approvals, everyone else on their own submissions.
pub fn default_tab(roles: &RoleState) -> Tab {
    if roles.is_owner_like() {
        Tab::PendingApprovals
    } else {
        Tab::MySubmissions
    }
}

/// Base view for a tab.
pub fn derive_view(cache: &[WorkflowItem], tab: Tab, current_user_id: i64) -> Vec<&WorkflowItem> {
    cache
        .iter()
        .filter(|item| match tab {
            Tab::PendingApprovals => item.status == ItemStatus::PendingApproval,
            Tab::MySubmissions => item.author.id == current_user_id,
            Tab::AllRequests => true,
        })
        .collect()
}

/// Search text plus exact-match facets. `None` on a facet means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Facets {
    pub search: String,
    pub status: Option<ItemStatus>,
    pub role: Option<Role>,
    pub category: Option<Category>,
}

impl Facets {
    /// Build facets from raw query values; empty strings and `"all"` disable a facet.
    pub fn from_raw(
        search: Option<&str>,
        status: Option<&str>,
        role: Option<&str>,
        category: Option<&str>,
    ) -> Result<Self, String> {
        Ok(Self {
            search: search.unwrap_or("").trim().to_string(),
            status: parse_facet(status, "status", ItemStatus::parse)?,
            role: parse_facet(role, "role", Role::parse)?,
            category: parse_facet(category, "category", Category::parse)?,
        })
    }

    pub fn is_unfiltered(&self) -> bool {
        self.search.is_empty() && self.status.is_none() && self.role.is_none() && self.category.is_none()
    }

    fn matches(&self, item: &WorkflowItem, needle: &str) -> bool {
        if let Some(status) = self.status {
            if item.status != status {
                return false;
            }
        }
        if let Some(role) = self.role {
            if item.author.role != role {
                return false;
            }
        }
        if let Some(category) = self.category {
            if item.category != category {
                return false;
            }
        }
        needle.is_empty() || matches_search(item, needle)
    }
}

fn parse_facet<T>(
    raw: Option<&str>,
    name: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Option<T>, String> {
    match raw.map(str::trim) {
        None | Some("") | Some("all") => Ok(None),
        Some(value) => parse(value)
            .map(Some)
            .ok_or_else(|| format!("Unknown {name} filter '{value}'")),
    }
}

/// Case-insensitive substring match on title, author name, or content.
/// `needle` must already be lowercase.
fn matches_search(item: &WorkflowItem, needle: &str) -> bool {
    let hit = |text: &str| text.to_lowercase().contains(needle);
    item.title.as_deref().is_some_and(hit)
        || hit(&item.author.name)
        || item.content.as_deref().is_some_and(hit)
}

/// Narrow a tab view by search text and facets; all predicates must hold.
pub fn apply_filters<'a>(view: &[&'a WorkflowItem], facets: &Facets) -> Vec<&'a WorkflowItem> {
    let needle = facets.search.to_lowercase();
    view.iter()
        .copied()
        .filter(|item| facets.matches(item, &needle))
        .collect()
}
