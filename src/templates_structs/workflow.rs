use askama::Template;

use crate::workflow::{BoardRow, Category, ItemStatus, Role, Tab};

pub struct TabLink {
    pub key: &'static str,
    pub label: &'static str,
    pub active: bool,
}

impl From<(Tab, Tab)> for TabLink {
    fn from((tab, active): (Tab, Tab)) -> Self {
        TabLink {
            key: tab.as_str(),
            label: tab.label(),
            active: tab == active,
        }
    }
}

pub struct FacetOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

impl FacetOption {
    fn list(options: impl IntoIterator<Item = (&'static str, &'static str)>, current: Option<&str>) -> Vec<Self> {
        let current = current.unwrap_or("all");
        std::iter::once(("all", "All"))
            .chain(options)
            .map(|(value, label)| FacetOption { value, label, selected: value == current })
            .collect()
    }

    pub fn statuses(current: Option<ItemStatus>) -> Vec<Self> {
        Self::list(
            ItemStatus::ALL.iter().map(|s| (s.as_str(), s.label())),
            current.as_ref().map(ItemStatus::as_str),
        )
    }

    pub fn roles(current: Option<Role>) -> Vec<Self> {
        Self::list(
            Role::ALL.iter().map(|r| (r.as_str(), r.label())),
            current.as_ref().map(Role::as_str),
        )
    }

    pub fn categories(current: Option<Category>) -> Vec<Self> {
        Self::list(
            Category::ALL.iter().map(|c| (c.as_str(), c.as_str())),
            current.as_ref().map(Category::as_str),
        )
    }
}

/// Display-ready row for the approvals page.
pub struct ApprovalRow {
    pub key: String,
    pub type_label: &'static str,
    pub title: String,
    pub author_name: String,
    pub status: &'static str,
    pub status_label: &'static str,
    pub priority: &'static str,
    pub category: &'static str,
    pub review_notes: String,
    pub approver_name: String,
    pub can_approve: bool,
    pub is_pending: bool,
}

impl From<&BoardRow<'_>> for ApprovalRow {
    fn from(row: &BoardRow<'_>) -> Self {
        let item = row.item;
        ApprovalRow {
            key: item.key.to_string(),
            type_label: item.item_type.label(),
            title: item.title.clone().unwrap_or_else(|| "(untitled)".to_string()),
            author_name: item.author.name.clone(),
            status: item.status.as_str(),
            status_label: item.status.label(),
            priority: item.priority.as_str(),
            category: item.category.as_str(),
            review_notes: item.review_notes.clone().unwrap_or_default(),
            approver_name: item.approver.as_ref().map(|a| a.name.clone()).unwrap_or_default(),
            can_approve: row.can_approve,
            is_pending: item.status.is_pending(),
        }
    }
}

#[derive(Template)]
#[template(path = "workflow/approvals.html")]
pub struct ApprovalsTemplate {
    pub project_id: i64,
    pub csrf_token: String,
    pub role_labels: String,
    pub notice: Option<String>,
    pub active_tab: &'static str,
    pub tabs: Vec<TabLink>,
    pub search: String,
    pub status_options: Vec<FacetOption>,
    pub role_options: Vec<FacetOption>,
    pub category_options: Vec<FacetOption>,
    pub rows: Vec<ApprovalRow>,
}

/// Decision form posted from a row of the approvals page.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct DecisionForm {
    #[serde(default)]
    pub csrf_token: String,
    pub item: String,
    pub action: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub tab: Option<String>,
}
