use serde::{Deserialize, Serialize};

use crate::workflow::{
    Action, BulkFailure, ItemKey, Notice, RoleState, Tab, WorkflowItem,
};

/// API error response.
#[derive(Serialize, Deserialize, Debug)]
pub struct ApiErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// One row of the approval view.
#[derive(Serialize, Debug, Clone)]
pub struct ApiViewRow {
    pub item: WorkflowItem,
    pub can_approve: bool,
}

/// `GET /api/projects/{id}/workflow`
#[derive(Serialize, Debug, Clone)]
pub struct ApiWorkflowView {
    pub roles: RoleState,
    pub tabs: Vec<Tab>,
    pub active_tab: Tab,
    pub total: usize,
    pub items: Vec<ApiViewRow>,
}

/// Query string of the approval view.
#[derive(Deserialize, Debug, Default)]
pub struct WorkflowQuery {
    pub tab: Option<String>,
    pub search: Option<String>,
    pub status: Option<String>,
    pub role: Option<String>,
    pub category: Option<String>,
    pub notice: Option<String>,
}

/// `POST /api/projects/{id}/workflow/decisions`
#[derive(Deserialize, Debug)]
pub struct ApiDecisionRequest {
    pub item: ItemKey,
    pub action: Action,
    #[serde(default)]
    pub notes: Option<String>,
}

/// `POST /api/projects/{id}/workflow/decisions/bulk`
#[derive(Deserialize, Debug)]
pub struct ApiBulkDecisionRequest {
    pub items: Vec<ItemKey>,
    pub action: Action,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct ApiDecisionResponse {
    pub notice: Notice,
}

#[derive(Serialize, Debug)]
pub struct ApiBulkDecisionResponse {
    pub applied: Vec<ItemKey>,
    pub failed: Vec<BulkFailure>,
    pub notice: Notice,
}

#[derive(Serialize, Debug)]
pub struct ApiRefreshResponse {
    pub total: usize,
}
