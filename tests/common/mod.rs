//! Shared test infrastructure.
//!
//! - `MemoryBackend` - an in-memory approval store with failure injection
//!   and call counters, for workflow and handler tests.
//! - fixtures for external approval rows and role records.
//! - `setup_test_db()` - a migrated Postgres database for query tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use sqlx::PgPool;

use storyfoundry::models::approval::{
    DecisionReceipt, EditorDecisionRequest, ExternalProfile, ExternalSource, ExternalWorkflowItem,
    WorkflowItemPatch,
};
use storyfoundry::models::collaborator::{RoleInputs, RoleRecord};
use storyfoundry::workflow::cache::Clock;
use storyfoundry::workflow::{ApprovalBackend, ItemKey, RemoteError};

// ============================================================================
// TEST CONSTANTS
// ============================================================================

pub const PROJECT_ID: i64 = 1;
pub const OWNER_ID: i64 = 100;
pub const EDITOR_ID: i64 = 1;
pub const COAUTHOR_ID: i64 = 2;
pub const REVIEWER_ID: i64 = 3;
pub const VIEWER_ID: i64 = 9;

// ============================================================================
// IN-MEMORY STORE
// ============================================================================

#[derive(Default)]
struct MemoryState {
    owner_id: i64,
    records: Vec<RoleRecord>,
    names: HashMap<i64, String>,
    items: Vec<ExternalWorkflowItem>,
    fetch_failure: Option<RemoteError>,
    decision_failures: HashMap<ItemKey, RemoteError>,
    fetch_calls: usize,
    editor_requests: Vec<EditorDecisionRequest>,
    patches: Vec<(i64, WorkflowItemPatch)>,
}

/// Approval store held in memory. Decisions mutate the stored rows so a
/// refetch observes them, the way the real store behaves.
#[derive(Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    pub fn new(owner_id: i64) -> Self {
        let backend = Self::default();
        backend.lock().owner_id = owner_id;
        backend
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn with_role(self, user_id: i64, role: &str) -> Self {
        self.lock().records.push(role_record(user_id, role, "active"));
        self
    }

    pub fn with_record(self, record: RoleRecord) -> Self {
        self.lock().records.push(record);
        self
    }

    pub fn with_name(self, user_id: i64, name: &str) -> Self {
        self.lock().names.insert(user_id, name.to_string());
        self
    }

    pub fn with_item(self, item: ExternalWorkflowItem) -> Self {
        self.lock().items.push(item);
        self
    }

    pub fn fail_fetch(&self, status: u16, body: &str) {
        self.lock().fetch_failure = Some(RemoteError::new(status, body));
    }

    pub fn clear_fetch_failure(&self) {
        self.lock().fetch_failure = None;
    }

    pub fn fail_decision(&self, key: ItemKey, status: u16, body: &str) {
        self.lock().decision_failures.insert(key, RemoteError::new(status, body));
    }

    pub fn push_item(&self, item: ExternalWorkflowItem) {
        self.lock().items.push(item);
    }

    pub fn fetch_calls(&self) -> usize {
        self.lock().fetch_calls
    }

    pub fn editor_requests(&self) -> Vec<EditorDecisionRequest> {
        self.lock().editor_requests.clone()
    }

    pub fn patches(&self) -> Vec<(i64, WorkflowItemPatch)> {
        self.lock().patches.clone()
    }

    pub fn stored_status(&self, source: ExternalSource, id: i64) -> Option<String> {
        self.lock()
            .items
            .iter()
            .find(|i| i.source == source && i.id == id)
            .map(|i| i.status.clone())
    }
}

impl ApprovalBackend for MemoryBackend {
    async fn fetch_project_items(&self, _project_id: i64) -> Result<Vec<ExternalWorkflowItem>, RemoteError> {
        let mut state = self.lock();
        state.fetch_calls += 1;
        if let Some(e) = &state.fetch_failure {
            return Err(e.clone());
        }
        Ok(state.items.clone())
    }

    async fn load_role_inputs(&self, _project_id: i64) -> Result<RoleInputs, RemoteError> {
        let state = self.lock();
        Ok(RoleInputs {
            owner_id: state.owner_id,
            records: state.records.clone(),
        })
    }

    async fn decide_editor_change(
        &self,
        _project_id: i64,
        actor_id: i64,
        request: EditorDecisionRequest,
    ) -> Result<DecisionReceipt, RemoteError> {
        let mut state = self.lock();
        state.editor_requests.push(request.clone());

        let key = ItemKey::EditorChange { change_id: request.pending_change_id };
        if let Some(e) = state.decision_failures.get(&key) {
            return Err(e.clone());
        }
        if actor_id != state.owner_id {
            return Err(RemoteError::new(403, "Only the project owner can decide editor changes"));
        }

        let reviewer = reviewer_profile(&state.names, actor_id);
        let item = state
            .items
            .iter_mut()
            .find(|i| i.source == ExternalSource::PendingChange && i.id == request.pending_change_id)
            .ok_or_else(|| RemoteError::new(404, "Not found"))?;
        if item.status != "pending" {
            return Err(RemoteError::new(409, format!("Change already {}", item.status)));
        }
        item.status = request.decision.stored_status().to_string();
        item.review_notes = request.feedback_notes.clone();
        item.reviewer = Some(reviewer);
        item.updated_at = Some(Utc::now());

        Ok(DecisionReceipt {
            message: request.decision.message().to_string(),
        })
    }

    async fn update_workflow_item(
        &self,
        _project_id: i64,
        actor_id: i64,
        item_id: i64,
        patch: WorkflowItemPatch,
    ) -> Result<ExternalWorkflowItem, RemoteError> {
        let mut state = self.lock();
        state.patches.push((item_id, patch.clone()));

        if let Some(e) = state.decision_failures.get(&ItemKey::Generic { id: item_id }) {
            return Err(e.clone());
        }

        let reviewer = reviewer_profile(&state.names, actor_id);
        let item = state
            .items
            .iter_mut()
            .find(|i| i.source == ExternalSource::WorkflowItem && i.id == item_id)
            .ok_or_else(|| RemoteError::new(404, format!("Workflow item {item_id} not found")))?;
        if !matches!(item.status.as_str(), "pending_approval" | "pending_request") {
            return Err(RemoteError::new(409, format!("Workflow item {item_id} already {}", item.status)));
        }
        item.status = patch.status;
        item.review_notes = patch.review_notes;
        if let Some(priority) = patch.priority {
            item.priority = Some(priority);
        }
        item.reviewer = Some(reviewer);
        item.updated_at = Some(Utc::now());
        Ok(item.clone())
    }
}

fn reviewer_profile(names: &HashMap<i64, String>, user_id: i64) -> ExternalProfile {
    ExternalProfile {
        id: Some(user_id),
        full_name: names.get(&user_id).cloned(),
        ..Default::default()
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, minute, 0).single().expect("valid timestamp")
}

pub fn profile(id: i64, name: &str, role: &str) -> ExternalProfile {
    ExternalProfile {
        id: Some(id),
        full_name: Some(name.to_string()),
        avatar_url: None,
        role: Some(role.to_string()),
        roles: vec![role.to_string()],
    }
}

pub fn role_record(user_id: i64, role: &str, status: &str) -> RoleRecord {
    RoleRecord {
        user_id,
        role: role.to_string(),
        status: status.to_string(),
    }
}

/// A pending editor change, as the store reports it.
pub fn editor_change(id: i64, author: ExternalProfile, title: &str) -> ExternalWorkflowItem {
    ExternalWorkflowItem {
        id,
        source: ExternalSource::PendingChange,
        item_type: Some("edit".to_string()),
        title: Some(title.to_string()),
        content: Some(format!("{title} body")),
        status: "pending".to_string(),
        author: Some(author),
        content_type: Some("chapter".to_string()),
        editor_notes: Some("tightened prose".to_string()),
        created_at: Some(at(id as u32 % 60)),
        ..Default::default()
    }
}

/// A generic workflow item in the given internal status.
pub fn generic_item(
    id: i64,
    item_type: &str,
    author: ExternalProfile,
    title: &str,
    status: &str,
) -> ExternalWorkflowItem {
    ExternalWorkflowItem {
        id,
        source: ExternalSource::WorkflowItem,
        item_type: Some(item_type.to_string()),
        title: Some(title.to_string()),
        content: Some(format!("{title} body")),
        status: status.to_string(),
        priority: Some("high".to_string()),
        category: Some("plot".to_string()),
        author: Some(author),
        tags: Some(vec!["draft".to_string()]),
        created_at: Some(at(id as u32 % 60)),
        ..Default::default()
    }
}

/// Owner 100, editor 1, coauthor 2, reviewer 3; one editor change (42) by the
/// editor and one suggestion (7) by the reviewer.
pub fn sample_backend() -> MemoryBackend {
    MemoryBackend::new(OWNER_ID)
        .with_role(EDITOR_ID, "editor")
        .with_role(COAUTHOR_ID, "coauthor")
        .with_role(REVIEWER_ID, "reviewer")
        .with_name(OWNER_ID, "Olive Owner")
        .with_name(COAUTHOR_ID, "Cora Coauthor")
        .with_item(editor_change(42, profile(EDITOR_ID, "Eddie Editor", "editor"), "Dragon Chapter Edit"))
        .with_item(generic_item(
            7,
            "suggestion",
            profile(REVIEWER_ID, "Rae Reviewer", "reviewer"),
            "Ocean Scene",
            "pending_approval",
        ))
}

// ============================================================================
// CLOCK
// ============================================================================

/// A settable clock for freshness tests.
#[derive(Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { now: Arc::new(Mutex::new(start)) }
    }

    pub fn advance(&self, by: TimeDelta) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }

    pub fn clock(&self) -> Clock {
        let now = Arc::clone(&self.now);
        Arc::new(move || *now.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

// ============================================================================
// DATABASE SETUP
// ============================================================================

/// A migrated Postgres database for query tests.
pub struct TestDb {
    pool: PgPool,
}

impl TestDb {
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Connect to `TEST_DATABASE_URL`, run migrations and start from empty tables.
///
/// Tests using this are `#[ignore]`d; run them with
/// `TEST_DATABASE_URL=postgres://... cargo test -- --ignored --test-threads=1`.
pub async fn setup_test_db() -> TestDb {
    dotenvy::dotenv().ok();
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set for database tests");
    let pool = storyfoundry::db::init_pool(&url, 2)
        .await
        .expect("Failed to connect to test database");
    storyfoundry::db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    sqlx::query(
        "TRUNCATE audit_entries, workflow_items, pending_changes, project_collaborators, projects, profiles \
         RESTART IDENTITY CASCADE",
    )
    .execute(&pool)
    .await
    .expect("Failed to reset tables");

    TestDb { pool }
}

/// Insert a profile with an explicit id.
pub async fn insert_profile(pool: &PgPool, id: i64, name: &str) {
    sqlx::query("INSERT INTO profiles (id, full_name) VALUES ($1, $2)")
        .bind(id)
        .bind(name)
        .execute(pool)
        .await
        .expect("insert profile");
}

/// Insert a project owned by `owner_id`.
pub async fn insert_project(pool: &PgPool, id: i64, owner_id: i64, title: &str) {
    sqlx::query("INSERT INTO projects (id, owner_id, title) VALUES ($1, $2, $3)")
        .bind(id)
        .bind(owner_id)
        .bind(title)
        .execute(pool)
        .await
        .expect("insert project");
}
