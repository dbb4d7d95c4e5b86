use serde::{Deserialize, Serialize};

/// One collaboration role a user holds on a project, as stored.
/// `role` is free text until the role resolver parses it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RoleRecord {
    pub user_id: i64,
    pub role: String,
    pub status: String,
}

impl RoleRecord {
    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case("active")
    }
}

/// Everything the role resolver needs for one project.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RoleInputs {
    pub owner_id: i64,
    pub records: Vec<RoleRecord>,
}
