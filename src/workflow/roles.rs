//! Role resolution for the acting user on a project.
//!
//! Role names arrive as free text from collaborator rows ("Owner", "editor",
//! "co-author", ...). They are parsed once, here, into [`Role`]; nothing
//! downstream compares role strings.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::collaborator::{RoleInputs, RoleRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Owner,
    Editor,
    Coauthor,
    Reviewer,
    Producer,
    Viewer,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Owner,
        Role::Editor,
        Role::Coauthor,
        Role::Reviewer,
        Role::Producer,
        Role::Viewer,
    ];

    /// Case-insensitive parse; accepts the hyphenated/underscored co-author spellings.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "owner" => Some(Role::Owner),
            "editor" => Some(Role::Editor),
            "coauthor" | "co-author" | "co_author" => Some(Role::Coauthor),
            "reviewer" => Some(Role::Reviewer),
            "producer" => Some(Role::Producer),
            "viewer" => Some(Role::Viewer),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Editor => "editor",
            Role::Coauthor => "coauthor",
            Role::Reviewer => "reviewer",
            Role::Producer => "producer",
            Role::Viewer => "viewer",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::Owner => "Owner",
            Role::Editor => "Editor",
            Role::Coauthor => "Co-author",
            Role::Reviewer => "Reviewer",
            Role::Producer => "Producer",
            Role::Viewer => "Viewer",
        }
    }
}

/// Effective roles of the acting user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleState {
    pub is_owner: bool,
    pub roles: BTreeSet<Role>,
}

impl RoleState {
    pub fn viewer() -> Self {
        Self {
            is_owner: false,
            roles: BTreeSet::from([Role::Viewer]),
        }
    }

    pub fn has(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Owner by project ownership or by an explicit owner role.
    pub fn is_owner_like(&self) -> bool {
        self.is_owner || self.has(Role::Owner)
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.roles.iter().map(Role::label).collect()
    }
}

/// Derive the role set of `user_id` on a project owned by `owner_id`.
///
/// Ownership short-circuits to exactly `{Owner}`. Otherwise the result is the
/// union of the user's active collaboration roles, or `{Viewer}` when there
/// are none.
pub fn resolve_roles(owner_id: i64, user_id: i64, records: &[RoleRecord]) -> RoleState {
    if user_id == owner_id {
        return RoleState {
            is_owner: true,
            roles: BTreeSet::from([Role::Owner]),
        };
    }

    let mut roles = BTreeSet::new();
    for record in records
        .iter()
        .filter(|r| r.user_id == user_id && r.is_active())
    {
        match Role::parse(&record.role) {
            Some(role) => {
                roles.insert(role);
            }
            None => log::warn!(
                "Skipping unknown collaborator role '{}' for user {}",
                record.role,
                user_id
            ),
        }
    }

    if roles.is_empty() {
        RoleState::viewer()
    } else {
        RoleState { is_owner: false, roles }
    }
}

/// Memoized [`resolve_roles`]: recomputes only when the owner, the user, or
/// the role records change structurally.
#[derive(Debug, Default)]
pub struct RoleSelector {
    cached: Option<Cached>,
    computations: usize,
}

#[derive(Debug)]
struct Cached {
    owner_id: i64,
    user_id: i64,
    records: Vec<RoleRecord>,
    state: RoleState,
}

impl RoleSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, owner_id: i64, user_id: i64, records: &[RoleRecord]) -> &RoleState {
        let cached = match self.cached.take() {
            Some(c) if c.owner_id == owner_id && c.user_id == user_id && c.records == records => c,
            _ => {
                self.computations += 1;
                Cached {
                    owner_id,
                    user_id,
                    records: records.to_vec(),
                    state: resolve_roles(owner_id, user_id, records),
                }
            }
        };
        &self.cached.insert(cached).state
    }

    pub fn select_inputs(&mut self, inputs: &RoleInputs, user_id: i64) -> &RoleState {
        self.select(inputs.owner_id, user_id, &inputs.records)
    }

    /// How many times the role set was actually recomputed.
    pub fn computations(&self) -> usize {
        self.computations
    }
}
