//! Collaboration approval workflow: role resolution, the per-project item
//! cache, tab and facet filtering, the permission gate, and decision dispatch.
//!
//! ```text
//! roles ──► gate / tabs
//!   │
//! backend ──► cache ──► tab filter ──► facet filter ──► rows
//!   ▲                                                   │
//!   └──────────────── dispatcher ◄──────── decision ◄───┘
//! ```

pub mod backend;
pub mod board;
pub mod cache;
pub mod dispatch;
pub mod filter;
pub mod gate;
pub mod normalize;
pub mod roles;
pub mod types;

pub use backend::{ApprovalBackend, PgBackend, RemoteError};
pub use board::{ApprovalBoard, BoardRow};
pub use cache::WorkflowCache;
pub use dispatch::{
    BulkFailure, BulkReport, DispatchError, Dispatcher, Notice, NoticeLevel, PromptResponse,
    ReviewPrompt, SuppliedNotes,
};
pub use filter::{apply_filters, default_tab, derive_view, Facets, Tab};
pub use gate::{can_approve, visible_tabs};
pub use roles::{resolve_roles, Role, RoleSelector, RoleState};
pub use types::*;
