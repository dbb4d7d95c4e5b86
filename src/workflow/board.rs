//! Per-viewer state of the approval screen.

use crate::models::collaborator::RoleInputs;

use super::filter::{apply_filters, default_tab, derive_view, Facets, Tab};
use super::gate::{can_approve, visible_tabs};
use super::roles::{RoleSelector, RoleState};
use super::types::{ItemKey, WorkflowItem};

/// One displayed row.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardRow<'a> {
    pub item: &'a WorkflowItem,
    pub can_approve: bool,
}

/// Holds the viewer's roles, active tab, facets, and bulk selection.
///
/// The active tab is picked from the roles exactly once; after that only an
/// explicit [`ApprovalBoard::select_tab`] changes it.
#[derive(Debug)]
pub struct ApprovalBoard {
    user_id: i64,
    selector: RoleSelector,
    roles: RoleState,
    active_tab: Option<Tab>,
    facets: Facets,
    selection: Vec<ItemKey>,
}

impl ApprovalBoard {
    pub fn new(user_id: i64) -> Self {
        Self {
            user_id,
            selector: RoleSelector::new(),
            roles: RoleState::viewer(),
            active_tab: None,
            facets: Facets::default(),
            selection: Vec::new(),
        }
    }

    /// Feed the latest role inputs; returns the (possibly memoized) role state.
    pub fn sync_roles(&mut self, inputs: &RoleInputs) -> &RoleState {
        let state = self.selector.select_inputs(inputs, self.user_id);
        if *state != self.roles {
            self.roles = state.clone();
        }
        if self.active_tab.is_none() {
            self.active_tab = Some(default_tab(&self.roles));
        }
        &self.roles
    }

    pub fn roles(&self) -> &RoleState {
        &self.roles
    }

    pub fn role_computations(&self) -> usize {
        self.selector.computations()
    }

    pub fn tabs(&self) -> Vec<Tab> {
        visible_tabs(&self.roles)
    }

    pub fn active_tab(&self) -> Tab {
        self.active_tab.unwrap_or_else(|| default_tab(&self.roles))
    }

    /// Switch tabs. Tabs hidden from this viewer are refused.
    pub fn select_tab(&mut self, tab: Tab) -> bool {
        if !self.tabs().contains(&tab) {
            return false;
        }
        self.active_tab = Some(tab);
        true
    }

    pub fn facets(&self) -> &Facets {
        &self.facets
    }

    pub fn set_facets(&mut self, facets: Facets) {
        self.facets = facets;
    }

    /// Add a key to the bulk selection. Repeats are ignored and return false.
    pub fn select(&mut self, key: ItemKey) -> bool {
        if self.selection.contains(&key) {
            return false;
        }
        self.selection.push(key);
        true
    }

    /// Selected keys, in the order they were selected.
    pub fn selection(&self) -> &[ItemKey] {
        &self.selection
    }

    /// Active tab's view narrowed by the facets.
    pub fn view<'a>(&self, cache: &'a [WorkflowItem]) -> Vec<&'a WorkflowItem> {
        let base = derive_view(cache, self.active_tab(), self.user_id);
        apply_filters(&base, &self.facets)
    }

    pub fn rows<'a>(&self, cache: &'a [WorkflowItem]) -> Vec<BoardRow<'a>> {
        self.view(cache)
            .into_iter()
            .map(|item| BoardRow {
                item,
                can_approve: can_approve(item, &self.roles),
            })
            .collect()
    }
}
