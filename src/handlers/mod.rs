pub mod api_v1;
pub mod workflow_handlers;

use crate::workflow::WorkflowCache;

/// Shared application state: the approval store and the per-project item cache.
pub struct AppState<B> {
    pub backend: B,
    pub cache: WorkflowCache,
}

impl<B> AppState<B> {
    pub fn new(backend: B, cache: WorkflowCache) -> Self {
        Self { backend, cache }
    }
}
