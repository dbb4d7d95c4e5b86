// Response and template context structures, organized by surface.
// All types are re-exported: `use storyfoundry::templates_structs::*`

pub mod api;
pub mod workflow;

pub use api::*;
pub use workflow::*;
