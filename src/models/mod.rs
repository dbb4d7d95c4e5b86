pub mod approval;
pub mod collaborator;
