pub mod actor;
pub mod csrf;
pub mod middleware;

pub use actor::{actor_id, Actor, USER_ID_HEADER};
