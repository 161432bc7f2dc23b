//! Type definitions

pub mod chat;
pub mod job;
pub mod messages;
pub mod route;

pub use chat::*;
pub use job::*;
pub use messages::*;
pub use route::*;
