//! Conversation core: sessions, their store and the transition function.

pub mod access;
pub mod machine;
pub mod session;
pub mod store;
pub mod texts;
pub mod validate;

pub use access::{AllowList, Caller, Roles};
pub use machine::{step, Choice, Effect, Input, Reply, Step};
pub use session::{Draft, Sale, Session, State};
pub use store::{SessionGuard, SessionStore};
