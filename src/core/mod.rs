pub mod health;
pub mod memo;
pub mod money;
pub mod project;
pub mod temporal;
pub mod todo;
pub mod validate;

/// A record persisted by the remote store, identified by the id it assigned.
pub trait Entity: Clone {
    fn id(&self) -> i64;
}
