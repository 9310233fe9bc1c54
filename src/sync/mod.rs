pub mod board;
pub mod codec;
pub mod collection;
pub mod form;
pub mod gateway;
pub mod health;
pub mod keyring;
pub mod ledger;
pub mod memos;
pub mod projects;
pub mod reorder;
pub mod session;
pub mod todos;
pub mod wire;

#[cfg(test)]
pub(crate) mod testing;

pub use board::Board;
pub use gateway::{Endpoint, Gateway, HttpStore, RemoteStore, TableType};
pub use reorder::{Bounds, Hover, Layout, ReorderOutcome, Subject};
pub use session::Session;

use crate::error::ValidationError;

/// How a collection operation settled.
///
/// Collections change only for `Applied`; the other two leave every
/// collection as it was.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T = ()> {
    /// The store acknowledged and the collections were updated.
    Applied(T),
    /// The store gave no result; the cause was logged.
    Rejected,
    /// Refused before any request was sent.
    Invalid(ValidationError),
}

impl<T> Outcome<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied(_))
    }

    pub fn applied(self) -> Option<T> {
        match self {
            Outcome::Applied(value) => Some(value),
            _ => None,
        }
    }
}
