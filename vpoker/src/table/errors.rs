//! Table error types.

use thiserror::Error;

use super::entities::{Class, ItemId};
use crate::registry::RegistryError;

/// Coarse failure category reported to the acting user.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    BadRequest,
    Capacity,
}

/// Table errors
#[derive(Debug, Error)]
pub enum TableError {
    /// Table does not exist
    #[error("table not found")]
    TableNotFound,

    /// Item does not exist on the table
    #[error("item {0} not found")]
    ItemNotFound(ItemId),

    /// User does not exist
    #[error("user not found")]
    UserNotFound,

    /// Actor is not seated at the table
    #[error("you are not at the table")]
    NotSeated,

    /// Actor does not own the item
    #[error("item {0} is owned by someone else")]
    NotOwner(ItemId),

    /// Attempt to change an item's class
    #[error("attempt to update readonly field class: {stored} -> {proposed}")]
    ImmutableClass { stored: Class, proposed: Class },

    /// Malformed request
    #[error("bad request: {0}")]
    BadRequest(String),

    /// All seats are taken
    #[error("this table is full ({max_seats} seats)")]
    TableFull { max_seats: usize },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl TableError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TableError::TableNotFound
            | TableError::ItemNotFound(_)
            | TableError::UserNotFound
            | TableError::Registry(RegistryError::NotFound(_)) => ErrorKind::NotFound,
            TableError::NotSeated | TableError::NotOwner(_) => ErrorKind::Forbidden,
            TableError::ImmutableClass { .. } | TableError::BadRequest(_) => ErrorKind::BadRequest,
            TableError::TableFull { .. } => ErrorKind::Capacity,
        }
    }

    /// Message safe to hand back to a client. Registry keys are not echoed.
    pub fn client_message(&self) -> String {
        match self {
            TableError::Registry(RegistryError::NotFound(_)) => "not found".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for table operations
pub type TableResult<T> = Result<T, TableError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(TableError::TableNotFound.kind(), ErrorKind::NotFound);
        assert_eq!(TableError::ItemNotFound(3).kind(), ErrorKind::NotFound);
        assert_eq!(TableError::NotSeated.kind(), ErrorKind::Forbidden);
        assert_eq!(TableError::NotOwner(3).kind(), ErrorKind::Forbidden);
        assert_eq!(
            TableError::ImmutableClass {
                stored: Class::Card,
                proposed: Class::Chip
            }
            .kind(),
            ErrorKind::BadRequest
        );
        assert_eq!(TableError::TableFull { max_seats: 3 }.kind(), ErrorKind::Capacity);
        assert_eq!(
            TableError::from(RegistryError::NotFound("abc".to_string())).kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_client_message_hides_registry_keys() {
        let err = TableError::from(RegistryError::NotFound("secret-key".to_string()));
        assert!(!err.client_message().contains("secret-key"));
        assert_eq!(TableError::NotSeated.client_message(), "you are not at the table");
    }
}
