//! Shared card tables.
//!
//! This module implements:
//! - Entities: users, cards, chips, markers and seated players
//! - TableState: the items and seats guarded by one table lock
//! - Table: exclusive update and shared read transactions over that state
//! - Visibility: the per-viewer view of cards
//! - TableManager: the entry points that mutate tables and notify players
//!
//! ## Architecture
//!
//! Every table is an `Arc<Table>` in the table registry. A mutation runs
//! as one synchronous closure under the table's write lock, returns the
//! changed items together with the players to notify, and the manager
//! dispatches pushes once the lock is released.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use vpoker::registry::{TableRegistry, UserRegistry};
//! use vpoker::table::{TableConfig, TableManager};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let manager = TableManager::new(
//!     Arc::new(UserRegistry::new()),
//!     Arc::new(TableRegistry::new()),
//!     TableConfig::default(),
//! );
//! let alice = manager.register_user("alice").await;
//! let table_id = manager.create_table(&alice).await.unwrap();
//! let card = manager.take_item(table_id, 1, &alice).await.unwrap();
//! assert!(card.is_owned_by(alice.id));
//! # }
//! ```

pub mod config;
pub mod entities;
pub mod errors;
pub mod layout;
pub mod manager;
pub mod state;
pub mod visibility;

pub use config::TableConfig;
pub use entities::{
    Card, Chip, Class, Color, ItemId, ItemKind, ItemUpdate, Player, Side, Suit, TableId, TableItem,
    User, UserId,
};
pub use errors::{ErrorKind, TableError, TableResult};
pub use manager::{TableManager, anonymous_name};
pub use state::{JoinedTable, Table, TableState};
