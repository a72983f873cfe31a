//! # vpoker
//!
//! A shared virtual card table. Players sit at a table, pick up, move,
//! turn and reveal cards and chips, and every other seated player sees
//! each change pushed to them as it happens.
//!
//! Cards a player holds stay private: every export of the table, whether
//! a state fetch or a push, is filtered for its viewer so that only the
//! owner ever sees the face of an owned card.
//!
//! ## Core Modules
//!
//! - [`table`]: Table state, transactions, visibility and the manager
//! - [`push`]: Per-player mailboxes and the viewer push loop
//! - [`registry`]: Lock-guarded registries of users and tables

/// Lock-guarded registries of users and tables.
pub mod registry;
pub use registry::{Registry, RegistryError, TableRegistry, UserRegistry};

/// Push notifications to connected viewers.
pub mod push;
pub use push::{Push, PushSink, SessionEnd, ViewerSession};

/// Shared tables and their transactions.
pub mod table;
pub use table::{
    ErrorKind, Table, TableConfig, TableError, TableItem, TableManager, TableResult, TableState,
    User,
};
