//! Push notifications from table mutations to connected viewers.
//!
//! This module implements:
//! - Push: the closed set of events (`refresh`, `player_joined`, `update_items`)
//! - Mailbox: a player's single attachable outbound channel
//! - PlayerList: fan-out of one event to the other seated players
//! - ViewerSession: the per-connection loop filtering and writing events
//!
//! ## Flow
//!
//! A mutating action collects the other seated players while it holds
//! the table lock, releases the lock, then calls
//! [`PlayerList::notify_all`]. Each viewer's [`ViewerSession`] receives
//! the event, filters a private copy for its viewer, and writes it to its
//! [`PushSink`]. Delivery is best-effort and never replayed.

pub mod fanout;
pub mod mailbox;
pub mod messages;
pub mod session;

pub use fanout::PlayerList;
pub use mailbox::{Mailbox, Subscription, SubscriptionId};
pub use messages::Push;
pub use session::{
    DeliveryError, PushSink, SessionEnd, SessionHandle, TERMINATED_NOTICE, ViewerSession,
};
