//! Delivering one event to several players.

use std::sync::Arc;

use super::messages::Push;
use crate::table::entities::Player;

/// Players to notify about a change, collected under the table lock and
/// notified after it is released.
#[derive(Debug, Default)]
pub struct PlayerList(Vec<Player>);

impl PlayerList {
    pub fn new(players: Vec<Player>) -> Self {
        Self(players)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.0.iter()
    }

    /// Dispatch `push` to every player in the list. Returns how many
    /// players had a live subscription.
    pub fn notify_all(&self, push: Push) -> usize {
        let push = Arc::new(push);
        let mut delivered = 0;
        for player in &self.0 {
            if player.mailbox().dispatch(push.clone()) {
                delivered += 1;
            } else {
                log::debug!(
                    "recipient={} push={} dropped: not listening",
                    player.name(),
                    push.kind()
                );
            }
        }
        delivered
    }
}

impl FromIterator<Player> for PlayerList {
    fn from_iter<I: IntoIterator<Item = Player>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
