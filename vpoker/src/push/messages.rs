//! Push event payloads.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::table::entities::{Player, TableItem, UserId};

/// An asynchronous notification describing a table change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Push {
    /// Refetch everything (after a reshuffle, or when events were lost)
    Refresh,

    /// Someone sat down
    PlayerJoined {
        players: BTreeMap<UserId, Player>,
        items: Vec<TableItem>,
    },

    /// Items moved, turned or changed hands
    UpdateItems { items: Vec<TableItem> },
}

impl Push {
    pub fn update_items(items: Vec<TableItem>) -> Self {
        Push::UpdateItems { items }
    }

    pub fn player_joined(players: BTreeMap<UserId, Player>, items: Vec<TableItem>) -> Self {
        Push::PlayerJoined { players, items }
    }

    /// Event name as it appears on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Push::Refresh => "refresh",
            Push::PlayerJoined { .. } => "player_joined",
            Push::UpdateItems { .. } => "update_items",
        }
    }

    pub fn items(&self) -> &[TableItem] {
        match self {
            Push::Refresh => &[],
            Push::PlayerJoined { items, .. } | Push::UpdateItems { items } => items,
        }
    }

    /// A copy of this event as `viewer` is allowed to see it.
    pub fn filtered_for(&self, viewer: UserId) -> Push {
        let mut copy = self.clone();
        if let Push::PlayerJoined { items, .. } | Push::UpdateItems { items } = &mut copy {
            crate::table::visibility::apply_visibility(items.iter_mut(), viewer);
        }
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::entities::{Card, Side, Suit};
    use uuid::Uuid;

    #[test]
    fn test_wire_tags() {
        let refresh = serde_json::to_value(Push::Refresh).unwrap();
        assert_eq!(refresh["type"], "refresh");

        let update = serde_json::to_value(Push::update_items(vec![])).unwrap();
        assert_eq!(update["type"], "update_items");
        assert!(update["items"].as_array().unwrap().is_empty());

        assert_eq!(Push::player_joined(BTreeMap::new(), vec![]).kind(), "player_joined");
    }

    #[test]
    fn test_filtered_copy_leaves_original_untouched() {
        let alice = Uuid::new_v4();
        let mut item = TableItem::card(7, 0, 0, Card::new("A", Suit::Spades, Side::Face));
        item.owner_id = Some(alice);
        let push = Push::update_items(vec![item.clone()]);

        let for_bob = push.filtered_for(Uuid::new_v4());

        assert!(for_bob.items()[0].as_card().unwrap().is_blank());
        assert_eq!(push.items()[0], item);
    }
}
