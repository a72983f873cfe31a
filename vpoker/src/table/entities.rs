//! Value types living on a shared table: users, seated players, cards,
//! chips and the positioned items that carry them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::push::Mailbox;

/// Table ID type
pub type TableId = Uuid;

/// User ID type
pub type UserId = Uuid;

/// Item ID type, unique within one table
pub type ItemId = u32;

/// Card ranks in deck order.
pub const RANKS: [&str; 13] = [
    "2", "3", "4", "5", "6", "7", "8", "9", "10", "J", "Q", "K", "A",
];

/// A registered visitor. Created on first visit and never removed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(id: UserId, name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: name.into(),
            created_at,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Suit {
    /// A redacted suit, or no suit at all.
    #[default]
    #[serde(rename = "")]
    Blank,
    #[serde(rename = "♠")]
    Spades,
    #[serde(rename = "♥")]
    Hearts,
    #[serde(rename = "♦")]
    Diamonds,
    #[serde(rename = "♣")]
    Clubs,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Spades, Suit::Hearts, Suit::Diamonds, Suit::Clubs];
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Blank => "",
            Self::Spades => "♠",
            Self::Hearts => "♥",
            Self::Diamonds => "♦",
            Self::Clubs => "♣",
        };
        write!(f, "{repr}")
    }
}

/// Which side of a card is facing up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[default]
    Cover,
    Face,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    #[serde(default)]
    pub rank: String,
    #[serde(default)]
    pub suit: Suit,
    #[serde(default)]
    pub side: Side,
}

impl Card {
    pub fn new(rank: impl Into<String>, suit: Suit, side: Side) -> Self {
        Self {
            rank: rank.into(),
            suit,
            side,
        }
    }

    /// Wipes rank and suit so nothing about the card's face is exported.
    pub fn blank(&mut self) {
        self.rank.clear();
        self.suit = Suit::Blank;
    }

    pub fn is_blank(&self) -> bool {
        self.rank.is_empty() && self.suit == Suit::Blank
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

/// Colors used for chips and seat markers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Blue,
    Gray,
    Green,
    Black,
    #[serde(rename = "#FF5733")]
    SeatRed,
    #[serde(rename = "#9B59B6")]
    SeatPurple,
    #[serde(rename = "#2ECC71")]
    SeatGreen,
}

/// Seat colors, handed out by seat index.
pub const PLAYER_COLORS: [Color; 3] = [Color::SeatRed, Color::SeatPurple, Color::SeatGreen];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chip {
    pub color: Color,
    pub val: u32,
}

/// The chip denominations every seat receives on join.
pub const CHIP_SET: [Chip; 5] = [
    Chip { color: Color::Gray, val: 1 },
    Chip { color: Color::Red, val: 5 },
    Chip { color: Color::Blue, val: 10 },
    Chip { color: Color::Green, val: 25 },
    Chip { color: Color::Black, val: 50 },
];

/// Item class without its payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Class {
    Card,
    Chip,
    Dealer,
    Player,
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Class::Card => write!(f, "card"),
            Class::Chip => write!(f, "chip"),
            Class::Dealer => write!(f, "dealer"),
            Class::Player => write!(f, "player"),
        }
    }
}

/// Class-specific payload of an item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "class", rename_all = "lowercase")]
pub enum ItemKind {
    Card(Card),
    Chip(Chip),
    Dealer,
    Player,
}

impl ItemKind {
    pub fn class(&self) -> Class {
        match self {
            ItemKind::Card(_) => Class::Card,
            ItemKind::Chip(_) => Class::Chip,
            ItemKind::Dealer => Class::Dealer,
            ItemKind::Player => Class::Player,
        }
    }
}

/// A positioned object on the table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableItem {
    pub id: ItemId,
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub owner_id: Option<UserId>,
    #[serde(flatten)]
    pub kind: ItemKind,
}

impl TableItem {
    pub fn new(id: ItemId, x: i32, y: i32, kind: ItemKind) -> Self {
        Self {
            id,
            x,
            y,
            owner_id: None,
            kind,
        }
    }

    pub fn card(id: ItemId, x: i32, y: i32, card: Card) -> Self {
        Self::new(id, x, y, ItemKind::Card(card))
    }

    pub fn chip(id: ItemId, x: i32, y: i32, chip: Chip) -> Self {
        Self::new(id, x, y, ItemKind::Chip(chip))
    }

    pub fn dealer(id: ItemId, x: i32, y: i32) -> Self {
        Self::new(id, x, y, ItemKind::Dealer)
    }

    /// A seat marker, owned by the player it stands for.
    pub fn player_marker(id: ItemId, x: i32, y: i32, owner: UserId) -> Self {
        Self {
            owner_id: Some(owner),
            ..Self::new(id, x, y, ItemKind::Player)
        }
    }

    pub fn class(&self) -> Class {
        self.kind.class()
    }

    pub fn is(&self, class: Class) -> bool {
        self.class() == class
    }

    pub fn is_owned(&self) -> bool {
        self.owner_id.is_some()
    }

    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.owner_id == Some(user_id)
    }

    /// Owned, but not by `user_id`.
    pub fn is_owned_by_other(&self, user_id: UserId) -> bool {
        self.is_owned() && !self.is_owned_by(user_id)
    }

    pub fn as_card(&self) -> Option<&Card> {
        match &self.kind {
            ItemKind::Card(card) => Some(card),
            _ => None,
        }
    }

    pub fn as_card_mut(&mut self) -> Option<&mut Card> {
        match &mut self.kind {
            ItemKind::Card(card) => Some(card),
            _ => None,
        }
    }

    pub fn side(&self) -> Option<Side> {
        self.as_card().map(|card| card.side)
    }
}

/// A client's proposed move of one item.
///
/// Only position and orientation are taken from a proposal. A missing
/// `side` leaves the card as it is; owner, rank and suit are ignored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemUpdate {
    pub id: ItemId,
    pub x: i32,
    pub y: i32,
    pub class: Class,
    #[serde(default)]
    pub side: Option<Side>,
}

impl From<&TableItem> for ItemUpdate {
    fn from(item: &TableItem) -> Self {
        Self {
            id: item.id,
            x: item.x,
            y: item.y,
            class: item.class(),
            side: item.side(),
        }
    }
}

/// A user seated at one table.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Player {
    #[serde(flatten)]
    pub user: User,
    pub color: Color,
    #[serde(default)]
    pub skin: String,
    pub index: usize,
    #[serde(skip)]
    pub(crate) mailbox: Mailbox,
}

impl Player {
    pub fn new(user: User, color: Color, index: usize) -> Self {
        Self {
            user,
            color,
            skin: String::new(),
            index,
            mailbox: Mailbox::default(),
        }
    }

    pub fn id(&self) -> UserId {
        self.user.id
    }

    pub fn name(&self) -> &str {
        &self.user.name
    }

    pub fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }

    /// A copy of this player that shares no mailbox with the original.
    pub fn detached(&self) -> Self {
        Self {
            mailbox: Mailbox::default(),
            ..self.clone()
        }
    }
}

impl PartialEq for Player {
    fn eq(&self, other: &Self) -> bool {
        self.user == other.user
            && self.color == other.color
            && self.skin == other.skin
            && self.index == other.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str) -> User {
        User::new(Uuid::new_v4(), name, Utc::now())
    }

    #[test]
    fn test_item_ownership_helpers() {
        let alice = user("alice");
        let bob = user("bob");
        let mut item = TableItem::card(1, 0, 0, Card::new("A", Suit::Spades, Side::Cover));

        assert!(!item.is_owned());
        assert!(!item.is_owned_by_other(alice.id));

        item.owner_id = Some(alice.id);
        assert!(item.is_owned_by(alice.id));
        assert!(!item.is_owned_by_other(alice.id));
        assert!(item.is_owned_by_other(bob.id));
    }

    #[test]
    fn test_player_marker_is_owned_by_its_player() {
        let alice = user("alice");
        let marker = TableItem::player_marker(9, 10, 20, alice.id);
        assert!(marker.is(Class::Player));
        assert!(marker.is_owned_by(alice.id));
        assert_eq!(marker.side(), None);
    }

    #[test]
    fn test_card_serializes_flat_with_class_tag() {
        let item = TableItem::card(7, 3, 4, Card::new("A", Suit::Spades, Side::Cover));
        let json = serde_json::to_value(&item).unwrap();

        assert_eq!(json["class"], "card");
        assert_eq!(json["rank"], "A");
        assert_eq!(json["suit"], "♠");
        assert_eq!(json["side"], "cover");
        assert_eq!(json["id"], 7);
        assert!(json["owner_id"].is_null());
    }

    #[test]
    fn test_blank_suit_serializes_as_empty_string() {
        let mut card = Card::new("K", Suit::Hearts, Side::Cover);
        card.blank();
        let json = serde_json::to_value(&card).unwrap();
        assert_eq!(json["suit"], "");
        assert_eq!(json["rank"], "");
        assert!(card.is_blank());
    }

    #[test]
    fn test_update_without_side_proposes_no_turn() {
        let moved: ItemUpdate =
            serde_json::from_str(r#"{"id": 7, "x": 5, "y": 6, "class": "card"}"#).unwrap();
        assert_eq!(moved.side, None);

        let turned: ItemUpdate = serde_json::from_str(
            r#"{"id": 7, "x": 5, "y": 6, "owner_id": null, "class": "card", "rank": "", "suit": "", "side": "face"}"#,
        )
        .unwrap();
        assert_eq!(turned.side, Some(Side::Face));
    }

    #[test]
    fn test_chip_item_parses_from_client_payload() {
        let item: TableItem = serde_json::from_str(
            r#"{"id": 60, "x": 100, "y": 200, "class": "chip", "color": "blue", "val": 10}"#,
        )
        .unwrap();
        assert_eq!(item.class(), Class::Chip);
        assert_eq!(item.x, 100);
        assert_eq!(item.owner_id, None);
    }

    #[test]
    fn test_detached_player_keeps_identity() {
        let alice = user("alice");
        let player = Player::new(alice.clone(), PLAYER_COLORS[0], 0);
        let copy = player.detached();
        assert_eq!(copy, player);
        assert_eq!(copy.name(), "alice");
        assert!(!copy.mailbox().is_attached());
    }
}
