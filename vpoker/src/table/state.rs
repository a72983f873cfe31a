//! The shared table and its transactions.
//!
//! A [`Table`] wraps its whole [`TableState`] (items, seated players,
//! seat capacity) in one `RwLock`. [`Table::update`] runs a closure with
//! sole write access; [`Table::read`] runs one with shared access. Both
//! closures are synchronous, so nothing can be awaited (and no push can
//! be dispatched) while a table lock is held: transactions return what
//! changed and who to tell, and the caller notifies after release.
//!
//! Every operation on [`TableState`] validates before it writes, so an
//! operation returning an error leaves the state untouched.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::{
    config::TableConfig,
    entities::{
        Class, ItemId, ItemUpdate, PLAYER_COLORS, Player, Side, TableId, TableItem, User, UserId,
    },
    errors::{TableError, TableResult},
    layout,
};
use crate::push::PlayerList;

fn default_chips_per_stack() -> u32 {
    TableConfig::default().chips_per_stack
}

/// Everything guarded by a table's lock.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TableState {
    pub id: TableId,

    /// Seat capacity
    pub max_seats: usize,

    /// Chips of each denomination a joining seat receives
    #[serde(default = "default_chips_per_stack")]
    pub chips_per_stack: u32,

    /// Items ordered by id
    pub items: Vec<TableItem>,

    /// Seated players by user id
    pub players: BTreeMap<UserId, Player>,
}

/// What a successful join produced.
#[derive(Debug)]
pub struct JoinedTable {
    /// The joining player
    pub player: Player,

    /// Items created for the new seat
    pub items: Vec<TableItem>,

    /// Seat map after the join, detached from live mailboxes
    pub players: BTreeMap<UserId, Player>,
}

impl TableState {
    pub fn new(id: TableId, config: &TableConfig) -> Self {
        Self {
            id,
            max_seats: config.max_seats,
            chips_per_stack: config.chips_per_stack,
            items: Vec::new(),
            players: BTreeMap::new(),
        }
    }

    /// Lay out a fresh shuffled deck and the dealer marker.
    pub fn start_game(&mut self) -> &mut Self {
        let deck = layout::deck(self.next_item_id());
        self.items.extend(deck);
        let (x, y) = layout::DEALER_ORIGIN;
        let dealer = TableItem::dealer(self.next_item_id(), x, y);
        self.items.push(dealer);
        self
    }

    fn next_item_id(&self) -> ItemId {
        self.items.last().map_or(1, |item| item.id + 1)
    }

    fn position(&self, id: ItemId) -> Option<usize> {
        self.items.binary_search_by_key(&id, |item| item.id).ok()
    }

    pub fn item(&self, id: ItemId) -> Option<&TableItem> {
        self.position(id).map(|pos| &self.items[pos])
    }

    fn item_mut(&mut self, id: ItemId) -> TableResult<&mut TableItem> {
        let pos = self.position(id).ok_or(TableError::ItemNotFound(id))?;
        Ok(&mut self.items[pos])
    }

    pub fn player(&self, user_id: UserId) -> Option<&Player> {
        self.players.get(&user_id)
    }

    pub fn is_seated(&self, user_id: UserId) -> bool {
        self.players.contains_key(&user_id)
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.max_seats
    }

    /// The actor's seat, or `NotSeated`.
    pub fn ensure_seated(&self, user_id: UserId) -> TableResult<&Player> {
        self.player(user_id).ok_or(TableError::NotSeated)
    }

    /// Seat `user` at the lowest free seat, handing out a marker and a
    /// chip set. Returns `None` if the user is already seated.
    pub fn join(&mut self, user: &User) -> TableResult<Option<JoinedTable>> {
        if self.is_seated(user.id) {
            return Ok(None);
        }
        if self.is_full() {
            return Err(TableError::TableFull {
                max_seats: self.max_seats,
            });
        }
        let seat = (0..self.max_seats)
            .find(|seat| self.players.values().all(|p| p.index != *seat))
            .ok_or(TableError::TableFull {
                max_seats: self.max_seats,
            })?;

        let color = PLAYER_COLORS[seat % PLAYER_COLORS.len()];
        let player = Player::new(user.clone(), color, seat);
        let items = layout::seat_items(self.next_item_id(), seat, user.id, self.chips_per_stack);

        self.items.extend(items.iter().cloned());
        self.players.insert(user.id, player.clone());
        log::debug!(
            "table_id={} user_name={} seated at {} players_joined={}",
            self.id,
            user.name,
            seat,
            self.players.len()
        );

        Ok(Some(JoinedTable {
            player,
            items,
            players: self.detached_players(),
        }))
    }

    /// Pick an item up. Cards are turned to their cover.
    pub fn take_item(&mut self, item_id: ItemId, user_id: UserId) -> TableResult<TableItem> {
        self.ensure_seated(user_id)?;
        let item = self.item_mut(item_id)?;
        if item.is_owned_by_other(user_id) {
            return Err(TableError::NotOwner(item_id));
        }
        item.owner_id = Some(user_id);
        if let Some(card) = item.as_card_mut() {
            card.side = Side::Cover;
        }
        Ok(item.clone())
    }

    /// Turn an owned card face up.
    pub fn show_item(&mut self, item_id: ItemId, user_id: UserId) -> TableResult<TableItem> {
        self.ensure_seated(user_id)?;
        let item = self.item_mut(item_id)?;
        if !item.is_owned_by(user_id) {
            return Err(TableError::NotOwner(item_id));
        }
        if let Some(card) = item.as_card_mut() {
            card.side = Side::Face;
        }
        Ok(item.clone())
    }

    /// Move an item, and turn it if the actor may.
    ///
    /// Position always follows the proposal. A proposed side applies only
    /// to cards that are unowned or owned by the actor.
    pub fn update_item(&mut self, proposed: &ItemUpdate, user_id: UserId) -> TableResult<TableItem> {
        self.ensure_seated(user_id)?;
        let item = self.item_mut(proposed.id)?;
        if item.class() != proposed.class {
            return Err(TableError::ImmutableClass {
                stored: item.class(),
                proposed: proposed.class,
            });
        }

        item.x = proposed.x;
        item.y = proposed.y;

        let may_turn = !item.is_owned_by_other(user_id);
        if let (Some(side), true) = (proposed.side, may_turn)
            && let Some(card) = item.as_card_mut()
        {
            card.side = side;
        }
        Ok(item.clone())
    }

    /// Gather every card back into a freshly shuffled face-down deck.
    /// Chips and markers stay where they are.
    pub fn shuffle(&mut self, user_id: UserId) -> TableResult<()> {
        self.ensure_seated(user_id)?;
        let mut faces = layout::shuffled_faces().into_iter();
        let cards = self.items.iter_mut().filter(|item| item.is(Class::Card));
        for (n, item) in cards.enumerate() {
            let (x, y) = layout::deck_position(n);
            item.x = x;
            item.y = y;
            item.owner_id = None;
            if let (Some(card), Some((rank, suit))) = (item.as_card_mut(), faces.next()) {
                card.rank = rank.to_string();
                card.suit = suit;
                card.side = Side::Cover;
            }
        }
        Ok(())
    }

    /// Every seated player except `user_id`, sharing their live mailboxes.
    pub fn other_players(&self, user_id: UserId) -> PlayerList {
        self.players
            .values()
            .filter(|player| player.id() != user_id)
            .cloned()
            .collect()
    }

    /// Seated players ordered by seat, detached from their mailboxes.
    pub fn players_by_seat(&self) -> Vec<Player> {
        let mut players: Vec<Player> = self.players.values().map(Player::detached).collect();
        players.sort_by_key(|player| player.index);
        players
    }

    fn detached_players(&self) -> BTreeMap<UserId, Player> {
        self.players
            .iter()
            .map(|(id, player)| (*id, player.detached()))
            .collect()
    }

    /// An independent copy, safe to filter and serialize outside the lock.
    pub fn deep_copy(&self) -> TableState {
        TableState {
            players: self.detached_players(),
            ..self.clone()
        }
    }

    /// Filter every item of this copy for `viewer`.
    pub fn apply_visibility(&mut self, viewer: UserId) {
        super::visibility::apply_visibility(self.items.iter_mut(), viewer);
    }
}

/// A live table shared between request handlers.
#[derive(Debug)]
pub struct Table {
    id: TableId,
    state: RwLock<TableState>,
}

impl Table {
    /// A table with a freshly laid out deck and no players.
    pub fn new(id: TableId, config: &TableConfig) -> Self {
        let mut state = TableState::new(id, config);
        state.start_game();
        Self::from_state(state)
    }

    /// Wrap previously exported or hand-built state.
    pub fn from_state(state: TableState) -> Self {
        Self {
            id: state.id,
            state: RwLock::new(state),
        }
    }

    pub fn id(&self) -> TableId {
        self.id
    }

    /// Run `f` with exclusive access to the table.
    ///
    /// No other update or read on this table runs until `f` returns. The
    /// lock is released before this returns, whatever `f` returned.
    pub async fn update<T, F>(&self, f: F) -> TableResult<T>
    where
        F: FnOnce(&mut TableState) -> TableResult<T>,
    {
        let mut state = self.state.write().await;
        f(&mut state)
    }

    /// Run `f` with shared access to the table.
    pub async fn read<T, F>(&self, f: F) -> TableResult<T>
    where
        F: FnOnce(&TableState) -> TableResult<T>,
    {
        let state = self.state.read().await;
        f(&state)
    }

    /// Unfiltered copy of the whole table, for persistence.
    pub async fn deep_copy(&self) -> TableState {
        self.state.read().await.deep_copy()
    }
}
