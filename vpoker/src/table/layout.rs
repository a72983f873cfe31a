//! Where things sit when they are first put on the table.

use rand::seq::SliceRandom;

use super::entities::{CHIP_SET, Card, ItemId, Side, Suit, TableItem, RANKS, UserId};

/// Width of one chip stack on screen.
pub const CHIP_WIDTH: i32 = 70;

/// Top-left corner of the deck.
pub const DECK_ORIGIN: (i32, i32) = (60, 60);

/// Where the dealer marker starts.
pub const DEALER_ORIGIN: (i32, i32) = (260, 60);

/// Horizontal distance between neighbouring seats.
pub const SEAT_WIDTH: i32 = 420;

/// Vertical offset of the seat row.
pub const SEAT_ROW_Y: i32 = 560;

/// Cards in a full deck.
pub const DECK_SIZE: usize = 52;

/// Every rank/suit combination, in a fresh random order.
pub fn shuffled_faces() -> Vec<(&'static str, Suit)> {
    let mut faces: Vec<(&'static str, Suit)> = RANKS
        .into_iter()
        .flat_map(|rank| Suit::ALL.into_iter().map(move |suit| (rank, suit)))
        .collect();
    faces.shuffle(&mut rand::rng());
    faces
}

/// Position of the `n`-th card of the deck. Cards are stacked with a
/// small step every few cards so the pile looks like a pile.
pub fn deck_position(n: usize) -> (i32, i32) {
    let step = (n / 13) as i32;
    (DECK_ORIGIN.0 + step, DECK_ORIGIN.1 + step)
}

/// A shuffled deck, face down, with ids starting at `first_id`.
pub fn deck(first_id: ItemId) -> Vec<TableItem> {
    shuffled_faces()
        .into_iter()
        .enumerate()
        .map(|(n, (rank, suit))| {
            let (x, y) = deck_position(n);
            TableItem::card(
                first_id + n as ItemId,
                x,
                y,
                Card::new(rank, suit, Side::Cover),
            )
        })
        .collect()
}

/// Anchor point of a seat.
pub fn seat_origin(seat: usize) -> (i32, i32) {
    (40 + seat as i32 * SEAT_WIDTH, SEAT_ROW_Y)
}

/// The marker and chip stacks of one seat, with ids starting at `first_id`.
pub fn seat_items(
    first_id: ItemId,
    seat: usize,
    owner: UserId,
    chips_per_stack: u32,
) -> Vec<TableItem> {
    let (x, y) = seat_origin(seat);
    let mut next_id = first_id;
    let mut items = vec![TableItem::player_marker(next_id, x, y, owner)];
    next_id += 1;

    for (column, chip) in CHIP_SET.iter().enumerate() {
        let chip_x = x + column as i32 * CHIP_WIDTH;
        for level in 0..chips_per_stack {
            // stacked chips creep upwards a little
            let chip_y = y + 60 - (level as i32 * 2);
            items.push(TableItem::chip(next_id, chip_x, chip_y, *chip));
            next_id += 1;
        }
    }

    items
}
