//! Per-viewer redaction of card faces.
//!
//! Every path that exports items (state fetches and each push) runs the
//! filter on its own copy for the viewer it is addressed to. The result
//! is never cached because the same card looks different to different
//! viewers at the same instant.

use super::entities::{Side, TableItem, UserId};

impl TableItem {
    /// Stamp the externally visible fields of this item for `viewer`.
    ///
    /// Only cards are affected. Owners always see the face, other
    /// viewers always see the cover of an owned card, and a covered card
    /// never carries rank or suit.
    pub fn apply_visibility(&mut self, viewer: UserId) {
        let owner = self.owner_id;
        let Some(card) = self.as_card_mut() else {
            return;
        };
        match owner {
            Some(owner) if owner == viewer => card.side = Side::Face,
            Some(_) => card.side = Side::Cover,
            None => {}
        }
        if card.side == Side::Cover {
            card.blank();
        }
    }
}

/// Filter a batch of exported items for one viewer.
pub fn apply_visibility<'a, I>(items: I, viewer: UserId)
where
    I: IntoIterator<Item = &'a mut TableItem>,
{
    for item in items {
        item.apply_visibility(viewer);
    }
}
