//! Table endpoints.
//!
//! Every endpoint here requires a session. Item payloads use the same
//! JSON shape the push stream sends, and every item or state handed back
//! is filtered for the requesting user.
//!
//! # Examples
//!
//! Pick up card 7:
//! ```bash
//! curl -b jar -X POST http://localhost:8080/games/$ID/take_card \
//!   -H "Content-Type: application/json" -d '{"id": 7}'
//! ```

use axum::{
    Json,
    extract::{Extension, Path, State},
};
use serde::{Deserialize, Serialize};
use vpoker::{
    TableItem, TableState, User,
    table::{ItemId, ItemUpdate, Player, TableId},
};

use super::{AppState, error::ApiResult};

#[derive(Debug, Serialize, Deserialize)]
pub struct NewTableResponse {
    pub id: TableId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlayersResponse {
    pub id: TableId,
    pub players: Vec<Player>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JoinResponse {
    /// `false` when the user was already seated
    pub joined: bool,
    pub items: Vec<TableItem>,
}

#[derive(Debug, Deserialize)]
pub struct ItemRequest {
    pub id: ItemId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdatedResponse {
    pub updated: TableItem,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShuffleResponse {
    pub shuffled: bool,
}

fn updated(mut item: TableItem, viewer: &User) -> ApiResult<UpdatedResponse> {
    item.apply_visibility(viewer.id);
    Ok(Json(UpdatedResponse { updated: item }))
}

/// Create a table and seat its creator.
pub async fn new_table(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> ApiResult<NewTableResponse> {
    let id = state.manager.create_table(&user).await?;
    crate::metrics::active_tables(state.manager.table_count().await);
    Ok(Json(NewTableResponse { id }))
}

/// Seated players ordered by seat.
pub async fn get_table(
    State(state): State<AppState>,
    Path(table_id): Path<TableId>,
    Extension(user): Extension<User>,
) -> ApiResult<PlayersResponse> {
    let players = state.manager.seated_players(table_id, &user).await?;
    Ok(Json(PlayersResponse {
        id: table_id,
        players,
    }))
}

/// The whole table as the user may see it.
pub async fn get_state(
    State(state): State<AppState>,
    Path(table_id): Path<TableId>,
    Extension(user): Extension<User>,
) -> ApiResult<TableState> {
    Ok(Json(state.manager.table_state(table_id, &user).await?))
}

/// Sit down at the table.
pub async fn join_table(
    State(state): State<AppState>,
    Path(table_id): Path<TableId>,
    Extension(user): Extension<User>,
) -> ApiResult<JoinResponse> {
    let response = match state.manager.join_table(table_id, &user).await? {
        Some(joined) => JoinResponse {
            joined: true,
            items: joined.items,
        },
        None => JoinResponse {
            joined: false,
            items: Vec::new(),
        },
    };
    Ok(Json(response))
}

/// Move or turn an item.
pub async fn update_item(
    State(state): State<AppState>,
    Path(table_id): Path<TableId>,
    Extension(user): Extension<User>,
    Json(proposed): Json<ItemUpdate>,
) -> ApiResult<UpdatedResponse> {
    let item = state.manager.update_item(table_id, &proposed, &user).await?;
    updated(item, &user)
}

/// Pick up an item.
pub async fn take_card(
    State(state): State<AppState>,
    Path(table_id): Path<TableId>,
    Extension(user): Extension<User>,
    Json(request): Json<ItemRequest>,
) -> ApiResult<UpdatedResponse> {
    let item = state.manager.take_item(table_id, request.id, &user).await?;
    updated(item, &user)
}

/// Reveal an owned card.
pub async fn show_card(
    State(state): State<AppState>,
    Path(table_id): Path<TableId>,
    Extension(user): Extension<User>,
    Json(request): Json<ItemRequest>,
) -> ApiResult<UpdatedResponse> {
    let item = state.manager.show_item(table_id, request.id, &user).await?;
    updated(item, &user)
}

/// Gather every card and reshuffle the deck.
pub async fn shuffle(
    State(state): State<AppState>,
    Path(table_id): Path<TableId>,
    Extension(user): Extension<User>,
) -> ApiResult<ShuffleResponse> {
    state.manager.shuffle(table_id, &user).await?;
    Ok(Json(ShuffleResponse { shuffled: true }))
}
