//! WebSocket push stream for live table updates.
//!
//! # Connection Flow
//!
//! 1. Client connects via `GET /games/{id}/listen` with its session cookie
//! 2. Server checks the user is seated and attaches their mailbox
//! 3. Server spawns two tasks:
//!    - Send task: runs the viewer session, writing each filtered push
//!    - Receive task: reads the client half only to notice a close
//! 4. When either task ends the other is stopped and the subscription
//!    is released
//!
//! A second connection for the same player supersedes the first, which
//! receives `terminated by another connection` and is closed.
//!
//! # Example
//!
//! ```javascript
//! const ws = new WebSocket(`ws://localhost:8080/games/${id}/listen`);
//!
//! ws.onmessage = (event) => {
//!   const push = JSON.parse(event.data);
//!   if (push.type === "refresh") {
//!     reloadState();
//!   } else {
//!     applyItems(push.items);
//!   }
//! };
//! ```

use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{
        Extension, Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt, stream::SplitSink};
use log::{error, info};
use std::sync::atomic::{AtomicU64, Ordering};
use vpoker::{
    PushSink, SessionEnd, User, ViewerSession,
    push::DeliveryError,
    table::TableId,
};

use super::{AppState, error::ApiError};

static ACTIVE_SESSIONS: AtomicU64 = AtomicU64::new(0);

/// Outbound half of an axum WebSocket.
pub struct WsSink {
    sender: SplitSink<WebSocket, Message>,
}

impl WsSink {
    pub fn new(sender: SplitSink<WebSocket, Message>) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl PushSink for WsSink {
    async fn send_text(&mut self, text: String) -> Result<(), DeliveryError> {
        // axum only fails a write once the connection is closed.
        self.sender
            .send(Message::Text(text.into()))
            .await
            .map_err(|_| DeliveryError::PeerGone)?;
        crate::metrics::websocket_messages_sent();
        Ok(())
    }

    async fn send_ping(&mut self) -> Result<(), DeliveryError> {
        self.sender
            .send(Message::Ping(Bytes::new()))
            .await
            .map_err(|_| DeliveryError::PeerGone)
    }
}

/// WebSocket upgrade handler.
///
/// The user must be seated; the mailbox is attached before the upgrade
/// so a refused subscription is an ordinary HTTP error. If the upgrade
/// never completes, dropping the session detaches the mailbox again.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path(table_id): Path<TableId>,
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Response {
    match state.manager.subscribe(table_id, &user).await {
        Ok(session) => ws.on_upgrade(move |socket| handle_socket(socket, table_id, session)),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Handle an established WebSocket connection.
///
/// # Arguments
///
/// - `socket`: The WebSocket connection
/// - `table_id`: Table the user is listening to
/// - `session`: The attached viewer session
async fn handle_socket(socket: WebSocket, table_id: TableId, session: ViewerSession) {
    let (sender, mut receiver) = socket.split();
    let user_name = session.viewer().name.clone();
    let handle = session.handle();

    info!("WebSocket connected: table={}, user={}", table_id, user_name);
    crate::metrics::websocket_connections_total();
    crate::metrics::websocket_connections_active(ACTIVE_SESSIONS.fetch_add(1, Ordering::Relaxed) + 1);

    let mut send_task = tokio::spawn(async move {
        let mut sink = WsSink::new(sender);
        let end = session.run(&mut sink).await;
        if end == SessionEnd::Superseded {
            let _ = sink.sender.send(Message::Close(None)).await;
        }
        end
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    error!("WebSocket error: {}", e);
                    break;
                }
            }
        }
    });

    let reason = tokio::select! {
        end = &mut send_task => {
            recv_task.abort();
            match end {
                Ok(SessionEnd::Superseded) => "superseded",
                Ok(SessionEnd::PeerGone) => "peer_gone",
                Err(_) => "aborted",
            }
        }
        _ = &mut recv_task => {
            send_task.abort();
            "closed"
        }
    };

    // A superseded session no longer owns the mailbox; release is a no-op then.
    handle.release();
    crate::metrics::websocket_sessions_ended(reason);
    crate::metrics::websocket_connections_active(ACTIVE_SESSIONS.fetch_sub(1, Ordering::Relaxed) - 1);
    info!(
        "WebSocket closed: table={}, user={}, reason={}",
        table_id, user_name, reason
    );
}
