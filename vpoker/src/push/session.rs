//! The event loop of one connected viewer.
//!
//! A [`ViewerSession`] drains the viewer's subscription, filters every
//! event for that viewer, serializes it and writes it to a [`PushSink`].
//! While idle it pings the sink so dead connections surface. The loop
//! ends when a newer connection of the same player supersedes it or when
//! the sink reports the peer is gone.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tokio::{sync::broadcast::error::RecvError, time::timeout};

use super::{
    mailbox::{Mailbox, Subscription, SubscriptionId},
    messages::Push,
};
use crate::table::entities::User;

/// Written to a connection that was replaced by a newer one.
pub const TERMINATED_NOTICE: &str = "terminated by another connection";

/// Push delivery errors
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The connection is closed for good
    #[error("peer is gone")]
    PeerGone,

    /// A single write failed; later writes may succeed
    #[error("write failed: {0}")]
    Write(String),

    /// The event could not be serialized
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl DeliveryError {
    pub fn is_peer_gone(&self) -> bool {
        matches!(self, DeliveryError::PeerGone)
    }
}

/// The outbound half of a viewer's connection.
#[async_trait]
pub trait PushSink: Send {
    /// Write one text frame.
    async fn send_text(&mut self, text: String) -> Result<(), DeliveryError>;

    /// Write a liveness probe.
    async fn send_ping(&mut self) -> Result<(), DeliveryError>;
}

/// Why a session loop stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEnd {
    /// A newer connection took over the player's mailbox
    Superseded,
    /// The connection is gone; the subscription was released
    PeerGone,
}

/// Releases a session's subscription from outside the loop, e.g. after
/// the transport noticed the peer closed the connection.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    mailbox: Mailbox,
    id: SubscriptionId,
}

impl SessionHandle {
    /// Returns `false` if the subscription was already superseded.
    pub fn release(&self) -> bool {
        self.mailbox.unsubscribe(self.id)
    }
}

/// A subscribed viewer ready to drain its events.
///
/// The subscription stays attached for as long as the session lives.
pub struct ViewerSession {
    viewer: User,
    mailbox: Mailbox,
    subscription: Subscription,
    keepalive: Duration,
}

impl ViewerSession {
    pub fn new(
        viewer: User,
        mailbox: Mailbox,
        subscription: Subscription,
        keepalive: Duration,
    ) -> Self {
        Self {
            viewer,
            mailbox,
            subscription,
            keepalive,
        }
    }

    pub fn viewer(&self) -> &User {
        &self.viewer
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            mailbox: self.mailbox.clone(),
            id: self.subscription.id,
        }
    }

    /// Drain events into `sink` until superseded or the peer is gone.
    pub async fn run<S: PushSink + ?Sized>(mut self, sink: &mut S) -> SessionEnd {
        let name = self.viewer.name.clone();
        log::debug!("ws user_name={} pushes_start", name);

        loop {
            let received = match timeout(self.keepalive, self.subscription.receiver.recv()).await {
                Ok(received) => received,
                Err(_) => {
                    if let Err(e) = sink.send_ping().await {
                        if e.is_peer_gone() {
                            return self.finish(SessionEnd::PeerGone);
                        }
                        log::warn!("ws user_name={} ping failed: {}", name, e);
                    }
                    continue;
                }
            };

            let written = match received {
                Ok(push) => self.deliver(&push, sink).await,
                Err(RecvError::Lagged(missed)) => {
                    log::warn!(
                        "ws user_name={} missed {} events, asking for refresh",
                        name,
                        missed
                    );
                    self.deliver(&Push::Refresh, sink).await
                }
                Err(RecvError::Closed) => {
                    log::info!("ws user_name={} {}", name, TERMINATED_NOTICE);
                    if let Err(e) = sink.send_text(TERMINATED_NOTICE.to_string()).await {
                        log::warn!("ws user_name={} terminal notice not sent: {}", name, e);
                    }
                    return self.finish(SessionEnd::Superseded);
                }
            };

            if let Err(e) = written {
                if e.is_peer_gone() {
                    return self.finish(SessionEnd::PeerGone);
                }
                log::error!("ws user_name={} {}", name, e);
            }
        }
    }

    async fn deliver<S: PushSink + ?Sized>(
        &self,
        push: &Push,
        sink: &mut S,
    ) -> Result<(), DeliveryError> {
        log::debug!("ws user_name={} push_begin: {}", self.viewer.name, push.kind());
        let filtered = push.filtered_for(self.viewer.id);
        let text = serde_json::to_string(&filtered)?;
        sink.send_text(text).await?;
        log::debug!("ws user_name={} push_finished: {}", self.viewer.name, push.kind());
        Ok(())
    }

    // Dropping `self` here releases the subscription.
    fn finish(self, end: SessionEnd) -> SessionEnd {
        log::info!("ws user_name={} pushes_finish: {:?}", self.viewer.name, end);
        end
    }
}

/// A session that is dropped, run to completion or never started detaches
/// its subscription. Superseded ids are left alone.
impl Drop for ViewerSession {
    fn drop(&mut self) {
        if self.mailbox.unsubscribe(self.subscription.id) {
            log::debug!(
                "ws user_name={} subscription {} released",
                self.viewer.name,
                self.subscription.id
            );
        }
    }
}
