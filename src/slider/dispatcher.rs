//! Routes inbound navigation clicks to their navigator

use std::sync::Arc;
use tracing::{debug, warn};

use super::registry::NavigatorRegistry;
use super::transport::{InteractionAck, MessageId, Transport};

/// Requested move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

impl Direction {
    pub const PREVIOUS_TOKEN: &'static str = "previous";
    pub const NEXT_TOKEN: &'static str = "next";

    /// Parse a button token; anything other than the two literals is rejected
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            Self::PREVIOUS_TOKEN => Some(Direction::Previous),
            Self::NEXT_TOKEN => Some(Direction::Next),
            _ => None,
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            Direction::Previous => Self::PREVIOUS_TOKEN,
            Direction::Next => Self::NEXT_TOKEN,
        }
    }
}

/// Click on a navigation control
#[derive(Debug, Clone)]
pub struct NavigationEvent {
    pub message_id: MessageId,
    pub token: String,
    pub ack: Option<InteractionAck>,
}

impl NavigationEvent {
    pub fn new(message_id: impl Into<MessageId>, token: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            token: token.into(),
            ack: None,
        }
    }

    pub fn with_ack(mut self, ack: InteractionAck) -> Self {
        self.ack = Some(ack);
        self
    }
}

/// What happened to a dispatched event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Unknown or expired session, or an unrecognised token
    Dropped,
    /// Cursor moved (or stayed at a boundary) and the message was updated
    Updated { position: usize },
    /// Cursor moved but the remote update failed; the move is kept
    UpdateFailed { position: usize },
}

/// Applies navigation events to registered navigators
#[derive(Clone)]
pub struct InteractionDispatcher {
    registry: Arc<NavigatorRegistry>,
    transport: Arc<dyn Transport>,
}

impl InteractionDispatcher {
    pub fn new(registry: Arc<NavigatorRegistry>, transport: Arc<dyn Transport>) -> Self {
        Self {
            registry,
            transport,
        }
    }

    pub fn registry(&self) -> &Arc<NavigatorRegistry> {
        &self.registry
    }

    pub async fn dispatch(&self, event: NavigationEvent) -> DispatchOutcome {
        let Some(direction) = Direction::from_token(&event.token) else {
            debug!(
                "Dropping event with unknown token {:?} for message {}",
                event.token, event.message_id
            );
            metrics::increment_counter!("slider_events_dropped");
            return DispatchOutcome::Dropped;
        };

        let Some(navigator) = self.registry.lookup(&event.message_id).await else {
            debug!("No navigator for message {}, dropping event", event.message_id);
            metrics::increment_counter!("slider_events_dropped");
            return DispatchOutcome::Dropped;
        };

        let Some((rendered, result)) = navigator
            .navigate_remote(
                direction,
                self.transport.as_ref(),
                &event.message_id,
                event.ack.as_ref(),
            )
            .await
        else {
            debug!(
                "Navigator for message {} is no longer active, dropping event",
                event.message_id
            );
            metrics::increment_counter!("slider_events_dropped");
            return DispatchOutcome::Dropped;
        };

        metrics::increment_counter!("slider_events_dispatched");
        match result {
            Ok(()) => {
                debug!(
                    "Message {} now shows page {}/{}",
                    event.message_id,
                    rendered.position + 1,
                    rendered.total
                );
                DispatchOutcome::Updated {
                    position: rendered.position,
                }
            }
            Err(e) => {
                warn!("Failed to update message {}: {}", event.message_id, e);
                DispatchOutcome::UpdateFailed {
                    position: rendered.position,
                }
            }
        }
    }
}
