//! Outbound message transport used by navigators

use async_trait::async_trait;

use super::page::{Affordance, Page};

/// Identifier of an outbound message; also the registry key
pub type MessageId = String;

/// Identifier of the destination channel
pub type ChannelId = String;

/// Remote send or edit failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Handle for answering the inbound interaction that triggered an update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionAck {
    pub id: String,
    pub token: String,
}

/// Creates and edits messages on the chat platform.
///
/// Implementations bound their own latency (request timeouts) and never retry.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a new message showing `page` with the given controls
    async fn create_message(
        &self,
        channel_id: &str,
        page: &Page,
        affordance: Affordance,
    ) -> Result<MessageId, TransportError>;

    /// Replace the page and controls of an existing message
    async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        page: &Page,
        affordance: Affordance,
    ) -> Result<(), TransportError>;

    /// Update a message in response to an interaction.
    ///
    /// Platforms without interaction callbacks fall back to a plain edit.
    async fn acknowledge_update(
        &self,
        ack: &InteractionAck,
        channel_id: &str,
        message_id: &str,
        page: &Page,
        affordance: Affordance,
    ) -> Result<(), TransportError> {
        let _ = ack;
        self.edit_message(channel_id, message_id, page, affordance)
            .await
    }
}
