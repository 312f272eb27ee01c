//! Discord REST API client implementation

use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::types::{
    ActionRow, CreateMessage, DiscordError, EditMessage, Embed, InteractionResponse, Message,
};
use crate::slider::{Affordance, InteractionAck, MessageId, Page, Transport, TransportError};

/// Discord REST API client
pub struct DiscordRestClient {
    base_url: String,
    token: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl DiscordRestClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            timeout,
            client: reqwest::Client::new(),
        }
    }

    /// Send an authenticated request and reject non-success statuses
    async fn request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<reqwest::Response, DiscordError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Discord {} {}", method, url);

        let mut request = self
            .client
            .request(method, &url)
            .header("Authorization", format!("Bot {}", self.token))
            .timeout(self.timeout);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DiscordError::Http(status.as_u16(), body));
        }

        Ok(response)
    }

    /// Post a new message to a channel
    pub async fn create_message(
        &self,
        channel_id: &str,
        message: &CreateMessage,
    ) -> Result<Message, DiscordError> {
        let response = self
            .request(
                Method::POST,
                &format!("/channels/{}/messages", channel_id),
                Some(message),
            )
            .await?;
        Ok(response.json().await?)
    }

    /// Edit an existing message
    pub async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        edit: &EditMessage,
    ) -> Result<Message, DiscordError> {
        let response = self
            .request(
                Method::PATCH,
                &format!("/channels/{}/messages/{}", channel_id, message_id),
                Some(edit),
            )
            .await?;
        Ok(response.json().await?)
    }

    pub async fn send_text(
        &self,
        channel_id: &str,
        content: impl Into<String>,
    ) -> Result<Message, DiscordError> {
        self.create_message(channel_id, &CreateMessage::text(content))
            .await
    }

    pub async fn send_embed(&self, channel_id: &str, embed: Embed) -> Result<Message, DiscordError> {
        self.create_message(channel_id, &CreateMessage::embed(embed))
            .await
    }

    /// Show the typing indicator in a channel
    pub async fn trigger_typing(&self, channel_id: &str) -> Result<(), DiscordError> {
        self.request::<()>(
            Method::POST,
            &format!("/channels/{}/typing", channel_id),
            None,
        )
        .await?;
        Ok(())
    }

    /// Answer an interaction
    pub async fn respond_to_interaction(
        &self,
        interaction_id: &str,
        token: &str,
        response: &InteractionResponse,
    ) -> Result<(), DiscordError> {
        self.request(
            Method::POST,
            &format!("/interactions/{}/{}/callback", interaction_id, token),
            Some(response),
        )
        .await?;
        Ok(())
    }

    /// Best-effort text reply; failures are only logged
    pub async fn reply(&self, channel_id: &str, content: impl Into<String>) {
        if let Err(e) = self.send_text(channel_id, content).await {
            warn!("Failed to send message to channel {}: {}", channel_id, e);
        }
    }
}

fn navigation_components(affordance: Affordance) -> Vec<ActionRow> {
    vec![ActionRow::navigation(affordance.retreat, affordance.advance)]
}

#[async_trait]
impl Transport for DiscordRestClient {
    async fn create_message(
        &self,
        channel_id: &str,
        page: &Page,
        affordance: Affordance,
    ) -> Result<MessageId, TransportError> {
        let body = CreateMessage {
            content: None,
            embeds: vec![page.clone()],
            components: navigation_components(affordance),
        };
        let message = DiscordRestClient::create_message(self, channel_id, &body)
            .await
            .map_err(|e| TransportError::new(e.to_string()))?;
        Ok(message.id)
    }

    async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        page: &Page,
        affordance: Affordance,
    ) -> Result<(), TransportError> {
        let edit = EditMessage {
            content: None,
            embeds: Some(vec![page.clone()]),
            components: Some(navigation_components(affordance)),
        };
        DiscordRestClient::edit_message(self, channel_id, message_id, &edit)
            .await
            .map_err(|e| TransportError::new(e.to_string()))?;
        Ok(())
    }

    async fn acknowledge_update(
        &self,
        ack: &InteractionAck,
        _channel_id: &str,
        _message_id: &str,
        page: &Page,
        affordance: Affordance,
    ) -> Result<(), TransportError> {
        let response =
            InteractionResponse::update_message(vec![page.clone()], navigation_components(affordance));
        self.respond_to_interaction(&ack.id, &ack.token, &response)
            .await
            .map_err(|e| TransportError::new(e.to_string()))
    }
}
