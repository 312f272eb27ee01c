//! Discord API data types and structures

use serde::{Deserialize, Serialize};

/// Discord limits an embed field value to 1024 characters
pub const EMBED_FIELD_VALUE_LIMIT: usize = 1024;

/// Component type ids
const COMPONENT_ACTION_ROW: u8 = 1;
const COMPONENT_BUTTON: u8 = 2;

/// Primary (blurple) button style
const BUTTON_STYLE_PRIMARY: u8 = 1;

/// Interaction type for button clicks and other message components
pub const INTERACTION_MESSAGE_COMPONENT: u8 = 3;

/// Interaction callback types
pub const CALLBACK_DEFERRED_UPDATE_MESSAGE: u8 = 6;
pub const CALLBACK_UPDATE_MESSAGE: u8 = 7;

/// Gateway opcodes
pub mod opcode {
    pub const DISPATCH: u8 = 0;
    pub const HEARTBEAT: u8 = 1;
    pub const IDENTIFY: u8 = 2;
    pub const RECONNECT: u8 = 7;
    pub const INVALID_SESSION: u8 = 9;
    pub const HELLO: u8 = 10;
    pub const HEARTBEAT_ACK: u8 = 11;
}

/// Gateway intents
pub mod intents {
    pub const GUILD_MESSAGES: u64 = 1 << 9;
    pub const DIRECT_MESSAGES: u64 = 1 << 12;
    pub const MESSAGE_CONTENT: u64 = 1 << 15;

    /// Everything the bot needs to read prefixed commands
    pub const DEFAULT: u64 = GUILD_MESSAGES | DIRECT_MESSAGES | MESSAGE_CONTENT;
}

/// Rich embed attached to a message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<EmbedThumbnail>,
}

impl Embed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn color(mut self, color: u32) -> Self {
        self.color = Some(color);
        self
    }

    /// Append a field, truncating the value to Discord's limit.
    /// Empty values are rejected by the API, so they are replaced with a placeholder.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        let value = value.into();
        let value = if value.trim().is_empty() {
            "n/a".to_string()
        } else {
            truncate_chars(&value, EMBED_FIELD_VALUE_LIMIT)
        };
        self.fields.push(EmbedField {
            name: name.into(),
            value,
            inline,
        });
        self
    }

    pub fn thumbnail(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        if !url.is_empty() {
            self.thumbnail = Some(EmbedThumbnail { url });
        }
        self
    }
}

/// Field inside an embed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

/// Embed thumbnail image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedThumbnail {
    pub url: String,
}

/// Row of interactive components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRow {
    #[serde(rename = "type")]
    pub kind: u8,
    pub components: Vec<Button>,
}

impl ActionRow {
    /// Previous/Next button pair used by paginated messages
    pub fn navigation(previous_enabled: bool, next_enabled: bool) -> Self {
        Self {
            kind: COMPONENT_ACTION_ROW,
            components: vec![
                Button::primary("Previous", crate::slider::Direction::Previous.token())
                    .disabled(!previous_enabled),
                Button::primary("Next", crate::slider::Direction::Next.token())
                    .disabled(!next_enabled),
            ],
        }
    }
}

/// Clickable button component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Button {
    #[serde(rename = "type")]
    pub kind: u8,
    pub style: u8,
    pub label: String,
    pub custom_id: String,
    #[serde(default)]
    pub disabled: bool,
}

impl Button {
    pub fn primary(label: impl Into<String>, custom_id: impl Into<String>) -> Self {
        Self {
            kind: COMPONENT_BUTTON,
            style: BUTTON_STYLE_PRIMARY,
            label: label.into(),
            custom_id: custom_id.into(),
            disabled: false,
        }
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }
}

/// Body for `POST /channels/{id}/messages`
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<ActionRow>,
}

impl CreateMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn embed(embed: Embed) -> Self {
        Self {
            embeds: vec![embed],
            ..Default::default()
        }
    }
}

/// Body for `PATCH /channels/{id}/messages/{id}`; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize)]
pub struct EditMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embeds: Option<Vec<Embed>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<ActionRow>>,
}

/// Body for `POST /interactions/{id}/{token}/callback`
#[derive(Debug, Clone, Serialize)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<InteractionCallbackData>,
}

impl InteractionResponse {
    /// Replace the message the component belongs to
    pub fn update_message(embeds: Vec<Embed>, components: Vec<ActionRow>) -> Self {
        Self {
            kind: CALLBACK_UPDATE_MESSAGE,
            data: Some(InteractionCallbackData { embeds, components }),
        }
    }

    /// Acknowledge without changing anything visible
    pub fn deferred_update() -> Self {
        Self {
            kind: CALLBACK_DEFERRED_UPDATE_MESSAGE,
            data: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InteractionCallbackData {
    pub embeds: Vec<Embed>,
    pub components: Vec<ActionRow>,
}

/// Discord user (only the fields the bot reads)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub bot: bool,
}

/// File attached to a message
#[derive(Debug, Clone, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub filename: String,
    pub url: String,
    #[serde(default)]
    pub content_type: Option<String>,
}

impl Attachment {
    /// Whether Discord reported an image content type
    pub fn is_image(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("image/"))
    }

    /// MIME type for upload, falling back to the file extension
    pub fn mime_type(&self) -> String {
        if let Some(ct) = self.content_type.as_deref().filter(|ct| !ct.is_empty()) {
            // Discord may append parameters like "; charset=..."
            return ct.split(';').next().unwrap_or(ct).trim().to_string();
        }

        let extension = self
            .filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "jpg" | "jpeg" => "image/jpeg",
            "png" => "image/png",
            "webp" => "image/webp",
            "gif" => "image/gif",
            _ => "application/octet-stream",
        }
        .to_string()
    }
}

/// Message as delivered by the gateway or returned by REST
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub id: String,
    pub channel_id: String,
    #[serde(default)]
    pub author: User,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// Interaction payload from `INTERACTION_CREATE`
#[derive(Debug, Clone, Deserialize)]
pub struct Interaction {
    pub id: String,
    pub token: String,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub data: Option<ComponentData>,
}

impl Interaction {
    /// Custom id of the clicked component, if this is a component interaction
    pub fn custom_id(&self) -> Option<&str> {
        if self.kind != INTERACTION_MESSAGE_COMPONENT {
            return None;
        }
        self.data.as_ref().and_then(|d| d.custom_id.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ComponentData {
    #[serde(default)]
    pub custom_id: Option<String>,
    #[serde(default)]
    pub component_type: Option<u8>,
}

/// Raw gateway frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayPayload {
    pub op: u8,
    #[serde(default)]
    pub d: Option<serde_json::Value>,
    #[serde(default)]
    pub s: Option<u64>,
    #[serde(default)]
    pub t: Option<String>,
}

/// Data for HELLO (op 10)
#[derive(Debug, Clone, Deserialize)]
pub struct Hello {
    pub heartbeat_interval: u64,
}

/// Data for the READY dispatch
#[derive(Debug, Clone, Deserialize)]
pub struct Ready {
    pub session_id: String,
    pub user: User,
}

/// Dispatch events the bot reacts to
#[derive(Debug, Clone)]
pub enum GatewayEvent {
    Ready(Ready),
    MessageCreate(Message),
    InteractionCreate(Interaction),
}

/// Error types for Discord operations
#[derive(Debug, thiserror::Error)]
pub enum DiscordError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP error {0}: {1}")]
    Http(u16, String),
    #[error("Gateway error: {0}")]
    Gateway(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Truncate to at most `limit` characters, marking the cut with an ellipsis
pub fn truncate_chars(value: &str, limit: usize) -> String {
    if value.chars().count() <= limit {
        return value.to_string();
    }
    let mut truncated: String = value.chars().take(limit.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}
