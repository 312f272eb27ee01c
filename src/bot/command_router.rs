//! Command Router for prefixed chat commands

use anyhow::Result;
use tracing::debug;

/// Commands users can send in chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    /// Liveness check
    Ping,
    /// Repeat the text back
    Echo { text: String },
    /// Analyze one food per attached image and save it
    Scan,
    /// Analyze one food per attached image without saving
    Ask,
    /// All foods in each photo, not saved
    AskAll,
    /// All foods in each photo, saved
    ScanAll,
    /// All foods on each receipt, saved
    Receipt,
    /// Page through the caller's saved foods
    Get,
    /// Recipes from saved foods, with optional free-text preferences
    Recipes { preferences: String },
    /// Delete all of the caller's saved foods
    ClearAll,
    Help,
}

impl BotCommand {
    /// Whether the command works on attached images
    pub fn needs_images(&self) -> bool {
        matches!(
            self,
            BotCommand::Scan
                | BotCommand::Ask
                | BotCommand::AskAll
                | BotCommand::ScanAll
                | BotCommand::Receipt
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            BotCommand::Ping => "ping",
            BotCommand::Echo { .. } => "echo",
            BotCommand::Scan => "scan",
            BotCommand::Ask => "ask",
            BotCommand::AskAll => "askall",
            BotCommand::ScanAll => "scanall",
            BotCommand::Receipt => "receipt",
            BotCommand::Get => "get",
            BotCommand::Recipes { .. } => "recipes",
            BotCommand::ClearAll => "clearall",
            BotCommand::Help => "help",
        }
    }
}

const HELP_ENTRIES: &[(&str, &str)] = &[
    ("ping", "Responds with Pong!"),
    ("echo <message>", "Repeats the message you send"),
    ("scan", "Scans the food in each attached photo into your pantry"),
    ("ask", "Describes the food in each attached photo without saving it"),
    ("askall", "Describes every food in each attached photo"),
    ("scanall", "Scans every food in each attached photo into your pantry"),
    ("receipt", "Scans every food on each attached receipt into your pantry"),
    ("get", "Pages through the foods in your pantry"),
    ("recipes [preferences]", "Suggests three recipes from your pantry"),
    ("clearall", "Deletes every food in your pantry"),
    ("help", "Shows this help"),
];

/// Parses chat messages into commands
#[derive(Debug, Clone)]
pub struct CommandRouter {
    prefix: String,
}

impl CommandRouter {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Parse a message.
    ///
    /// Messages without the prefix and unknown commands yield `Ok(None)`;
    /// a known command with bad arguments is an error carrying its usage.
    pub fn parse(&self, content: &str) -> Result<Option<BotCommand>> {
        let content = content.trim();
        let Some(rest) = content.strip_prefix(self.prefix.as_str()) else {
            return Ok(None);
        };

        let (name, args) = match rest.split_once(char::is_whitespace) {
            Some((name, args)) => (name, args.trim()),
            None => (rest, ""),
        };

        let command = match name {
            "ping" => BotCommand::Ping,
            "echo" => {
                if args.is_empty() {
                    return Err(anyhow::anyhow!("Usage: {}echo <message>", self.prefix));
                }
                BotCommand::Echo {
                    text: args.to_string(),
                }
            }
            "scan" => BotCommand::Scan,
            "ask" => BotCommand::Ask,
            "askall" => BotCommand::AskAll,
            "scanall" => BotCommand::ScanAll,
            "receipt" => BotCommand::Receipt,
            "get" => BotCommand::Get,
            "recipes" => BotCommand::Recipes {
                preferences: args.to_string(),
            },
            "clearall" => BotCommand::ClearAll,
            "help" => BotCommand::Help,
            _ => {
                debug!("Ignoring unknown command {:?}", name);
                return Ok(None);
            }
        };

        Ok(Some(command))
    }

    /// Help text, one line per command
    pub fn help_messages(&self) -> Vec<String> {
        HELP_ENTRIES
            .iter()
            .map(|(usage, help)| format!("`{}{}` - {}", self.prefix, usage, help))
            .collect()
    }
}
