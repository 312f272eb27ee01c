//! Configuration management module
//!
//! Handles loading, validation, and management of application configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Logging level
    pub log_level: String,

    /// File-based logging configuration
    pub log: LogConfig,

    /// Discord-specific configuration
    pub discord: DiscordConfig,

    /// Gemini-specific configuration
    pub gemini: GeminiConfig,

    /// Food record storage
    pub store: StoreConfig,

    /// Paginated message behaviour
    #[serde(default)]
    pub slider: SliderConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DiscordConfig {
    /// Bot token
    #[serde(default)]
    pub token: String,

    /// REST API base URL
    pub api_url: String,

    /// Gateway WebSocket URL
    pub gateway_url: String,

    /// Request timeout in seconds
    pub timeout_seconds: u64,

    /// Prefix that marks a message as a command
    pub command_prefix: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeminiConfig {
    /// API key for the Generative Language API
    #[serde(default)]
    pub api_key: String,

    /// Model name
    pub model: String,

    /// API base URL
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Path of the SQLite database file
    pub db_file: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SliderConfig {
    /// Seconds before navigation buttons are disabled; 0 keeps them forever
    pub expiry_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogConfig {
    /// Absolute or relative path to the rolling log file
    pub file_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log: LogConfig::default(),
            discord: DiscordConfig::default(),
            gemini: GeminiConfig::default(),
            store: StoreConfig::default(),
            slider: SliderConfig::default(),
        }
    }
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_url: "https://discord.com/api/v10".to_string(),
            gateway_url: "wss://gateway.discord.gg".to_string(),
            timeout_seconds: 10,
            command_prefix: "!".to_string(),
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-2.0-flash-exp".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            timeout_seconds: 60,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_file: "data/foods.db".to_string(),
        }
    }
}

impl Default for SliderConfig {
    fn default() -> Self {
        Self { expiry_secs: 300 }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file_path: "logs/pantrybot.log".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment variable overrides
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;

        // Apply environment variable overrides
        config.apply_env_overrides();

        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    /// Apply overrides from any key lookup; later keys win over earlier ones
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        // BOT_TOKEN / PANTRYBOT_DISCORD_TOKEN - Discord bot token
        if let Some(token) = non_empty("BOT_TOKEN") {
            self.discord.token = token;
        }
        if let Some(token) = non_empty("PANTRYBOT_DISCORD_TOKEN") {
            self.discord.token = token;
        }

        // GEMINI_API / PANTRYBOT_GEMINI_API_KEY - Gemini API key
        if let Some(key) = non_empty("GEMINI_API") {
            self.gemini.api_key = key;
        }
        if let Some(key) = non_empty("PANTRYBOT_GEMINI_API_KEY") {
            self.gemini.api_key = key;
        }

        // DB_FILE / PANTRYBOT_DB_FILE - database file
        if let Some(db_file) = non_empty("DB_FILE") {
            self.store.db_file = db_file;
        }
        if let Some(db_file) = non_empty("PANTRYBOT_DB_FILE") {
            self.store.db_file = db_file;
        }

        // PANTRYBOT_LOG_LEVEL - logging level
        if let Some(log_level) = non_empty("PANTRYBOT_LOG_LEVEL") {
            self.log_level = log_level;
        }

        // PANTRYBOT_LOG_FILE_PATH - logging destination file
        if let Some(file_path) = non_empty("PANTRYBOT_LOG_FILE_PATH") {
            self.log.file_path = file_path;
        }

        // Discord-specific environment variables
        // PANTRYBOT_DISCORD_API_URL - REST API URL
        if let Some(api_url) = non_empty("PANTRYBOT_DISCORD_API_URL") {
            self.discord.api_url = api_url;
        }

        // PANTRYBOT_DISCORD_GATEWAY_URL - gateway URL
        if let Some(gateway_url) = non_empty("PANTRYBOT_DISCORD_GATEWAY_URL") {
            self.discord.gateway_url = gateway_url;
        }

        // PANTRYBOT_DISCORD_TIMEOUT_SECONDS - REST timeout
        if let Some(value) =
            non_empty("PANTRYBOT_DISCORD_TIMEOUT_SECONDS").and_then(|v| v.parse::<u64>().ok())
        {
            self.discord.timeout_seconds = value;
        }

        // PANTRYBOT_COMMAND_PREFIX - command prefix
        if let Some(prefix) = non_empty("PANTRYBOT_COMMAND_PREFIX") {
            self.discord.command_prefix = prefix;
        }

        // Gemini-specific environment variables
        // PANTRYBOT_GEMINI_MODEL - model name
        if let Some(model) = non_empty("PANTRYBOT_GEMINI_MODEL") {
            self.gemini.model = model;
        }

        // PANTRYBOT_GEMINI_BASE_URL - API base URL
        if let Some(base_url) = non_empty("PANTRYBOT_GEMINI_BASE_URL") {
            self.gemini.base_url = base_url;
        }

        // PANTRYBOT_GEMINI_TIMEOUT_SECONDS - generation timeout
        if let Some(value) =
            non_empty("PANTRYBOT_GEMINI_TIMEOUT_SECONDS").and_then(|v| v.parse::<u64>().ok())
        {
            self.gemini.timeout_seconds = value;
        }

        // PANTRYBOT_SLIDER_EXPIRY_SECS - navigation button lifetime
        if let Some(value) =
            non_empty("PANTRYBOT_SLIDER_EXPIRY_SECS").and_then(|v| v.parse::<u64>().ok())
        {
            self.slider.expiry_secs = value;
        }
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Load configuration with fallback to default
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        Self::load_from_file(path).unwrap_or_else(|err| {
            tracing::warn!("Failed to load config: {}, using defaults", err);
            let mut config = Self::default();
            config.apply_env_overrides();
            config
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.discord.timeout_seconds == 0 {
            anyhow::bail!("discord.timeout_seconds must be greater than 0");
        }

        if self.gemini.timeout_seconds == 0 {
            anyhow::bail!("gemini.timeout_seconds must be greater than 0");
        }

        if self.discord.command_prefix.trim().is_empty() {
            anyhow::bail!("Command prefix must not be empty");
        }

        if self.gemini.model.trim().is_empty() {
            anyhow::bail!("Gemini model must not be empty");
        }

        if self.store.db_file.trim().is_empty() {
            anyhow::bail!("Database file path must not be empty");
        }

        if self.log.file_path.trim().is_empty() {
            anyhow::bail!("Log file path must not be empty");
        }

        for url in [&self.discord.api_url, &self.gemini.base_url] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                anyhow::bail!("Invalid HTTP URL: {}", url);
            }
        }

        if !self.discord.gateway_url.starts_with("ws://")
            && !self.discord.gateway_url.starts_with("wss://")
        {
            anyhow::bail!("Invalid gateway URL: {}", self.discord.gateway_url);
        }

        Ok(())
    }

    /// Check that the secrets needed to run the bot are present
    pub fn validate_credentials(&self) -> Result<()> {
        if self.discord.token.trim().is_empty() {
            anyhow::bail!("Discord bot token is not set (BOT_TOKEN or discord.token)");
        }

        if self.gemini.api_key.trim().is_empty() {
            anyhow::bail!("Gemini API key is not set (GEMINI_API or gemini.api_key)");
        }

        Ok(())
    }

    /// Copy with secrets masked, for display
    pub fn redacted(&self) -> Self {
        let mask = |secret: &str| {
            if secret.is_empty() {
                String::new()
            } else {
                "********".to_string()
            }
        };

        let mut config = self.clone();
        config.discord.token = mask(&self.discord.token);
        config.gemini.api_key = mask(&self.gemini.api_key);
        config
    }

    /// Display formatted configuration
    pub fn display(&self) -> Result<()> {
        let content =
            toml::to_string_pretty(&self.redacted()).context("Failed to serialize configuration")?;
        println!("Current configuration:");
        println!("{}", content);
        Ok(())
    }

    /// Display configuration management help
    pub fn display_help() -> Result<()> {
        println!("Configuration management commands:");
        println!("  pantrybot config show    - Show current configuration");
        println!("  pantrybot config reset   - Write the default configuration file");
        Ok(())
    }

    /// Handle configuration command
    pub fn handle_command(
        action: &Option<crate::cli::ConfigAction>,
        config_file: &str,
    ) -> Result<()> {
        match action {
            Some(crate::cli::ConfigAction::Show) => {
                let config = Config::load_or_default(config_file);
                config.display()?;
            }
            Some(crate::cli::ConfigAction::Reset) => {
                let default_config = Config::default();
                default_config.save_to_file(config_file)?;
                println!("Wrote default configuration to {}", config_file);
                default_config.display()?;
            }
            None => {
                Config::display_help()?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::NamedTempFile;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.slider.expiry_secs, 300);
        assert_eq!(config.discord.command_prefix, "!");
        assert!(config.validate_credentials().is_err());
    }

    #[test]
    fn test_legacy_env_names() {
        let mut config = Config::default();
        config.apply_overrides(lookup(&[
            ("BOT_TOKEN", "discord-token"),
            ("GEMINI_API", "gemini-key"),
            ("DB_FILE", "/tmp/foods.db"),
        ]));

        assert_eq!(config.discord.token, "discord-token");
        assert_eq!(config.gemini.api_key, "gemini-key");
        assert_eq!(config.store.db_file, "/tmp/foods.db");
        assert!(config.validate_credentials().is_ok());
    }

    #[test]
    fn test_prefixed_env_names_win() {
        let mut config = Config::default();
        config.apply_overrides(lookup(&[
            ("BOT_TOKEN", "legacy"),
            ("PANTRYBOT_DISCORD_TOKEN", "prefixed"),
            ("PANTRYBOT_SLIDER_EXPIRY_SECS", "60"),
            ("PANTRYBOT_GEMINI_TIMEOUT_SECONDS", "not-a-number"),
            ("PANTRYBOT_COMMAND_PREFIX", "  "),
        ]));

        assert_eq!(config.discord.token, "prefixed");
        assert_eq!(config.slider.expiry_secs, 60);
        assert_eq!(config.gemini.timeout_seconds, 60);
        assert_eq!(config.discord.command_prefix, "!");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut config = Config::default();
        config.discord.timeout_seconds = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.discord.gateway_url = "https://gateway.discord.gg".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.store.db_file = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_redacted_masks_secrets() {
        let mut config = Config::default();
        config.discord.token = "secret".to_string();
        let shown = config.redacted();
        assert_eq!(shown.discord.token, "********");
        assert_eq!(shown.gemini.api_key, "");
    }

    #[test]
    fn test_config_file_operations() {
        let mut config = Config::default();
        config.slider.expiry_secs = 42;
        let temp_file = NamedTempFile::new().unwrap();

        // Test save
        config.save_to_file(temp_file.path()).unwrap();

        // Test load
        let loaded_config = Config::load_from_file(temp_file.path()).unwrap();
        assert_eq!(loaded_config.slider.expiry_secs, 42);
        assert_eq!(loaded_config.gemini.model, config.gemini.model);
    }

    #[test]
    fn test_missing_slider_section_uses_default() {
        let mut value = toml::Value::try_from(Config::default()).unwrap();
        value.as_table_mut().unwrap().remove("slider");
        let config: Config = toml::from_str(&toml::to_string(&value).unwrap()).unwrap();
        assert_eq!(config.slider.expiry_secs, 300);
    }
}
