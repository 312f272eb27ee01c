//! Discord API integration module
//!
//! REST calls for sending and editing messages, the gateway connection that
//! delivers messages and button clicks, and the wire types both share.

pub mod gateway;
pub mod rest;
pub mod types;

// Re-export commonly used types
pub use gateway::DiscordGateway;
pub use rest::DiscordRestClient;
pub use types::*;
