//! Chat bot module
//!
//! Parses prefixed commands from gateway messages, runs them against the
//! analyzer and the food store, and routes button clicks to navigators.

pub mod command_router;
pub mod context;
pub mod handlers;
pub mod runtime;

// Re-export commonly used types
pub use command_router::{BotCommand, CommandRouter};
pub use context::{BotContext, RuntimeStats, StatsSnapshot};
pub use runtime::{BotRuntime, RuntimeState};
