//! Shared state handed to every command task

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::discord::DiscordRestClient;
use crate::gemini::FoodAnalyzer;
use crate::slider::{InteractionDispatcher, NavigatorRegistry, Transport};
use crate::store::FoodStore;

use super::command_router::CommandRouter;

/// Runtime statistics for monitoring
#[derive(Debug)]
pub struct RuntimeStats {
    started_at: Instant,
    commands_processed: AtomicU64,
    interactions_processed: AtomicU64,
    errors_encountered: AtomicU64,
}

/// Point-in-time copy of [`RuntimeStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub uptime: Duration,
    pub commands_processed: u64,
    pub interactions_processed: u64,
    pub errors_encountered: u64,
}

impl Default for RuntimeStats {
    fn default() -> Self {
        Self {
            started_at: Instant::now(),
            commands_processed: AtomicU64::new(0),
            interactions_processed: AtomicU64::new(0),
            errors_encountered: AtomicU64::new(0),
        }
    }
}

impl RuntimeStats {
    pub fn record_command(&self) {
        self.commands_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_interaction(&self) {
        self.interactions_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors_encountered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            uptime: self.started_at.elapsed(),
            commands_processed: self.commands_processed.load(Ordering::Relaxed),
            interactions_processed: self.interactions_processed.load(Ordering::Relaxed),
            errors_encountered: self.errors_encountered.load(Ordering::Relaxed),
        }
    }
}

/// Collaborators shared by command handlers
pub struct BotContext {
    pub rest: Arc<DiscordRestClient>,
    pub transport: Arc<dyn Transport>,
    pub analyzer: Arc<dyn FoodAnalyzer>,
    pub store: Arc<FoodStore>,
    pub registry: Arc<NavigatorRegistry>,
    pub dispatcher: InteractionDispatcher,
    pub router: CommandRouter,
    pub slider_expiry: Duration,
    pub stats: RuntimeStats,
}

impl BotContext {
    /// Wire up a context; the REST client doubles as the navigator transport
    pub fn new(
        rest: Arc<DiscordRestClient>,
        analyzer: Arc<dyn FoodAnalyzer>,
        store: Arc<FoodStore>,
        router: CommandRouter,
        slider_expiry: Duration,
    ) -> Self {
        let transport: Arc<dyn Transport> = rest.clone();
        let registry = Arc::new(NavigatorRegistry::new());
        let dispatcher = InteractionDispatcher::new(registry.clone(), transport.clone());

        Self {
            rest,
            transport,
            analyzer,
            store,
            registry,
            dispatcher,
            router,
            slider_expiry,
            stats: RuntimeStats::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_counters() {
        let stats = RuntimeStats::default();
        stats.record_command();
        stats.record_command();
        stats.record_interaction();
        stats.record_error();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.commands_processed, 2);
        assert_eq!(snapshot.interactions_processed, 1);
        assert_eq!(snapshot.errors_encountered, 1);
    }
}
