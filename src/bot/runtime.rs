//! Bot runtime: gateway event loop and lifecycle management

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::discord::{DiscordGateway, DiscordRestClient, GatewayEvent, Message, intents};
use crate::gemini::{FoodAnalyzer, GeminiClient};
use crate::store::FoodStore;

use super::command_router::CommandRouter;
use super::context::BotContext;
use super::handlers;

/// Runtime state tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeState {
    Starting,
    Running,
    ShuttingDown,
    Terminated,
}

/// Owns the gateway connection and fans events out to handler tasks
pub struct BotRuntime {
    config: Config,
    state: RuntimeState,
    context: Arc<BotContext>,
    bot_user_id: Option<String>,
    shutdown_tx: watch::Sender<bool>,
}

impl BotRuntime {
    /// Build the runtime from configuration, opening the food store
    pub async fn new(config: Config) -> Result<Self> {
        info!("Creating bot runtime");

        let rest = Arc::new(DiscordRestClient::new(
            config.discord.api_url.clone(),
            config.discord.token.clone(),
            Duration::from_secs(config.discord.timeout_seconds),
        ));
        let analyzer: Arc<dyn FoodAnalyzer> = Arc::new(GeminiClient::new(&config.gemini));
        let store = Arc::new(
            FoodStore::open(&config.store.db_file)
                .await
                .with_context(|| format!("Failed to open store {}", config.store.db_file))?,
        );

        let context = BotContext::new(
            rest,
            analyzer,
            store,
            CommandRouter::new(config.discord.command_prefix.clone()),
            Duration::from_secs(config.slider.expiry_secs),
        );

        Ok(Self::with_context(config, context))
    }

    /// Build the runtime around an existing context
    pub fn with_context(config: Config, context: BotContext) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            config,
            state: RuntimeState::Starting,
            context: Arc::new(context),
            bot_user_id: None,
            shutdown_tx,
        }
    }

    pub fn context(&self) -> &Arc<BotContext> {
        &self.context
    }

    /// Connect to the gateway and serve until Ctrl-C or the gateway gives up
    pub async fn run(&mut self) -> Result<()> {
        let (gateway, events) = DiscordGateway::new(
            self.config.discord.gateway_url.clone(),
            self.config.discord.token.clone(),
            intents::DEFAULT,
        );
        let gateway_task = tokio::spawn(gateway.run(self.shutdown_tx.subscribe()));

        self.run_with_events(events, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await?;

        Self::join_gateway(gateway_task).await;
        Ok(())
    }

    /// Main event loop over an arbitrary event source
    pub async fn run_with_events<F>(
        &mut self,
        mut events: mpsc::Receiver<GatewayEvent>,
        shutdown_signal: F,
    ) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        info!("Starting bot event loop");
        self.state = RuntimeState::Running;
        tokio::pin!(shutdown_signal);

        while self.state == RuntimeState::Running {
            tokio::select! {
                // Handle shutdown signal
                _ = &mut shutdown_signal => {
                    info!("Received shutdown signal");
                    break;
                }

                event = events.recv() => {
                    match event {
                        Some(event) => self.handle_event(event),
                        None => {
                            warn!("Gateway event channel closed");
                            break;
                        }
                    }
                }
            }
        }

        self.shutdown().await
    }

    fn handle_event(&mut self, event: GatewayEvent) {
        match event {
            GatewayEvent::Ready(ready) => {
                info!(
                    "Logged in as {} ({}), session {}",
                    ready.user.username, ready.user.id, ready.session_id
                );
                self.bot_user_id = Some(ready.user.id);
            }
            GatewayEvent::MessageCreate(message) => self.handle_message(message),
            GatewayEvent::InteractionCreate(interaction) => {
                self.context.stats.record_interaction();
                let context = Arc::clone(&self.context);
                tokio::spawn(async move {
                    let outcome = handlers::handle_interaction(&context, interaction).await;
                    debug!("Interaction outcome: {:?}", outcome);
                });
            }
        }
    }

    fn handle_message(&self, message: Message) {
        if message.author.bot || self.bot_user_id.as_deref() == Some(message.author.id.as_str()) {
            return;
        }

        let command = match self.context.router.parse(&message.content) {
            Ok(Some(command)) => command,
            Ok(None) => return,
            Err(e) => {
                let context = Arc::clone(&self.context);
                tokio::spawn(async move {
                    context.rest.reply(&message.channel_id, e.to_string()).await;
                });
                return;
            }
        };

        self.context.stats.record_command();
        let context = Arc::clone(&self.context);
        tokio::spawn(async move {
            let name = command.name();
            if let Err(e) = handlers::handle_command(&context, &message, command).await {
                error!("Command {} failed: {:#}", name, e);
            }
        });
    }

    async fn join_gateway(task: JoinHandle<()>) {
        match tokio::time::timeout(Duration::from_secs(5), task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("Gateway task terminated with error: {}", e),
            Err(_) => warn!("Gateway did not stop within 5 seconds"),
        }
    }

    /// Graceful shutdown: stop the gateway and freeze every open slider
    pub async fn shutdown(&mut self) -> Result<()> {
        if self.state == RuntimeState::Terminated {
            return Ok(());
        }
        info!("Initiating graceful shutdown");
        self.state = RuntimeState::ShuttingDown;

        // receivers may already be gone
        let _ = self.shutdown_tx.send(true);

        let navigators = self.context.registry.snapshot().await;
        if !navigators.is_empty() {
            info!("Disabling {} open navigators", navigators.len());
        }
        for navigator in navigators {
            navigator
                .disable(self.context.transport.as_ref(), &self.context.registry)
                .await;
        }

        let stats = self.context.stats.snapshot();
        info!(
            "Shutdown completed after {:?}: {} commands, {} interactions, {} errors",
            stats.uptime,
            stats.commands_processed,
            stats.interactions_processed,
            stats.errors_encountered
        );

        self.state = RuntimeState::Terminated;
        Ok(())
    }

    /// Get runtime state
    pub fn get_state(&self) -> RuntimeState {
        self.state
    }

    /// Request shutdown of the gateway connection
    pub fn request_shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

impl Drop for BotRuntime {
    fn drop(&mut self) {
        if self.state == RuntimeState::Running {
            warn!("BotRuntime dropped without proper shutdown");
        }
    }
}
