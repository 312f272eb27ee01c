//! Command and interaction handlers

use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::discord::{Attachment, Interaction, InteractionResponse, Message, truncate_chars};
use crate::food::{self, FoodInfo};
use crate::gemini::ImageSource;
use crate::slider::{
    DispatchOutcome, InteractionAck, MessageId, NavigationEvent, Navigator, Page, SliderError,
};

use super::command_router::BotCommand;
use super::context::BotContext;

/// Discord rejects message content longer than this
const MESSAGE_CONTENT_LIMIT: usize = 2000;

const FAILED_IMAGE: &str = "Failed to process image 😢";
const FAILED_ENTRY: &str = "Failed to create entry 😢";
const FAILED_FOODS: &str = "Failed to get foods 😢";
const FAILED_RECIPES: &str = "Failed to get recipes 😢";
const FAILED_SLIDER: &str = "Failed to make slider";

/// How a multi-food command sources and keeps its results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MultiScan {
    Photo { save: bool },
    Receipt,
}

/// Run one parsed command to completion
pub async fn handle_command(ctx: &BotContext, message: &Message, command: BotCommand) -> Result<()> {
    debug!(
        "Handling {} from {} in channel {}",
        command.name(),
        message.author.id,
        message.channel_id
    );

    if command.needs_images() && message.attachments.is_empty() {
        ctx.rest
            .reply(
                &message.channel_id,
                format!(
                    "Attach a photo to use `{}{}`",
                    ctx.router.prefix(),
                    command.name()
                ),
            )
            .await;
        return Ok(());
    }

    match command {
        BotCommand::Ping => ctx.rest.reply(&message.channel_id, "Pong!").await,
        BotCommand::Echo { text } => {
            ctx.rest
                .reply(
                    &message.channel_id,
                    truncate_chars(&format!("Echo: {}", text), MESSAGE_CONTENT_LIMIT),
                )
                .await
        }
        BotCommand::Scan => handle_single(ctx, message, true).await,
        BotCommand::Ask => handle_single(ctx, message, false).await,
        BotCommand::AskAll => handle_multi(ctx, message, MultiScan::Photo { save: false }).await,
        BotCommand::ScanAll => handle_multi(ctx, message, MultiScan::Photo { save: true }).await,
        BotCommand::Receipt => handle_multi(ctx, message, MultiScan::Receipt).await,
        BotCommand::Get => handle_get(ctx, message).await,
        BotCommand::Recipes { preferences } => handle_recipes(ctx, message, &preferences).await?,
        BotCommand::ClearAll => handle_clear_all(ctx, message).await?,
        BotCommand::Help => {
            let mut text = String::from("**PantryBot commands**\n");
            for line in ctx.router.help_messages() {
                let _ = writeln!(text, "{}", line);
            }
            ctx.rest.reply(&message.channel_id, text).await
        }
    }

    Ok(())
}

/// Attachments that can be analyzed; the rest are reported and skipped
async fn image_attachments<'a>(ctx: &BotContext, message: &'a Message) -> Vec<&'a Attachment> {
    let mut images = Vec::new();
    for attachment in &message.attachments {
        if attachment.is_image() {
            images.push(attachment);
        } else {
            debug!("Skipping non-image attachment {}", attachment.url);
            ctx.rest
                .reply(
                    &message.channel_id,
                    format!("Skipping `{}`: not an image", attachment.filename),
                )
                .await;
        }
    }
    images
}

fn image_source(attachment: &Attachment) -> ImageSource {
    ImageSource::new(attachment.url.clone(), attachment.mime_type())
}

async fn show_typing(ctx: &BotContext, channel_id: &str) {
    if let Err(e) = ctx.rest.trigger_typing(channel_id).await {
        warn!("Error sending typing indicator: {}", e);
    }
}

async fn handle_single(ctx: &BotContext, message: &Message, save: bool) {
    for attachment in image_attachments(ctx, message).await {
        show_typing(ctx, &message.channel_id).await;

        let info = match ctx.analyzer.analyze_single(&image_source(attachment)).await {
            Ok(info) => info,
            Err(e) => {
                error!("Failed to analyze {}: {}", attachment.url, e);
                ctx.stats.record_error();
                ctx.rest.reply(&message.channel_id, FAILED_IMAGE).await;
                continue;
            }
        };

        let info = if save {
            let owned = info.owned_by(message.author.id.clone(), attachment.url.clone());
            match ctx.store.create_food(owned).await {
                Ok(saved) => saved,
                Err(e) => {
                    error!("Error creating food entry: {}", e);
                    ctx.stats.record_error();
                    ctx.rest.reply(&message.channel_id, FAILED_ENTRY).await;
                    return;
                }
            }
        } else {
            info
        };

        if let Err(e) = ctx
            .rest
            .send_embed(&message.channel_id, food::food_page(&info))
            .await
        {
            warn!("Failed to send food page: {}", e);
        }
    }
}

async fn handle_multi(ctx: &BotContext, message: &Message, mode: MultiScan) {
    for attachment in image_attachments(ctx, message).await {
        show_typing(ctx, &message.channel_id).await;

        let source = image_source(attachment);
        let result = match mode {
            MultiScan::Photo { .. } => ctx.analyzer.analyze_photo(&source).await,
            MultiScan::Receipt => ctx.analyzer.analyze_receipt(&source).await,
        };

        let foods = match result {
            Ok(foods) => foods,
            Err(e) => {
                error!("Failed to analyze {}: {}", attachment.url, e);
                ctx.stats.record_error();
                ctx.rest.reply(&message.channel_id, FAILED_IMAGE).await;
                continue;
            }
        };

        if foods.is_empty() {
            ctx.rest
                .reply(
                    &message.channel_id,
                    format!("No food found in `{}`", attachment.filename),
                )
                .await;
            continue;
        }

        let save = matches!(mode, MultiScan::Photo { save: true } | MultiScan::Receipt);
        let foods = if save {
            let owned: Vec<FoodInfo> = foods
                .into_iter()
                .map(|f| f.owned_by(message.author.id.clone(), attachment.url.clone()))
                .collect();
            match ctx.store.create_foods(owned.clone()).await {
                Ok(saved) => {
                    info!("Saved {} foods for {}", saved.len(), message.author.id);
                    saved
                }
                Err(e) => {
                    // still show what was found
                    error!("Error creating food entries: {}", e);
                    ctx.stats.record_error();
                    ctx.rest.reply(&message.channel_id, FAILED_ENTRY).await;
                    owned
                }
            }
        } else {
            foods
        };

        let pages = foods.iter().map(food::food_page).collect();
        if let Err(e) = send_slider(ctx, &message.channel_id, pages).await {
            error!("Failed to send slider: {}", e);
            ctx.rest.reply(&message.channel_id, FAILED_SLIDER).await;
        }
    }
}

/// The author's stored foods; read failures are reported in the channel
async fn user_foods(ctx: &BotContext, message: &Message, failure: &str) -> Option<Vec<FoodInfo>> {
    match ctx.store.list_foods(&message.author.id).await {
        Ok(foods) => Some(foods),
        Err(e) => {
            error!("Error listing foods for {}: {}", message.author.id, e);
            ctx.stats.record_error();
            ctx.rest.reply(&message.channel_id, failure).await;
            None
        }
    }
}

async fn handle_get(ctx: &BotContext, message: &Message) {
    let Some(foods) = user_foods(ctx, message, FAILED_FOODS).await else {
        return;
    };
    if foods.is_empty() {
        ctx.rest
            .reply(
                &message.channel_id,
                format!(
                    "Your pantry is empty. Try `{}scan` with a photo.",
                    ctx.router.prefix()
                ),
            )
            .await;
        return;
    }

    let pages = foods.iter().map(food::food_page).collect();
    if let Err(e) = send_slider(ctx, &message.channel_id, pages).await {
        error!("Failed to send slider: {}", e);
        ctx.rest.reply(&message.channel_id, FAILED_FOODS).await;
    }
}

async fn handle_recipes(ctx: &BotContext, message: &Message, preferences: &str) -> Result<()> {
    let Some(foods) = user_foods(ctx, message, FAILED_RECIPES).await else {
        return Ok(());
    };
    if foods.is_empty() {
        ctx.rest
            .reply(
                &message.channel_id,
                "Your pantry is empty, scan some food first.",
            )
            .await;
        return Ok(());
    }

    show_typing(ctx, &message.channel_id).await;
    let recipes = match ctx.analyzer.suggest_recipes(&foods, preferences).await {
        Ok(recipes) if !recipes.is_empty() => recipes,
        Ok(_) => {
            ctx.rest.reply(&message.channel_id, FAILED_RECIPES).await;
            return Ok(());
        }
        Err(e) => {
            ctx.stats.record_error();
            ctx.rest.reply(&message.channel_id, FAILED_RECIPES).await;
            return Err(e).context("Failed to suggest recipes");
        }
    };

    let pages = recipes.iter().map(food::recipe_page).collect();
    send_slider(ctx, &message.channel_id, pages)
        .await
        .context("Failed to send recipe slider")?;
    Ok(())
}

async fn handle_clear_all(ctx: &BotContext, message: &Message) -> Result<()> {
    let Some(foods) = user_foods(ctx, message, FAILED_FOODS).await else {
        return Ok(());
    };
    if foods.is_empty() {
        ctx.rest
            .reply(&message.channel_id, "Your pantry is already empty.")
            .await;
        return Ok(());
    }

    let mut text = String::from("Deleting foods: \n");
    let mut failures = 0usize;
    for food in &foods {
        match ctx.store.delete_food(food.id).await {
            Ok(true) => {
                let _ = writeln!(text, "\t- {}", food.food_item);
            }
            Ok(false) => {}
            Err(e) => {
                warn!("Failed to delete food {}: {}", food.id, e);
                failures += 1;
            }
        }
    }

    ctx.rest
        .reply(
            &message.channel_id,
            truncate_chars(&text, MESSAGE_CONTENT_LIMIT),
        )
        .await;

    if failures > 0 {
        ctx.stats.record_error();
        anyhow::bail!("{} foods could not be deleted", failures);
    }
    Ok(())
}

/// Send pages as a navigable message
pub async fn send_slider(
    ctx: &BotContext,
    channel_id: &str,
    pages: Vec<Page>,
) -> Result<MessageId, SliderError> {
    let navigator = Navigator::new(pages, channel_id, ctx.slider_expiry)?;
    navigator
        .send(Arc::clone(&ctx.transport), Arc::clone(&ctx.registry))
        .await
}

/// Route a component click to its navigator.
///
/// Clicks that no navigator handles are still acknowledged so the client
/// doesn't report a failed interaction.
pub async fn handle_interaction(ctx: &BotContext, interaction: Interaction) -> DispatchOutcome {
    let (Some(custom_id), Some(message)) = (interaction.custom_id(), interaction.message.as_ref())
    else {
        debug!("Ignoring non-component interaction {}", interaction.id);
        return DispatchOutcome::Dropped;
    };

    let ack = InteractionAck {
        id: interaction.id.clone(),
        token: interaction.token.clone(),
    };
    let event = NavigationEvent::new(message.id.clone(), custom_id).with_ack(ack.clone());
    let outcome = ctx.dispatcher.dispatch(event).await;

    match outcome {
        DispatchOutcome::Dropped => {
            let response = InteractionResponse::deferred_update();
            if let Err(e) = ctx
                .rest
                .respond_to_interaction(&ack.id, &ack.token, &response)
                .await
            {
                warn!("Failed to acknowledge interaction {}: {}", ack.id, e);
            }
        }
        DispatchOutcome::UpdateFailed { .. } => ctx.stats.record_error(),
        DispatchOutcome::Updated { .. } => {}
    }

    outcome
}
