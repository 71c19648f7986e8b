//! Telegram transport
//!
//! Routes messages and callback queries to the console keyed by the
//! Telegram user id, and renders the console's replies as messages with
//! inline keyboards.

mod inbound;
mod keyboard;

pub use inbound::{mask_for_logging, parse_text};
pub use keyboard::build_keyboard;

use crate::config::AppConfig;
use crate::runtime::{Console, Inbound, Outbound};
use crate::session::UserId;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{ChatId, MessageId};

/// Run the long-polling dispatcher until Ctrl-C
pub async fn run(bot: Bot, console: Arc<Console>, config: Arc<AppConfig>) {
    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(on_message))
        .branch(Update::filter_callback_query().endpoint(on_callback));

    tracing::info!("Telegram dispatcher starting");

    // Updates run concurrently; the console refuses overlapping events per user
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![console, config])
        .distribution_function(|_| None::<std::convert::Infallible>)
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    tracing::info!("Telegram dispatcher stopped");
}

async fn on_message(
    bot: Bot,
    msg: Message,
    console: Arc<Console>,
    config: Arc<AppConfig>,
) -> ResponseResult<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let user_id = user.id.0;
    if !config.is_allowed(user_id) {
        tracing::warn!(user_id, "Ignoring message from user outside the allowlist");
        return Ok(());
    }
    let Some(text) = msg.text() else {
        return Ok(());
    };

    tracing::info!(
        user_id,
        chat_id = %msg.chat.id,
        text = %mask_for_logging(text),
        "Received message"
    );

    let replies = console.handle(UserId(user_id), parse_text(text)).await;
    send_all(&bot, msg.chat.id, replies).await
}

async fn on_callback(
    bot: Bot,
    query: CallbackQuery,
    console: Arc<Console>,
    config: Arc<AppConfig>,
) -> ResponseResult<()> {
    // Always answered, even when ignored, so the client stops spinning
    if let Err(e) = bot.answer_callback_query(query.id.clone()).await {
        tracing::debug!(error = %e, "Failed to answer callback query");
    }

    let user_id = query.from.id.0;
    if !config.is_allowed(user_id) {
        tracing::warn!(user_id, "Ignoring callback from user outside the allowlist");
        return Ok(());
    }
    let Some(data) = query.data.clone() else {
        return Ok(());
    };

    tracing::info!(user_id, token = %data, "Received callback");

    let replies = console.handle(UserId(user_id), Inbound::Button(data)).await;

    let Some(origin) = query.regular_message() else {
        return send_all(&bot, ChatId::from(query.from.id), replies).await;
    };

    if let [single] = replies.as_slice() {
        match edit(&bot, origin.chat.id, origin.id, single).await {
            Ok(()) => return Ok(()),
            Err(e) => tracing::debug!(error = %e, "Edit failed, sending a new message"),
        }
    }
    send_all(&bot, origin.chat.id, replies).await
}

async fn edit(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    reply: &Outbound,
) -> ResponseResult<()> {
    let mut request = bot.edit_message_text(chat_id, message_id, reply.text.clone());
    if let Some(menu) = reply.menu.as_ref().filter(|m| !m.is_empty()) {
        request = request.reply_markup(build_keyboard(menu));
    }
    request.await?;
    Ok(())
}

/// Send every chunk in order; a failed chunk is logged and the rest still go
/// out, the first failure is returned afterwards
async fn send_all(bot: &Bot, chat_id: ChatId, replies: Vec<Outbound>) -> ResponseResult<()> {
    let total = replies.len();
    let mut first_error = None;
    for (index, reply) in replies.into_iter().enumerate() {
        // Telegram rejects empty messages
        if reply.text.is_empty() && reply.menu.is_none() {
            continue;
        }
        let mut request = bot.send_message(chat_id, reply.text);
        if let Some(menu) = reply.menu.as_ref().filter(|m| !m.is_empty()) {
            tracing::debug!(%chat_id, buttons = menu.entries().count(), "Attaching keyboard");
            request = request.reply_markup(build_keyboard(menu));
        }
        if let Err(e) = request.await {
            tracing::warn!(%chat_id, chunk = index + 1, total, error = %e, "Failed to send message chunk");
            first_error.get_or_insert(e);
        }
    }
    first_error.map_or(Ok(()), Err)
}
