//! Telegram commands root module

mod cmd;
mod config;
mod inline_query;

use crate::pixiv::IllustrationRecord;
use crate::prelude::*;
use crate::{http, pixiv, Result};
use dptree::di::DependencyMap;
use std::sync::Arc;
use teloxide::adaptors::{CacheMe, DefaultParseMode, Throttle, Trace};
use teloxide::dispatching::UpdateFilterExt;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use teloxide::utils::command::BotCommands;
use teloxide::utils::markdown;

pub(crate) use cmd::TopCommandError;
pub(crate) use config::*;

pub(crate) type Bot = Trace<CacheMe<DefaultParseMode<Throttle<teloxide::Bot>>>>;

pub(crate) struct Ctx {
    bot: Bot,
    cfg: Arc<Config>,
    pixiv: pixiv::Service,
}

pub(crate) struct RunBotOptions {
    pub(crate) tg_cfg: Config,
    pub(crate) pixiv_cfg: pixiv::Config,
}

pub(crate) async fn run_bot(opts: RunBotOptions) -> Result {
    let mut di = DependencyMap::new();

    let http = http::create_client();

    let bot: Bot = teloxide::Bot::new(opts.tg_cfg.token.clone())
        .throttle(Default::default())
        .parse_mode(ParseMode::MarkdownV2)
        .cache_me()
        .trace(teloxide::adaptors::trace::Settings::all());

    let pixiv = pixiv::Service::new(opts.pixiv_cfg, http);

    di.insert(Arc::new(Ctx {
        bot: bot.clone(),
        cfg: Arc::new(opts.tg_cfg),
        pixiv,
    }));

    info!("Starting bot...");

    bot.set_my_commands(cmd::regular::Cmd::bot_commands())
        .await?;

    let handler = dptree::entry()
        .inspect(|update: Update| {
            trace!(kind = update.kind.discriminator(), id = update.id, "Received update");
        })
        .branch(
            Update::filter_message()
                .filter_command::<cmd::regular::Cmd>()
                .endpoint(cmd::handle::<cmd::regular::Cmd>()),
        )
        .branch(
            Update::filter_message()
                .filter(cmd::filter_pm_with_bot)
                .filter_command::<cmd::StartCommand>()
                .endpoint(cmd::handle::<cmd::StartCommand>()),
        )
        .branch(Update::filter_inline_query().endpoint(inline_query::handle))
        .branch(
            Update::filter_chosen_inline_result()
                .endpoint(inline_query::handle_chosen_inline_result),
        );

    Dispatcher::builder(bot, handler)
        .dependencies(di)
        // We don't handle all possible messages that users send,
        // so to suppress the warning that we don't do this we have
        // a noop default handler here
        .default_handler(|_| std::future::ready(()))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Bot stopped");

    Ok(())
}

/// MarkdownV2 caption shared by inline results and `/top` albums: the title
/// linked to the artwork page, and the author linked to their profile.
pub(crate) fn record_caption(record: &IllustrationRecord) -> String {
    let title = if record.title.is_empty() {
        "Untitled"
    } else {
        &record.title
    };

    let title = match record.page_url() {
        Some(url) => markdown::link(url.as_str(), &markdown::escape(title)),
        None => markdown::escape(title),
    };

    if record.author_name.is_empty() {
        return title;
    }

    let author = match record.author_url() {
        Some(url) => markdown::link(url.as_str(), &markdown::escape(&record.author_name)),
        None => markdown::escape(&record.author_name),
    };

    format!("{title} by {author}")
}
