mod top;

use crate::prelude::*;
use crate::tg;
use crate::Result;
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use teloxide::utils::markdown;
use top::TopCmd;

pub(crate) use top::TopCommandError;

#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "snake_case", description = "Commands:")]
pub(crate) enum Cmd {
    #[command(description = "show the guide")]
    Help,

    #[command(description = "top daily illustrations: /top [nsfw] [page]")]
    Top(String),
}

#[async_trait]
impl tg::cmd::Command for Cmd {
    async fn handle(self, ctx: &tg::Ctx, msg: &Message) -> Result {
        match self {
            Cmd::Help => {
                let bot_username = ctx
                    .bot
                    .get_me()
                    .await?
                    .user
                    .username
                    .expect("BUG: bot is guaranteed have a username");

                let commands = Cmd::descriptions();

                let header = markdown::escape(&format!(
                    "{commands}\n\n\
                    Type this in any chat to search pixiv right there:",
                ));

                let example_usage =
                    markdown::code_inline(&format!("@{bot_username} [r18] {{search terms}}"));

                let footer = markdown::escape(
                    "An empty search shows the daily ranking. \
                    Pasting an artwork link or a bare illustration id \
                    fetches that artwork directly.",
                );

                ctx.bot
                    .reply_chunked(msg, format!("{header}\n\n{example_usage}\n\n{footer}"))
                    .await?;
            }
            Cmd::Top(cmd) => cmd.parse::<TopCmd>()?.handle(ctx, msg).await?,
        }
        Ok(())
    }
}
