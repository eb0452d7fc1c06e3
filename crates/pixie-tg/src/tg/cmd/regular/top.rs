use crate::pixiv::{Query, RankingMode};
use crate::prelude::*;
use crate::{err, tg, Error, Result};
use std::str::FromStr;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, InputFile, InputMedia, InputMediaPhoto};

/// Telegram caps media groups (albums) at this many items.
const MAX_GROUPED_MEDIA: usize = 10;

#[derive(Debug, Clone)]
pub(crate) struct TopCmd {
    mode: RankingMode,
    /// 1-based album page within the ranking.
    page: u32,
}

impl FromStr for TopCmd {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self> {
        let mut mode = RankingMode::Day;
        let mut page = None;

        for token in input.split_whitespace() {
            if token.eq_ignore_ascii_case("nsfw") || token.eq_ignore_ascii_case("r18") {
                mode = RankingMode::DayR18;
                continue;
            }

            if token.chars().next().map_or(false, |c| c.is_ascii_digit()) {
                let parsed = token.parse().ok().filter(|&page| page > 0).ok_or_else(|| {
                    err!(TopCommandError::InvalidPage {
                        input: token.to_owned()
                    })
                })?;

                if page.replace(parsed).is_some() {
                    return Err(err!(TopCommandError::UnexpectedArgument {
                        input: token.to_owned()
                    }));
                }
                continue;
            }

            return Err(err!(TopCommandError::UnexpectedArgument {
                input: token.to_owned()
            }));
        }

        Ok(TopCmd {
            mode,
            page: page.unwrap_or(1),
        })
    }
}

impl TopCmd {
    /// `page` is user input, so the multiplication must not overflow.
    fn offset(&self) -> u32 {
        (self.page - 1).saturating_mul(MAX_GROUPED_MEDIA as u32)
    }

    #[instrument(skip(ctx, msg))]
    pub(crate) async fn handle(self, ctx: &tg::Ctx, msg: &Message) -> Result {
        ctx.bot
            .send_chat_action(msg.chat.id, ChatAction::UploadPhoto)
            .await?;

        let query = Query::ranking(self.mode, self.offset());

        let page = ctx.pixiv.fetch(&query).await?;

        if page.records.is_empty() {
            return Err(err!(TopCommandError::NothingFound { page: self.page }));
        }

        let media = page
            .records
            .into_iter()
            .take(MAX_GROUPED_MEDIA)
            .map(|record| {
                let caption = tg::record_caption(&record);
                InputMedia::Photo(
                    InputMediaPhoto::new(InputFile::url(record.display_url)).caption(caption),
                )
            });

        ctx.bot
            .send_media_group(msg.chat.id, media)
            .reply_to_message_id(msg.id)
            .allow_sending_without_reply(true)
            .await?;

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum TopCommandError {
    #[error("The ranking page must be a positive number, got `{input}`")]
    InvalidPage { input: String },

    #[error("Unexpected argument `{input}`. Usage: /top [nsfw] [page]")]
    UnexpectedArgument { input: String },

    #[error("The ranking has nothing on page {page}")]
    NothingFound { page: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use assert_matches::assert_matches;

    fn parse(input: &str) -> Result<TopCmd> {
        input.parse()
    }

    #[test]
    fn defaults_to_the_first_sfw_daily_page() {
        let cmd = parse("").unwrap();
        assert_eq!(cmd.mode, RankingMode::Day);
        assert_eq!(cmd.page, 1);
    }

    #[test]
    fn accepts_the_nsfw_flag_and_page_in_any_order() {
        let cmd = parse("nsfw 2").unwrap();
        assert_eq!(cmd.mode, RankingMode::DayR18);
        assert_eq!(cmd.page, 2);

        let cmd = parse("3 R18").unwrap();
        assert_eq!(cmd.mode, RankingMode::DayR18);
        assert_eq!(cmd.page, 3);
    }

    #[test]
    fn huge_pages_saturate_instead_of_overflowing() {
        let cmd = parse(&u32::MAX.to_string()).unwrap();
        assert_eq!(cmd.offset(), u32::MAX);

        let cmd = parse("2").unwrap();
        assert_eq!(cmd.offset(), 10);
    }

    #[test]
    fn rejects_a_zero_or_garbage_page() {
        for input in ["0", "2x"] {
            assert_matches!(
                parse(input).unwrap_err().kind(),
                ErrorKind::TopCommand {
                    source: TopCommandError::InvalidPage { .. }
                }
            );
        }
    }

    #[test]
    fn rejects_unknown_arguments() {
        for input in ["weekly", "1 2"] {
            assert_matches!(
                parse(input).unwrap_err().kind(),
                ErrorKind::TopCommand {
                    source: TopCommandError::UnexpectedArgument { .. }
                }
            );
        }
    }
}
