use crate::pixiv::{IllustId, IllustrationRecord, Query, RankingMode};
use crate::prelude::*;
use crate::util::DynResult;
use crate::{tg, Error};
use lazy_regex::regex_captures;
use std::future::IntoFuture;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{
    ChosenInlineResult, InlineQuery, InlineQueryResult, InlineQueryResultPhoto, ParseMode,
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum ParsedQuery {
    /// A page of ranking or search results.
    Page(Query),

    /// A single artwork requested by its id or page URL.
    Artwork(IllustId),
}

#[instrument(skip_all, fields(
    query = %query.query,
    offset = %query.offset,
    from = %query.from.debug_id(),
))]
pub(crate) async fn handle(ctx: Arc<tg::Ctx>, query: InlineQuery) -> DynResult {
    let tg::Ctx { bot, cfg, pixiv } = &*ctx;

    let inline_query_id = query.id;

    // Telegram passes whatever string we returned as `next_offset` from the
    // previous answer. The very first query comes with an empty one.
    let offset = query.offset.parse().unwrap_or(0);

    let result = async {
        let (records, next_offset) = match parse_query(&query.query, offset) {
            ParsedQuery::Artwork(id) => (pixiv.illust_detail(id).await?, None),
            ParsedQuery::Page(page_query) => {
                let page = pixiv.fetch(&page_query).await?;
                (page.records, page.next_offset)
            }
        };

        let total_records = records.len();

        let results = records
            .iter()
            .enumerate()
            .map(|(index, record)| record_to_inline_query_result(index, record));

        let mut answer = bot
            .answer_inline_query(&inline_query_id, results)
            .is_personal(false)
            .cache_time(cfg.inline_cache_time);

        if let Some(next_offset) = next_offset {
            answer = answer.next_offset(next_offset.to_string());
        }

        answer
            .into_future()
            .instrument(info_span!("payload", total_records, ?next_offset))
            .await?;

        Ok::<_, Error>(())
    }
    .await;

    if let Err(err) = result {
        warn!(
            err = tracing_err(&err),
            id = err.id(),
            "Failed to process inline query"
        );

        // The title is very constrained in size. We must be very succinct in it.
        let answer_result = bot
            .answer_inline_query(&inline_query_id, [])
            .is_personal(false)
            .cache_time(0)
            .switch_pm_text(format!("Something went wrong 🥺 (id: {})", err.id()))
            .switch_pm_parameter("help")
            .await;

        if let Err(answer_err) = answer_result {
            warn!(
                err = tracing_err(&answer_err),
                "Failed to answer with error to inline query"
            );
        }

        return Err(err.into());
    }

    Ok(())
}

/// XXX: This handler must be enabled manually via `/setinlinefeedback` command
/// in Telegram BotFather, otherwise `ChosenInlineResult` updates will not be
/// sent.
pub(crate) async fn handle_chosen_inline_result(result: ChosenInlineResult) -> DynResult {
    info!(
        result_id = %result.result_id,
        query = %result.query,
        from = %result.from.debug_id(),
        "Inline result was chosen"
    );
    Ok(())
}

fn record_to_inline_query_result(index: usize, record: &IllustrationRecord) -> InlineQueryResult {
    // Ids must be unique within one answer. An artwork id alone is not
    // enough, because a multi-page artwork produces one result per page.
    let id = record
        .id
        .map(|illust| format!("{illust}:{index}"))
        .unwrap_or_else(|| nanoid::nanoid!());

    InlineQueryResultPhoto::new(id, record.display_url.clone(), record.thumb_url.clone())
        // XXX: title is ignored for photos in the results preview popup.
        // That's really surprising, but that's how telegram works -_-
        .title(record.title.clone())
        .caption(tg::record_caption(record))
        .parse_mode(ParseMode::MarkdownV2)
        .into()
}

fn parse_query(text: &str, offset: u32) -> ParsedQuery {
    macro_rules! parse_with_regexes {
        ($str:ident, $($regex:literal)*) => (None$(.or_else(|| regex_captures!($regex, $str)))*)
    }

    let text = text.trim();

    let artwork = parse_with_regexes!(
        text,
        r"pixiv.net/(?:\w+/)?artworks/(\d+)"
        r"illust_id=(\d+)"
        r"^(\d+)$"
    );

    if let Some(id) = artwork.and_then(|(_, id)| id.parse().ok()) {
        return ParsedQuery::Artwork(id);
    }

    let (_, flag, term) = regex_captures!(r"(?i)^(r18|nsfw)?\s?(.*)$", text).unwrap_or_default();

    let nsfw = !flag.is_empty();
    let term = term.trim();

    if term.is_empty() {
        let mode = if nsfw {
            RankingMode::DayR18
        } else {
            RankingMode::Day
        };
        return ParsedQuery::Page(Query::ranking(mode, offset));
    }

    ParsedQuery::Page(Query::search(term, nsfw, offset))
}
