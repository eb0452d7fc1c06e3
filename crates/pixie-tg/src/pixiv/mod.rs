//! Symbols related to communicating with the pixiv API

mod error;
mod session;

pub(crate) mod api;
pub(crate) mod model;

pub(crate) use error::PixivError;
pub(crate) use model::*;

use crate::prelude::*;
use crate::util::retry::retry_request;
use crate::{http, Result};
use api::model::{ImageUrls, RawIllust};
use api::PixivApi;
use retry_policies::policies::ExponentialBackoff;
use serde::Deserialize;
use session::SessionManager;
use std::sync::Arc;
use std::time::Duration;

/// How many records one upstream page holds, which is also the unit the
/// linear offset cursor advances by on a full page.
pub(crate) const RESULTS_PER_PAGE: u32 = 50;

/// Total attempts for one upstream call, counting the first one.
const MAX_FETCH_ATTEMPTS: u32 = 5;

const DEFAULT_MAX_RESULTS: u32 = 3000;

#[derive(Deserialize, Clone)]
pub(crate) struct Config {
    pub(crate) refresh_token: Option<String>,

    pub(crate) username: Option<String>,
    pub(crate) password: Option<String>,

    /// Deepest the cursor is allowed to go; pixiv serves garbage past a few
    /// thousand results anyway.
    #[serde(default = "default_max_results")]
    pub(crate) max_results: u32,
}

fn default_max_results() -> u32 {
    DEFAULT_MAX_RESULTS
}

impl Config {
    fn credential(&self) -> Credential {
        if let Some(refresh_token) = &self.refresh_token {
            return Credential::RefreshToken(refresh_token.clone());
        }
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Credential::Password {
                username: username.clone(),
                password: password.clone(),
            },
            _ => panic!(
                "BUG: either PIXIV_REFRESH_TOKEN or both PIXIV_USERNAME \
                and PIXIV_PASSWORD must be set"
            ),
        }
    }
}

/// The result fetcher. Translates logical queries into upstream calls
/// through the session manager, retries transient failures, and reshapes
/// whatever payload generation comes back into uniform records.
pub(crate) struct Service {
    api: Arc<dyn PixivApi>,
    session: SessionManager,
    max_results: u32,
    retry_policy: ExponentialBackoff,
}

impl Service {
    pub(crate) fn new(cfg: Config, http: http::Client) -> Self {
        let credential = cfg.credential();
        Self::with_api(credential, cfg.max_results, Arc::new(api::Client::new(http)))
    }

    fn with_api(credential: Credential, max_results: u32, api: Arc<dyn PixivApi>) -> Self {
        let retry_policy = ExponentialBackoff::builder()
            .backoff_exponent(2)
            .retry_bounds(Duration::from_millis(100), Duration::from_secs(3))
            .build_with_max_retries(MAX_FETCH_ATTEMPTS - 1);

        Self {
            session: SessionManager::new(Arc::clone(&api), credential),
            api,
            max_results,
            retry_policy,
        }
    }

    /// Fetch one page of results for the query.
    ///
    /// Every attempt re-checks session freshness first; transient upstream
    /// failures are retried up to the attempt budget; auth failures and
    /// permanently broken requests surface immediately.
    #[instrument(skip(self))]
    pub(crate) async fn fetch(&self, query: &Query) -> Result<PageResult, PixivError> {
        // The upstream paginates by 1-based page index, our cursor is a
        // linear record count.
        let page = query.offset / RESULTS_PER_PAGE + 1;

        let raw = retry_request(
            &self.retry_policy,
            || async {
                let token = self.session.fresh_token().await?;

                let result = match &query.mode {
                    QueryMode::Ranking(mode) => self.api.ranking(&token, *mode, page).await,
                    QueryMode::Search(word) => self.api.search(&token, word, page).await,
                };

                result.map_err(PixivError::classify)
            },
            PixivError::is_transient,
        )
        .await?;

        // A payload that carries an error marker or decodes to nothing is a
        // terminal empty page, not a failure.
        if raw.has_error() {
            return Ok(PageResult {
                records: vec![],
                next_offset: None,
            });
        }

        let has_next_page = raw.has_next_page();
        let entries = raw.into_entries();
        let fetched = entries.len() as u32;

        let records = normalize_entries(entries, query.nsfw);

        // The offset comes straight from the inline query string, so the
        // addition must not overflow.
        let next_offset = (has_next_page && fetched > 0)
            .then(|| query.offset.saturating_add(fetched))
            .filter(|next| *next <= self.max_results);

        debug!(
            fetched,
            retained = records.len(),
            ?next_offset,
            "Fetched a page of pixiv results"
        );

        Ok(PageResult {
            records,
            next_offset,
        })
    }

    /// Fetch one illustration by id, normalized the same way as page
    /// results (a multi-page illustration yields one record per page).
    #[instrument(skip(self))]
    pub(crate) async fn illust_detail(&self, id: IllustId) -> Result<Vec<IllustrationRecord>, PixivError> {
        let raw = retry_request(
            &self.retry_policy,
            || async {
                let token = self.session.fresh_token().await?;
                self.api
                    .illust_detail(&token, id)
                    .await
                    .map_err(PixivError::classify)
            },
            PixivError::is_transient,
        )
        .await?;

        Ok(normalize_entry(raw))
    }
}

fn normalize_entries(entries: Vec<RawIllust>, nsfw: bool) -> Vec<IllustrationRecord> {
    entries
        .into_iter()
        .filter(|entry| nsfw || entry.sanity_level < SafetyRating::Restricted)
        .flat_map(normalize_entry)
        .collect()
}

fn normalize_entry(entry: RawIllust) -> Vec<IllustrationRecord> {
    let (author_name, author_id) = entry
        .user
        .as_ref()
        .map(|user| (user.name.clone(), user.id))
        .unwrap_or_default();

    let make_record = |image_urls: &ImageUrls| {
        let (display_url, thumb_url) = match (image_urls.full(), image_urls.thumb()) {
            (Some(full), Some(thumb)) => (full.clone(), thumb.clone()),
            _ => {
                warn!(id = ?entry.id, "Dropping an entry without usable image URLs");
                return None;
            }
        };

        Some(IllustrationRecord {
            id: entry.id,
            display_url,
            thumb_url,
            title: entry.title.clone(),
            author_name: author_name.clone(),
            author_id,
        })
    };

    let pages = entry.pages();

    if pages.is_empty() {
        make_record(&entry.image_urls).into_iter().collect()
    } else {
        pages
            .iter()
            .filter_map(|page| make_record(&page.image_urls))
            .collect()
    }
}
