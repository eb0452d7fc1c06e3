mod client;

pub(crate) mod model;

pub(crate) use client::Client;

use crate::pixiv::model::{AccessToken, Credential, IllustId, RankingMode};
use crate::Result;
use async_trait::async_trait;
use model::{RawIllust, RawPage};

/// Upstream pixiv API capability. The session manager and the fetcher hold
/// this by reference instead of wrapping the concrete client, so tests can
/// substitute a scripted implementation.
#[async_trait]
pub(crate) trait PixivApi: Send + Sync + 'static {
    async fn authenticate(&self, credential: &Credential) -> Result<AccessToken>;

    async fn ranking(&self, token: &AccessToken, mode: RankingMode, page: u32) -> Result<RawPage>;

    async fn search(&self, token: &AccessToken, word: &str, page: u32) -> Result<RawPage>;

    async fn illust_detail(&self, token: &AccessToken, id: IllustId) -> Result<RawIllust>;
}
