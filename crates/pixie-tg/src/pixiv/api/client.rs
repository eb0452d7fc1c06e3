use crate::pixiv::api::model::*;
use crate::pixiv::api::PixivApi;
use crate::pixiv::model::{AccessToken, Credential, IllustId, RankingMode};
use crate::pixiv::RESULTS_PER_PAGE;
use crate::prelude::*;
use crate::{http, util};
use async_trait::async_trait;

util::def_url_base!(pixiv_oauth, "https://oauth.secure.pixiv.net");
util::def_url_base!(pixiv_public_api, "https://public-api.secure.pixiv.net/v1");
util::def_url_base!(pixiv_app_api, "https://app-api.pixiv.net/v1");

// OAuth client credentials of the official mobile app. These are public
// knowledge, every third-party pixiv client ships the same pair.
const CLIENT_ID: &str = "MOBrBDS8blbauoSck0ZfDbtuzpyT";
const CLIENT_SECRET: &str = "lsACyCD94FhDUtGTXi3QzcFE2uU1hqtDaKeqrdwj";

pub(crate) struct Client {
    http: http::Client,
}

/// The public ranking API speaks an older mode dialect than the
/// user-facing names, and ranks manga as a separate ranking type.
fn ranking_params(mode: RankingMode) -> (&'static str, &'static str) {
    match mode {
        RankingMode::Day => ("illust", "daily"),
        RankingMode::Week => ("illust", "weekly"),
        RankingMode::Month => ("illust", "monthly"),
        RankingMode::DayMale => ("illust", "male"),
        RankingMode::DayFemale => ("illust", "female"),
        RankingMode::WeekOriginal => ("illust", "original"),
        RankingMode::WeekRookie => ("illust", "rookie"),
        RankingMode::DayManga => ("manga", "daily"),
        RankingMode::DayR18 => ("illust", "daily_r18"),
        RankingMode::WeekR18 => ("illust", "weekly_r18"),
    }
}

impl Client {
    pub(crate) fn new(http: http::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl PixivApi for Client {
    async fn authenticate(&self, credential: &Credential) -> Result<AccessToken> {
        let mut form = vec![
            ("client_id", CLIENT_ID.to_owned()),
            ("client_secret", CLIENT_SECRET.to_owned()),
            ("get_secure_url", "1".to_owned()),
        ];

        match credential {
            Credential::RefreshToken(refresh_token) => {
                form.push(("grant_type", "refresh_token".to_owned()));
                form.push(("refresh_token", refresh_token.clone()));
            }
            Credential::Password { username, password } => {
                form.push(("grant_type", "password".to_owned()));
                form.push(("username", username.clone()));
                form.push(("password", password.clone()));
            }
        }

        let res: AuthResponse = self
            .http
            .post(pixiv_oauth(["auth", "token"]))
            .form(&form)
            .read_json()
            .await?;

        Ok(AccessToken::new(res.response.access_token))
    }

    async fn ranking(&self, token: &AccessToken, mode: RankingMode, page: u32) -> Result<RawPage> {
        let (ranking_type, wire_mode) = ranking_params(mode);

        let res: RankingResponse = self
            .http
            .get(pixiv_public_api(["ranking", "all"]))
            .query(&[
                ("ranking_type", ranking_type),
                ("mode", wire_mode),
                ("page", &page.to_string()),
                ("per_page", &RESULTS_PER_PAGE.to_string()),
                ("image_sizes", "medium,large"),
                ("include_stats", "false"),
            ])
            .bearer_auth(token.secret())
            .read_json()
            .await?;

        Ok(RawPage::Ranking(res))
    }

    async fn search(&self, token: &AccessToken, word: &str, page: u32) -> Result<RawPage> {
        let res: SearchResponse = self
            .http
            .get(pixiv_public_api(["search", "works.json"]))
            .query(&[
                ("q", word),
                ("page", &page.to_string()),
                ("per_page", &RESULTS_PER_PAGE.to_string()),
                ("mode", "text"),
                ("types", "illustration"),
                ("sort", "date"),
                ("order", "desc"),
                ("image_sizes", "medium,large"),
                ("include_stats", "false"),
            ])
            .bearer_auth(token.secret())
            .read_json()
            .await?;

        Ok(RawPage::Search(res))
    }

    async fn illust_detail(&self, token: &AccessToken, id: IllustId) -> Result<RawIllust> {
        let res: DetailResponse = self
            .http
            .get(pixiv_app_api(["illust", "detail"]))
            .query(&[
                ("illust_id", id.to_string().as_str()),
                ("filter", "for_ios"),
            ])
            .bearer_auth(token.secret())
            .read_json()
            .await?;

        Ok(res.illust)
    }
}
