use crate::pixiv::api::PixivApi;
use crate::pixiv::error::PixivError;
use crate::pixiv::model::{AccessToken, Credential};
use crate::prelude::*;
use chrono::prelude::*;
use std::sync::Arc;
use tokio::sync::Mutex;

/// How long an access token stays valid before we re-authenticate.
pub(crate) const TOKEN_LIFESPAN_SECS: i64 = 3600;

type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Owns the upstream credential and the freshness timestamp of the session.
///
/// Concurrent fetches share one manager. The check-then-refresh sequence is
/// a critical section guarded by the internal mutex, so two queries arriving
/// at the same time never race into two re-authentications.
pub(crate) struct SessionManager {
    api: Arc<dyn PixivApi>,
    credential: Credential,
    clock: Clock,
    state: Mutex<SessionState>,
}

#[derive(Default)]
struct SessionState {
    /// `None` until the first successful authentication, which forces the
    /// first call to re-auth.
    last_auth: Option<DateTime<Utc>>,
    token: Option<AccessToken>,
}

impl SessionManager {
    pub(crate) fn new(api: Arc<dyn PixivApi>, credential: Credential) -> Self {
        Self::with_clock(api, credential, Box::new(Utc::now))
    }

    pub(crate) fn with_clock(api: Arc<dyn PixivApi>, credential: Credential, clock: Clock) -> Self {
        Self {
            api,
            credential,
            clock,
            state: Mutex::new(SessionState::default()),
        }
    }

    /// Returns a token that is guaranteed to be younger than
    /// [`TOKEN_LIFESPAN_SECS`], re-authenticating first if needed.
    ///
    /// Re-authentication is deliberately not retried here: repeated auth
    /// failures should surface to the caller immediately instead of looping
    /// inside the generic retry wrapper.
    pub(crate) async fn fresh_token(&self) -> Result<AccessToken, PixivError> {
        let mut state = self.state.lock().await;

        let now = (self.clock)();
        let stale = state
            .last_auth
            .map_or(true, |last_auth| {
                now - last_auth > chrono::Duration::seconds(TOKEN_LIFESPAN_SECS)
            });

        if stale {
            let token = self
                .api
                .authenticate(&self.credential)
                .await
                .map_err(|source| PixivError::Auth { source })?;

            state.token = Some(token);
            state.last_auth = Some((self.clock)());

            debug!("Pixiv session refreshed");
        }

        Ok(state
            .token
            .clone()
            .expect("BUG: the token is always set right after a successful auth"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpClientError;
    use crate::pixiv::api::model::{RawIllust, RawPage};
    use crate::pixiv::model::{IllustId, RankingMode};
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, Ordering::SeqCst};

    pub(crate) struct FakeApi {
        pub(crate) auth_calls: AtomicU32,
        pub(crate) fail_auth: AtomicBool,
    }

    impl FakeApi {
        pub(crate) fn new() -> Self {
            Self {
                auth_calls: AtomicU32::new(0),
                fail_auth: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl PixivApi for FakeApi {
        async fn authenticate(&self, _credential: &Credential) -> crate::Result<AccessToken> {
            self.auth_calls.fetch_add(1, SeqCst);
            if self.fail_auth.load(SeqCst) {
                return Err(crate::error::err!(HttpClientError::BadResponseStatusCode {
                    status: reqwest::StatusCode::BAD_REQUEST,
                    body: "invalid_grant".to_owned(),
                }));
            }
            Ok(AccessToken::new("token".to_owned()))
        }

        async fn ranking(
            &self,
            _token: &AccessToken,
            _mode: RankingMode,
            _page: u32,
        ) -> crate::Result<RawPage> {
            unimplemented!("the session tests never fetch")
        }

        async fn search(
            &self,
            _token: &AccessToken,
            _word: &str,
            _page: u32,
        ) -> crate::Result<RawPage> {
            unimplemented!("the session tests never fetch")
        }

        async fn illust_detail(
            &self,
            _token: &AccessToken,
            _id: IllustId,
        ) -> crate::Result<RawIllust> {
            unimplemented!("the session tests never fetch")
        }
    }

    fn manager_with_clock(api: Arc<FakeApi>, epoch_secs: Arc<AtomicI64>) -> SessionManager {
        let clock = move || {
            DateTime::from_timestamp(epoch_secs.load(SeqCst), 0).unwrap()
        };
        SessionManager::with_clock(
            api,
            Credential::RefreshToken("refresh".to_owned()),
            Box::new(clock),
        )
    }

    #[test_log::test(tokio::test)]
    async fn authenticates_on_first_use_and_reuses_a_fresh_token() {
        let api = Arc::new(FakeApi::new());
        let now = Arc::new(AtomicI64::new(1_000_000));
        let session = manager_with_clock(api.clone(), now.clone());

        session.fresh_token().await.unwrap();
        assert_eq!(api.auth_calls.load(SeqCst), 1);

        // Within the lifespan, no second auth
        now.fetch_add(TOKEN_LIFESPAN_SECS, SeqCst);
        session.fresh_token().await.unwrap();
        assert_eq!(api.auth_calls.load(SeqCst), 1);
    }

    #[test_log::test(tokio::test)]
    async fn reauthenticates_once_the_lifespan_is_exceeded() {
        let api = Arc::new(FakeApi::new());
        let now = Arc::new(AtomicI64::new(1_000_000));
        let session = manager_with_clock(api.clone(), now.clone());

        session.fresh_token().await.unwrap();

        now.fetch_add(TOKEN_LIFESPAN_SECS + 1, SeqCst);
        session.fresh_token().await.unwrap();

        assert_eq!(api.auth_calls.load(SeqCst), 2);
    }

    #[test_log::test(tokio::test)]
    async fn auth_failures_surface_immediately_without_a_retry() {
        let api = Arc::new(FakeApi::new());
        let now = Arc::new(AtomicI64::new(1_000_000));
        let session = manager_with_clock(api.clone(), now.clone());

        api.fail_auth.store(true, SeqCst);

        let err = session.fresh_token().await.unwrap_err();

        assert_matches!(err, PixivError::Auth { .. });
        assert_eq!(api.auth_calls.load(SeqCst), 1);

        // A failed auth does not corrupt the session state: the next call
        // simply attempts to authenticate again.
        api.fail_auth.store(false, SeqCst);
        session.fresh_token().await.unwrap();
        assert_eq!(api.auth_calls.load(SeqCst), 2);
    }
}
