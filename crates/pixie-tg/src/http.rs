use crate::prelude::*;
use async_trait::async_trait;
use bytes::Bytes;
use easy_ext::ext;
use reqwest_middleware::RequestBuilder;
use reqwest_retry::policies::ExponentialBackoff;
use reqwest_retry::RetryTransientMiddleware;
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};

pub(crate) mod prelude {
    pub(crate) use super::RequestBuilderExt as _;
}

pub(crate) type Client = reqwest_middleware::ClientWithMiddleware;

pub(crate) fn create_client() -> Client {
    // Retry transport-level failures with increasing intervals between attempts.
    // Logical API-level retries are layered on top of this in `util::retry`.
    let retry_policy = ExponentialBackoff::builder()
        .backoff_exponent(2)
        .retry_bounds(Duration::from_millis(100), Duration::from_secs(3))
        .build_with_total_retry_duration(Duration::from_secs(60));

    reqwest_middleware::ClientBuilder::new(teloxide::net::client_from_env())
        .with(OutermostObservingMiddleware)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .with(InnermostObservingMiddleware)
        .with_init(|request_builder: RequestBuilder| {
            request_builder.header(
                "User-Agent",
                concat!(
                    "PixieTelegramBot/",
                    env!("CARGO_PKG_VERSION"),
                    " (https://github.com/pixie-tg/pixie)",
                ),
            )
        })
        .build()
}

struct OutermostObservingMiddleware;

#[async_trait]
impl reqwest_middleware::Middleware for OutermostObservingMiddleware {
    async fn handle(
        &self,
        request: reqwest::Request,
        extensions: &mut task_local_extensions::Extensions,
        next: reqwest_middleware::Next<'_>,
    ) -> reqwest_middleware::Result<reqwest::Response> {
        let span = info_span!(
            "request",
            version = ?request.version(),
            method = %request.method(),
            url = %request.url(),
        );
        next.run(request, extensions).instrument(span).await
    }
}

struct InnermostObservingMiddleware;

#[async_trait]
impl reqwest_middleware::Middleware for InnermostObservingMiddleware {
    async fn handle(
        &self,
        request: reqwest::Request,
        extensions: &mut task_local_extensions::Extensions,
        next: reqwest_middleware::Next<'_>,
    ) -> reqwest_middleware::Result<reqwest::Response> {
        let start = Instant::now();
        let result = next.run(request, extensions).await;
        let duration = start.elapsed();

        match &result {
            Ok(response) => {
                let status = response.status();

                if let Err(err) = response.error_for_status_ref() {
                    warn!(
                        err = tracing_err(&err),
                        duration = format_args!("{duration:.2?}"),
                        %status,
                        "Network request failed (error status)"
                    );
                } else {
                    info!(
                        duration = format_args!("{duration:.2?}"),
                        %status,
                        "Network request succeeded"
                    );
                }
            }
            Err(err) => {
                error!(
                    duration = format_args!("{duration:.2?}"),
                    err = tracing_err(err),
                    "Network request failed"
                );
            }
        };

        result
    }
}

#[ext(RequestBuilderExt)]
#[async_trait]
pub(crate) impl RequestBuilder {
    async fn read_json<Res: DeserializeOwned>(self) -> Result<Res> {
        let bytes = self.read_bytes().await?;

        serde_json::from_slice(&bytes).map_err(|err| {
            match std::str::from_utf8(&bytes) {
                Ok(response_body) => warn!(%response_body, "Bad JSON response"),
                Err(utf8_decode_err) => warn!(
                    response_body = ?bytes,
                    ?utf8_decode_err,
                    "Bad JSON response"
                ),
            };
            err!(HttpClientError::UnexpectedResponseJsonShape { source: err })
        })
    }

    async fn read_bytes(self) -> Result<Bytes> {
        let res = self
            .send()
            .await
            .map_err(err_ctx!(HttpClientError::SendRequest))?;

        let status = res.status();

        if status.is_client_error() || status.is_server_error() {
            let body = match res.text().await {
                Ok(it) => it,
                Err(err) => format!("Could not collect the error response body text: {err}"),
            };

            return Err(err!(HttpClientError::BadResponseStatusCode { status, body }));
        }

        res.bytes()
            .await
            .map_err(err_ctx!(HttpClientError::ReadResponse))
    }
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum HttpClientError {
    #[error("Failed to send an http request")]
    SendRequest { source: reqwest_middleware::Error },

    #[error("Failed to read http response")]
    ReadResponse { source: reqwest::Error },

    #[error("HTTP request has failed (http status code: {status}):\n{body}")]
    BadResponseStatusCode {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Received an unexpected response JSON object")]
    UnexpectedResponseJsonShape { source: serde_json::Error },
}
