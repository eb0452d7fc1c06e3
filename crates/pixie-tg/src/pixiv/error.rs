use crate::http::HttpClientError;
use crate::ErrorKind;
use reqwest::StatusCode;

/// Failure taxonomy of the pixiv core. An exhausted retry budget always
/// surfaces as `Transient` carrying the last error; there is no code path
/// that swallows a failure into an empty success.
#[derive(Debug, thiserror::Error)]
pub(crate) enum PixivError {
    #[error("Failed to authenticate with pixiv")]
    Auth { source: crate::Error },

    #[error("Pixiv API request failed transiently")]
    Transient { source: crate::Error },

    #[error("Pixiv API rejected the request")]
    Permanent { source: crate::Error },
}

impl PixivError {
    /// Splits upstream call failures into the retryable and the hopeless.
    ///
    /// Client errors other than 408/429 mean the request itself is bad and
    /// repeating it verbatim cannot help. So does a response body that is
    /// not even JSON. Everything else (connect failures, 5xx, rate limits)
    /// is worth another attempt.
    pub(crate) fn classify(err: crate::Error) -> Self {
        let permanent = match err.kind() {
            ErrorKind::HttpClient {
                source: HttpClientError::BadResponseStatusCode { status, .. },
            } => {
                status.is_client_error()
                    && *status != StatusCode::TOO_MANY_REQUESTS
                    && *status != StatusCode::REQUEST_TIMEOUT
            }
            ErrorKind::HttpClient {
                source: HttpClientError::UnexpectedResponseJsonShape { .. },
            } => true,
            _ => false,
        };

        if permanent {
            Self::Permanent { source: err }
        } else {
            Self::Transient { source: err }
        }
    }

    pub(crate) fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}
