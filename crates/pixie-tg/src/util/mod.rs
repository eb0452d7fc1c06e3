//! Assorted utility functions (missing batteries).
mod teloxide_ext;

pub(crate) mod retry;

pub(crate) type DynError = dyn std::error::Error + Send + Sync;
pub(crate) type DynResult<T = (), E = Box<DynError>> = Result<T, E>;

// We don't care if some of the imports here are not used. They may be used
// at some point. It's just convenient not to import them manually all the
// time a new logging macro is needed.
#[allow(unused_imports)]
pub(crate) mod prelude {
    pub(crate) use super::teloxide_ext::UpdateKindExt as _;
    pub(crate) use super::teloxide_ext::UserExt as _;
    pub(crate) use super::teloxide_ext::UtilRequesterExt as _;
    pub(crate) use super::ErrorExt as _;

    pub(crate) use super::tracing_err;
    pub(crate) use tracing::{
        debug, debug_span, error, error_span, info, info_span, instrument, trace, trace_span, warn,
        warn_span,
    };
    pub(crate) use tracing::Instrument as _;
}

macro_rules! def_url_base {
    ($vis:vis $ident:ident, $url:literal) => {
        $vis fn $ident<T: AsRef<str>>(segments: impl IntoIterator<Item = T>) -> ::url::Url {
            let mut url: ::url::Url = $url.parse().unwrap();
            url.path_segments_mut().unwrap().extend(segments);
            url
        }
    };
}

pub(crate) use def_url_base;

use easy_ext::ext;

#[ext(ErrorExt)]
pub(crate) impl<E> E
where
    E: std::error::Error + ?Sized,
{
    fn display_chain(&self) -> display_error_chain::DisplayErrorChain<&Self> {
        display_error_chain::DisplayErrorChain::new(self)
    }
}

#[must_use]
pub fn tracing_err<'a, E: std::error::Error + 'static>(
    err: &'a E,
) -> impl tracing::Value + std::fmt::Debug + 'a {
    err as &dyn std::error::Error
}
