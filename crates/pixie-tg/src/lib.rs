mod config;
mod error;
mod http;
mod observability;
mod pixiv;
mod tg;

pub mod util;

pub use crate::error::*;
pub use config::*;
pub use observability::*;
pub use util::tracing_err;

#[allow(unused_imports)]
mod prelude {
    pub(crate) use crate::error::prelude::*;
    pub(crate) use crate::http::prelude::*;
    pub(crate) use crate::util::prelude::*;
}

/// Run the telegram bot processing loop
pub async fn run(config: Config) -> Result<()> {
    let opts = tg::RunBotOptions {
        tg_cfg: config.tg,
        pixiv_cfg: config.pixiv,
    };

    tg::run_bot(opts).await
}
