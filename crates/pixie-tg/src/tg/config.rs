use serde::Deserialize;

#[derive(Deserialize, Clone)]
pub(crate) struct Config {
    pub(crate) token: String,

    /// How long Telegram may cache an inline answer on their side, in
    /// seconds. Zero disables caching, which is handy in development.
    #[serde(default = "default_inline_cache_time")]
    pub(crate) inline_cache_time: u32,
}

fn default_inline_cache_time() -> u32 {
    300
}
