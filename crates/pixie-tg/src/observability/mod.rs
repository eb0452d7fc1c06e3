pub(crate) mod logging;

pub use self::logging::init_logging;
