pub(crate) mod background;
pub(crate) mod database;
pub(crate) mod logging;
pub(crate) mod mailer;
pub(crate) mod metrics;
pub(crate) mod rate_limiter;
pub(crate) mod settings;
