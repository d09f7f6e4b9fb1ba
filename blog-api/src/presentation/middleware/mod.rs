pub(crate) mod auth;
pub(crate) mod cors;
pub(crate) mod metrics;
pub(crate) mod rate_limit;
pub(crate) mod trace;
