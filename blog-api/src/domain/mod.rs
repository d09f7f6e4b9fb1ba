pub(crate) mod comment;
pub(crate) mod error;
pub(crate) mod filter;
pub(crate) mod post;
pub(crate) mod token;
pub(crate) mod user;
pub(crate) mod validation;
