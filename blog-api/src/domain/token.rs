use std::fmt;

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};

use super::validation::Validator;

pub(crate) const TOKEN_PLAINTEXT_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenScope {
    Activation,
    Authentication,
}

impl TokenScope {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            TokenScope::Activation => "activation",
            TokenScope::Authentication => "authentication",
        }
    }
}

impl fmt::Display for TokenScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque credential. Only `hash` is ever persisted; `plaintext` goes to the user once.
#[derive(Debug, Clone)]
pub(crate) struct Token {
    pub(crate) plaintext: String,
    pub(crate) hash: Vec<u8>,
    pub(crate) user_id: i64,
    pub(crate) expiry: DateTime<Utc>,
    pub(crate) scope: TokenScope,
}

impl Token {
    pub(crate) fn generate(user_id: i64, ttl: Duration, scope: TokenScope) -> Self {
        let bytes: [u8; TOKEN_PLAINTEXT_LEN / 2] = rand::random();
        let plaintext = hex::encode(bytes);
        let hash = hash_token(&plaintext);

        Self {
            plaintext,
            hash,
            user_id,
            expiry: Utc::now() + ttl,
            scope,
        }
    }
}

pub(crate) fn hash_token(plaintext: &str) -> Vec<u8> {
    Sha256::digest(plaintext.as_bytes()).to_vec()
}

pub(crate) fn validate_token_plaintext(v: &mut Validator, plaintext: &str) {
    v.check(!plaintext.is_empty(), "token", "must be provided");
    v.check(
        plaintext.len() == TOKEN_PLAINTEXT_LEN,
        "token",
        "must be 32 bytes long",
    );
}
