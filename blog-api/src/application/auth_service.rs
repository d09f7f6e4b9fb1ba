use std::sync::Arc;

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        Error as PasswordHashError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
        rand_core::OsRng,
    },
};
use chrono::Duration;

use crate::data::token_repository::TokenRepository;
use crate::data::user_repository::{NewUser, UserRepository};
use crate::domain::error::DomainError;
use crate::domain::token::{Token, TokenScope, hash_token, validate_token_plaintext};
use crate::domain::user::{CredentialsRequest, RegisterRequest, User};
use crate::domain::validation::Validator;
use crate::infrastructure::background::BackgroundTasks;
use crate::infrastructure::mailer::{MailTemplates, Mailer, USER_WELCOME, WelcomeMail};

const ACTIVATION_TOKEN_TTL_HOURS: i64 = 24;
const AUTHENTICATION_TOKEN_TTL_HOURS: i64 = 24;

pub(crate) struct AuthService<U, T, M>
where
    U: UserRepository,
    T: TokenRepository,
    M: Mailer + 'static,
{
    users: U,
    tokens: T,
    mailer: Arc<M>,
    templates: Arc<MailTemplates>,
    background: BackgroundTasks,
}

impl<U, T, M> AuthService<U, T, M>
where
    U: UserRepository,
    T: TokenRepository,
    M: Mailer + 'static,
{
    const DUMMY_PASSWORD_HASH: &'static str = "$argon2id$v=19$m=19456,t=2,p=1$MDEyMzQ1Njc4OWFiY2RlZg$gwN6hT1sNdk9kI95f7n2Gl3fL0qRmBf2Ffkj2r90/0M";

    pub(crate) fn new(
        users: U,
        tokens: T,
        mailer: Arc<M>,
        templates: Arc<MailTemplates>,
        background: BackgroundTasks,
    ) -> Self {
        Self {
            users,
            tokens,
            mailer,
            templates,
            background,
        }
    }

    /// Creates an inactive account and mails its activation token in the background.
    pub(crate) async fn register(&self, req: RegisterRequest) -> Result<User, DomainError> {
        let req = req.validate()?;

        let password_hash = self.hash_password(&req.password)?;
        let user = self
            .users
            .create_user(NewUser {
                username: req.username,
                email: req.email,
                password_hash,
            })
            .await?;

        let token = Token::generate(
            user.id,
            Duration::hours(ACTIVATION_TOKEN_TTL_HOURS),
            TokenScope::Activation,
        );
        self.tokens.insert_token(&token).await?;

        self.queue_welcome_mail(&user, token.plaintext);
        Ok(user)
    }

    pub(crate) async fn activate(&self, token_plaintext: &str) -> Result<User, DomainError> {
        let mut v = Validator::new();
        validate_token_plaintext(&mut v, token_plaintext);
        v.finish()?;

        let mut user = self
            .users
            .find_for_token(TokenScope::Activation, &hash_token(token_plaintext))
            .await?
            .ok_or_else(|| DomainError::invalid("token", "invalid or expired activation token"))?;

        user.activated = true;
        let user = self.users.update_user(&user).await?;
        self.tokens
            .delete_all_for_user(TokenScope::Activation, user.id)
            .await?;

        Ok(user)
    }

    pub(crate) async fn create_authentication_token(
        &self,
        req: CredentialsRequest,
    ) -> Result<Token, DomainError> {
        let req = req.validate()?;

        let Some(credentials) = self.users.find_by_email(&req.email).await? else {
            // keep the response time close to the wrong-password path
            let _ = self.verify_password(&req.password, Self::DUMMY_PASSWORD_HASH);
            return Err(DomainError::InvalidCredentials);
        };

        self.verify_password(&req.password, &credentials.password_hash)?;

        let token = Token::generate(
            credentials.user.id,
            Duration::hours(AUTHENTICATION_TOKEN_TTL_HOURS),
            TokenScope::Authentication,
        );
        self.tokens.insert_token(&token).await?;
        Ok(token)
    }

    /// Resolves a bearer token to its user. Malformed, unknown and expired tokens
    /// are all `InvalidCredentials`.
    pub(crate) async fn authenticate(&self, token_plaintext: &str) -> Result<User, DomainError> {
        let mut v = Validator::new();
        validate_token_plaintext(&mut v, token_plaintext);
        if !v.is_valid() {
            return Err(DomainError::InvalidCredentials);
        }

        self.users
            .find_for_token(TokenScope::Authentication, &hash_token(token_plaintext))
            .await?
            .ok_or(DomainError::InvalidCredentials)
    }

    fn queue_welcome_mail(&self, user: &User, activation_token: String) {
        let mail = match self.templates.render(
            USER_WELCOME,
            &WelcomeMail {
                user_id: user.id,
                username: user.username.clone(),
                activation_token,
            },
        ) {
            Ok(mail) => mail,
            Err(err) => {
                tracing::error!(user_id = user.id, error = %err, "failed to render welcome email");
                return;
            }
        };

        let mailer = Arc::clone(&self.mailer);
        let recipient = user.email.clone();
        let user_id = user.id;
        self.background.spawn(async move {
            match mailer.send(&recipient, &mail).await {
                Ok(()) => tracing::info!(user_id, "welcome email sent"),
                Err(err) => tracing::error!(user_id, error = %err, "failed to send welcome email"),
            }
        });
    }

    pub(crate) fn hash_password(&self, raw_password: &str) -> Result<String, DomainError> {
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Self::argon2()?
            .hash_password(raw_password.as_bytes(), &salt)
            .map_err(|err| DomainError::Unexpected(err.to_string()))?;
        Ok(password_hash.to_string())
    }

    pub(crate) fn verify_password(
        &self,
        raw_password: &str,
        password_hash: &str,
    ) -> Result<(), DomainError> {
        let parsed_hash = PasswordHash::new(password_hash)
            .map_err(|err| DomainError::Unexpected(err.to_string()))?;
        Self::argon2()?
            .verify_password(raw_password.as_bytes(), &parsed_hash)
            .map_err(|err| match err {
                PasswordHashError::Password => DomainError::InvalidCredentials,
                _ => DomainError::Unexpected(err.to_string()),
            })?;

        Ok(())
    }

    fn argon2() -> Result<Argon2<'static>, DomainError> {
        let params = Params::new(19 * 1024, 2, 1, None)
            .map_err(|err| DomainError::Unexpected(err.to_string()))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}
