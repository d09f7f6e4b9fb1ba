use sqlx::PgPool;
use std::sync::Arc;

use crate::application::auth_service::AuthService;
use crate::application::blog_service::BlogService;
use crate::application::comment_service::CommentService;
use crate::data::repositories::postgres::comment_repository::PostgresCommentRepository;
use crate::data::repositories::postgres::post_repository::PostgresPostRepository;
use crate::data::repositories::postgres::token_repository::PostgresTokenRepository;
use crate::data::repositories::postgres::user_repository::PostgresUserRepository;
use crate::infrastructure::background::BackgroundTasks;
use crate::infrastructure::mailer::{MailTemplates, SmtpMailer};
use crate::infrastructure::metrics::HttpMetrics;
use crate::infrastructure::rate_limiter::ClientRateLimiter;
use crate::infrastructure::settings::{Environment, Settings};

pub(crate) mod app_error;
pub(crate) mod handlers;
pub(crate) mod http_handlers;
pub(crate) mod middleware;
pub(crate) mod openapi;
pub(crate) mod routes;

pub(crate) type Posts = BlogService<PostgresPostRepository>;
pub(crate) type Comments = CommentService<PostgresCommentRepository, PostgresPostRepository>;
pub(crate) type Auth = AuthService<PostgresUserRepository, PostgresTokenRepository, SmtpMailer>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) environment: Environment,
    pub(crate) default_page_size: i64,
    pub(crate) blog_service: Arc<Posts>,
    pub(crate) comment_service: Arc<Comments>,
    pub(crate) auth_service: Arc<Auth>,
    pub(crate) rate_limiter: Arc<ClientRateLimiter>,
    pub(crate) metrics: Arc<HttpMetrics>,
}

impl AppState {
    pub(crate) fn new(
        pool: PgPool,
        settings: &Settings,
        mailer: Arc<SmtpMailer>,
        templates: Arc<MailTemplates>,
        background: BackgroundTasks,
        rate_limiter: Arc<ClientRateLimiter>,
        metrics: Arc<HttpMetrics>,
    ) -> Self {
        let query_timeout = settings.database.query_timeout;
        let posts = || PostgresPostRepository::new(pool.clone(), query_timeout);

        let blog_service = BlogService::new(posts());
        let comment_service = CommentService::new(
            PostgresCommentRepository::new(pool.clone(), query_timeout),
            posts(),
        );
        let auth_service = AuthService::new(
            PostgresUserRepository::new(pool.clone(), query_timeout),
            PostgresTokenRepository::new(pool.clone(), query_timeout),
            mailer,
            templates,
            background,
        );

        Self {
            environment: settings.environment,
            default_page_size: settings.default_page_size,
            blog_service: Arc::new(blog_service),
            comment_service: Arc::new(comment_service),
            auth_service: Arc::new(auth_service),
            rate_limiter,
            metrics,
        }
    }
}
