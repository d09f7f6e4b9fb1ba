use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::presentation::app_error::{ErrorBody, ErrorMessage};
use crate::presentation::handlers::comments::{
    CommentDto, CommentEnvelope, CommentListEnvelope, CreateCommentDto, UpdateCommentDto,
};
use crate::presentation::handlers::posts::{
    CreatePostDto, PostDto, PostEnvelope, PostListEnvelope, PublishPostDto, UpdatePostDto,
};
use crate::presentation::handlers::tokens::{
    AuthenticationTokenDto, AuthenticationTokenEnvelope, CredentialsDto,
};
use crate::presentation::handlers::users::{ActivateDto, RegisterDto, UserDto, UserEnvelope};
use crate::presentation::handlers::{MessageResponse, MetadataDto};
use crate::presentation::http_handlers::HealthcheckResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::presentation::http_handlers::healthcheck,
        crate::presentation::handlers::posts::list_posts,
        crate::presentation::handlers::posts::get_post,
        crate::presentation::handlers::posts::create_post,
        crate::presentation::handlers::posts::update_post,
        crate::presentation::handlers::posts::delete_post,
        crate::presentation::handlers::posts::publish_post,
        crate::presentation::handlers::posts::clap_post,
        crate::presentation::handlers::comments::create_comment,
        crate::presentation::handlers::comments::list_comments,
        crate::presentation::handlers::comments::update_comment,
        crate::presentation::handlers::comments::delete_comment,
        crate::presentation::handlers::users::register,
        crate::presentation::handlers::users::activate,
        crate::presentation::handlers::users::me,
        crate::presentation::handlers::tokens::create_authentication_token
    ),
    components(
        schemas(
            ErrorBody,
            ErrorMessage,
            MessageResponse,
            MetadataDto,
            HealthcheckResponse,
            CreatePostDto,
            UpdatePostDto,
            PublishPostDto,
            PostDto,
            PostEnvelope,
            PostListEnvelope,
            CreateCommentDto,
            UpdateCommentDto,
            CommentDto,
            CommentEnvelope,
            CommentListEnvelope,
            RegisterDto,
            ActivateDto,
            UserDto,
            UserEnvelope,
            CredentialsDto,
            AuthenticationTokenDto,
            AuthenticationTokenEnvelope
        )
    ),
    tags(
        (name = "system", description = "Service status"),
        (name = "posts", description = "Post endpoints"),
        (name = "comments", description = "Comment endpoints"),
        (name = "users", description = "Registration and activation"),
        (name = "tokens", description = "Authentication tokens")
    ),
    modifiers(&SecurityAddon)
)]
pub(crate) struct ApiDoc;

pub(crate) struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let mut components = openapi.components.take().unwrap_or_default();
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
        openapi.components = Some(components);
    }
}

#[cfg(test)]
mod tests {
    use utoipa::OpenApi;

    use super::ApiDoc;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/healthcheck",
            "/api/posts",
            "/api/posts/{id}",
            "/api/posts/{id}/publish",
            "/api/posts/{id}/clap",
            "/api/posts/{id}/comments",
            "/api/posts/{id}/comments/{comment_id}",
            "/api/users",
            "/api/users/activated",
            "/api/users/me",
            "/api/tokens/authentication",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }

        let components = doc.components.expect("components must be present");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }

    #[test]
    fn omitted_version_is_documented_as_last_writer_wins() {
        let doc = serde_json::to_value(ApiDoc::openapi()).expect("document must serialise");
        for schema in ["UpdatePostDto", "UpdateCommentDto"] {
            let description = doc["components"]["schemas"][schema]["properties"]["version"]
                ["description"]
                .as_str()
                .unwrap_or_default();
            assert!(description.contains("last writer wins"), "{schema}: {description}");
        }
        let description = doc["components"]["schemas"]["PublishPostDto"]["properties"]["version"]
            ["description"]
            .as_str()
            .unwrap_or_default();
        assert!(description.contains("no conflict"), "{description}");
    }
}
