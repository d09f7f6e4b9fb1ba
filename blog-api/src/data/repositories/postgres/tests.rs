//! Store-level checks against a live PostgreSQL (`DATABASE_URL`).
//! Run with `cargo test -- --ignored`.

use std::time::Duration;

use chrono::Duration as TokenTtl;
use sqlx::PgPool;

use super::comment_repository::PostgresCommentRepository;
use super::post_repository::PostgresPostRepository;
use super::token_repository::PostgresTokenRepository;
use super::user_repository::PostgresUserRepository;
use crate::data::comment_repository::{CommentRepository, NewComment};
use crate::data::post_repository::{NewPost, PostRepository, PostSearch};
use crate::data::token_repository::TokenRepository;
use crate::data::user_repository::{NewUser, UserRepository};
use crate::domain::error::DomainError;
use crate::domain::filter::Filter;
use crate::domain::post::{Post, PostStatus, generate_slug};
use crate::domain::token::{Token, TokenScope};
use crate::domain::user::User;

const QUERY_TIMEOUT: Duration = Duration::from_secs(3);

fn new_post(title: &str, content: &str, tags: &[&str]) -> NewPost {
    NewPost {
        title: title.to_string(),
        subtitle: String::new(),
        content: content.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        slug: generate_slug(title),
    }
}

async fn published(repo: &PostgresPostRepository, input: NewPost) -> Post {
    let post = repo.create_post(input).await.expect("post must be created");
    repo.publish_post(post.id, post.version)
        .await
        .expect("post must be published")
}

/// Moves `published_at` back by `hours_ago`, independent of insertion order.
async fn backdate(pool: &PgPool, id: i64, hours_ago: i32) {
    sqlx::query("UPDATE posts SET published_at = now() - $1::int * interval '1 hour' WHERE id = $2")
        .bind(hours_ago)
        .bind(id)
        .execute(pool)
        .await
        .expect("published_at must be updated");
}

fn ids(posts: &[Post]) -> Vec<i64> {
    posts.iter().map(|post| post.id).collect()
}

async fn seed_user(pool: &PgPool, username: &str) -> User {
    PostgresUserRepository::new(pool.clone(), QUERY_TIMEOUT)
        .create_user(NewUser {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: "hash".to_string(),
        })
        .await
        .expect("user must be created")
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL via DATABASE_URL"]
async fn created_post_is_draft_with_first_version(pool: PgPool) {
    let repo = PostgresPostRepository::new(pool, QUERY_TIMEOUT);

    let post = repo
        .create_post(new_post("Learning Rust Ownership", "Borrowing rules in depth", &["rust"]))
        .await
        .expect("post must be created");

    assert_eq!(post.status, PostStatus::Draft);
    assert_eq!(post.version, 1);
    assert_eq!(post.claps, 0);
    assert_eq!(post.slug, "learning-rust-ownership");
    assert!(post.published_at.is_none());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL via DATABASE_URL"]
async fn duplicate_slug_is_reported_as_duplicate(pool: PgPool) {
    let repo = PostgresPostRepository::new(pool, QUERY_TIMEOUT);
    let input = new_post("Same Title Twice Here", "some content for the post", &["rust"]);

    repo.create_post(input.clone())
        .await
        .expect("first insert must succeed");
    let err = repo
        .create_post(input)
        .await
        .expect_err("second insert must fail");

    assert!(matches!(err, DomainError::Duplicate { field: "slug" }));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL via DATABASE_URL"]
async fn concurrent_updates_with_same_version_let_exactly_one_win(pool: PgPool) {
    let repo = PostgresPostRepository::new(pool, QUERY_TIMEOUT);
    let post = repo
        .create_post(new_post("Concurrency Post Title", "content long enough here", &["db"]))
        .await
        .expect("post must be created");

    let mut left = post.clone();
    left.title = "Left Writer Title Wins".to_string();
    let mut right = post.clone();
    right.title = "Right Writer Title Wins".to_string();

    let (a, b) = tokio::join!(repo.update_post(&left), repo.update_post(&right));

    let outcomes = [a.is_ok(), b.is_ok()];
    assert_eq!(outcomes.iter().filter(|ok| **ok).count(), 1);
    let conflict = if a.is_ok() { b } else { a };
    assert!(matches!(conflict, Err(DomainError::EditConflict)));

    let stored = repo
        .get_post(post.id)
        .await
        .expect("lookup must succeed")
        .expect("post must exist");
    assert_eq!(stored.version, 2);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL via DATABASE_URL"]
async fn clap_increments_claps_and_version(pool: PgPool) {
    let repo = PostgresPostRepository::new(pool, QUERY_TIMEOUT);
    let post = published(
        &repo,
        new_post("Clap Worthy Article", "content long enough here", &["misc"]),
    )
    .await;

    let clapped = repo
        .clap_post(post.id)
        .await
        .expect("clap must succeed")
        .expect("post must exist");

    assert_eq!(clapped.claps, 1);
    assert_eq!(clapped.version, post.version + 1);
    assert!(repo.clap_post(9_999).await.expect("clap must run").is_none());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL via DATABASE_URL"]
async fn listing_excludes_drafts_and_counts_whole_result(pool: PgPool) {
    let repo = PostgresPostRepository::new(pool.clone(), QUERY_TIMEOUT);
    let mut posts = Vec::new();
    for i in 0..3 {
        posts.push(
            published(
                &repo,
                new_post(&format!("Published Article {i}"), "content long enough here", &["rust"]),
            )
            .await,
        );
    }
    repo.create_post(new_post("Draft Article Only", "content long enough here", &["rust"]))
        .await
        .expect("draft must be created");

    // Oldest id is the most recently published.
    backdate(&pool, posts[0].id, 1).await;
    backdate(&pool, posts[1].id, 2).await;
    backdate(&pool, posts[2].id, 3).await;

    let page = repo
        .list_published(&PostSearch::default(), Filter::new(1, 20))
        .await
        .expect("listing must succeed");
    assert_eq!(page.total_records, 3);
    assert!(page.items.iter().all(Post::is_published));
    assert_eq!(ids(&page.items), vec![posts[0].id, posts[1].id, posts[2].id]);

    let page = repo
        .list_published(&PostSearch::default(), Filter::new(2, 2))
        .await
        .expect("listing must succeed");
    assert_eq!(page.total_records, 3);
    assert_eq!(ids(&page.items), vec![posts[2].id]);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL via DATABASE_URL"]
async fn search_ranks_matches_and_tags_must_all_be_present(pool: PgPool) {
    let repo = PostgresPostRepository::new(pool.clone(), QUERY_TIMEOUT);
    let strong = published(
        &repo,
        new_post("Tokio Runtime Internals", "tokio tokio scheduler", &["rust", "async"]),
    )
    .await;
    let weak = published(
        &repo,
        new_post("Gardening In Spring", "tomatoes and a little tokio", &["garden"]),
    )
    .await;
    // Rank outweighs recency.
    backdate(&pool, strong.id, 48).await;
    backdate(&pool, weak.id, 1).await;
    published(
        &repo,
        new_post("Unrelated Cooking Notes", "pasta with basil leaves", &["food"]),
    )
    .await;

    let search = PostSearch {
        query: "tokio".to_string(),
        tags: Vec::new(),
    };
    let page = repo
        .list_published(&search, Filter::new(1, 20))
        .await
        .expect("search must succeed");
    assert_eq!(page.total_records, 2);
    assert_eq!(ids(&page.items), vec![strong.id, weak.id]);

    let search = PostSearch {
        query: String::new(),
        tags: vec!["rust".to_string(), "async".to_string()],
    };
    let page = repo
        .list_published(&search, Filter::new(1, 20))
        .await
        .expect("tag filter must succeed");
    assert_eq!(page.total_records, 1);
    assert_eq!(page.items[0].tags, vec!["rust", "async"]);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL via DATABASE_URL"]
async fn equally_ranked_matches_are_newest_first(pool: PgPool) {
    let repo = PostgresPostRepository::new(pool.clone(), QUERY_TIMEOUT);
    let first = published(
        &repo,
        new_post("Tokio Field Notes One", "notes on tokio channels", &["rust"]),
    )
    .await;
    let second = published(
        &repo,
        new_post("Tokio Field Notes Two", "notes on tokio channels", &["rust"]),
    )
    .await;
    published(
        &repo,
        new_post("Unrelated Cooking Notes", "pasta with basil leaves", &["food"]),
    )
    .await;

    // Same rank; the earlier insert is published later.
    backdate(&pool, first.id, 1).await;
    backdate(&pool, second.id, 5).await;

    let search = PostSearch {
        query: "tokio".to_string(),
        tags: Vec::new(),
    };
    let page = repo
        .list_published(&search, Filter::new(1, 20))
        .await
        .expect("search must succeed");

    assert_eq!(page.total_records, 2);
    assert_eq!(ids(&page.items), vec![first.id, second.id]);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL via DATABASE_URL"]
async fn empty_page_beyond_results_reports_zero_total(pool: PgPool) {
    let repo = PostgresPostRepository::new(pool, QUERY_TIMEOUT);
    published(
        &repo,
        new_post("Only Published Post", "content long enough here", &["rust"]),
    )
    .await;

    let page = repo
        .list_published(&PostSearch::default(), Filter::new(5, 20))
        .await
        .expect("listing must succeed");

    assert!(page.items.is_empty());
    assert_eq!(page.total_records, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL via DATABASE_URL"]
async fn comment_delete_requires_matching_owner_and_post(pool: PgPool) {
    let author = seed_user(&pool, "comment_author").await;
    let other = seed_user(&pool, "someone_else").await;
    let posts = PostgresPostRepository::new(pool.clone(), QUERY_TIMEOUT);
    let post = published(
        &posts,
        new_post("Commented Article Here", "content long enough here", &["rust"]),
    )
    .await;
    let comments = PostgresCommentRepository::new(pool, QUERY_TIMEOUT);

    let comment = comments
        .create_comment(NewComment {
            body: "first comment body".to_string(),
            user_id: author.id,
            post_id: post.id,
        })
        .await
        .expect("comment must be created");

    assert!(
        !comments
            .delete_comment(comment.id, other.id, post.id)
            .await
            .expect("delete must run")
    );
    assert!(
        !comments
            .delete_comment(comment.id, author.id, post.id + 1)
            .await
            .expect("delete must run")
    );
    assert!(
        comments
            .delete_comment(comment.id, author.id, post.id)
            .await
            .expect("delete must run")
    );
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL via DATABASE_URL"]
async fn comment_on_missing_post_is_not_found(pool: PgPool) {
    let author = seed_user(&pool, "comment_author").await;
    let comments = PostgresCommentRepository::new(pool, QUERY_TIMEOUT);

    let err = comments
        .create_comment(NewComment {
            body: "orphaned comment body".to_string(),
            user_id: author.id,
            post_id: 4_242,
        })
        .await
        .expect_err("insert must fail");

    assert!(matches!(err, DomainError::NotFound(ref resource) if resource == "post"));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL via DATABASE_URL"]
async fn comments_list_in_insertion_order(pool: PgPool) {
    let author = seed_user(&pool, "comment_author").await;
    let posts = PostgresPostRepository::new(pool.clone(), QUERY_TIMEOUT);
    let post = published(
        &posts,
        new_post("Thread Starter Article", "content long enough here", &["rust"]),
    )
    .await;
    let comments = PostgresCommentRepository::new(pool, QUERY_TIMEOUT);
    for i in 0..3 {
        comments
            .create_comment(NewComment {
                body: format!("comment number {i}"),
                user_id: author.id,
                post_id: post.id,
            })
            .await
            .expect("comment must be created");
    }

    let page = comments
        .list_for_post(post.id, Filter::new(1, 2))
        .await
        .expect("listing must succeed");

    assert_eq!(page.total_records, 3);
    assert_eq!(page.items[0].body, "comment number 0");
    assert_eq!(page.items[1].body, "comment number 1");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL via DATABASE_URL"]
async fn duplicate_email_is_reported_as_duplicate(pool: PgPool) {
    let users = PostgresUserRepository::new(pool, QUERY_TIMEOUT);
    users
        .create_user(NewUser {
            username: "first_account".to_string(),
            email: "shared@example.com".to_string(),
            password_hash: "hash".to_string(),
        })
        .await
        .expect("first user must be created");

    let err = users
        .create_user(NewUser {
            username: "second_account".to_string(),
            email: "shared@example.com".to_string(),
            password_hash: "hash".to_string(),
        })
        .await
        .expect_err("second user must fail");

    assert!(matches!(err, DomainError::Duplicate { field: "email" }));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL via DATABASE_URL"]
async fn token_resolves_owner_only_for_its_scope_until_deleted(pool: PgPool) {
    let user = seed_user(&pool, "token_holder").await;
    let users = PostgresUserRepository::new(pool.clone(), QUERY_TIMEOUT);
    let tokens = PostgresTokenRepository::new(pool, QUERY_TIMEOUT);

    let token = Token::generate(user.id, TokenTtl::hours(1), TokenScope::Activation);
    tokens
        .insert_token(&token)
        .await
        .expect("token must be stored");

    let found = users
        .find_for_token(TokenScope::Activation, &token.hash)
        .await
        .expect("lookup must succeed")
        .expect("owner must be found");
    assert_eq!(found.id, user.id);

    assert!(
        users
            .find_for_token(TokenScope::Authentication, &token.hash)
            .await
            .expect("lookup must succeed")
            .is_none()
    );

    let removed = tokens
        .delete_all_for_user(TokenScope::Activation, user.id)
        .await
        .expect("delete must succeed");
    assert_eq!(removed, 1);
    assert!(
        users
            .find_for_token(TokenScope::Activation, &token.hash)
            .await
            .expect("lookup must succeed")
            .is_none()
    );
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL via DATABASE_URL"]
async fn expired_token_does_not_resolve(pool: PgPool) {
    let user = seed_user(&pool, "token_holder").await;
    let users = PostgresUserRepository::new(pool.clone(), QUERY_TIMEOUT);
    let tokens = PostgresTokenRepository::new(pool, QUERY_TIMEOUT);

    let token = Token::generate(user.id, TokenTtl::seconds(-1), TokenScope::Authentication);
    tokens
        .insert_token(&token)
        .await
        .expect("token must be stored");

    let found = users
        .find_for_token(TokenScope::Authentication, &token.hash)
        .await
        .expect("lookup must succeed");
    assert!(found.is_none());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL via DATABASE_URL"]
async fn user_update_with_stale_version_conflicts(pool: PgPool) {
    let user = seed_user(&pool, "version_user").await;
    let users = PostgresUserRepository::new(pool, QUERY_TIMEOUT);

    let mut activated = user.clone();
    activated.activated = true;
    let updated = users
        .update_user(&activated)
        .await
        .expect("first update must succeed");
    assert!(updated.activated);
    assert_eq!(updated.version, user.version + 1);

    let err = users
        .update_user(&activated)
        .await
        .expect_err("stale update must fail");
    assert!(matches!(err, DomainError::EditConflict));
}
