use anyhow::Result;
use bytes::Bytes;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use f2learn::app::accounts::ProfileUpdate;
use f2learn::app::posts::{PostDraft, PostFilter};
use f2learn::config::AppConfig;
use f2learn::domain::post::SubjectCategory;
use f2learn::App;

/// Seed scenario: walks the whole surface once so the crate can be watched
/// end to end with `RUST_LOG=info cargo run`.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let app = App::new(&config).await;

    let admin = app
        .accounts
        .bootstrap_admin("Site Admin", "admin@f2learn.example", "+84 28 3776 1300", "s3cret-admin")
        .await?;
    let alice = app
        .accounts
        .register("Alice Tran", "alice@f2learn.example", "+84 90 123 4567", "hunter2-plus")
        .await?;
    let bob = app
        .accounts
        .register("Bob Nguyen", "bob@f2learn.example", "+84 90 765 4321", "correct-horse")
        .await?;

    // Avatar upload through the blob store, then a profile update.
    let avatar_url = app
        .blobs
        .put(Bytes::from_static(b"\x89PNG\r\n\x1a\n"), "image/png")
        .await;
    app.accounts
        .update_profile(
            &alice,
            ProfileUpdate {
                avatar_url: Some(avatar_url),
                ..Default::default()
            },
        )
        .await?;

    let mut feed = app.posts.watch(PostFilter::approved());
    let initial = feed.recv().await?.unwrap_or_default();
    info!(posts = initial.len(), "approved feed primed");

    let post = app
        .posts
        .create(
            &alice,
            PostDraft {
                title: "Integrals without tears".to_string(),
                content: "A gentle walkthrough of substitution.".to_string(),
                tags: vec!["calculus".to_string()],
                image_url: None,
                subject_category: SubjectCategory::Mathematics,
            },
        )
        .await?;
    let after_create = feed.recv().await?.unwrap_or_default();
    info!(posts = after_create.len(), "feed after pending create (still empty)");

    app.posts.approve(&admin, post.id).await?;
    let after_approve = feed.recv().await?.unwrap_or_default();
    info!(posts = after_approve.len(), "feed after approval");

    let bob_user = bob.require_user()?;
    let liked = app.posts.toggle_like(post.id, bob_user.id).await?;
    info!(likes = liked.likes, "bob liked the post");

    let commented = app
        .posts
        .add_comment(&bob, post.id, "This finally made it click, thanks!")
        .await?;
    info!(comments = commented.comments.len(), "bob commented");

    let stats = app.dashboard.stats(&admin).await?;
    info!(
        total_users = stats.total_users,
        total_posts = stats.total_posts,
        pending_posts = stats.pending_posts,
        active_users = stats.active_users,
        "dashboard"
    );

    Ok(())
}
