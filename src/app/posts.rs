use futures::Stream;
use serde_json::Value;
use time::OffsetDateTime;
use tokio::sync::broadcast;
use tracing::info;
use uuid::Uuid;

use crate::app::moderation;
use crate::domain::post::{Comment, Post, SubjectCategory};
use crate::domain::session::Session;
use crate::error::{AppError, DecodeError};
use crate::infra::docstore::{Change, Collection};

pub const POSTS: &str = "posts";

/// Caller-supplied fields of a new post. Author identity is stamped from the
/// session, never taken from the draft.
#[derive(Debug, Clone)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub image_url: Option<String>,
    pub subject_category: SubjectCategory,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PostFilter {
    pub approved_only: bool,
}

impl PostFilter {
    pub fn all() -> Self {
        Self {
            approved_only: false,
        }
    }

    pub fn approved() -> Self {
        Self {
            approved_only: true,
        }
    }
}

#[derive(Clone)]
pub struct PostService {
    posts: Collection,
}

impl PostService {
    pub fn new(posts: Collection) -> Self {
        Self { posts }
    }

    /// Admin posts are approved on the spot; everything else starts pending.
    pub async fn create(&self, session: &Session, draft: PostDraft) -> Result<Post, AppError> {
        let actor = session.require_user()?;

        let title = draft.title.trim();
        let content = draft.content.trim();
        if title.is_empty() {
            return Err(AppError::validation("title is required"));
        }
        if content.is_empty() {
            return Err(AppError::validation("content is required"));
        }

        let is_admin_post = actor.role.is_admin();
        let now = OffsetDateTime::now_utc();
        let post = Post {
            id: Uuid::new_v4(),
            title: title.to_string(),
            content: content.to_string(),
            author_id: actor.id,
            author_name: actor.full_name.clone(),
            created_at: now,
            updated_at: now,
            likes: 0,
            liked_by: Default::default(),
            comments: Vec::new(),
            tags: draft.tags,
            image_url: draft.image_url,
            is_admin_post,
            is_approved: is_admin_post,
            is_rejected: false,
            subject_category: draft.subject_category,
        };

        self.posts.insert(post.id, encode_post(&post)?).await;
        info!(post_id = %post.id, author_id = %actor.id, approved = post.is_approved, "created post");
        Ok(post)
    }

    pub async fn get(&self, post_id: Uuid) -> Result<Post, AppError> {
        let value = self
            .posts
            .get(post_id)
            .await
            .ok_or(AppError::NotFound(POSTS))?;
        decode_post(post_id, value)
    }

    /// One-shot listing, newest first. Rejected posts never appear.
    pub async fn list(&self, filter: PostFilter) -> Result<Vec<Post>, AppError> {
        snapshot(&self.posts, filter).await
    }

    /// Live subscription. The first `recv` yields the current snapshot; each
    /// later one yields a fresh snapshot after any post changes. Dropping the
    /// feed unsubscribes.
    pub fn watch(&self, filter: PostFilter) -> PostFeed {
        PostFeed {
            posts: self.posts.clone(),
            filter,
            rx: self.posts.subscribe(),
            primed: false,
        }
    }

    /// Atomic flip of one user's like. Runs as a single-document optimistic
    /// transaction, so concurrent togglers never lose an update and `likes`
    /// stays equal to the size of `liked_by`.
    pub async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> Result<Post, AppError> {
        let committed = self
            .posts
            .transact(post_id, |value| {
                let mut post = decode_post(post_id, value.clone())?;
                post.toggle_like(user_id);
                encode_post(&post)
            })
            .await?;
        decode_post(post_id, committed)
    }

    /// Appends under the same per-document transaction; order of arrival is
    /// the order of the `comments` list.
    pub async fn add_comment(
        &self,
        session: &Session,
        post_id: Uuid,
        content: &str,
    ) -> Result<Post, AppError> {
        let actor = session.require_user()?;
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::validation("comment content is required"));
        }

        let comment = Comment {
            id: Uuid::new_v4(),
            author_id: actor.id,
            author_name: actor.full_name.clone(),
            content: content.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };

        let committed = self
            .posts
            .transact(post_id, |value| {
                let mut post = decode_post(post_id, value.clone())?;
                post.comments.push(comment.clone());
                encode_post(&post)
            })
            .await?;
        decode_post(post_id, committed)
    }

    /// Admin only. Idempotent: approving an approved post changes nothing.
    pub async fn approve(&self, session: &Session, post_id: Uuid) -> Result<(), AppError> {
        let actor = session.require_user()?;
        if !moderation::can_moderate(actor) {
            return Err(AppError::Forbidden("only admins may approve posts"));
        }

        if !self
            .posts
            .update_fields(post_id, &[("is_approved", Value::Bool(true))])
            .await
        {
            return Err(AppError::NotFound(POSTS));
        }
        info!(%post_id, admin_id = %actor.id, "approved post");
        Ok(())
    }

    /// Admin only. Marks the post rejected and keeps the record; rejected
    /// posts disappear from every listing and feed.
    pub async fn reject(&self, session: &Session, post_id: Uuid) -> Result<(), AppError> {
        let actor = session.require_user()?;
        if !moderation::can_moderate(actor) {
            return Err(AppError::Forbidden("only admins may reject posts"));
        }

        if !self
            .posts
            .update_fields(post_id, &[("is_rejected", Value::Bool(true))])
            .await
        {
            return Err(AppError::NotFound(POSTS));
        }
        info!(%post_id, admin_id = %actor.id, "rejected post");
        Ok(())
    }

    /// Author-only edit of a still-pending post. Replaces the authored
    /// fields; counters, comments, and the approval flags are carried from
    /// the stored document, not the caller's copy.
    pub async fn update(&self, session: &Session, post: Post) -> Result<Post, AppError> {
        let actor = session.require_user()?.clone();
        let post_id = post.id;

        let committed = self
            .posts
            .transact(post_id, |value| {
                let current = decode_post(post_id, value.clone())?;
                if !moderation::can_edit(&current, &actor) {
                    return Err(AppError::Forbidden(
                        "only the author may edit, and only before approval",
                    ));
                }
                let next = Post {
                    title: post.title.clone(),
                    content: post.content.clone(),
                    tags: post.tags.clone(),
                    image_url: post.image_url.clone(),
                    subject_category: post.subject_category,
                    updated_at: OffsetDateTime::now_utc(),
                    ..current
                };
                encode_post(&next)
            })
            .await?;
        decode_post(post_id, committed)
    }

    /// Author or admin, enforced here.
    pub async fn delete(&self, session: &Session, post_id: Uuid) -> Result<(), AppError> {
        let actor = session.require_user()?;
        let post = self.get(post_id).await?;
        if !moderation::can_delete(&post, actor) {
            return Err(AppError::Forbidden("only the author or an admin may delete"));
        }

        if !self.posts.remove(post_id).await {
            return Err(AppError::NotFound(POSTS));
        }
        info!(%post_id, actor_id = %actor.id, "deleted post");
        Ok(())
    }
}

/// Push-based view over the posts collection.
pub struct PostFeed {
    posts: Collection,
    filter: PostFilter,
    rx: broadcast::Receiver<Change>,
    primed: bool,
}

impl PostFeed {
    /// Next consistent snapshot; `Ok(None)` once the store is gone.
    pub async fn recv(&mut self) -> Result<Option<Vec<Post>>, AppError> {
        if !self.primed {
            self.primed = true;
            return snapshot(&self.posts, self.filter).await.map(Some);
        }

        loop {
            match self.rx.recv().await {
                Ok(change) if change.collection == POSTS => {
                    return snapshot(&self.posts, self.filter).await.map(Some);
                }
                Ok(_) => continue,
                // Snapshots are recomputed from scratch, so a lagged
                // receiver just skips the intermediate states.
                Err(broadcast::error::RecvError::Lagged(_)) => {
                    return snapshot(&self.posts, self.filter).await.map(Some);
                }
                Err(broadcast::error::RecvError::Closed) => return Ok(None),
            }
        }
    }

    pub fn into_stream(self) -> impl Stream<Item = Result<Vec<Post>, AppError>> {
        futures::stream::unfold(self, |mut feed| async move {
            match feed.recv().await {
                Ok(Some(posts)) => Some((Ok(posts), feed)),
                Ok(None) => None,
                Err(err) => Some((Err(err), feed)),
            }
        })
    }
}

async fn snapshot(posts: &Collection, filter: PostFilter) -> Result<Vec<Post>, AppError> {
    let mut items = Vec::new();
    for (id, value) in posts.all().await {
        let post = decode_post(id, value)?;
        if post.matches(filter.approved_only) {
            items.push(post);
        }
    }
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    Ok(items)
}

pub(crate) fn decode_post(id: Uuid, value: Value) -> Result<Post, AppError> {
    serde_json::from_value(value).map_err(|source| {
        DecodeError {
            collection: POSTS,
            id,
            source,
        }
        .into()
    })
}

fn encode_post(post: &Post) -> Result<Value, AppError> {
    serde_json::to_value(post)
        .map_err(|err| AppError::internal(format!("failed to encode post: {}", err)))
}
