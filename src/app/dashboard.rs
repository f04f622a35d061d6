use serde::Serialize;
use time::{Duration, OffsetDateTime};

use crate::app::accounts::decode_user;
use crate::app::moderation;
use crate::app::posts::decode_post;
use crate::domain::session::Session;
use crate::error::AppError;
use crate::infra::docstore::Collection;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub total_users: usize,
    pub total_posts: usize,
    pub pending_posts: usize,
    pub active_users: usize,
}

/// Admin dashboard aggregates.
#[derive(Clone)]
pub struct DashboardService {
    users: Collection,
    posts: Collection,
    active_window_days: i64,
}

impl DashboardService {
    pub fn new(users: Collection, posts: Collection, active_window_days: i64) -> Self {
        Self {
            users,
            posts,
            active_window_days,
        }
    }

    pub async fn stats(&self, session: &Session) -> Result<Stats, AppError> {
        let actor = session.require_user()?;
        if !moderation::can_moderate(actor) {
            return Err(AppError::Forbidden("only admins may view dashboard stats"));
        }

        let cutoff = OffsetDateTime::now_utc() - Duration::days(self.active_window_days);

        let mut total_users = 0;
        let mut active_users = 0;
        for (id, value) in self.users.all().await {
            let user = decode_user(id, value)?;
            total_users += 1;
            if user.last_active > cutoff {
                active_users += 1;
            }
        }

        let mut total_posts = 0;
        let mut pending_posts = 0;
        for (id, value) in self.posts.all().await {
            let post = decode_post(id, value)?;
            total_posts += 1;
            if !post.is_approved && !post.is_rejected {
                pending_posts += 1;
            }
        }

        Ok(Stats {
            total_users,
            total_posts,
            pending_posts,
            active_users,
        })
    }
}
