pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod infra;

use crate::app::accounts::{AccountService, USERS};
use crate::app::dashboard::DashboardService;
use crate::app::posts::{PostService, POSTS};
use crate::config::AppConfig;
use crate::infra::auth::AuthProvider;
use crate::infra::blobstore::BlobStore;
use crate::infra::docstore::DocStore;

/// The wired application: one document store, one credential registry, and
/// the services on top. Clone-cheap; all handles share state.
#[derive(Clone)]
pub struct App {
    pub accounts: AccountService,
    pub posts: PostService,
    pub dashboard: DashboardService,
    pub blobs: BlobStore,
}

impl App {
    pub async fn new(config: &AppConfig) -> Self {
        let store = DocStore::new(config.change_buffer, config.txn_max_retries);
        let users = store.collection(USERS).await;
        let posts = store.collection(POSTS).await;
        let auth = AuthProvider::new(config.password_min_chars);

        Self {
            accounts: AccountService::new(users.clone(), auth),
            posts: PostService::new(posts.clone()),
            dashboard: DashboardService::new(users, posts, config.active_window_days),
            blobs: BlobStore::new(config.blob_base_url.clone()),
        }
    }
}
