#![allow(dead_code)]

use uuid::Uuid;

use f2learn::app::posts::PostDraft;
use f2learn::config::AppConfig;
use f2learn::domain::post::{Post, SubjectCategory};
use f2learn::domain::session::Session;
use f2learn::App;

pub const DEFAULT_PASSWORD: &str = "testpassword123";

/// Fresh in-process app per test; no shared state between tests.
pub struct TestApp {
    pub app: App,
}

pub async fn app() -> TestApp {
    let config = AppConfig::from_env().expect("failed to build AppConfig");
    TestApp {
        app: App::new(&config).await,
    }
}

impl TestApp {
    pub async fn create_user(&self, suffix: &str) -> Session {
        self.app
            .accounts
            .register(
                &format!("Test User {}", suffix),
                &format!("test_{}@example.com", suffix),
                "+84 90 000 0000",
                DEFAULT_PASSWORD,
            )
            .await
            .expect("register test user failed")
    }

    pub async fn create_admin(&self, suffix: &str) -> Session {
        self.app
            .accounts
            .bootstrap_admin(
                &format!("Test Admin {}", suffix),
                &format!("admin_{}@example.com", suffix),
                "+84 90 000 0001",
                DEFAULT_PASSWORD,
            )
            .await
            .expect("bootstrap test admin failed")
    }

    pub async fn create_post(&self, session: &Session, title: &str) -> Post {
        self.app
            .posts
            .create(session, draft(title))
            .await
            .expect("create test post failed")
    }
}

pub fn draft(title: &str) -> PostDraft {
    PostDraft {
        title: title.to_string(),
        content: "test content".to_string(),
        tags: vec!["test".to_string()],
        image_url: None,
        subject_category: SubjectCategory::ComputerScience,
    }
}

pub fn user_id(session: &Session) -> Uuid {
    session.user().expect("session is authenticated").id
}
