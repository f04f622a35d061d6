//! Account Tests
//!
//! Covers registration, sign-in/out, profile updates, password changes,
//! admin account management, and the dashboard aggregates.

mod common;

use common::{app, user_id, DEFAULT_PASSWORD};
use f2learn::app::accounts::ProfileUpdate;
use f2learn::domain::session::Session;
use f2learn::domain::user::Role;
use f2learn::error::AppError;
use std::time::Duration;

// ===========================================================================
// Registration
// ===========================================================================

#[tokio::test]
async fn register_assigns_user_role_and_authenticates() {
    let app = app().await;

    let session = app
        .app
        .accounts
        .register("Alice Tran", "alice@example.com", "+84 90 111 2222", DEFAULT_PASSWORD)
        .await
        .expect("register failed");

    assert!(session.is_authenticated());
    let user = session.user().unwrap();
    assert_eq!(user.full_name, "Alice Tran");
    assert_eq!(user.email, "alice@example.com");
    assert_eq!(user.role, Role::User);
    assert_eq!(user.created_date, user.last_active);
}

#[tokio::test]
async fn register_requires_full_name() {
    let app = app().await;

    let err = app
        .app
        .accounts
        .register("   ", "noname@example.com", "+84 90 111 2222", DEFAULT_PASSWORD)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn register_rejects_weak_password() {
    let app = app().await;

    let err = app
        .app
        .accounts
        .register("Short Pass", "short@example.com", "+84 90 111 2222", "abc")
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::WeakPassword { min: 6 }));
}

#[tokio::test]
async fn register_duplicate_email_leaves_no_record() {
    let app = app().await;
    let admin = app.create_admin("dup").await;

    app.app
        .accounts
        .register("First User", "taken@example.com", "+84 90 111 2222", DEFAULT_PASSWORD)
        .await
        .expect("first register failed");

    let err = app
        .app
        .accounts
        .register("Second User", "taken@example.com", "+84 90 333 4444", DEFAULT_PASSWORD)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::EmailTaken));

    // Only the admin and the first registration exist.
    let users = app.app.accounts.list_all(&admin).await.expect("list failed");
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|u| u.full_name != "Second User"));
}

// ===========================================================================
// Sign-in / sign-out
// ===========================================================================

#[tokio::test]
async fn sign_in_bumps_last_active() {
    let app = app().await;
    let session = app.create_user("lastactive").await;
    let before = app
        .app
        .accounts
        .get(user_id(&session))
        .await
        .expect("get failed")
        .last_active;

    tokio::time::sleep(Duration::from_millis(5)).await;

    let signed_in = app
        .app
        .accounts
        .sign_in("test_lastactive@example.com", DEFAULT_PASSWORD)
        .await
        .expect("sign in failed");

    assert!(signed_in.user().unwrap().last_active > before);
    let stored = app
        .app
        .accounts
        .get(user_id(&session))
        .await
        .expect("get failed");
    assert!(stored.last_active > before);
}

#[tokio::test]
async fn sign_in_wrong_password() {
    let app = app().await;
    app.create_user("wrongpw").await;

    let err = app
        .app
        .accounts
        .sign_in("test_wrongpw@example.com", "not-the-password")
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InvalidCredentials));
}

#[tokio::test]
async fn sign_in_unknown_email() {
    let app = app().await;

    let err = app
        .app
        .accounts
        .sign_in("ghost@example.com", DEFAULT_PASSWORD)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InvalidCredentials));
}

#[tokio::test]
async fn sign_out_returns_anonymous() {
    let app = app().await;
    let session = app.create_user("signout").await;

    let session = app.app.accounts.sign_out(session);

    assert!(!session.is_authenticated());
    assert!(matches!(session, Session::Anonymous));
}

// ===========================================================================
// Profile
// ===========================================================================

#[tokio::test]
async fn update_profile_touches_only_mutable_fields() {
    let app = app().await;
    let session = app.create_user("profile").await;

    let updated = app
        .app
        .accounts
        .update_profile(
            &session,
            ProfileUpdate {
                phone: Some("+84 28 999 8888".to_string()),
                avatar_url: Some("mem://f2learn-media/abc".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect("update failed");

    assert_eq!(updated.phone, "+84 28 999 8888");
    assert_eq!(updated.avatar_url.as_deref(), Some("mem://f2learn-media/abc"));
    // untouched and immutable fields survive
    assert_eq!(updated.full_name, "Test User profile");
    assert_eq!(updated.email, "test_profile@example.com");
    assert_eq!(updated.role, Role::User);
}

#[tokio::test]
async fn avatar_upload_roundtrip() {
    let app = app().await;
    let session = app.create_user("avatar").await;

    let bytes = bytes::Bytes::from_static(b"fake-png-bytes");
    let url = app.app.blobs.put(bytes.clone(), "image/png").await;
    let key = url.rsplit('/').next().unwrap().to_string();

    let blob = app.app.blobs.get(&key).await.expect("blob missing");
    assert_eq!(blob.bytes, bytes);
    assert_eq!(blob.content_type, "image/png");

    let updated = app
        .app
        .accounts
        .update_profile(
            &session,
            ProfileUpdate {
                avatar_url: Some(url.clone()),
                ..Default::default()
            },
        )
        .await
        .expect("update failed");
    assert_eq!(updated.avatar_url.as_deref(), Some(url.as_str()));
}

#[tokio::test]
async fn update_profile_requires_auth() {
    let app = app().await;

    let err = app
        .app
        .accounts
        .update_profile(&Session::Anonymous, ProfileUpdate::default())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Unauthenticated));
}

#[tokio::test]
async fn change_password_reauthenticates() {
    let app = app().await;
    let session = app.create_user("chpass").await;

    let err = app
        .app
        .accounts
        .change_password(&session, "not-the-password", "brand-new-password")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidCredentials));

    app.app
        .accounts
        .change_password(&session, DEFAULT_PASSWORD, "brand-new-password")
        .await
        .expect("change password failed");

    // old credential is dead, new one works
    let err = app
        .app
        .accounts
        .sign_in("test_chpass@example.com", DEFAULT_PASSWORD)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidCredentials));
    app.app
        .accounts
        .sign_in("test_chpass@example.com", "brand-new-password")
        .await
        .expect("sign in with new password failed");
}

// ===========================================================================
// Admin account management
// ===========================================================================

#[tokio::test]
async fn list_all_requires_admin() {
    let app = app().await;
    let user = app.create_user("listall").await;

    let err = app.app.accounts.list_all(&user).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let admin = app.create_admin("listall").await;
    let users = app.app.accounts.list_all(&admin).await.expect("list failed");
    assert_eq!(users.len(), 2);
}

#[tokio::test]
async fn delete_account_requires_admin() {
    let app = app().await;
    let user_a = app.create_user("delete_a").await;
    let user_b = app.create_user("delete_b").await;

    let err = app
        .app
        .accounts
        .delete(&user_a, user_id(&user_b))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
async fn delete_account_removes_record_and_credential() {
    let app = app().await;
    let admin = app.create_admin("delete").await;
    let victim = app.create_user("victim").await;
    let victim_id = user_id(&victim);

    app.app
        .accounts
        .delete(&admin, victim_id)
        .await
        .expect("delete failed");

    let err = app.app.accounts.get(victim_id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound("users")));

    let err = app
        .app
        .accounts
        .sign_in("test_victim@example.com", DEFAULT_PASSWORD)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidCredentials));
}

// ===========================================================================
// Dashboard
// ===========================================================================

#[tokio::test]
async fn dashboard_stats_counts() {
    let app = app().await;
    let admin = app.create_admin("stats").await;
    let user = app.create_user("stats").await;

    app.create_post(&admin, "approved one").await;
    app.create_post(&user, "pending one").await;
    app.create_post(&user, "pending two").await;

    let stats = app.app.dashboard.stats(&admin).await.expect("stats failed");
    assert_eq!(stats.total_users, 2);
    assert_eq!(stats.total_posts, 3);
    assert_eq!(stats.pending_posts, 2);
    // everyone registered moments ago
    assert_eq!(stats.active_users, 2);
}

#[tokio::test]
async fn dashboard_stats_requires_admin() {
    let app = app().await;
    let user = app.create_user("statsgate").await;

    let err = app.app.dashboard.stats(&user).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}
