use std::collections::HashMap;
use std::sync::Arc;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::AppError;

struct Credential {
    user_id: Uuid,
    password_hash: String,
}

/// Email + password credential registry. Issues an opaque durable user id at
/// registration; the account document is keyed by the same id.
#[derive(Clone)]
pub struct AuthProvider {
    credentials: Arc<RwLock<HashMap<String, Credential>>>,
    min_password_chars: usize,
}

impl AuthProvider {
    pub fn new(min_password_chars: usize) -> Self {
        Self {
            credentials: Arc::new(RwLock::new(HashMap::new())),
            min_password_chars,
        }
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<Uuid, AppError> {
        if password.chars().count() < self.min_password_chars {
            return Err(AppError::WeakPassword {
                min: self.min_password_chars,
            });
        }

        let email = normalize_email(email);
        let password_hash = hash_password(password)?;

        let mut credentials = self.credentials.write().await;
        if credentials.contains_key(&email) {
            return Err(AppError::EmailTaken);
        }
        let user_id = Uuid::new_v4();
        credentials.insert(
            email,
            Credential {
                user_id,
                password_hash,
            },
        );
        Ok(user_id)
    }

    pub async fn verify(&self, email: &str, password: &str) -> Result<Uuid, AppError> {
        let email = normalize_email(email);
        let credentials = self.credentials.read().await;
        let credential = credentials
            .get(&email)
            .ok_or(AppError::InvalidCredentials)?;
        if !verify_password(password, &credential.password_hash)? {
            return Err(AppError::InvalidCredentials);
        }
        Ok(credential.user_id)
    }

    /// Reauthenticates with the current password before accepting the new one.
    pub async fn change_password(
        &self,
        email: &str,
        current: &str,
        new: &str,
    ) -> Result<(), AppError> {
        if new.chars().count() < self.min_password_chars {
            return Err(AppError::WeakPassword {
                min: self.min_password_chars,
            });
        }

        let email = normalize_email(email);
        let password_hash = hash_password(new)?;

        let mut credentials = self.credentials.write().await;
        let credential = credentials
            .get_mut(&email)
            .ok_or(AppError::InvalidCredentials)?;
        if !verify_password(current, &credential.password_hash)? {
            return Err(AppError::InvalidCredentials);
        }
        credential.password_hash = password_hash;
        Ok(())
    }

    /// Drops the credential for a deleted account. No-op if already gone.
    pub async fn unregister(&self, user_id: Uuid) {
        let mut credentials = self.credentials.write().await;
        credentials.retain(|_, credential| credential.user_id != user_id);
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| AppError::internal(format!("failed to hash password: {}", err)))?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|err| AppError::internal(format!("failed to parse password hash: {}", err)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
