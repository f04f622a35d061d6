use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::app::moderation;
use crate::domain::session::Session;
use crate::domain::user::{Role, User};
use crate::error::{AppError, DecodeError};
use crate::infra::auth::AuthProvider;
use crate::infra::docstore::Collection;

pub const USERS: &str = "users";

/// Partial profile update; only the mutable fields. Email and role are fixed
/// at sign-up.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Clone)]
pub struct AccountService {
    users: Collection,
    auth: AuthProvider,
}

impl AccountService {
    pub fn new(users: Collection, auth: AuthProvider) -> Self {
        Self { users, auth }
    }

    /// Sign up a regular user. Creates the credential first, then the user
    /// document; a credential failure (taken email, weak password) leaves no
    /// records behind. Returns an authenticated session for the new user.
    pub async fn register(
        &self,
        full_name: &str,
        email: &str,
        phone: &str,
        password: &str,
    ) -> Result<Session, AppError> {
        self.create_account(full_name, email, phone, password, Role::User)
            .await
    }

    /// Seed an admin account. Role is immutable afterwards, so this is the
    /// only way an admin comes into existence; the embedding application
    /// decides who may call it.
    pub async fn bootstrap_admin(
        &self,
        full_name: &str,
        email: &str,
        phone: &str,
        password: &str,
    ) -> Result<Session, AppError> {
        self.create_account(full_name, email, phone, password, Role::Admin)
            .await
    }

    async fn create_account(
        &self,
        full_name: &str,
        email: &str,
        phone: &str,
        password: &str,
        role: Role,
    ) -> Result<Session, AppError> {
        let full_name = full_name.trim();
        let email = email.trim();
        let phone = phone.trim();
        if full_name.is_empty() {
            return Err(AppError::validation("full name is required"));
        }
        if email.is_empty() {
            return Err(AppError::validation("email is required"));
        }
        if phone.is_empty() {
            return Err(AppError::validation("phone is required"));
        }

        let user_id = self.auth.register(email, password).await?;

        let now = OffsetDateTime::now_utc();
        let user = User {
            id: user_id,
            full_name: full_name.to_string(),
            email: email.to_ascii_lowercase(),
            phone: phone.to_string(),
            avatar_url: None,
            role,
            created_date: now,
            last_active: now,
        };
        self.users.insert(user.id, encode_user(&user)?).await;
        info!(user_id = %user.id, role = role.as_db(), "registered account");

        Ok(Session::authenticated(user))
    }

    /// Verifies the credential, loads the account, and bumps `last_active`.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AppError> {
        let user_id = self.auth.verify(email, password).await?;

        let value = self
            .users
            .get(user_id)
            .await
            .ok_or(AppError::NotFound(USERS))?;
        let mut user = decode_user(user_id, value)?;

        let now = OffsetDateTime::now_utc();
        self.users
            .update_fields(user_id, &[("last_active", rfc3339(now)?)])
            .await;
        user.last_active = now;

        Ok(Session::authenticated(user))
    }

    /// Clears the ambient identity. No server-side effect.
    pub fn sign_out(&self, _session: Session) -> Session {
        Session::Anonymous
    }

    pub async fn get(&self, user_id: Uuid) -> Result<User, AppError> {
        let value = self
            .users
            .get(user_id)
            .await
            .ok_or(AppError::NotFound(USERS))?;
        decode_user(user_id, value)
    }

    /// Partial update of the caller's own profile; untouched fields keep
    /// their current value.
    pub async fn update_profile(
        &self,
        session: &Session,
        update: ProfileUpdate,
    ) -> Result<User, AppError> {
        let actor = session.require_user()?;

        let mut fields: Vec<(&str, Value)> = Vec::new();
        if let Some(full_name) = &update.full_name {
            fields.push(("full_name", Value::String(full_name.clone())));
        }
        if let Some(phone) = &update.phone {
            fields.push(("phone", Value::String(phone.clone())));
        }
        if let Some(avatar_url) = &update.avatar_url {
            fields.push(("avatar_url", Value::String(avatar_url.clone())));
        }

        if !fields.is_empty() && !self.users.update_fields(actor.id, &fields).await {
            return Err(AppError::NotFound(USERS));
        }

        self.get(actor.id).await
    }

    /// Reauthenticates with the current password before changing it.
    pub async fn change_password(
        &self,
        session: &Session,
        current: &str,
        new: &str,
    ) -> Result<(), AppError> {
        let actor = session.require_user()?;
        self.auth.change_password(&actor.email, current, new).await
    }

    /// Admin only, enforced here rather than left to the caller.
    pub async fn list_all(&self, session: &Session) -> Result<Vec<User>, AppError> {
        let actor = session.require_user()?;
        if !moderation::can_moderate(actor) {
            return Err(AppError::Forbidden("only admins may list accounts"));
        }

        let mut users = Vec::new();
        for (id, value) in self.users.all().await {
            users.push(decode_user(id, value)?);
        }
        users.sort_by(|a, b| a.created_date.cmp(&b.created_date).then(a.id.cmp(&b.id)));
        Ok(users)
    }

    /// Admin only. Removes the account document and its credential.
    pub async fn delete(&self, session: &Session, user_id: Uuid) -> Result<(), AppError> {
        let actor = session.require_user()?;
        if !moderation::can_moderate(actor) {
            return Err(AppError::Forbidden("only admins may delete accounts"));
        }

        if !self.users.remove(user_id).await {
            return Err(AppError::NotFound(USERS));
        }
        self.auth.unregister(user_id).await;
        info!(%user_id, admin_id = %actor.id, "deleted account");
        Ok(())
    }
}

pub(crate) fn decode_user(id: Uuid, value: Value) -> Result<User, AppError> {
    serde_json::from_value(value).map_err(|source| {
        DecodeError {
            collection: USERS,
            id,
            source,
        }
        .into()
    })
}

fn encode_user(user: &User) -> Result<Value, AppError> {
    serde_json::to_value(user)
        .map_err(|err| AppError::internal(format!("failed to encode user: {}", err)))
}

fn rfc3339(stamp: OffsetDateTime) -> Result<Value, AppError> {
    let formatted = stamp
        .format(&Rfc3339)
        .map_err(|err| AppError::internal(format!("failed to format timestamp: {}", err)))?;
    Ok(Value::String(formatted))
}
