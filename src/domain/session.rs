use crate::domain::user::User;
use crate::error::AppError;

/// Request-scoped identity, passed explicitly into every store call that
/// needs an actor. Transitions: anonymous -> authenticated on sign-in or
/// sign-up, authenticated -> anonymous on sign-out. No other states.
#[derive(Debug, Clone, Default)]
pub enum Session {
    #[default]
    Anonymous,
    Authenticated(User),
}

impl Session {
    pub fn authenticated(user: User) -> Self {
        Self::Authenticated(user)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated(user) => Some(user),
            Self::Anonymous => None,
        }
    }

    pub fn require_user(&self) -> Result<&User, AppError> {
        self.user().ok_or(AppError::Unauthenticated)
    }
}
