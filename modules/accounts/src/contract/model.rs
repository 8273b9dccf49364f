use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Stored account. `password_hash` is an Argon2id PHC string, never plaintext.
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("name", &self.name)
            .field("password_hash", &"<redacted>")
            .field("is_active", &self.is_active)
            .field("is_staff", &self.is_staff)
            .field("is_superuser", &self.is_superuser)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Sign-up data. `email` is optional so a missing address can be reported
/// as such instead of failing deserialization.
#[derive(Clone, Default)]
pub struct NewUser {
    pub email: Option<String>,
    pub password: String,
    pub name: Option<String>,
}

/// Email + password pair presented to obtain a token.
#[derive(Clone, Default)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Partial update of the caller's own account.
#[derive(Clone, Default)]
pub struct ProfilePatch {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
}

/// Account created from the admin surface with explicit flags.
#[derive(Clone)]
pub struct AdminNewUser {
    pub email: Option<String>,
    pub password: String,
    pub name: Option<String>,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl Default for AdminNewUser {
    fn default() -> Self {
        Self {
            email: None,
            password: String::new(),
            name: None,
            is_active: true,
            is_staff: false,
            is_superuser: false,
        }
    }
}

/// Administrative edit; `None` leaves the field untouched.
#[derive(Clone, Default)]
pub struct AdminUserPatch {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
    pub is_active: Option<bool>,
    pub is_staff: Option<bool>,
    pub is_superuser: Option<bool>,
}

/// Opaque API token; one per user.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken {
    pub key: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthToken")
            .field("key", &"<redacted>")
            .field("user_id", &self.user_id)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Caller identity resolved from a token, valid for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
    pub email: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
        }
    }
}

/// Description of the admin "add user" view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddForm {
    pub fields: Vec<FormField>,
    pub min_password_length: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub name: &'static str,
    pub kind: &'static str,
    pub required: bool,
}
