use sea_orm::Set;

use crate::contract::model::{AuthToken, User};
use crate::infra::storage::entity::{auth_token, user};

impl From<user::Model> for User {
    fn from(m: user::Model) -> Self {
        Self {
            id: m.id,
            email: m.email,
            name: m.name,
            password_hash: m.password_hash,
            is_active: m.is_active,
            is_staff: m.is_staff,
            is_superuser: m.is_superuser,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

impl From<User> for user::ActiveModel {
    fn from(u: User) -> Self {
        Self {
            id: Set(u.id),
            email: Set(u.email),
            name: Set(u.name),
            password_hash: Set(u.password_hash),
            is_active: Set(u.is_active),
            is_staff: Set(u.is_staff),
            is_superuser: Set(u.is_superuser),
            created_at: Set(u.created_at),
            updated_at: Set(u.updated_at),
        }
    }
}

impl From<auth_token::Model> for AuthToken {
    fn from(m: auth_token::Model) -> Self {
        Self {
            key: m.key,
            user_id: m.user_id,
            created_at: m.created_at,
        }
    }
}

impl From<AuthToken> for auth_token::ActiveModel {
    fn from(t: AuthToken) -> Self {
        Self {
            key: Set(t.key),
            user_id: Set(t.user_id),
            created_at: Set(t.created_at),
        }
    }
}
