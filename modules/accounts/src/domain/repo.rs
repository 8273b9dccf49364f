use async_trait::async_trait;
use uuid::Uuid;

use crate::contract::model::{AuthToken, User};

/// Port for the domain layer: user persistence.
/// Emails passed in are already normalized by the service.
#[async_trait]
pub trait UsersRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn exists_by_email(&self, email: &str) -> anyhow::Result<bool>;
    /// Insert or update by primary key.
    ///
    /// Service computes id/timestamps/validation; repo persists.
    async fn save(&self, user: User) -> anyhow::Result<()>;
    /// All users, oldest first.
    async fn list(&self) -> anyhow::Result<Vec<User>>;
}

/// Port for issued tokens. At most one token per user; `insert` fails when
/// the user already has one.
#[async_trait]
pub trait TokensRepository: Send + Sync {
    async fn find_by_key(&self, key: &str) -> anyhow::Result<Option<AuthToken>>;
    async fn find_by_user(&self, user_id: Uuid) -> anyhow::Result<Option<AuthToken>>;
    async fn insert(&self, token: AuthToken) -> anyhow::Result<()>;
}
