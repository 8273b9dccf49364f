//! SeaORM-backed repository implementations for the domain ports.
//!
//! Both repositories are generic over `C: ConnectionTrait`, so they can be
//! built from a `DatabaseConnection` or a transaction.

use anyhow::Context;
use sea_orm::{
    sea_query::OnConflict, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder,
};
use uuid::Uuid;

use crate::contract::model::{AuthToken, User};
use crate::domain::repo::{TokensRepository, UsersRepository};
use crate::infra::storage::entity::{auth_token, user};

/// SeaORM users repository.
/// Holds a connection object; its lifetime/ownership is up to the caller.
pub struct SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl<C> UsersRepository for SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let found = user::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find_by_id failed")?;
        Ok(found.map(Into::into))
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let found = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("find_by_email failed")?;
        Ok(found.map(Into::into))
    }

    async fn exists_by_email(&self, email: &str) -> anyhow::Result<bool> {
        let count = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .count(&self.conn)
            .await
            .context("exists_by_email failed")?;
        Ok(count > 0)
    }

    async fn save(&self, u: User) -> anyhow::Result<()> {
        let am: user::ActiveModel = u.into();
        user::Entity::insert(am)
            .on_conflict(
                OnConflict::column(user::Column::Id)
                    .update_columns([
                        user::Column::Email,
                        user::Column::Name,
                        user::Column::PasswordHash,
                        user::Column::IsActive,
                        user::Column::IsStaff,
                        user::Column::IsSuperuser,
                        user::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await
            .context("save failed")?;
        Ok(())
    }

    async fn list(&self) -> anyhow::Result<Vec<User>> {
        let rows = user::Entity::find()
            .order_by_asc(user::Column::CreatedAt)
            .order_by_asc(user::Column::Email)
            .all(&self.conn)
            .await
            .context("list failed")?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

/// SeaORM tokens repository.
pub struct SeaOrmTokensRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmTokensRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl<C> TokensRepository for SeaOrmTokensRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn find_by_key(&self, key: &str) -> anyhow::Result<Option<AuthToken>> {
        let found = auth_token::Entity::find_by_id(key.to_owned())
            .one(&self.conn)
            .await
            .context("find_by_key failed")?;
        Ok(found.map(Into::into))
    }

    async fn find_by_user(&self, user_id: Uuid) -> anyhow::Result<Option<AuthToken>> {
        let found = auth_token::Entity::find()
            .filter(auth_token::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await
            .context("find_by_user failed")?;
        Ok(found.map(Into::into))
    }

    async fn insert(&self, token: AuthToken) -> anyhow::Result<()> {
        let am: auth_token::ActiveModel = token.into();
        auth_token::Entity::insert(am)
            .exec_without_returning(&self.conn)
            .await
            .context("insert token failed")?;
        Ok(())
    }
}
