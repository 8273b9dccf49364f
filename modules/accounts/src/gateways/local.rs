use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::contract::{
    client::AccountsApi,
    error::AccountsError,
    model::{
        AdminNewUser, AdminUserPatch, AuthToken, Credentials, NewUser, Principal, ProfilePatch,
        User,
    },
};
use crate::domain::service::Service;

/// Local implementation of the AccountsApi trait that delegates to the domain service
pub struct AccountsLocalClient {
    service: Arc<Service>,
}

impl AccountsLocalClient {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl AccountsApi for AccountsLocalClient {
    async fn create_user(&self, new_user: NewUser) -> Result<User, AccountsError> {
        self.service.create_user(new_user).await.map_err(Into::into)
    }

    async fn create_superuser(&self, new_user: NewUser) -> Result<User, AccountsError> {
        self.service
            .create_superuser(new_user)
            .await
            .map_err(Into::into)
    }

    async fn issue_token(&self, credentials: Credentials) -> Result<AuthToken, AccountsError> {
        self.service
            .issue_token(credentials)
            .await
            .map_err(Into::into)
    }

    async fn authenticate(&self, token_key: &str) -> Result<Principal, AccountsError> {
        self.service
            .authenticate(token_key)
            .await
            .map_err(Into::into)
    }

    async fn get_profile(&self, principal: &Principal) -> Result<User, AccountsError> {
        self.service.get_profile(principal).await.map_err(Into::into)
    }

    async fn update_profile(
        &self,
        principal: &Principal,
        patch: ProfilePatch,
    ) -> Result<User, AccountsError> {
        self.service
            .update_profile(principal, patch)
            .await
            .map_err(Into::into)
    }

    async fn admin_list_users(&self, principal: &Principal) -> Result<Vec<User>, AccountsError> {
        self.service
            .admin_list_users(principal)
            .await
            .map_err(Into::into)
    }

    async fn admin_get_user(&self, principal: &Principal, id: Uuid) -> Result<User, AccountsError> {
        self.service
            .admin_get_user(principal, id)
            .await
            .map_err(Into::into)
    }

    async fn admin_create_user(
        &self,
        principal: &Principal,
        new_user: AdminNewUser,
    ) -> Result<User, AccountsError> {
        self.service
            .admin_create_user(principal, new_user)
            .await
            .map_err(Into::into)
    }

    async fn admin_update_user(
        &self,
        principal: &Principal,
        id: Uuid,
        patch: AdminUserPatch,
    ) -> Result<User, AccountsError> {
        self.service
            .admin_update_user(principal, id, patch)
            .await
            .map_err(Into::into)
    }
}
