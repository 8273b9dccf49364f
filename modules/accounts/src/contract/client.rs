use async_trait::async_trait;
use uuid::Uuid;

use crate::contract::{
    error::AccountsError,
    model::{
        AdminNewUser, AdminUserPatch, AuthToken, Credentials, NewUser, Principal, ProfilePatch,
        User,
    },
};

/// Public API trait for the accounts module that other modules can use
#[async_trait]
pub trait AccountsApi: Send + Sync {
    /// Create a regular account
    async fn create_user(&self, new_user: NewUser) -> Result<User, AccountsError>;

    /// Create a staff + superuser account
    async fn create_superuser(&self, new_user: NewUser) -> Result<User, AccountsError>;

    /// Exchange credentials for the user's token (created on first use)
    async fn issue_token(&self, credentials: Credentials) -> Result<AuthToken, AccountsError>;

    /// Resolve a token key to the calling principal
    async fn authenticate(&self, token_key: &str) -> Result<Principal, AccountsError>;

    async fn get_profile(&self, principal: &Principal) -> Result<User, AccountsError>;

    async fn update_profile(
        &self,
        principal: &Principal,
        patch: ProfilePatch,
    ) -> Result<User, AccountsError>;

    async fn admin_list_users(&self, principal: &Principal) -> Result<Vec<User>, AccountsError>;

    async fn admin_get_user(&self, principal: &Principal, id: Uuid) -> Result<User, AccountsError>;

    async fn admin_create_user(
        &self,
        principal: &Principal,
        new_user: AdminNewUser,
    ) -> Result<User, AccountsError>;

    async fn admin_update_user(
        &self,
        principal: &Principal,
        id: Uuid,
        patch: AdminUserPatch,
    ) -> Result<User, AccountsError>;
}
