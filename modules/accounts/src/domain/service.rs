use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::{AccountsConfig, HashingConfig};
use crate::contract::model::{
    AddForm, AdminNewUser, AdminUserPatch, AuthToken, Credentials, FormField, NewUser, Principal,
    ProfilePatch, User,
};
use crate::domain::error::DomainError;
use crate::domain::password::{verify_blocking, PasswordHasher};
use crate::domain::repo::{TokensRepository, UsersRepository};

/// Domain service with the account, token, profile and admin rules.
/// Depends only on the repository ports, not on infra types.
#[derive(Clone)]
pub struct Service {
    users: Arc<dyn UsersRepository>,
    tokens: Arc<dyn TokensRepository>,
    hasher: PasswordHasher,
    config: ServiceConfig,
}

/// Configuration for the domain service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub min_password_length: usize,
    pub max_name_length: usize,
    pub hashing: HashingConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        AccountsConfig::default().into()
    }
}

impl From<AccountsConfig> for ServiceConfig {
    fn from(cfg: AccountsConfig) -> Self {
        Self {
            min_password_length: cfg.min_password_length,
            max_name_length: cfg.max_name_length,
            hashing: cfg.hashing,
        }
    }
}

/// Flags applied when an account is created.
#[derive(Clone, Copy)]
struct AccountFlags {
    is_active: bool,
    is_staff: bool,
    is_superuser: bool,
}

impl Service {
    /// Create a service with dependencies.
    pub fn new(
        users: Arc<dyn UsersRepository>,
        tokens: Arc<dyn TokensRepository>,
        config: ServiceConfig,
    ) -> Result<Self, DomainError> {
        let hasher = PasswordHasher::new(&config.hashing)?;
        Ok(Self {
            users,
            tokens,
            hasher,
            config,
        })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    // --- accounts ---

    #[instrument(name = "accounts.service.create_user", skip_all)]
    pub async fn create_user(&self, new_user: NewUser) -> Result<User, DomainError> {
        info!("Creating new user");
        let flags = AccountFlags {
            is_active: true,
            is_staff: false,
            is_superuser: false,
        };
        self.create_account(new_user.email, new_user.password, new_user.name, flags)
            .await
    }

    #[instrument(name = "accounts.service.create_superuser", skip_all)]
    pub async fn create_superuser(&self, new_user: NewUser) -> Result<User, DomainError> {
        info!("Creating new superuser");
        let flags = AccountFlags {
            is_active: true,
            is_staff: true,
            is_superuser: true,
        };
        self.create_account(new_user.email, new_user.password, new_user.name, flags)
            .await
    }

    async fn create_account(
        &self,
        email: Option<String>,
        password: String,
        name: Option<String>,
        flags: AccountFlags,
    ) -> Result<User, DomainError> {
        let email = normalize_email(email.as_deref().unwrap_or_default());
        if email.is_empty() {
            return Err(DomainError::MissingEmail);
        }
        validate_email(&email)?;
        self.validate_password(&password)?;
        let name = name.unwrap_or_default();
        self.validate_name(&name)?;

        if self.email_taken(&email).await? {
            return Err(DomainError::email_already_exists(email));
        }

        let password_hash = self.hasher.hash_blocking(&password).await?;
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email,
            name,
            password_hash,
            is_active: flags.is_active,
            is_staff: flags.is_staff || flags.is_superuser,
            is_superuser: flags.is_superuser,
            created_at: now,
            updated_at: now,
        };

        self.persist(&user).await?;
        info!(user_id = %user.id, "Successfully created user");
        Ok(user)
    }

    /// Save a new or edited user. A write rejected because another account
    /// now owns the email (a lost race on the unique index) is reported as a
    /// duplicate rather than a storage failure.
    async fn persist(&self, user: &User) -> Result<(), DomainError> {
        let Err(e) = self.users.save(user.clone()).await else {
            return Ok(());
        };
        let owner = self
            .users
            .find_by_email(&user.email)
            .await
            .map_err(db_err)?;
        match owner {
            Some(owner) if owner.id != user.id => {
                debug!(user_id = %user.id, "Lost race for email");
                Err(DomainError::email_already_exists(user.email.clone()))
            }
            _ => Err(db_err(e)),
        }
    }

    // --- tokens ---

    #[instrument(name = "accounts.service.issue_token", skip_all)]
    pub async fn issue_token(&self, credentials: Credentials) -> Result<AuthToken, DomainError> {
        let email = normalize_email(&credentials.email);
        if email.is_empty() || credentials.password.is_empty() {
            return Err(DomainError::MissingCredentials);
        }

        let user = match self.users.find_by_email(&email).await.map_err(db_err)? {
            Some(user) => user,
            None => {
                // Keep timing comparable to the wrong-password path.
                let _ = self.hasher.hash_blocking(&credentials.password).await;
                debug!("Token requested for unknown email");
                return Err(DomainError::InvalidCredentials);
            }
        };

        let matches = verify_blocking(&credentials.password, &user.password_hash).await?;
        if !matches || !user.is_active {
            debug!(user_id = %user.id, "Token request rejected");
            return Err(DomainError::InvalidCredentials);
        }

        if let Some(existing) = self.tokens.find_by_user(user.id).await.map_err(db_err)? {
            return Ok(existing);
        }

        let token = AuthToken {
            key: generate_key(),
            user_id: user.id,
            created_at: Utc::now(),
        };
        if let Err(e) = self.tokens.insert(token.clone()).await {
            // A concurrent request may have created it first.
            return match self.tokens.find_by_user(user.id).await.map_err(db_err)? {
                Some(existing) => Ok(existing),
                None => Err(db_err(e)),
            };
        }

        info!(user_id = %user.id, "Issued new token");
        Ok(token)
    }

    #[instrument(name = "accounts.service.authenticate", skip_all)]
    pub async fn authenticate(&self, token_key: &str) -> Result<Principal, DomainError> {
        if token_key.is_empty() {
            return Err(DomainError::InvalidToken);
        }
        let token = self
            .tokens
            .find_by_key(token_key)
            .await
            .map_err(db_err)?
            .ok_or(DomainError::InvalidToken)?;
        let user = self
            .users
            .find_by_id(token.user_id)
            .await
            .map_err(db_err)?
            .ok_or(DomainError::InvalidToken)?;
        if !user.is_active {
            warn!(user_id = %user.id, "Token presented for inactive user");
            return Err(DomainError::InvalidToken);
        }
        Ok(Principal::from(&user))
    }

    // --- profile ---

    #[instrument(
        name = "accounts.service.get_profile",
        skip_all,
        fields(user_id = %principal.user_id)
    )]
    pub async fn get_profile(&self, principal: &Principal) -> Result<User, DomainError> {
        self.load(principal.user_id).await
    }

    #[instrument(
        name = "accounts.service.update_profile",
        skip_all,
        fields(user_id = %principal.user_id)
    )]
    pub async fn update_profile(
        &self,
        principal: &Principal,
        patch: ProfilePatch,
    ) -> Result<User, DomainError> {
        info!("Updating profile");
        let mut user = self.load(principal.user_id).await?;

        self.apply_common(&mut user, patch.email, patch.name, patch.password)
            .await?;
        user.updated_at = Utc::now();

        self.persist(&user).await?;
        Ok(user)
    }

    // --- admin ---

    #[instrument(name = "accounts.service.admin_list_users", skip_all)]
    pub async fn admin_list_users(&self, principal: &Principal) -> Result<Vec<User>, DomainError> {
        ensure_superuser(principal)?;
        let users = self.users.list().await.map_err(db_err)?;
        debug!("Listed {} users", users.len());
        Ok(users)
    }

    #[instrument(name = "accounts.service.admin_get_user", skip(self, principal))]
    pub async fn admin_get_user(&self, principal: &Principal, id: Uuid) -> Result<User, DomainError> {
        ensure_superuser(principal)?;
        self.load(id).await
    }

    pub fn admin_add_form(&self, principal: &Principal) -> Result<AddForm, DomainError> {
        ensure_superuser(principal)?;
        let field = |name, kind, required| FormField {
            name,
            kind,
            required,
        };
        Ok(AddForm {
            fields: vec![
                field("email", "email", true),
                field("password", "password", true),
                field("name", "text", false),
                field("is_active", "boolean", false),
                field("is_staff", "boolean", false),
                field("is_superuser", "boolean", false),
            ],
            min_password_length: self.config.min_password_length,
        })
    }

    #[instrument(name = "accounts.service.admin_create_user", skip_all)]
    pub async fn admin_create_user(
        &self,
        principal: &Principal,
        new_user: AdminNewUser,
    ) -> Result<User, DomainError> {
        ensure_superuser(principal)?;
        let flags = AccountFlags {
            is_active: new_user.is_active,
            is_staff: new_user.is_staff,
            is_superuser: new_user.is_superuser,
        };
        self.create_account(new_user.email, new_user.password, new_user.name, flags)
            .await
    }

    #[instrument(name = "accounts.service.admin_update_user", skip(self, principal, patch))]
    pub async fn admin_update_user(
        &self,
        principal: &Principal,
        id: Uuid,
        patch: AdminUserPatch,
    ) -> Result<User, DomainError> {
        ensure_superuser(principal)?;
        let mut user = self.load(id).await?;

        let is_superuser = patch.is_superuser.unwrap_or(user.is_superuser);
        let is_staff = match (is_superuser, patch.is_staff) {
            (true, Some(false)) => {
                return Err(DomainError::validation(
                    "is_staff",
                    "a superuser must also be staff",
                ))
            }
            (true, _) => true,
            (false, staff) => staff.unwrap_or(user.is_staff),
        };

        self.apply_common(&mut user, patch.email, patch.name, patch.password)
            .await?;
        if let Some(active) = patch.is_active {
            user.is_active = active;
        }
        user.is_superuser = is_superuser;
        user.is_staff = is_staff;
        user.updated_at = Utc::now();

        self.persist(&user).await?;
        info!("Administrative edit applied");
        Ok(user)
    }

    // --- helpers ---

    async fn load(&self, id: Uuid) -> Result<User, DomainError> {
        self.users
            .find_by_id(id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::user_not_found(id))
    }

    async fn email_taken(&self, email: &str) -> Result<bool, DomainError> {
        self.users.exists_by_email(email).await.map_err(db_err)
    }

    /// Validate and apply the fields shared by profile and admin edits.
    /// Nothing is written to `user` unless every field is valid.
    async fn apply_common(
        &self,
        user: &mut User,
        email: Option<String>,
        name: Option<String>,
        password: Option<String>,
    ) -> Result<(), DomainError> {
        let email = match email {
            Some(raw) => {
                let email = normalize_email(&raw);
                if email.is_empty() {
                    return Err(DomainError::MissingEmail);
                }
                validate_email(&email)?;
                if email != user.email && self.email_taken(&email).await? {
                    return Err(DomainError::email_already_exists(email));
                }
                Some(email)
            }
            None => None,
        };
        if let Some(name) = &name {
            self.validate_name(name)?;
        }
        let password_hash = match password {
            Some(password) => {
                self.validate_password(&password)?;
                Some(self.hasher.hash_blocking(&password).await?)
            }
            None => None,
        };

        if let Some(email) = email {
            user.email = email;
        }
        if let Some(name) = name {
            user.name = name;
        }
        if let Some(hash) = password_hash {
            user.password_hash = hash;
        }
        Ok(())
    }

    fn validate_password(&self, password: &str) -> Result<(), DomainError> {
        if password.chars().count() < self.config.min_password_length {
            return Err(DomainError::password_too_short(
                self.config.min_password_length,
            ));
        }
        Ok(())
    }

    fn validate_name(&self, name: &str) -> Result<(), DomainError> {
        let len = name.chars().count();
        if len > self.config.max_name_length {
            return Err(DomainError::name_too_long(len, self.config.max_name_length));
        }
        Ok(())
    }
}

/// Trim and lower-case; applied before storage and before every lookup.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn validate_email(email: &str) -> Result<(), DomainError> {
    let valid = match email.rsplit_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(DomainError::invalid_email(email));
    }
    Ok(())
}

fn ensure_superuser(principal: &Principal) -> Result<(), DomainError> {
    if !principal.is_superuser {
        return Err(DomainError::PermissionDenied);
    }
    Ok(())
}

/// 40 lowercase hex characters from 20 random bytes.
fn generate_key() -> String {
    hex::encode(rand::random::<[u8; 20]>())
}

/// Top-level context plus the root cause, each once. The driver error is
/// repeated at every level of the chain, so `{:#}` would print it several times.
fn db_err(e: anyhow::Error) -> DomainError {
    let top = e.to_string();
    let root = e.root_cause().to_string();
    if top == root {
        DomainError::database(top)
    } else {
        DomainError::database(format!("{top}: {root}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_trimmed_and_lowercased() {
        assert_eq!(normalize_email("  test@ELIASPOSEN.com "), "test@eliasposen.com");
        assert_eq!(normalize_email("   "), "");
    }

    #[test]
    fn email_shape_is_checked() {
        assert!(validate_email("a@b.co").is_ok());
        for bad in ["plain", "@b.co", "a@bco", "a@.co", "a@co.", "a b@c.co"] {
            assert!(
                matches!(validate_email(bad), Err(DomainError::InvalidEmail { .. })),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn generated_keys_are_40_hex_chars() {
        let a = generate_key();
        let b = generate_key();
        assert_eq!(a.len(), 40);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(a, b);
    }

    #[test]
    fn db_errors_keep_context_and_root_cause_once() {
        let inner = anyhow::anyhow!("UNIQUE constraint failed: users.email");
        let err = db_err(inner.context("wrapped").context("save failed"));
        let DomainError::Database { message } = err else {
            panic!("expected a database error");
        };
        assert_eq!(message, "save failed: UNIQUE constraint failed: users.email");

        let DomainError::Database { message } = db_err(anyhow::anyhow!("pool timed out")) else {
            panic!("expected a database error");
        };
        assert_eq!(message, "pool timed out");
    }

    #[test]
    fn only_superusers_pass_admin_gate() {
        let mut principal = Principal {
            user_id: Uuid::new_v4(),
            email: "staff@example.com".into(),
            is_staff: true,
            is_superuser: false,
        };
        assert!(matches!(
            ensure_superuser(&principal),
            Err(DomainError::PermissionDenied)
        ));
        principal.is_superuser = true;
        assert!(ensure_superuser(&principal).is_ok());
    }
}
