use thiserror::Error;
use uuid::Uuid;

/// Domain-specific errors using thiserror
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Users must have an email address")]
    MissingEmail,

    #[error("Invalid email format: '{email}'")]
    InvalidEmail { email: String },

    #[error("User with email '{email}' already exists")]
    EmailAlreadyExists { email: String },

    #[error("Password must be at least {min} characters")]
    PasswordTooShort { min: usize },

    #[error("Name too long: {len} characters (max: {max})")]
    NameTooLong { len: usize, max: usize },

    #[error("Validation failed: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Must include email and password")]
    MissingCredentials,

    #[error("Unable to log in with provided credentials")]
    InvalidCredentials,

    #[error("Authentication credentials were not provided")]
    NotAuthenticated,

    #[error("Invalid token")]
    InvalidToken,

    #[error("You do not have permission to perform this action")]
    PermissionDenied,

    #[error("User not found: {id}")]
    UserNotFound { id: Uuid },

    #[error("Password hashing error: {message}")]
    Hashing { message: String },

    #[error("Database error: {message}")]
    Database { message: String },
}

impl DomainError {
    pub fn invalid_email(email: impl Into<String>) -> Self {
        Self::InvalidEmail {
            email: email.into(),
        }
    }

    pub fn email_already_exists(email: impl Into<String>) -> Self {
        Self::EmailAlreadyExists {
            email: email.into(),
        }
    }

    pub fn password_too_short(min: usize) -> Self {
        Self::PasswordTooShort { min }
    }

    pub fn name_too_long(len: usize, max: usize) -> Self {
        Self::NameTooLong { len, max }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn user_not_found(id: Uuid) -> Self {
        Self::UserNotFound { id }
    }

    pub fn hashing(message: impl Into<String>) -> Self {
        Self::Hashing {
            message: message.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }
}
