use thiserror::Error;
use uuid::Uuid;

/// Errors that are safe to expose to other modules
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccountsError {
    #[error("User not found: {id}")]
    NotFound { id: Uuid },

    #[error("User with email '{email}' already exists")]
    Conflict { email: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Unable to log in with provided credentials")]
    InvalidCredentials,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Permission denied")]
    Forbidden,

    #[error("Internal error")]
    Internal,
}

impl AccountsError {
    pub fn not_found(id: Uuid) -> Self {
        Self::NotFound { id }
    }

    pub fn conflict(email: String) -> Self {
        Self::Conflict { email }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

impl From<crate::domain::error::DomainError> for AccountsError {
    fn from(domain_error: crate::domain::error::DomainError) -> Self {
        use crate::domain::error::DomainError::*;
        match domain_error {
            UserNotFound { id } => Self::not_found(id),
            EmailAlreadyExists { email } => Self::conflict(email),
            e @ (MissingEmail
            | InvalidEmail { .. }
            | PasswordTooShort { .. }
            | NameTooLong { .. }
            | Validation { .. }
            | MissingCredentials) => Self::validation(e.to_string()),
            InvalidCredentials => Self::InvalidCredentials,
            NotAuthenticated | InvalidToken => Self::Unauthenticated,
            PermissionDenied => Self::Forbidden,
            Hashing { .. } | Database { .. } => Self::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::DomainError;

    #[test]
    fn internal_details_are_not_exposed() {
        let err: AccountsError = DomainError::database("connection reset").into();
        assert_eq!(err, AccountsError::Internal);
        assert!(!err.to_string().contains("connection"));
    }

    #[test]
    fn validation_keeps_domain_message() {
        let err: AccountsError = DomainError::password_too_short(6).into();
        match err {
            AccountsError::Validation { message } => assert!(message.contains('6')),
            other => panic!("unexpected {other:?}"),
        }
    }
}
