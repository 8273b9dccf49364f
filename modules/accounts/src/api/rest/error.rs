//! Error catalog for the accounts REST surface and the domain -> Problem mapping.

use axum::http::{header, StatusCode};
use restkit::{ErrDef, ProblemResponse, RequestCtx};

use crate::domain::error::DomainError;

macro_rules! err_def {
    ($name:ident, $status:ident, $title:literal, $code:literal) => {
        pub const $name: ErrDef = ErrDef {
            status: StatusCode::$status,
            title: $title,
            code: $code,
            type_url: concat!("https://errors.example.com/", $code),
        };
    };
}

err_def!(EMAIL_REQUIRED, BAD_REQUEST, "Email required", "ACCOUNTS_EMAIL_REQUIRED");
err_def!(INVALID_EMAIL, BAD_REQUEST, "Invalid email", "ACCOUNTS_INVALID_EMAIL");
err_def!(EMAIL_TAKEN, BAD_REQUEST, "Email already registered", "ACCOUNTS_EMAIL_TAKEN");
err_def!(PASSWORD_TOO_SHORT, BAD_REQUEST, "Password too short", "ACCOUNTS_PASSWORD_TOO_SHORT");
err_def!(VALIDATION, BAD_REQUEST, "Validation error", "ACCOUNTS_VALIDATION");
err_def!(CREDENTIALS_REQUIRED, BAD_REQUEST, "Credentials required", "ACCOUNTS_CREDENTIALS_REQUIRED");
err_def!(INVALID_CREDENTIALS, BAD_REQUEST, "Invalid credentials", "ACCOUNTS_INVALID_CREDENTIALS");
err_def!(NOT_AUTHENTICATED, UNAUTHORIZED, "Not authenticated", "ACCOUNTS_NOT_AUTHENTICATED");
err_def!(INVALID_TOKEN, UNAUTHORIZED, "Invalid token", "ACCOUNTS_INVALID_TOKEN");
err_def!(PERMISSION_DENIED, FORBIDDEN, "Permission denied", "ACCOUNTS_PERMISSION_DENIED");
err_def!(USER_NOT_FOUND, NOT_FOUND, "User not found", "ACCOUNTS_USER_NOT_FOUND");
err_def!(METHOD_NOT_ALLOWED, METHOD_NOT_ALLOWED, "Method not allowed", "ACCOUNTS_METHOD_NOT_ALLOWED");
err_def!(MALFORMED_BODY, BAD_REQUEST, "Malformed request body", "ACCOUNTS_MALFORMED_BODY");
err_def!(UNSUPPORTED_MEDIA_TYPE, UNSUPPORTED_MEDIA_TYPE, "Unsupported media type", "ACCOUNTS_UNSUPPORTED_MEDIA_TYPE");
err_def!(BODY_TOO_LARGE, PAYLOAD_TOO_LARGE, "Request body too large", "ACCOUNTS_BODY_TOO_LARGE");
err_def!(INTERNAL, INTERNAL_SERVER_ERROR, "Internal error", "ACCOUNTS_INTERNAL");

/// Map domain error to RFC9457 ProblemResponse
pub fn map_domain_error(e: &DomainError, ctx: &RequestCtx) -> ProblemResponse {
    use DomainError::*;
    match e {
        MissingEmail => ctx
            .problem(&EMAIL_REQUIRED, e.to_string())
            .with_violation("/email", "This field is required."),
        InvalidEmail { .. } => ctx
            .problem(&INVALID_EMAIL, e.to_string())
            .with_violation("/email", "Enter a valid email address."),
        EmailAlreadyExists { .. } => ctx
            .problem(&EMAIL_TAKEN, e.to_string())
            .with_violation("/email", "A user with that email already exists."),
        PasswordTooShort { .. } => ctx
            .problem(&PASSWORD_TOO_SHORT, e.to_string())
            .with_violation("/password", e.to_string()),
        NameTooLong { .. } => ctx
            .problem(&VALIDATION, e.to_string())
            .with_violation("/name", e.to_string()),
        Validation { field, message } => ctx
            .problem(&VALIDATION, e.to_string())
            .with_violation(format!("/{field}"), message.clone()),
        MissingCredentials => ctx.problem(&CREDENTIALS_REQUIRED, e.to_string()),
        InvalidCredentials => ctx.problem(&INVALID_CREDENTIALS, e.to_string()),
        NotAuthenticated => ctx
            .problem(&NOT_AUTHENTICATED, e.to_string())
            .with_header(header::WWW_AUTHENTICATE, "Token"),
        InvalidToken => ctx
            .problem(&INVALID_TOKEN, e.to_string())
            .with_header(header::WWW_AUTHENTICATE, "Token"),
        PermissionDenied => ctx.problem(&PERMISSION_DENIED, e.to_string()),
        UserNotFound { .. } => ctx.problem(&USER_NOT_FOUND, e.to_string()),
        Hashing { .. } | Database { .. } => {
            // Log the internal error details but don't expose them to the client
            tracing::error!(error = %e, "Internal accounts error");
            ctx.problem(&INTERNAL, "An internal error occurred")
        }
    }
}
