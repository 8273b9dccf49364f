//! Token authentication for REST handlers.

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use restkit::{ProblemResponse, RequestCtx};

use crate::api::rest::error::{map_domain_error, INTERNAL};
use crate::contract::model::Principal;
use crate::domain::error::DomainError;
use crate::domain::service::Service;

/// Authenticated caller. Extracting it rejects the request with 401 unless
/// `Authorization: Token <key>` (or `Bearer <key>`) names a live token.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Principal);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ProblemResponse;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ctx = match RequestCtx::from_request_parts(parts, state).await {
            Ok(ctx) => ctx,
            Err(never) => match never {},
        };

        let Some(svc) = parts.extensions.get::<Arc<Service>>().cloned() else {
            tracing::error!("accounts service missing from request extensions");
            return Err(ctx.problem(&INTERNAL, "An internal error occurred"));
        };

        let key = token_from_headers(&parts.headers).map_err(|e| map_domain_error(&e, &ctx))?;
        let principal = svc
            .authenticate(&key)
            .await
            .map_err(|e| map_domain_error(&e, &ctx))?;
        Ok(Self(principal))
    }
}

/// Pull the token key out of the `Authorization` header.
///
/// A missing header or foreign scheme means "no credentials"; a recognized
/// scheme with a missing or malformed key is an invalid token.
pub fn token_from_headers(headers: &HeaderMap) -> Result<String, DomainError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Err(DomainError::NotAuthenticated);
    };
    let value = value.to_str().map_err(|_| DomainError::InvalidToken)?;

    let mut parts = value.split_whitespace();
    let scheme = parts.next().unwrap_or_default();
    if !scheme.eq_ignore_ascii_case("token") && !scheme.eq_ignore_ascii_case("bearer") {
        return Err(DomainError::NotAuthenticated);
    }
    match (parts.next(), parts.next()) {
        (Some(key), None) => Ok(key.to_owned()),
        _ => Err(DomainError::InvalidToken),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &'static str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(header::AUTHORIZATION, HeaderValue::from_static(value));
        h
    }

    #[test]
    fn accepts_token_and_bearer_schemes() {
        assert_eq!(token_from_headers(&headers("Token abc")).unwrap(), "abc");
        assert_eq!(token_from_headers(&headers("token abc")).unwrap(), "abc");
        assert_eq!(token_from_headers(&headers("Bearer xyz")).unwrap(), "xyz");
    }

    #[test]
    fn missing_or_foreign_scheme_is_unauthenticated() {
        assert!(matches!(
            token_from_headers(&HeaderMap::new()),
            Err(DomainError::NotAuthenticated)
        ));
        assert!(matches!(
            token_from_headers(&headers("Basic dXNlcjpwYXNz")),
            Err(DomainError::NotAuthenticated)
        ));
    }

    #[test]
    fn malformed_key_is_invalid_token() {
        for value in ["Token", "Token a b"] {
            assert!(
                matches!(token_from_headers(&headers(value)), Err(DomainError::InvalidToken)),
                "{value}"
            );
        }
    }
}
