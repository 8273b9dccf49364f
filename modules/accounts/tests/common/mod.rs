#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde_json::Value;

use accounts::config::{AccountsConfig, HashingConfig};
use accounts::contract::model::{NewUser, Principal, User};
use accounts::domain::service::Service;
use accounts::Accounts;
use api_ingress::{ApiIngress, ApiIngressConfig};

/// Fresh in-memory SQLite database. A single pooled connection keeps every
/// query on the same in-memory file.
pub async fn create_test_db() -> DatabaseConnection {
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1).min_connections(1).sqlx_logging(false);
    Database::connect(opts)
        .await
        .expect("Failed to connect to test database")
}

/// Default policy with Argon2 costs turned down for test speed.
pub fn test_config() -> AccountsConfig {
    AccountsConfig {
        hashing: HashingConfig {
            memory_kib: 256,
            iterations: 1,
            parallelism: 1,
        },
        ..Default::default()
    }
}

pub async fn create_test_module() -> Accounts {
    Accounts::init(create_test_db().await, test_config())
        .await
        .expect("Failed to init accounts module")
}

pub async fn create_test_service() -> Arc<Service> {
    create_test_module().await.service()
}

/// Full router as served: module routes wrapped by the ingress stack.
pub fn create_test_router(module: &Accounts) -> Router {
    let ingress = ApiIngress::new(ApiIngressConfig {
        enable_docs: true,
        ..Default::default()
    })
    .with_openapi(Accounts::openapi());
    ingress.build_router(module.register_rest(Router::new()))
}

pub fn new_user(email: &str, password: &str, name: Option<&str>) -> NewUser {
    NewUser {
        email: Some(email.to_string()),
        password: password.to_string(),
        name: name.map(str::to_string),
    }
}

pub async fn superuser(svc: &Service) -> (User, Principal) {
    let user = svc
        .create_superuser(new_user("admin@example.com", "adminpass", Some("Admin")))
        .await
        .expect("create superuser");
    let principal = Principal::from(&user);
    (user, principal)
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Token {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Token {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
