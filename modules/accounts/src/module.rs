use std::sync::Arc;

use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info};

use crate::api::rest::routes;
use crate::config::AccountsConfig;
use crate::contract::client::AccountsApi;
use crate::domain::service::Service;
use crate::gateways::local::AccountsLocalClient;
use crate::infra::storage::migrations::Migrator;
use crate::infra::storage::sea_orm_repo::{SeaOrmTokensRepository, SeaOrmUsersRepository};

/// Accounts module: owns the domain service wired to SeaORM storage and
/// exposes it over REST and as an in-process client.
#[derive(Clone)]
pub struct Accounts {
    service: Arc<Service>,
}

impl Accounts {
    /// Run migrations and wire repositories into the domain service.
    pub async fn init(db: DatabaseConnection, cfg: AccountsConfig) -> anyhow::Result<Self> {
        info!("Initializing accounts module");
        debug!(
            "Loaded accounts config: min_password_length={}, max_name_length={}",
            cfg.min_password_length, cfg.max_name_length
        );

        Self::migrate(&db).await?;

        let users = Arc::new(SeaOrmUsersRepository::new(db.clone()));
        let tokens = Arc::new(SeaOrmTokensRepository::new(db));
        let service = Service::new(users, tokens, cfg.into())?;

        Ok(Self {
            service: Arc::new(service),
        })
    }

    pub async fn migrate(db: &DatabaseConnection) -> anyhow::Result<()> {
        info!("Running accounts database migrations");
        Migrator::up(db, None).await?;
        info!("Accounts database migrations completed successfully");
        Ok(())
    }

    pub fn service(&self) -> Arc<Service> {
        self.service.clone()
    }

    /// Local in-process client for other modules and the CLI.
    pub fn client(&self) -> Arc<dyn AccountsApi> {
        Arc::new(AccountsLocalClient::new(self.service.clone()))
    }

    pub fn register_rest(&self, router: axum::Router) -> axum::Router {
        info!("Registering accounts REST routes");
        routes::register_routes(router, self.service.clone())
    }

    pub fn openapi() -> utoipa::openapi::OpenApi {
        use utoipa::OpenApi;
        routes::ApiDoc::openapi()
    }
}
