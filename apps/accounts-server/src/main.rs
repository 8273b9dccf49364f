use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use runtime::{AppConfig, CliArgs, DatabaseConfig};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

use accounts::config::AccountsConfig;
use accounts::contract::model::NewUser;
use accounts::Accounts;
use api_ingress::{ApiIngress, ApiIngressConfig};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const MEMORY_DSN: &str = "sqlite::memory:";

/// Expand a sqlite DSN into an absolute-path DSN using a base directory.
/// - Keeps "sqlite::memory:" as-is.
/// - Normalizes backslashes into forward slashes (important on Windows).
/// - Adds `mode=rwc` so a fresh database file is created on first start.
fn absolutize_sqlite_dsn(dsn: &str, base_dir: &Path, create_dirs: bool) -> Result<String> {
    if dsn.eq_ignore_ascii_case(MEMORY_DSN) || dsn.eq_ignore_ascii_case("sqlite://:memory:") {
        return Ok(MEMORY_DSN.to_string());
    }
    let db_path = dsn
        .strip_prefix("sqlite://")
        .ok_or_else(|| anyhow!("DSN must start with sqlite:// (got: {})", dsn))?;

    let (path_str, query) = match db_path.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (db_path, None),
    };

    let mut p = PathBuf::from(path_str);
    if p.as_os_str().is_empty() {
        return Err(anyhow!("Empty SQLite path in DSN"));
    }
    if p.is_relative() {
        p = base_dir.join(p);
    }

    if let Some(dir) = p.parent() {
        if create_dirs {
            std::fs::create_dir_all(dir)?;
        }
    }

    // Rebuild DSN with absolute path and normalized slashes
    let mut out = String::from("sqlite://");
    out.push_str(&p.to_string_lossy().replace('\\', "/"));
    match query {
        Some(q) if q.split('&').any(|kv| kv.starts_with("mode=")) => {
            out.push('?');
            out.push_str(q);
        }
        Some(q) => {
            out.push('?');
            out.push_str(q);
            out.push_str("&mode=rwc");
        }
        None => out.push_str("?mode=rwc"),
    }
    Ok(out)
}

/// Accounts Server - user accounts, token auth and administration
#[derive(Parser)]
#[command(name = "accounts-server")]
#[command(about = "Accounts Server - user accounts, token auth and administration")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use an in-memory database
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
    /// Create an administrator account (staff + superuser)
    CreateSuperuser {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        name: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // CLI args passed down to config/app
    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
        mock: cli.mock,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;

    // Apply CLI overrides (port / verbosity)
    config.apply_cli_overrides(&args);

    // Print config and exit if requested
    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    // Initialize logging
    let logging_config = config.logging.as_ref().cloned().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!("Accounts Server starting");

    // Execute command
    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config, args).await,
        Commands::Check => check_config(config).await,
        Commands::CreateSuperuser {
            email,
            password,
            name,
        } => create_superuser(config, args, email, password, name).await,
    }
}

/// Detect DB backend from URL scheme (sqlite/postgres).
fn detect_from_dsn(cfg: &DatabaseConfig) -> Result<&'static str> {
    let raw = cfg.url.trim().to_owned();
    if raw.is_empty() {
        return Err(anyhow!("Database URL not configured"));
    }
    if raw.eq_ignore_ascii_case(MEMORY_DSN) {
        return Ok("sqlite");
    }

    let url = Url::parse(&raw).map_err(|e| anyhow!("Invalid database DSN '{}': {}", raw, e))?;

    match url.scheme() {
        "sqlite" | "sqlite3" => Ok("sqlite"),
        "postgres" | "postgresql" => Ok("postgres"),
        other => Err(anyhow!("Unsupported database type: {}", other)),
    }
}

/// Open the database named by the config, or an in-memory SQLite with `--mock`.
async fn connect_db(config: &AppConfig, args: &CliArgs) -> Result<DatabaseConnection> {
    let db_config = match (&config.database, args.mock) {
        (_, true) => DatabaseConfig {
            url: MEMORY_DSN.to_string(),
            max_conns: Some(1),
            busy_timeout_ms: None,
        },
        (Some(db), false) => db.clone(),
        (None, false) => {
            tracing::warn!("No database configuration found, using the default SQLite file");
            AppConfig::default()
                .database
                .ok_or_else(|| anyhow!("Database URL not configured"))?
        }
    };

    let backend = detect_from_dsn(&db_config)?;

    // Base dir for resolving relative sqlite paths (already absolute & created)
    let base_dir = PathBuf::from(&config.server.home_dir);
    let mut dsn = db_config.url.trim().to_owned();
    if dsn.starts_with("sqlite://") {
        dsn = absolutize_sqlite_dsn(&dsn, &base_dir, true)?;
    }

    let mut opts = ConnectOptions::new(dsn.clone());
    opts.max_connections(db_config.max_conns.unwrap_or(10))
        .acquire_timeout(Duration::from_secs(5))
        .sqlx_logging(false);
    if dsn == MEMORY_DSN {
        // Every pooled connection would otherwise get its own empty database.
        opts.max_connections(1).min_connections(1);
    }
    if let Some(ms) = db_config.busy_timeout_ms {
        opts.map_sqlx_sqlite_opts(move |o| o.busy_timeout(Duration::from_millis(ms as u64)));
    }

    tracing::info!("Connecting to {} database", backend);
    let db = Database::connect(opts)
        .await
        .with_context(|| format!("Failed to connect to {backend} database"))?;
    tracing::info!("Connected DB backend: {}", backend);
    Ok(db)
}

/// `modules.api_ingress` with the server section folded in: `server.host`/`port`
/// decide the bind address unless `bind_addr` is set explicitly; `--port` always wins.
fn ingress_config(config: &AppConfig, args: &CliArgs) -> Result<ApiIngressConfig> {
    let mut cfg: ApiIngressConfig = config.module_config("api_ingress")?;
    let explicit_bind = config
        .modules
        .get("api_ingress")
        .and_then(|v| v.get("bind_addr"))
        .is_some();
    if !explicit_bind || args.port.is_some() {
        cfg.bind_addr = format!("{}:{}", config.server.host, config.server.port);
    }
    if config.server.timeout_sec > 0 {
        cfg.request_timeout_sec = config.server.timeout_sec;
    }
    Ok(cfg)
}

async fn init_accounts(config: &AppConfig, args: &CliArgs) -> Result<Accounts> {
    let db = connect_db(config, args).await?;
    let accounts_cfg: AccountsConfig = config.module_config("accounts")?;
    Accounts::init(db, accounts_cfg).await
}

async fn run_server(config: AppConfig, args: CliArgs) -> Result<()> {
    tracing::info!("Initializing modules...");

    let accounts = init_accounts(&config, &args).await?;

    let ingress = ApiIngress::new(ingress_config(&config, &args)?).with_openapi(Accounts::openapi());
    let router = ingress.build_router(accounts.register_rest(axum::Router::new()));

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = runtime::shutdown::wait_for_shutdown().await {
            tracing::error!("Signal handling failed: {e:#}");
        }
        trigger.cancel();
    });

    ingress.serve(router, cancel).await?;
    tracing::info!("Accounts Server stopped");
    Ok(())
}

async fn check_config(config: AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");

    // Typed module sections must deserialize too.
    let _: AccountsConfig = config.module_config("accounts")?;
    let ingress: ApiIngressConfig = config.module_config("api_ingress")?;
    if let Some(db) = &config.database {
        detect_from_dsn(db)?;
    }
    ApiIngress::new(ingress).bind_addr()?;

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("Server config:");
    println!("{}", config.to_yaml()?);

    Ok(())
}

async fn create_superuser(
    config: AppConfig,
    args: CliArgs,
    email: String,
    password: String,
    name: Option<String>,
) -> Result<()> {
    let accounts = init_accounts(&config, &args).await?;
    let user = accounts
        .client()
        .create_superuser(NewUser {
            email: Some(email),
            password,
            name,
        })
        .await
        .context("Failed to create superuser")?;

    tracing::info!(user_id = %user.id, "Superuser created");
    println!("Superuser created: {}", user.email);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_dsn_is_made_absolute_and_creatable() {
        let tmp = tempfile::tempdir().unwrap();
        let dsn = absolutize_sqlite_dsn("sqlite://database/accounts.db", tmp.path(), true).unwrap();

        assert!(dsn.starts_with("sqlite://"));
        assert!(dsn.ends_with("database/accounts.db?mode=rwc"));
        assert!(tmp.path().join("database").is_dir());
    }

    #[test]
    fn sqlite_dsn_keeps_explicit_mode_and_memory() {
        let base = Path::new("/srv");
        assert_eq!(
            absolutize_sqlite_dsn("sqlite://a.db?mode=ro", base, false).unwrap(),
            "sqlite:///srv/a.db?mode=ro"
        );
        assert_eq!(
            absolutize_sqlite_dsn("sqlite://a.db?cache=shared", base, false).unwrap(),
            "sqlite:///srv/a.db?cache=shared&mode=rwc"
        );
        assert_eq!(
            absolutize_sqlite_dsn("sqlite://:memory:", base, false).unwrap(),
            MEMORY_DSN
        );
        assert!(absolutize_sqlite_dsn("postgres://x", base, false).is_err());
    }

    #[test]
    fn backend_is_detected_from_scheme() {
        let cfg = |url: &str| DatabaseConfig {
            url: url.into(),
            max_conns: None,
            busy_timeout_ms: None,
        };
        assert_eq!(detect_from_dsn(&cfg("sqlite://a.db")).unwrap(), "sqlite");
        assert_eq!(detect_from_dsn(&cfg("postgres://u:p@h/db")).unwrap(), "postgres");
        assert!(detect_from_dsn(&cfg("mysql://h/db")).is_err());
        assert!(detect_from_dsn(&cfg("")).is_err());
    }

    #[test]
    fn ingress_bind_follows_server_section_and_port_flag() {
        let mut config = AppConfig::default();
        config.server.host = "0.0.0.0".into();
        config.server.port = 9000;

        let cfg = ingress_config(&config, &CliArgs::default()).unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:9000");

        config.modules.insert(
            "api_ingress".into(),
            serde_json::json!({ "bind_addr": "127.0.0.1:7000" }),
        );
        let cfg = ingress_config(&config, &CliArgs::default()).unwrap();
        assert_eq!(cfg.bind_addr, "127.0.0.1:7000");

        let args = CliArgs {
            port: Some(9000),
            ..Default::default()
        };
        let cfg = ingress_config(&config, &args).unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:9000");
    }
}
