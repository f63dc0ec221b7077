mod config;
mod logging;

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::{Args, Parser, Subcommand, ValueEnum};
use thiserror::Error;
use tokio::net::TcpListener;

use staffmetrics_api::{ApiState, JwtError, JwtService, build_app};
use staffmetrics_generate::{CollisionPolicy, GenerateOptions, GenerationEngine, GenerationError};
use staffmetrics_report::{ReportError, export_employees_csv};
use staffmetrics_store::{MemoryStore, PostgresStore, RecordStore, StoreError};

use config::{AppConfig, ConfigError};
use logging::init_logging;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("logging setup failed: {0}")]
    Logging(String),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),
    #[error("export failed: {0}")]
    Report(#[from] ReportError),
    #[error("token error: {0}")]
    Jwt(#[from] JwtError),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "staffmetrics", version, about = "Employee records, reports and synthetic data")]
struct Cli {
    /// TOML config file (defaults to ./staffmetrics.toml when present).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Database connection string; overrides the config file and DATABASE_URL.
    #[arg(long, global = true, value_name = "URL")]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fill the database with synthetic employees, attendance and reviews.
    Generate(GenerateArgs),
    /// Run the HTTP API.
    Serve(ServeArgs),
    /// Apply pending schema migrations.
    Migrate,
    /// Write every employee as CSV.
    Export(ExportArgs),
    /// Mint an API token.
    Token(TokenArgs),
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Employees to create.
    #[arg(long, default_value_t = 10)]
    employees: u32,
    /// Attendance records per employee.
    #[arg(long, default_value_t = 30)]
    attendance_per_employee: u32,
    /// Performance reviews per employee.
    #[arg(long, default_value_t = 2)]
    reviews_per_employee: u32,
    /// Delete all existing records first.
    #[arg(long, default_value_t = false)]
    clean: bool,
    /// RNG seed; random when omitted.
    #[arg(long)]
    seed: Option<u64>,
    /// Employees inserted per batch.
    #[arg(long, default_value_t = 100)]
    batch_size: u32,
    /// What to do when a drawn key is already taken.
    #[arg(long, value_enum, default_value_t = OnCollision::Redraw)]
    on_collision: OnCollision,
    /// Draws allowed per record before giving up.
    #[arg(long, default_value_t = 50)]
    max_attempts: u32,
    /// Generate into memory and only print the report.
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OnCollision {
    Redraw,
    Abort,
}

impl From<OnCollision> for CollisionPolicy {
    fn from(value: OnCollision) -> Self {
        match value {
            OnCollision::Redraw => CollisionPolicy::Redraw,
            OnCollision::Abort => CollisionPolicy::Abort,
        }
    }
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Listen address; overrides the config file and STAFFMETRICS_BIND.
    #[arg(long, value_name = "ADDR")]
    bind: Option<String>,
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// Output file; stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct TokenArgs {
    /// Subject the token is issued to.
    #[arg(long)]
    subject: String,
    /// Lifetime in minutes; the configured TTL when omitted.
    #[arg(long)]
    ttl_minutes: Option<i64>,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(url) = cli.database_url {
        config.database.url = Some(url);
    }
    init_logging(&config.logging)?;

    match cli.command {
        Command::Generate(args) => run_generate(&config, args).await,
        Command::Serve(args) => run_serve(config, args).await,
        Command::Migrate => run_migrate(&config).await,
        Command::Export(args) => run_export(&config, args).await,
        Command::Token(args) => run_token(&config, args),
    }
}

/// Connect to Postgres and bring the schema up to date.
async fn open_store(config: &AppConfig) -> Result<PostgresStore, CliError> {
    let url = config.database.url.as_deref().ok_or_else(|| {
        CliError::InvalidConfig(
            "database url is required (--database-url, DATABASE_URL or [database].url)"
                .to_string(),
        )
    })?;
    if !(url.starts_with("postgres://") || url.starts_with("postgresql://")) {
        return Err(CliError::InvalidConfig(
            "only postgres:// connection strings are supported".to_string(),
        ));
    }

    let pool = staffmetrics_store::connect(
        url,
        config.database.max_connections,
        config.database.acquire_timeout(),
    )
    .await?;
    tracing::info!(event = "database_connected", max_connections = config.database.max_connections);

    staffmetrics_store::migrate(&pool).await?;
    tracing::info!(event = "migrations_applied");
    Ok(PostgresStore::new(pool))
}

async fn run_generate(config: &AppConfig, args: GenerateArgs) -> Result<(), CliError> {
    let options = GenerateOptions {
        employee_count: args.employees,
        attendance_per_employee: args.attendance_per_employee,
        reviews_per_employee: args.reviews_per_employee,
        clean: args.clean,
        seed: args.seed,
        batch_size: args.batch_size,
        on_collision: args.on_collision.into(),
        max_attempts_per_record: args.max_attempts,
        today: None,
    };

    let store: Arc<dyn RecordStore> = if args.dry_run {
        tracing::info!(event = "dry_run", "generating into memory");
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(open_store(config).await?)
    };

    let report = GenerationEngine::new(store, options).run().await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn run_serve(config: AppConfig, args: ServeArgs) -> Result<(), CliError> {
    let jwt = JwtService::with_config(config.auth.jwt_config())?;
    let store = open_store(&config).await?;
    let bind = args.bind.unwrap_or_else(|| config.server.bind.clone());

    let state = ApiState::new(Arc::new(store), jwt, config.server.api_settings());
    let listener = TcpListener::bind(&bind).await?;
    staffmetrics_api::serve(listener, build_app(state)).await?;
    Ok(())
}

async fn run_migrate(config: &AppConfig) -> Result<(), CliError> {
    open_store(config).await?;
    Ok(())
}

async fn run_export(config: &AppConfig, args: ExportArgs) -> Result<(), CliError> {
    let store = open_store(config).await?;
    let chunk_size = config.server.export_chunk_size;
    let timer = Instant::now();

    let summary = match &args.out {
        Some(path) => {
            let file = BufWriter::new(File::create(path)?);
            export_employees_csv(&store, file, chunk_size).await?
        }
        None => export_employees_csv(&store, BufWriter::new(io::stdout()), chunk_size).await?,
    };

    tracing::info!(
        event = "export_finished",
        rows = summary.rows,
        bytes = summary.bytes,
        duration_ms = timer.elapsed().as_millis() as u64,
    );
    Ok(())
}

fn run_token(config: &AppConfig, args: TokenArgs) -> Result<(), CliError> {
    let jwt = JwtService::with_config(config.auth.jwt_config())?;
    let token = jwt.issue(&args.subject, args.ttl_minutes)?;
    tracing::info!(event = "token_issued", subject = %args.subject);
    println!("{token}");
    Ok(())
}
