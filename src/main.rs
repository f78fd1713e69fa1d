use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use planespotter::actions::views::assemble_flights;
use planespotter::config::ServiceConfig;
use planespotter::db;
use planespotter::poller::run_poller;
use planespotter::web::{self, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "planespotter")]
#[command(about = "Live aircraft around Gunnison airport, with a log of private planes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    config: ServiceConfig,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web server
    Run {
        /// Interface to bind to
        #[arg(long, env = "INTERFACE", default_value = "0.0.0.0")]
        interface: String,

        /// Port to listen on
        #[arg(short, long, env = "PORT", default_value_t = 3000)]
        port: u16,

        /// Directory of static files served at / (index.html, script.js)
        #[arg(long, env = "STATIC_DIR", default_value = "public")]
        static_dir: PathBuf,

        /// Also run the pipeline in the background every N seconds
        #[arg(long, env = "POLL_INTERVAL_SECS")]
        poll_interval_secs: Option<u64>,
    },
    /// Run the pipeline once and print the classified aircraft as JSON
    Fetch,
    /// Apply pending database migrations and exit
    Migrate,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();
}

fn init_sentry() -> Option<sentry::ClientInitGuard> {
    let dsn = std::env::var("SENTRY_DSN")
        .ok()
        .filter(|d| !d.trim().is_empty())?;

    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: std::env::var("PLANESPOTTER_ENV").ok().map(Into::into),
            ..Default::default()
        },
    )))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let _sentry_guard = init_sentry();
    init_tracing();

    let cli = Cli::parse();
    let config = cli.config;

    match cli.command {
        Commands::Run {
            interface,
            port,
            static_dir,
            poll_interval_secs,
        } => {
            let metrics_handle = planespotter::metrics::init_metrics()?;
            planespotter::metrics::initialize_metrics();

            let store = db::connect_store(config.database_url.as_deref(), config.database_pool_size)
                .await;
            let feed = Arc::new(config.opensky_client()?);
            let pipeline = Arc::new(config.build_pipeline(feed, store));

            if let Some(secs) = poll_interval_secs.filter(|s| *s > 0) {
                tokio::spawn(run_poller(pipeline.clone(), Duration::from_secs(secs)));
            }

            let static_dir = if static_dir.is_dir() {
                Some(static_dir)
            } else {
                warn!(
                    "Static directory {} not found, / will not be served",
                    static_dir.display()
                );
                None
            };

            let state = AppState::new(pipeline).with_metrics(metrics_handle);
            web::start_web_server(interface, port, state, static_dir).await
        }
        Commands::Fetch => {
            let store = db::connect_store(config.database_url.as_deref(), config.database_pool_size)
                .await;
            let feed = Arc::new(config.opensky_client()?);
            let pipeline = config.build_pipeline(feed, store);

            let run = pipeline.run().await.context("Failed to fetch planes")?;
            info!(
                "{} aircraft, {} newly logged, {} failed to log",
                run.flights.len(),
                run.report.inserted,
                run.report.failed
            );
            println!(
                "{}",
                serde_json::to_string_pretty(&assemble_flights(&run.flights))?
            );
            Ok(())
        }
        Commands::Migrate => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set to run migrations")?;
            let pool = db::create_pool(url, 1)?;
            db::run_migrations(&pool).await
        }
    }
}
