use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use civicone::commands;
use civicone::config::{Config, ServeArgs};
use civicone::db::Database;
use civicone::server;

#[derive(Parser)]
#[command(name = "civicone")]
#[command(about = "REST backend for citizen-reported civic issues")]
#[command(version)]
struct Cli {
    /// SQLite database file
    #[arg(long, global = true, env = "CIVICONE_DB", default_value = "civicone.db")]
    db: PathBuf,

    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "CIVICONE_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve(ServeArgs),

    /// Create the database, upload directory and default dashboard
    Init {
        /// Directory served as static front-end
        #[arg(long, env = "CIVICONE_PUBLIC_DIR", default_value = "public")]
        public_dir: PathBuf,
        /// Overwrite an existing dashboard.html
        #[arg(short, long)]
        force: bool,
    },

    /// Show issue totals
    Stats,

    /// List issues, newest first
    List {
        /// Only issues assigned to this department (exact match)
        #[arg(short, long)]
        department: Option<String>,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn get_db(path: &Path) -> Result<Database> {
    Database::open(path).context("Failed to open database")
}

fn main() -> Result<()> {
    // A missing .env file is fine; real environment variables still apply.
    let _ = dotenv::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Commands::Serve(args) => {
            let config = Config::from_args(cli.db, args)?;
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("Failed to start async runtime")?;
            runtime.block_on(server::run(config))
        }

        Commands::Init { public_dir, force } => commands::init::run(&cli.db, &public_dir, force),

        Commands::Stats => {
            let db = get_db(&cli.db)?;
            commands::stats::run(&db)
        }

        Commands::List { department } => {
            let db = get_db(&cli.db)?;
            commands::list::run(&db, department.as_deref())
        }
    }
}
