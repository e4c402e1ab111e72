//! EmberDB page server daemon.
//!
//! `emberd` opens (or creates) the backing data file, builds the page
//! pool, and serves page GET/SET requests on a Unix domain socket until
//! SIGINT or SIGTERM.
//!
//! # Usage
//!
//! ```bash
//! # 1024 8 KB pages and 2048 16 KB pages
//! emberd /var/lib/ember/pages.db /tmp/ember.sock 1024 2048
//!
//! # Add 32 KB and 2 MB ranges
//! emberd pages.db /tmp/ember.sock 1024 2048 512 16
//!
//! # Serve uncached (multi-size layouts need this)
//! emberd pages.db /tmp/ember.sock 1024 2048 --direct
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ember_server::config::ServerConfig;
use ember_server::{shutdown, Server};
use ember_storage::{DirectPool, LruPool, PageStore};

/// EmberDB page server daemon.
#[derive(Parser, Debug)]
#[command(
    name = "emberd",
    author = "EmberDB Team",
    version,
    about = "EmberDB page cache server",
    long_about = "Serves page-level GET/SET requests over a Unix domain socket,\n\
                  backed by a pinned-page LRU cache over a single data file."
)]
struct Args {
    /// Path to the backing data file (created if absent)
    data_file: Option<PathBuf>,

    /// Path of the Unix socket to listen on
    socket_path: Option<PathBuf>,

    /// Page counts per size, smallest first: <8k> <16k> [<32k> <2m>]
    #[arg(num_args = 0..=4)]
    page_counts: Vec<usize>,

    /// Configuration file path; command-line values override it
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Serve uncached instead of through the LRU cache
    #[arg(long)]
    direct: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", env = "EMBER_LOG_LEVEL")]
    log_level: String,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    init_logging(&config.log_level);

    if args.print_config {
        println!("{}", config.to_toml()?);
        return Ok(());
    }

    run_server(config)
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(format!(
        "emberd={level},ember_server={level},ember_storage={level}"
    ))
    .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &Args) -> Result<ServerConfig> {
    let mut config = if let Some(path) = &args.config {
        ServerConfig::from_file(path).context("failed to load config file")?
    } else {
        ServerConfig::default()
    };

    if let Some(path) = &args.data_file {
        config.data_file = Some(path.clone());
    }
    if let Some(path) = &args.socket_path {
        config.socket_path = Some(path.clone());
    }
    if !args.page_counts.is_empty() {
        config.set_page_counts(&args.page_counts);
    }
    if args.direct {
        config.direct = true;
    }
    config.log_level = args.log_level.clone();

    Ok(config)
}

fn run_server(config: ServerConfig) -> Result<()> {
    let Some(data_file) = config.data_file.clone() else {
        bail!("no data file given (positional argument or config file)");
    };
    let Some(socket_path) = config.socket_path.clone() else {
        bail!("no socket path given (positional argument or config file)");
    };

    let layout = config.layout();
    if layout.is_empty() {
        bail!("no page counts given: pass <count_8k> <count_16k> [<count_32k> <count_2m>]");
    }

    let store: Arc<dyn PageStore> = if config.direct {
        info!("serving uncached (direct pool)");
        Arc::new(
            DirectPool::open(&data_file, &layout)
                .with_context(|| format!("cannot open {}", data_file.display()))?,
        )
    } else {
        Arc::new(
            LruPool::open(&data_file, &layout)
                .with_context(|| format!("cannot open {}", data_file.display()))?,
        )
    };

    shutdown::install_signal_handlers().context("cannot install signal handlers")?;

    info!(
        data_file = %data_file.display(),
        socket = %socket_path.display(),
        total_pages = layout.total_pages(),
        "starting emberd; press Ctrl+C to shut down"
    );

    let server = Server::new(store, &socket_path);
    server.run().context("server failed")?;

    Ok(())
}
