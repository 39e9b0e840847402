//! threadcast-send - Background daemon for scheduled thread publishing
//!
//! Watches the source-item feed and publishes pending items as threads on a
//! jittered interval.

use clap::Parser;
use libthreadcast::compose::TextGenerator;
use libthreadcast::config::Config;
use libthreadcast::logging::{LogFormat, LoggingConfig};
use libthreadcast::scheduler::PostScheduler;
use libthreadcast::{Database, MockPublisher, Publisher, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "threadcast-send")]
#[command(version)]
#[command(about = "Background daemon for scheduled thread publishing")]
#[command(long_about = "\
threadcast-send - Background daemon for scheduled thread publishing

DESCRIPTION:
    threadcast-send is a long-running daemon that watches the Threadcast
    feed for pending analysis items and publishes each as a thread of
    reply-chained posts.

    Publishing happens on a jittered interval drawn from a configured
    window, gated on the time since the last successful post. Published
    items are tracked in a dedup ledger so they go out at most once per
    clean run.

USAGE:
    # Run in foreground (logs to stderr)
    threadcast-send

    # Log segments without publishing
    threadcast-send --dry-run

    # Enable verbose logging
    threadcast-send --verbose

SIGNALS:
    SIGTERM, SIGINT - Graceful shutdown (finishes current cycle)

CONFIGURATION:
    Configuration file: ~/.config/threadcast/config.toml
    Database location: ~/.local/share/threadcast/threadcast.db

    [posting]
    interval_min_minutes = 90    # lower bound of the jittered window
    interval_max_minutes = 180   # upper bound of the jittered window
    post_immediately = false     # run one pass on startup
    dry_run = false              # log segments instead of publishing

    Environment overrides: POST_INTERVAL_MIN, POST_INTERVAL_MAX,
    POST_IMMEDIATELY, DRY_RUN, THREADCAST_CONFIG.

EXIT CODES:
    0 - Clean shutdown
    1 - Runtime error
    2 - Authentication error
    3 - Invalid input
")]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long)]
    #[arg(help = "Enable verbose logging (useful for debugging)")]
    verbose: bool,

    /// Log segments without publishing anything
    #[arg(long)]
    #[arg(help = "Compose and log threads without publishing")]
    dry_run: bool,

    /// Run one publishing cycle and exit (for testing)
    #[arg(long, hide = true)]
    #[arg(help = "Run one publishing cycle and exit (for testing)")]
    once: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        error!("{}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load()?;
    if cli.dry_run {
        config.posting.dry_run = true;
    }

    let db = Arc::new(Database::new(&config.database.path).await?);

    info!("threadcast-send daemon starting");

    // No publishing platform is wired in yet; without one, only dry runs
    // are meaningful.
    let publisher: Arc<dyn Publisher> = Arc::new(MockPublisher::succeeding());
    if !config.posting.dry_run {
        warn!("No publishing platform configured, forcing dry-run mode");
        config.posting.dry_run = true;
    }
    let generator: Option<Arc<dyn TextGenerator>> = None;

    let shutdown = Arc::new(AtomicBool::new(false));
    setup_signal_handlers(shutdown.clone())?;

    let scheduler = PostScheduler::new(
        db.clone(),
        db,
        publisher,
        generator,
        &config.account.name,
        &config.account.room,
        config.posting.clone(),
        config.segments,
        shutdown,
    );

    if cli.once {
        let report = scheduler.run_cycle().await?;
        info!(
            "threadcast-send: ran one cycle ({} of {} pending item(s) published), exiting",
            report.threads_published, report.items_seen
        );
    } else {
        scheduler.run().await?;
    }

    info!("threadcast-send daemon stopped");
    Ok(())
}

/// Initialize logging based on verbosity level and environment
fn init_logging(verbose: bool) {
    let format = std::env::var("THREADCAST_LOG_FORMAT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(LogFormat::Text);
    let level = std::env::var("THREADCAST_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    LoggingConfig::new(format, level, verbose).init();
}

/// Set up signal handlers for graceful shutdown
fn setup_signal_handlers(shutdown: Arc<AtomicBool>) -> Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM]).map_err(|e| {
        libthreadcast::ThreadcastError::InvalidInput(format!("Signal setup failed: {}", e))
    })?;

    // Spawn thread to handle signals
    let shutdown_clone = shutdown.clone();
    std::thread::spawn(move || {
        for sig in signals.forever() {
            match sig {
                SIGTERM | SIGINT => {
                    info!("Received shutdown signal, stopping gracefully...");
                    shutdown_clone.store(true, Ordering::Relaxed);
                    break;
                }
                _ => {}
            }
        }
    });

    Ok(())
}
