//! Refectory binary.
//!
//! # Usage
//!
//! ```bash
//! # Five workers around a ring of five resources
//! refectory
//!
//! # Seven workers, with lifecycle events mirrored to the debug log
//! RUST_LOG=debug refectory --workers 7
//! ```

use clap::Parser;
use refectory_cli::DEFAULT_WORKERS;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Ring-ordered resource acquisition demo
#[derive(Parser, Debug)]
#[command(name = "refectory")]
#[command(about = "Workers sharing a ring of resources without deadlock")]
#[command(version)]
struct Args {
    /// Number of workers (and resources in the ring)
    #[arg(short, long, default_value_t = DEFAULT_WORKERS, allow_negative_numbers = true)]
    workers: i64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    tracing::info!(workers = args.workers, "Refectory starting");

    refectory_cli::report(refectory_cli::run(args.workers))?;
    Ok(())
}
