use anyhow::Context;
use clap::Parser;
use cuaca::{load_locations, Cuaca, RetryPolicy, Scheduler, DEFAULT_STORE_DIR};
use std::path::PathBuf;
use std::time::Duration;

/// Polls public weather providers (BMKG, Open-Meteo) and publishes one JSON
/// document per location plus a location index.
#[derive(Parser, Debug)]
#[command(name = "cuaca", version, about)]
struct Args {
    /// Output directory for the per-location records and the index.
    #[arg(long, default_value = DEFAULT_STORE_DIR)]
    store_dir: PathBuf,

    /// JSON file overriding the built-in location registry.
    #[arg(long)]
    locations: Option<PathBuf>,

    /// Re-run the pipeline every N seconds instead of exiting after one pass.
    /// Pass the flag without a value for the default 5 minute period.
    #[arg(
        long,
        num_args = 0..=1,
        default_missing_value = "300",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    interval: Option<u64>,

    /// Maximum number of locations processed concurrently.
    #[arg(long, default_value_t = cuaca::DEFAULT_CONCURRENCY_LIMIT)]
    concurrency: usize,

    /// Maximum fetch attempts per location.
    #[arg(long, default_value_t = 3)]
    max_attempts: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = env_logger::Env::default().default_filter_or("info");
    env_logger::init_from_env(env);

    let args = Args::parse();

    let locations = match &args.locations {
        Some(path) => Some(
            load_locations(path)
                .with_context(|| format!("loading registry from {}", path.display()))?,
        ),
        None => None,
    };

    let pipeline = Cuaca::builder()
        .store_dir(args.store_dir)
        .maybe_locations(locations)
        .concurrency_limit(args.concurrency)
        .retry(RetryPolicy {
            max_attempts: args.max_attempts,
            ..RetryPolicy::default()
        })
        .build()
        .await
        .context("setting up the pipeline")?;

    match args.interval {
        Some(seconds) => {
            Scheduler::new(Duration::from_secs(seconds))
                .run(&pipeline)
                .await?;
        }
        None => {
            // Per-location failures degrade to fallback or skip; only setup
            // and index-write errors reach this `?`.
            pipeline.run_once().await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_of_zero_is_rejected() {
        let result = Args::try_parse_from(["cuaca", "--interval", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn bare_interval_flag_uses_the_default_period() {
        let args = Args::try_parse_from(["cuaca", "--interval"]).unwrap();
        assert_eq!(args.interval, Some(300));
    }

    #[test]
    fn explicit_interval_is_honored() {
        let args = Args::try_parse_from(["cuaca", "--interval", "60"]).unwrap();
        assert_eq!(args.interval, Some(60));
    }
}
