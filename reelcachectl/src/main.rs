use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use reelcache_client::ClientConfig;
use reelcache_core::{
    ByteSize, CleanupReport, Clock, MultiStoreCache, StoreKind, SystemClock,
};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "reelcachectl",
    about = "Inspect and maintain the reelcache preview and frame stores"
)]
struct Cli {
    /// Cache root; defaults to the configured or platform cache directory
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show per-store record counts and sizes against the configured budget
    Stats,
    /// Delete every record older than the configured TTL
    Sweep,
    /// Delete the oldest records across all stores until SIZE is freed
    Evict {
        /// Amount to free, e.g. 64MiB or 1048576
        #[arg(long)]
        bytes: ByteSize,
    },
    /// Remove every record from a store
    Clear {
        #[arg(long, value_enum)]
        store: StoreArg,
    },
    /// List the records in a store with their size and age
    Ls {
        #[arg(long, value_enum)]
        store: StoreArg,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StoreArg {
    Preview,
    Frames,
    Recognition,
    Subtitle,
    All,
}

impl StoreArg {
    fn kinds(self) -> &'static [StoreKind] {
        match self {
            StoreArg::Preview => &[StoreKind::Preview],
            StoreArg::Frames => &[StoreKind::Frames],
            StoreArg::Recognition => &[StoreKind::Recognition],
            StoreArg::Subtitle => &[StoreKind::Subtitle],
            StoreArg::All => &StoreKind::ALL,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::load();
    if let Some(dir) = cli.cache_dir {
        config.cache_dir = Some(dir);
    }
    let root = config.cache_root()?;
    debug!("opening cache; root={}", root.display());
    let cache = MultiStoreCache::open(&root, config.cache_limits())
        .with_context(|| {
            format!("failed to open cache at {}", root.display())
        })?;

    match cli.command {
        Command::Stats => stats(&cache).await,
        Command::Sweep => {
            let report = cache.cleanup_expired().await?;
            print_report("swept", &report);
            Ok(())
        }
        Command::Evict { bytes } => {
            let report = cache.remove_oldest(bytes.as_bytes()).await?;
            print_report("evicted", &report);
            Ok(())
        }
        Command::Clear { store } => {
            for kind in store.kinds() {
                info!("clearing {kind}");
                cache.clear(*kind).await?;
                println!("cleared {kind}");
            }
            Ok(())
        }
        Command::Ls { store } => ls(&cache, store).await,
    }
}

async fn stats(cache: &MultiStoreCache) -> Result<()> {
    let stats = cache.statistics().await?;
    let limits = cache.limits();

    println!("cache root: {}", cache.root().display());
    for kind in StoreKind::ALL {
        let store = stats.store(kind);
        println!(
            "{:<18} {:>8} records {:>12}",
            kind.to_string(),
            store.count,
            ByteSize::from_bytes(store.size).to_string()
        );
    }
    println!(
        "{:<18} {:>8} records {:>12}",
        "total",
        stats.total_count(),
        ByteSize::from_bytes(stats.total_size).to_string()
    );
    println!(
        "budget {} (evicts to {}), ttl {}",
        limits.max_bytes,
        limits.low_water_mark(),
        humantime::format_duration(limits.ttl)
    );
    Ok(())
}

async fn ls(cache: &MultiStoreCache, store: StoreArg) -> Result<()> {
    let now_ms = SystemClock.now_ms();
    for kind in store.kinds() {
        let mut records =
            cache.enumerate::<serde_json::Value>(*kind).await?;
        records.sort_by_key(|(_, record)| record.timestamp);
        for (key, record) in records {
            let age = Duration::from_secs(record.age_ms(now_ms) / 1000);
            println!(
                "{kind}\t{key}\t{}\t{} old",
                ByteSize::from_bytes(record.size),
                humantime::format_duration(age)
            );
        }
    }
    Ok(())
}

fn print_report(verb: &str, report: &CleanupReport) {
    info!(
        "{verb} pass done; ttl={}, size={}",
        report.removed_ttl, report.removed_size
    );
    println!(
        "{verb} {} records, freed {}",
        report.removed,
        ByteSize::from_bytes(report.freed_bytes)
    );
}
