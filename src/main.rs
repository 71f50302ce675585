use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;

use contactsync::{
    config::SyncConfig,
    digest::summarize,
    engine::fieldwise::FieldwiseComparator,
    notify::open_notifier,
    persist::open_directory,
    runtime::orchestrator::{Reconciler, Scope, deliver},
    telemetry,
};

/// Reconcile contacts between two directories.
///
/// With no arguments every contact in both directories is considered.
/// With FIRST and LAST only contacts with exactly that name are.
///
/// Configuration is read from the file named by CONTACTSYNC_CONFIG
/// (default: contactsync.toml).
#[derive(Parser)]
#[command(name = "contactsync")]
#[command(version, about)]
struct Cli {
    /// First name to restrict the run to.
    #[arg(requires = "last")]
    first: Option<String>,

    /// Last name to restrict the run to.
    #[arg(requires = "first")]
    last: Option<String>,
}

impl Cli {
    fn scope(self) -> Scope {
        match (self.first, self.last) {
            (Some(first), Some(last)) => Scope::Named { first, last },
            _ => Scope::All,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    telemetry::init();
    let cli = Cli::parse();

    let config = SyncConfig::load_from_env()?;
    let left = open_directory(&config.left)
        .with_context(|| format!("opening left directory {}", config.left.path.display()))?;
    let right = open_directory(&config.right)
        .with_context(|| format!("opening right directory {}", config.right.path.display()))?;
    let comparator = FieldwiseComparator;

    let reconciler = Reconciler::new(left.as_ref(), right.as_ref(), &comparator, config.policy());
    let (run, result) = reconciler.run_partial(&cli.scope()).await;
    println!("{}", run.summary());
    result?;

    let digest = summarize(&run, &comparator, &config.digest(), Utc::now());
    let notifier = open_notifier(config.notify.kind, &config.notify.outbox_dir);
    deliver(&digest, notifier.as_ref()).await;

    Ok(())
}
