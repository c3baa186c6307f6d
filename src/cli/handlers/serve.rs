//! Serve command handler.

use anyhow::{Context, Result};
use std::path::Path;
use tokio::io::BufReader;
use tracing::info;

use super::open_database;
use crate::cli::ServeArgs;
use crate::cli::config::Config;
use crate::ipc::{self, Dispatcher};
use crate::links::SystemBrowser;
use crate::sync::{SyncOptions, SyncService};

/// Runs the sync service against stdin/stdout until stdin closes.
pub fn handle_serve(args: &ServeArgs, db_path: &Path, config: &Config) -> Result<()> {
    let options = SyncOptions {
        reconcile_interval: config.reconcile_interval(args.interval)?,
        ..SyncOptions::default()
    };
    let db = open_database(db_path)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(async {
        let handle = SyncService::start(db, options).context("failed to start sync service")?;
        let dispatcher = Dispatcher::new(handle, SystemBrowser);

        ipc::serve(
            &dispatcher,
            BufReader::new(tokio::io::stdin()),
            tokio::io::stdout(),
        )
        .await
        .context("failed to serve notes protocol")?;

        info!(path = %db_path.display(), "serve finished");
        Ok::<(), anyhow::Error>(())
    })
}
