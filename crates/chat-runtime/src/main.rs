//! # Moderated Chat
//!
//! ```text
//! chat-runtime <test_case_number | test_case_dir>
//! ```
//!
//! A number `N` selects `testcase_N` in the current directory. Log filtering
//! follows `RUST_LOG` (default `info`).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chat_runtime::{ChatRuntime, RunConfig};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn test_case_dir() -> Result<PathBuf> {
    let Some(arg) = std::env::args().nth(1) else {
        bail!("Usage: chat-runtime <test_case_number | test_case_dir>");
    };
    Ok(match arg.parse::<u32>() {
        Ok(number) => RunConfig::test_case_dir(number),
        Err(_) => PathBuf::from(arg),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let dir = test_case_dir()?;
    let mut config = RunConfig::load(&dir)
        .with_context(|| format!("Failed to load test case {}", dir.display()))?;
    config.apply_env_overrides();

    let runtime = Arc::new(ChatRuntime::new(config));
    let signal_runtime = Arc::clone(&runtime);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Ctrl-C received, shutting down");
            signal_runtime.shutdown();
        }
    });

    let summary = runtime.run().await?;
    info!(complete = summary.is_complete(), "Run finished");
    println!("{summary}");
    Ok(())
}
