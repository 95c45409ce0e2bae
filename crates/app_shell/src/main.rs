use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use app_services::AppServicesBuilder;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let mut data_dir = dirs::data_local_dir().unwrap_or_else(|| std::path::PathBuf::from("."));
    data_dir.push("noteleaf");
    fs::create_dir_all(&data_dir)
        .with_context(|| format!("failed to prepare data dir {}", data_dir.display()))?;
    let _log_guard = init_local_logger(&data_dir.join("logs"));

    let services = AppServicesBuilder::new(&data_dir)
        .build()
        .await
        .context("failed to build app services")?;

    let restored = services
        .auth()
        .restore_session()
        .await
        .context("failed to restore auth session")?;
    if restored {
        info!("restored stored session");
    } else {
        info!("no stored session, sign-in required");
    }

    services
        .seed_demo_notes()
        .await
        .context("failed to seed demo notes")?;

    info!("{}", services.startup_summary().await);
    Ok(())
}

fn init_local_logger(log_dir: &Path) -> tracing_appender::non_blocking::WorkerGuard {
    if let Err(err) = fs::create_dir_all(log_dir) {
        eprintln!("failed to create log dir `{}`: {err}", log_dir.display());
    }
    let file_appender = tracing_appender::rolling::daily(log_dir, "noteleaf.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,app_shell=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .json()
        .with_writer(writer)
        .init();

    guard
}
