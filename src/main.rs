//! irc-helper - a rule-driven IRC bot.

use std::path::PathBuf;

use irc_helper::{Bot, Config, telemetry};
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load_validated(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    info!(
        host = %config.connection.host,
        port = config.connection.port,
        nick = %config.connection.nick,
        channel = %config.connection.channel,
        "Starting irc-helper"
    );

    let mut bot = Bot::new(config, Some(PathBuf::from(&config_path))).await?;

    let result = tokio::select! {
        result = async {
            bot.connect().await?;
            bot.run().await
        } => result,
        () = shutdown_signal() => {
            info!("Signal received, shutting down");
            Ok(())
        }
    };

    bot.shutdown().await;

    if let Err(e) = &result {
        error!(code = e.error_code(), error = %e, "Session failed");
    }
    result?;
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
