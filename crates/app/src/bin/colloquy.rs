// Colloquy - Local interactive chat

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{debug, error, info};

use colloquy_app::{create_app, env_filter};
use colloquy_common::config::Config;
use colloquy_llm::LlmConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter(&config))
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter(&config))
            .with_writer(std::io::stderr)
            .pretty()
            .init();
    }

    info!("Starting Colloquy local chat");
    debug!(?config, "Configuration loaded");

    let llm_config = LlmConfig::from_env().map_err(|e| {
        error!("Failed to load LLM configuration: {}", e);
        e
    })?;

    let app = create_app(&config, llm_config).map_err(|e| {
        error!("Failed to create application: {}", e);
        e
    })?;

    info!("Application ready");

    let mut session = app.session(chrono::Utc::now().timestamp());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut shown_title = false;

    println!("Type a message and press Enter. Ctrl+D or Ctrl+C to quit.");

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = shutdown_signal() => None,
        };

        let Some(line) = line else {
            break;
        };

        let text = line.trim();
        if text.is_empty() {
            continue;
        }

        match session.send(text).await {
            Ok(reply) => println!("assistant> {}", reply.content),
            Err(e) => error!(code = e.error_code(), "Completion failed: {}", e),
        }

        if !shown_title {
            if let Some(title) = session.title().await {
                println!("[title: {}]", title);
                shown_title = true;
            }
        }
    }

    if let Some(title) = session.title().await {
        info!(title = %title, "Session ended");
    } else {
        info!("Session ended");
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal, ending session");
        },
        _ = terminate => {
            info!("Received terminate signal, ending session");
        },
    }
}
