#[cfg(test)]
mod tests;

use crate::channels::{ReplySender, TwilioSender};
use crate::config::{Config, MediaConfig, load_config};
use crate::dispatch::{Dispatcher, WELCOME_REPLY};
use crate::gateway::{AppState, build_router};
use crate::media::encode::{encode_file, media_type_for_path};
use crate::media::{MediaStore, is_supported_media_type};
use crate::providers::anthropic::AnthropicClient;
use crate::providers::base::{AnalysisProvider, build_invoice_request};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "receipt-relay")]
#[command(about = "WhatsApp receipt extraction relay", version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the webhook server
    Serve {
        /// Path to config.json (default: ./config.json)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Override the bind address
        #[arg(long)]
        host: Option<String>,
        /// Override the listen port
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Extract invoice data from a local image and print it
    Analyze {
        image: PathBuf,
        /// Media type of the image (inferred from the extension if omitted)
        #[arg(long)]
        media_type: Option<String>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Show the effective configuration
    Status {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config, host, port } => {
            serve(config.as_deref(), host, port).await?;
        }
        Commands::Analyze {
            image,
            media_type,
            config,
        } => {
            let config = load_config(config.as_deref())?;
            let provider = AnthropicClient::new(&config.analysis);
            let text = analyze_image(&provider, &image, media_type.as_deref()).await?;
            println!("{}", text);
        }
        Commands::Status { config } => {
            status_command(config.as_deref())?;
        }
    }

    Ok(())
}

async fn serve(config_path: Option<&Path>, host: Option<String>, port: Option<u16>) -> Result<()> {
    info!("loading configuration...");
    let mut config = load_config(config_path)?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config
        .validate()
        .with_context(|| "Configuration validation failed")?;

    let store = Arc::new(MediaStore::new(&config.media));
    prune_media(&store, &config.media).await;

    let provider = Arc::new(AnthropicClient::new(&config.analysis));
    info!(
        "analysis provider ready: model={}, max_tokens={}",
        provider.model(),
        provider.max_tokens()
    );
    let sender = Arc::new(TwilioSender::new(&config.twilio));

    if config.server.startup_greeting {
        send_startup_greeting(sender.as_ref(), &config.twilio.notify_number).await;
    }

    let dispatcher = Dispatcher::new(store, provider, sender)
        .with_notify_recipient(config.twilio.notify_number.clone());
    let state = AppState::from_config(Arc::new(dispatcher), &config.twilio);
    if config.twilio.validate_signature {
        info!("webhook signature validation enabled");
    }
    let app = build_router(state, &config.server.webhook_path);

    println!(
        "receipt-relay {} listening on {}:{}{}",
        crate::VERSION,
        config.server.host,
        config.server.port,
        config.server.webhook_path
    );
    crate::gateway::serve(&config.server.host, config.server.port, app).await
}

/// Remove kept media older than the configured age. Failures are logged.
async fn prune_media(store: &MediaStore, media: &MediaConfig) -> usize {
    if !media.keep_files || media.max_age_hours == 0 {
        return 0;
    }
    let max_age = Duration::from_secs(media.max_age_hours.saturating_mul(3600));
    match store.prune_older_than(max_age).await {
        Ok(removed) => removed,
        Err(e) => {
            warn!("media pruning failed: {}", e);
            0
        }
    }
}

/// Send the welcome message to the notification recipient, if one is set.
/// Returns whether a message was delivered.
pub(crate) async fn send_startup_greeting(sender: &dyn ReplySender, recipient: &str) -> bool {
    if recipient.trim().is_empty() {
        return false;
    }
    match sender.send(recipient, WELCOME_REPLY).await {
        Ok(sent) => {
            info!("startup greeting sent: sid={}", sent.sid);
            true
        }
        Err(e) => {
            error!(kind = e.kind(), "failed to send startup greeting: {}", e);
            false
        }
    }
}

/// Run one image through the encode → request → analysis chain.
pub(crate) async fn analyze_image(
    provider: &dyn AnalysisProvider,
    image: &Path,
    media_type: Option<&str>,
) -> Result<String> {
    let media_type = match media_type {
        Some(media_type) => media_type,
        None => media_type_for_path(image).with_context(|| {
            format!(
                "cannot infer media type of {}; pass --media-type",
                image.display()
            )
        })?,
    };
    if !is_supported_media_type(media_type) {
        anyhow::bail!("unsupported media type: {}", media_type);
    }

    let encoded = encode_file(image).await?;
    let request = build_invoice_request(
        provider.model(),
        provider.max_tokens(),
        encoded,
        media_type,
    );
    let response = provider.analyze(&request).await?;
    response
        .first_text()
        .map(str::to_string)
        .context("analysis response has no text content")
}

fn mark(ok: bool) -> &'static str {
    if ok { "\u{2713}" } else { "\u{2717}" }
}

pub(crate) fn status_lines(
    config: &Config,
    config_path: &Path,
    env_overrides: &[&str],
) -> Vec<String> {
    let overrides = if env_overrides.is_empty() {
        "(none)".to_string()
    } else {
        env_overrides.join(", ")
    };
    vec![
        format!("Config: {} {}", config_path.display(), mark(config_path.exists())),
        format!("Model: {}", config.analysis.model),
        format!("Endpoint: {}", config.analysis.endpoint),
        format!("Analysis API key: {}", mark(!config.analysis.api_key.is_empty())),
        format!(
            "Twilio credentials: {}",
            mark(!config.twilio.account_sid.is_empty() && !config.twilio.auth_token.is_empty())
        ),
        format!(
            "Notify number: {}",
            if config.twilio.notify_number.is_empty() {
                "(reply to sender)"
            } else {
                config.twilio.notify_number.as_str()
            }
        ),
        format!(
            "Webhook: {}:{}{}",
            config.server.host, config.server.port, config.server.webhook_path
        ),
        format!(
            "Signature validation: {}",
            mark(config.twilio.validate_signature)
        ),
        format!(
            "Media dir: {} (keep files: {})",
            config.media.dir,
            mark(config.media.keep_files)
        ),
        format!("Env overrides: {}", overrides),
    ]
}

fn status_command(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let default_path = crate::config::get_config_path();
    let path = config_path.unwrap_or(default_path.as_path());

    println!("receipt-relay {} status\n", crate::VERSION);
    let overrides = crate::config::credentials::set_env_overrides();
    for line in status_lines(&config, path, &overrides) {
        println!("{}", line);
    }
    Ok(())
}
