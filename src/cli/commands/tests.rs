use super::*;
use crate::channels::SentMessage;
use crate::errors::{RelayError, RelayResult};
use crate::providers::base::{AnalysisRequest, AnalysisResponse, ContentBlock, ResponseBlock};
use async_trait::async_trait;
use clap::CommandFactory;
use std::sync::Mutex;

#[derive(Default)]
struct RecordingSender {
    fail: bool,
    sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl ReplySender for RecordingSender {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn send(&self, recipient: &str, text: &str) -> RelayResult<SentMessage> {
        self.sent
            .lock()
            .unwrap()
            .push((recipient.to_string(), text.to_string()));
        if self.fail {
            return Err(RelayError::Channel {
                channel: "recording".into(),
                message: "down".into(),
            });
        }
        Ok(SentMessage {
            sid: "SM0".into(),
            status: "queued".into(),
        })
    }
}

#[derive(Default)]
struct EchoProvider {
    requests: Mutex<Vec<AnalysisRequest>>,
}

#[async_trait]
impl AnalysisProvider for EchoProvider {
    async fn analyze(&self, request: &AnalysisRequest) -> RelayResult<AnalysisResponse> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(AnalysisResponse {
            content: vec![ResponseBlock::Text {
                text: "{\"total\":\"9.99\"}".into(),
            }],
            ..AnalysisResponse::default()
        })
    }

    fn model(&self) -> &str {
        "claude-test"
    }

    fn max_tokens(&self) -> u32 {
        256
    }
}

#[test]
fn test_cli_definition_is_valid() {
    Cli::command().debug_assert();
}

#[test]
fn test_parse_serve_with_overrides() {
    let cli = Cli::try_parse_from(["receipt-relay", "serve", "--port", "9000", "-c", "relay.json"])
        .unwrap();
    match cli.command {
        Commands::Serve { config, host, port } => {
            assert_eq!(config, Some(PathBuf::from("relay.json")));
            assert_eq!(host, None);
            assert_eq!(port, Some(9000));
        }
        _ => panic!("expected serve"),
    }
}

#[test]
fn test_parse_analyze_requires_image() {
    assert!(Cli::try_parse_from(["receipt-relay", "analyze"]).is_err());

    let cli = Cli::try_parse_from([
        "receipt-relay",
        "analyze",
        "receipt.bin",
        "--media-type",
        "image/png",
    ])
    .unwrap();
    match cli.command {
        Commands::Analyze {
            image, media_type, ..
        } => {
            assert_eq!(image, PathBuf::from("receipt.bin"));
            assert_eq!(media_type.as_deref(), Some("image/png"));
        }
        _ => panic!("expected analyze"),
    }
}

// --- startup greeting ---

#[tokio::test]
async fn test_greeting_sent_to_notify_number() {
    let sender = RecordingSender::default();

    assert!(send_startup_greeting(&sender, "+15551234567").await);

    let sent = sender.sent.lock().unwrap();
    assert_eq!(
        *sent,
        vec![("+15551234567".to_string(), WELCOME_REPLY.to_string())]
    );
}

#[tokio::test]
async fn test_greeting_skipped_without_recipient() {
    let sender = RecordingSender::default();

    assert!(!send_startup_greeting(&sender, " ").await);
    assert!(sender.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_greeting_failure_is_not_fatal() {
    let sender = RecordingSender {
        fail: true,
        ..RecordingSender::default()
    };

    assert!(!send_startup_greeting(&sender, "+15551234567").await);
}

// --- analyze ---

#[tokio::test]
async fn test_analyze_image_infers_media_type() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("receipt.PNG");
    std::fs::write(&image, b"hello").unwrap();
    let provider = EchoProvider::default();

    let text = analyze_image(&provider, &image, None).await.unwrap();

    assert_eq!(text, "{\"total\":\"9.99\"}");
    let requests = provider.requests.lock().unwrap();
    assert_eq!(requests[0].max_tokens, 256);
    match &requests[0].content_blocks()[0] {
        ContentBlock::Image { source } => {
            assert_eq!(source.media_type, "image/png");
            assert_eq!(source.data, "aGVsbG8=");
        }
        other => panic!("expected image block, got {:?}", other),
    }
}

#[tokio::test]
async fn test_analyze_image_unknown_extension_needs_flag() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("receipt.bin");
    std::fs::write(&image, b"hello").unwrap();
    let provider = EchoProvider::default();

    let err = analyze_image(&provider, &image, None).await.unwrap_err();
    assert!(err.to_string().contains("--media-type"));

    let text = analyze_image(&provider, &image, Some("image/webp"))
        .await
        .unwrap();
    assert_eq!(text, "{\"total\":\"9.99\"}");
}

#[tokio::test]
async fn test_analyze_image_rejects_unsupported_type() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("scan.pdf");
    std::fs::write(&image, b"%PDF").unwrap();
    let provider = EchoProvider::default();

    let err = analyze_image(&provider, &image, Some("application/pdf"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("unsupported media type"));
    assert!(provider.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_analyze_image_missing_file() {
    let provider = EchoProvider::default();
    let err = analyze_image(&provider, Path::new("/nonexistent/receipt.jpg"), None)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("I/O error"));
}

// --- media pruning ---

#[tokio::test]
async fn test_prune_media_disabled_by_default() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("old.jpg"), b"x").unwrap();
    let media = MediaConfig {
        dir: dir.path().to_string_lossy().into_owned(),
        ..MediaConfig::default()
    };
    let store = MediaStore::new(&media);

    assert_eq!(prune_media(&store, &media).await, 0);
    assert!(dir.path().join("old.jpg").exists());
}

#[tokio::test]
async fn test_prune_media_missing_dir_is_ok() {
    let media = MediaConfig {
        dir: "/nonexistent/receipt-relay-media".into(),
        keep_files: true,
        max_age_hours: 1,
        ..MediaConfig::default()
    };
    let store = MediaStore::new(&media);

    assert_eq!(prune_media(&store, &media).await, 0);
}

// --- status ---

#[test]
fn test_status_lines_hide_secrets() {
    let mut config = Config::default();
    config.analysis.api_key = "sk-ant-secret".into();
    config.twilio.auth_token = "twilio-secret".into();

    let lines = status_lines(&config, Path::new("/nonexistent/config.json"), &[]).join("\n");

    assert!(!lines.contains("sk-ant-secret"));
    assert!(!lines.contains("twilio-secret"));
    assert!(lines.contains("Analysis API key: \u{2713}"));
    assert!(lines.contains("Webhook: 0.0.0.0:8080/webhook"));
    assert!(lines.contains("(reply to sender)"));
    assert!(lines.contains("Env overrides: (none)"));
}

#[test]
fn test_status_lines_list_env_override_names() {
    let mut config = Config::default();
    config.analysis.api_key = "sk-ant-from-env".into();

    let lines = status_lines(
        &config,
        Path::new("/nonexistent/config.json"),
        &["CLAUDE_API_KEY", "PORT"],
    )
    .join("\n");

    assert!(lines.contains("Env overrides: CLAUDE_API_KEY, PORT"));
    assert!(!lines.contains("sk-ant-from-env"));
}
