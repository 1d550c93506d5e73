use super::*;

#[test]
fn test_api_status_display_carries_body() {
    let err = RelayError::ApiStatus {
        status: 529,
        body: r#"{"error":{"type":"overloaded_error"}}"#.to_string(),
    };
    let text = err.to_string();
    assert!(text.contains("529"));
    assert!(text.contains("overloaded_error"));
}

#[test]
fn test_api_display() {
    let err = RelayError::Api {
        kind: "invalid_request_error".to_string(),
        message: "image too large".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "API error: invalid_request_error - image too large"
    );
}

#[test]
fn test_io_helper_prefixes_context() {
    let err = RelayError::io("creating media directory", "permission denied");
    assert_eq!(
        err.to_string(),
        "I/O error: creating media directory: permission denied"
    );
}

#[test]
fn test_from_anyhow_is_internal() {
    let err: RelayError = anyhow::anyhow!("boom").into();
    assert!(matches!(err, RelayError::Internal(_)));
    assert_eq!(err.to_string(), "boom");
}

#[test]
fn test_kind_labels() {
    assert_eq!(RelayError::Io(String::new()).kind(), "io");
    assert_eq!(
        RelayError::ApiStatus {
            status: 500,
            body: String::new()
        }
        .kind(),
        "api_status"
    );
    assert_eq!(RelayError::Decode(String::new()).kind(), "decode");
    assert_eq!(
        RelayError::Api {
            kind: String::new(),
            message: String::new()
        }
        .kind(),
        "api"
    );
    assert_eq!(
        RelayError::Channel {
            channel: "twilio".into(),
            message: String::new()
        }
        .kind(),
        "channel"
    );
    assert_eq!(RelayError::Config(String::new()).kind(), "config");
}
