use super::*;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test]
fn test_default_http_client_builds() {
    let _client = default_http_client();
}

#[tokio::test]
async fn test_client_with_timeouts_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let client = client_with_timeouts(1, 1);
    let result = client.get(server.uri()).send().await;
    assert!(result.is_err());
    assert!(result.unwrap_err().is_timeout());
}
