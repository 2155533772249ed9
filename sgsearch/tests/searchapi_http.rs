use std::io::Write;
use std::sync::{Arc, Mutex};

use mockito::Matcher;
use serde_json::json;
use sgsearch::{SearchApiProvider, SearchErrorKind, SearchProvider, SearchResultKind};

fn provider_for(server: &mockito::Server) -> SearchApiProvider {
    SearchApiProvider::new(reqwest::Client::new(), "search-key")
        .expect("key should be accepted")
        .with_base_url(format!("{}/api/v1/search", server.url()))
}

#[tokio::test]
async fn web_search_sends_google_params_and_truncates() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v1/search")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("api_key".into(), "search-key".into()),
            Matcher::UrlEncoded("engine".into(), "google".into()),
            Matcher::UrlEncoded("q".into(), "rust release".into()),
            Matcher::UrlEncoded("num".into(), "2".into()),
            Matcher::UrlEncoded("gl".into(), "us".into()),
            Matcher::UrlEncoded("hl".into(), "en".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "search_metadata": {"status": "Success"},
                "organic_results": [
                    {"title": "One", "link": "https://one.example", "snippet": "first"},
                    {"title": "Two", "link": "https://two.example", "snippet": "second"},
                    {"title": "Three", "link": "https://three.example", "snippet": "third"}
                ],
                "answer_box": {"title": "Answer", "answer": "42"}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let results = provider_for(&server)
        .search("rust release", 2)
        .await
        .expect("search should succeed");

    mock.assert_async().await;
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].title.as_deref(), Some("One"));
    assert_eq!(results[1].position, Some(2));
}

#[tokio::test]
async fn address_search_uses_google_maps_engine() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v1/search")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("engine".into(), "google_maps".into()),
            Matcher::UrlEncoded("q".into(), "ferry building".into()),
            Matcher::UrlEncoded("num".into(), "3".into()),
        ]))
        .with_status(200)
        .with_body(
            json!({
                "search_metadata": {"status": "Success"},
                "local_results": [{"title": "Ferry Building", "address": "1 Ferry Building, San Francisco"}]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let results = provider_for(&server)
        .search_address("ferry building", 3)
        .await
        .expect("search should succeed");

    mock.assert_async().await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].kind, SearchResultKind::Local);
    assert_eq!(results[0].address.as_deref(), Some("1 Ferry Building, San Francisco"));
}

#[tokio::test]
async fn unsuccessful_metadata_status_is_an_api_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/v1/search")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(json!({"search_metadata": {"status": "Processing"}}).to_string())
        .create_async()
        .await;

    let error = provider_for(&server)
        .search("anything", 3)
        .await
        .expect_err("status should be rejected");
    assert_eq!(error.kind, SearchErrorKind::Api);
}

#[tokio::test]
async fn unauthorized_is_an_authentication_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/v1/search")
        .match_query(Matcher::Any)
        .with_status(401)
        .with_body(json!({"error": "Invalid API key"}).to_string())
        .create_async()
        .await;

    let error = provider_for(&server)
        .search("anything", 3)
        .await
        .expect_err("401 should fail");
    assert_eq!(error.kind, SearchErrorKind::Authentication);
}

#[tokio::test]
async fn validate_requires_at_least_one_result() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/v1/search")
        .match_query(Matcher::UrlEncoded("num".into(), "1".into()))
        .with_status(200)
        .with_body(json!({"search_metadata": {"status": "Success"}, "organic_results": []}).to_string())
        .create_async()
        .await;

    let error = provider_for(&server)
        .validate()
        .await
        .expect_err("empty validation should fail");
    assert_eq!(error.kind, SearchErrorKind::Api);
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().expect("logs lock")).into_owned()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().expect("logs lock").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLogs {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[tokio::test]
async fn request_start_is_logged_with_phase_and_event() {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/v1/search")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            json!({
                "search_metadata": {"status": "Success"},
                "organic_results": [{"title": "One", "link": "https://one.example"}]
            })
            .to_string(),
        )
        .create_async()
        .await;

    provider_for(&server)
        .search("rust", 1)
        .await
        .expect("search should succeed");

    let output = logs.text();
    let line = output
        .lines()
        .find(|line| line.contains("sending SearchAPI request"))
        .expect("request start should be logged");
    assert!(line.contains(r#"phase="search""#), "{line}");
    assert!(line.contains(r#"event="request_start""#), "{line}");
    assert!(line.contains(r#"engine="google""#), "{line}");
}
