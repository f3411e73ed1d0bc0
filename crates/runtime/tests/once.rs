//! One-shot polling driven by a config file on disk.

use serde_json::json;
use std::io::Write;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

fn write_config(body: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{body}").unwrap();
    file
}

#[tokio::test]
async fn run_once_reports_scaled_series() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/climate"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "temperature": 21.5, "humidity": 0.4, "other": 1 })),
        )
        .mount(&server)
        .await;

    let config = write_config(&format!(
        r#"
        [store]
        capacity = 5

        [[sources]]
        name = "climate"
        url  = "{}/climate"
        keys = ["temperature", "humidity", "wind"]

        [series.humidity]
        scale = 100.0
        label = "Humidity %"
        "#,
        server.uri()
    ));

    let report = series_runtime::run_once(config.path()).await.unwrap();

    // Lexical key order; "wind" has no samples and is left out.
    assert_eq!(report.len(), 2);
    assert_eq!(report[0].key, "humidity");
    assert_eq!(report[0].label, "Humidity %");
    assert_eq!(report[0].window, vec![(1, 40.0)]);
    assert_eq!(report[0].last, 40.0);
    assert_eq!(report[1].key, "temperature");
    assert_eq!(report[1].window, vec![(1, 21.5)]);
    assert_eq!(report[1].summary.len, 1);
}

#[tokio::test]
async fn run_once_tolerates_failing_sources() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "wind": 7 })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let config = write_config(&format!(
        r#"
        [[sources]]
        name = "weather"
        url  = "{uri}/ok"
        keys = ["wind"]

        [[sources]]
        name = "climate"
        url  = "{uri}/broken"
        keys = ["temperature"]
        "#,
        uri = server.uri()
    ));

    let report = series_runtime::run_once(config.path()).await.unwrap();

    assert_eq!(report.len(), 1);
    assert_eq!(report[0].key, "wind");
    assert_eq!(report[0].last, 7.0);
}

#[tokio::test]
async fn run_once_rejects_malformed_config() {
    let config = write_config("[store\ncapacity = ");
    assert!(series_runtime::run_once(config.path()).await.is_err());
}
