use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use survey_ai::app::App;
use survey_ai::backend::{BackendClient, ServedImage};
use survey_ai::llm::LlmClient;
use survey_ai::location::DeviceLocation;
use survey_ai_common::{Coordinates, ImageSource, PositionOptions, SelectedImage, NO_RESULTS_TO_SUMMARIZE};
use tempfile::tempdir;
use tokio::net::TcpListener;

#[derive(Default)]
struct Hits {
    health: usize,
    upload: usize,
    llm: usize,
    /// (フィールド名, テキスト値 or ファイル名)
    fields: Vec<(String, String)>,
    prompts: Vec<String>,
}

#[derive(Clone)]
struct Mock {
    health_status: StatusCode,
    health_delay: Duration,
    upload_status: StatusCode,
    upload_body: Value,
    llm_body: Value,
    hits: Arc<Mutex<Hits>>,
}

impl Mock {
    fn new() -> Self {
        Self {
            health_status: StatusCode::OK,
            health_delay: Duration::ZERO,
            upload_status: StatusCode::OK,
            upload_body: json!({
                "results": [{
                    "filename": "ab12cd34_site.jpg",
                    "chainage_km": "10.5",
                    "lat": 28.6139,
                    "lon": 77.209,
                    "gps_valid": true,
                    "distance_to_route": 12.3,
                    "labels": ["tripod"],
                    "confidences": {"tripod": 0.91}
                }]
            }),
            llm_body: json!({"response": "A surveying tripod beside the road."}),
            hits: Arc::new(Mutex::new(Hits::default())),
        }
    }
}

async fn health(State(mock): State<Mock>) -> StatusCode {
    mock.hits.lock().unwrap().health += 1;
    tokio::time::sleep(mock.health_delay).await;
    mock.health_status
}

async fn upload(State(mock): State<Mock>, mut multipart: Multipart) -> (StatusCode, Json<Value>) {
    let mut fields = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let value = match field.file_name() {
            Some(file_name) => file_name.to_string(),
            None => field.text().await.unwrap(),
        };
        fields.push((name, value));
    }

    let mut hits = mock.hits.lock().unwrap();
    hits.upload += 1;
    hits.fields = fields;
    (mock.upload_status, Json(mock.upload_body.clone()))
}

async fn generate(State(mock): State<Mock>, Json(body): Json<Value>) -> Json<Value> {
    let mut hits = mock.hits.lock().unwrap();
    hits.llm += 1;
    hits.prompts.push(body["prompt"].as_str().unwrap_or_default().to_string());
    Json(mock.llm_body.clone())
}

async fn served(Path(filename): Path<String>) -> Result<Vec<u8>, StatusCode> {
    if filename.starts_with("ab12cd34_") {
        Ok(vec![0xFF, 0xD8, 0xFF])
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

/// モックサーバを起動してベースURLを返す
async fn spawn(mock: Mock) -> String {
    let router = Router::new()
        .route("/", get(health))
        .route("/upload", post(upload))
        .route("/api/generate", post(generate))
        .route("/uploads/:filename", get(served))
        .with_state(mock);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// 接続できないURL
async fn closed_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

fn app_for(base_url: &str) -> App<DeviceLocation> {
    App::new(
        BackendClient::new(base_url, Duration::from_secs(5)),
        LlmClient::new(format!("{}/api/generate", base_url), "optgpt:7b"),
        DeviceLocation::Fixed(Coordinates::new(28.6139, 77.209)),
        PositionOptions::default(),
    )
}

fn image(name: &str) -> SelectedImage {
    SelectedImage::from_bytes(name, vec![0xFF, 0xD8, 0xFF, 0xE0]).unwrap()
}

fn field<'a>(hits: &'a Hits, name: &str) -> Option<&'a str> {
    hits.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
}

#[tokio::test]
async fn test_start_reports_accessible_server_and_location() {
    let mock = Mock::new();
    let url = spawn(mock.clone()).await;
    let mut app = app_for(&url);

    app.start().await;

    assert!(app.session().server().accessible);
    assert_eq!(app.session().server().message, "Accessible");
    assert_eq!(app.session().location(), Some(Coordinates::new(28.6139, 77.209)));
    assert!(!app.session().location_denied());
    assert_eq!(mock.hits.lock().unwrap().health, 1);
}

#[tokio::test]
async fn test_health_check_http_failure() {
    let mock = Mock { health_status: StatusCode::INTERNAL_SERVER_ERROR, ..Mock::new() };
    let url = spawn(mock).await;
    let mut app = app_for(&url);

    app.check_server_status().await;

    assert!(!app.session().server().accessible);
    assert_eq!(app.session().server().message, "Not accessible (HTTP 500)");
}

#[tokio::test]
async fn test_health_check_timeout() {
    let mock = Mock { health_delay: Duration::from_secs(3), ..Mock::new() };
    let url = spawn(mock).await;
    let mut app = App::new(
        BackendClient::new(&url, Duration::from_millis(200)),
        LlmClient::new(format!("{}/api/generate", url), "optgpt:7b"),
        DeviceLocation::Unsupported,
        PositionOptions::default(),
    );

    app.check_server_status().await;

    assert!(!app.session().server().accessible);
    assert_eq!(app.session().server().message, "Check timed out");
}

#[tokio::test]
async fn test_health_check_unreachable() {
    let url = closed_url().await;
    let mut app = app_for(&url);

    app.check_server_status().await;

    assert!(!app.session().server().accessible);
    assert!(app.session().server().message.starts_with("Not accessible ("));
}

#[tokio::test]
async fn test_run_analysis_replaces_results() {
    let mock = Mock::new();
    let url = spawn(mock.clone()).await;
    let mut app = app_for(&url);
    app.start().await;

    app.add_images(vec![image("site.jpg")], ImageSource::Gallery);
    app.set_chainage("10.5");

    let mut ticks = 0;
    app.run_analysis(|_| ticks += 1).await;

    let session = app.session();
    assert!(!session.is_loading());
    assert!(session.error().is_none());
    assert_eq!(session.results().len(), 1);
    assert_eq!(session.results()[0].filename, "ab12cd34_site.jpg");
    assert_eq!(session.results()[0].labels, vec!["tripod".to_string()]);

    let hits = mock.hits.lock().unwrap();
    assert_eq!(hits.upload, 1);
    assert_eq!(field(&hits, "image1"), Some("site.jpg"));
    assert_eq!(field(&hits, "chainage_km_1"), Some("10.5"));
    assert!(ticks < 1000);
}

#[tokio::test]
async fn test_gallery_upload_omits_coordinates() {
    let mock = Mock::new();
    let url = spawn(mock.clone()).await;
    let mut app = app_for(&url);
    app.start().await;

    app.add_images(vec![image("a.jpg"), image("b.png")], ImageSource::Gallery);
    app.run_analysis(|_| {}).await;

    let hits = mock.hits.lock().unwrap();
    assert_eq!(field(&hits, "image2"), Some("b.png"));
    assert_eq!(field(&hits, "lat1"), Some(""));
    assert_eq!(field(&hits, "lon1"), Some(""));
    assert_eq!(field(&hits, "lat2"), Some(""));
    assert_eq!(field(&hits, "chainage_km_2"), Some(""));
}

#[tokio::test]
async fn test_camera_upload_attaches_coordinates() {
    let mock = Mock::new();
    let url = spawn(mock.clone()).await;
    let mut app = app_for(&url);
    app.start().await;

    app.add_images(vec![image("photo.jpg")], ImageSource::Camera);
    app.run_analysis(|_| {}).await;

    let hits = mock.hits.lock().unwrap();
    assert_eq!(field(&hits, "lat1"), Some("28.6139"));
    assert_eq!(field(&hits, "lon1"), Some("77.209"));
}

#[tokio::test]
async fn test_upload_failure_sets_error() {
    let mock = Mock {
        upload_status: StatusCode::INTERNAL_SERVER_ERROR,
        upload_body: json!({"detail": "boom"}),
        ..Mock::new()
    };
    let url = spawn(mock.clone()).await;
    let mut app = app_for(&url);
    app.start().await;

    app.add_images(vec![image("site.jpg")], ImageSource::Gallery);
    app.run_analysis(|_| {}).await;

    let session = app.session();
    assert!(!session.is_loading());
    assert!(session.results().is_empty());
    let error = session.error().unwrap();
    assert!(error.contains("HTTP error! status: 500"));
    assert!(error.contains(&url));
    assert_eq!(mock.hits.lock().unwrap().upload, 1);
}

#[tokio::test]
async fn test_analysis_without_images_sends_nothing() {
    let mock = Mock::new();
    let url = spawn(mock.clone()).await;
    let mut app = app_for(&url);
    app.start().await;

    app.run_analysis(|_| {}).await;

    assert_eq!(
        app.session().error(),
        Some("Please select at least one image for analysis.")
    );
    assert_eq!(mock.hits.lock().unwrap().upload, 0);
}

#[tokio::test]
async fn test_analysis_with_inaccessible_server_sends_nothing() {
    let mock = Mock { health_status: StatusCode::SERVICE_UNAVAILABLE, ..Mock::new() };
    let url = spawn(mock.clone()).await;
    let mut app = app_for(&url);
    app.start().await;

    app.add_images(vec![image("site.jpg")], ImageSource::Gallery);
    app.run_analysis(|_| {}).await;

    assert_eq!(
        app.session().error(),
        Some("Cannot run analysis: Backend server is not accessible.")
    );
    assert_eq!(mock.hits.lock().unwrap().upload, 0);
}

#[tokio::test]
async fn test_generate_description() {
    let mock = Mock::new();
    let url = spawn(mock.clone()).await;
    let mut app = app_for(&url);
    app.start().await;
    app.add_images(vec![image("site.jpg")], ImageSource::Gallery);
    app.run_analysis(|_| {}).await;

    app.generate_image_description(0).await;

    assert_eq!(
        app.session().description("ab12cd34_site.jpg"),
        Some("A surveying tripod beside the road.")
    );
    assert!(app.session().describing().is_none());

    let hits = mock.hits.lock().unwrap();
    assert_eq!(hits.llm, 1);
    assert!(hits.prompts[0].contains("Detected objects: tripod"));
    assert!(hits.prompts[0].contains(r#"Confidences: {"tripod":0.91}"#));
    assert!(hits.prompts[0].contains("Chainage: 10.5 KM"));
}

#[tokio::test]
async fn test_unexpected_llm_response_keeps_descriptions() {
    let mock = Mock { llm_body: json!({}), ..Mock::new() };
    let url = spawn(mock.clone()).await;
    let mut app = app_for(&url);
    app.start().await;
    app.add_images(vec![image("site.jpg")], ImageSource::Gallery);
    app.run_analysis(|_| {}).await;

    app.generate_image_description(0).await;

    assert!(app.session().descriptions().is_empty());
    assert_eq!(
        app.session().error(),
        Some("Failed to generate description: Unexpected LLM response structure.")
    );
}

#[tokio::test]
async fn test_overall_summary() {
    let mock = Mock { llm_body: json!({"text": "One tripod found."}), ..Mock::new() };
    let url = spawn(mock.clone()).await;
    let mut app = app_for(&url);
    app.start().await;
    app.add_images(vec![image("site.jpg")], ImageSource::Gallery);
    app.run_analysis(|_| {}).await;

    app.generate_overall_summary().await;

    assert_eq!(app.session().summary(), "One tripod found.");
    assert!(!app.session().is_summarizing());
    assert_eq!(mock.hits.lock().unwrap().llm, 1);
}

#[tokio::test]
async fn test_summary_without_results_skips_llm() {
    let mock = Mock::new();
    let url = spawn(mock.clone()).await;
    let mut app = app_for(&url);

    app.generate_overall_summary().await;

    assert_eq!(app.session().summary(), NO_RESULTS_TO_SUMMARIZE);
    assert_eq!(mock.hits.lock().unwrap().llm, 0);
}

#[tokio::test]
async fn test_llm_unreachable_error_message() {
    let mock = Mock::new();
    let url = spawn(mock.clone()).await;
    let mut app = App::new(
        BackendClient::new(&url, Duration::from_secs(5)),
        LlmClient::new(closed_url().await, "optgpt:7b"),
        DeviceLocation::Unsupported,
        PositionOptions::default(),
    );
    app.start().await;
    app.add_images(vec![image("site.jpg")], ImageSource::Gallery);
    app.run_analysis(|_| {}).await;

    app.generate_overall_summary().await;

    let error = app.session().error().unwrap();
    assert!(error.starts_with("Failed to generate summary: "));
    assert!(error.ends_with("Check LLM API connection."));
    assert!(app.session().summary().is_empty());
}

#[tokio::test]
async fn test_upload_again_resets_and_rechecks() {
    let mock = Mock::new();
    let url = spawn(mock.clone()).await;
    let mut app = app_for(&url);
    app.start().await;
    app.add_images(vec![image("site.jpg")], ImageSource::Gallery);
    app.set_chainage("3.2");
    app.run_analysis(|_| {}).await;
    app.generate_image_description(0).await;

    app.upload_again().await;

    let session = app.session();
    assert!(session.selected().is_empty());
    assert!(session.results().is_empty());
    assert!(session.descriptions().is_empty());
    assert_eq!(session.chainage(), "");
    assert_eq!(mock.hits.lock().unwrap().health, 2);
}

#[tokio::test]
async fn test_download_served_image() {
    let url = spawn(Mock::new()).await;
    let backend = BackendClient::new(&url, Duration::from_secs(5));
    let dir = tempdir().unwrap();

    match backend.download_image("ab12cd34_site.jpg", dir.path()).await {
        ServedImage::Saved(path) => {
            assert_eq!(std::fs::read(path).unwrap(), vec![0xFF, 0xD8, 0xFF]);
        }
        other => panic!("unexpected: {:?}", other),
    }

    assert!(matches!(
        backend.download_image("missing.jpg", dir.path()).await,
        ServedImage::Placeholder(_)
    ));
}

#[tokio::test]
async fn test_download_rejects_paths_outside_target() {
    let url = spawn(Mock::new()).await;
    let backend = BackendClient::new(&url, Duration::from_secs(5));
    let target = tempdir().unwrap();
    let outside = tempdir().unwrap();
    let dir = target.path().join("uploads");

    let absolute = outside.path().join("ab12cd34_escaped.jpg");
    assert!(matches!(
        backend.download_image(absolute.to_str().unwrap(), &dir).await,
        ServedImage::Placeholder(_)
    ));
    assert!(!absolute.exists());

    assert!(matches!(
        backend.download_image("../ab12cd34_escaped.jpg", &dir).await,
        ServedImage::Placeholder(_)
    ));
    assert!(!target.path().join("ab12cd34_escaped.jpg").exists());
}
