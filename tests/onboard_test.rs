use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use contacts_backend::config::AppConfig;
use contacts_backend::services::contacts::ContactService;
use contacts_backend::services::image_pipeline::ImagePipeline;
use contacts_backend::services::store::{
    LocalObjectStore, ObjectStore, StoreError, UploadDescriptor,
};
use contacts_backend::{AppState, create_app};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "---------------------------123456789012345678901234567";

async fn setup_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .connect("sqlite::memory:")
        .await
        .unwrap();

    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}

async fn setup_app_with_store(store: Arc<dyn ObjectStore>) -> (Router, SqlitePool) {
    let pool = setup_pool().await;
    let config = AppConfig::development();
    let pipeline = ImagePipeline::new(store.clone(), &config);
    let contacts = Arc::new(ContactService::new(pool.clone(), pipeline, &config));

    let app = create_app(AppState {
        db: pool.clone(),
        store,
        contacts,
    });
    (app, pool)
}

async fn setup_app() -> (Router, SqlitePool, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(LocalObjectStore::new(
        dir.path(),
        "contacts".to_string(),
        "http://localhost:9000".to_string(),
    ));
    let (app, pool) = setup_app_with_store(store).await;
    (app, pool, dir)
}

fn multipart_body(contact_json: Option<&str>, picture: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();

    if let Some(contact) = contact_json {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\n\
                Content-Disposition: form-data; name=\"contact\"\r\n\r\n\
                {contact}\r\n"
            )
            .as_bytes(),
        );
    }

    if let Some((filename, bytes)) = picture {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\n\
                Content-Disposition: form-data; name=\"picture\"; filename=\"{filename}\"\r\n\
                Content-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn post_contacts(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/contacts")
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    let img = image::DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
        width,
        height,
        image::Rgba([10, 120, 200, 255]),
    ));
    img.write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

async fn body_json(response: axum::http::Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn row_count(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM contacts")
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_onboard_without_image_uses_defaults() {
    let (app, pool, _dir) = setup_app().await;
    let defaults = AppConfig::development();

    let body = multipart_body(Some(r#"{"first_name":"Ana","phone":"555-1000"}"#), None);
    let response = app.oneshot(post_contacts(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;

    assert!(json["contact_id"].as_i64().unwrap() > 0);
    assert_eq!(json["first_name"], "Ana");
    assert_eq!(json["phone"], "555-1000");
    assert!(json["last_name"].is_null());
    assert_eq!(json["img_url"], defaults.default_img_url.as_str());
    assert_eq!(json["thumbnail_url"], defaults.default_thumbnail_url.as_str());

    let date_added = json["date_added"].as_str().unwrap();
    chrono::NaiveDateTime::parse_from_str(date_added, "%Y-%m-%d %H:%M:%S").unwrap();

    assert_eq!(row_count(&pool).await, 1);
    let null_last_names: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM contacts WHERE last_name IS NULL")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(null_last_names, 1);
}

#[tokio::test]
async fn test_onboard_with_image_uploads_both_variants() {
    let (app, pool, dir) = setup_app().await;

    let picture = png_bytes(256, 64);
    let body = multipart_body(
        Some(r#"{"first_name":"Bea","last_name":"Reyes"}"#),
        Some(("portrait.png", &picture)),
    );
    let response = app.oneshot(post_contacts(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;

    let img_url = json["img_url"].as_str().unwrap();
    let thumbnail_url = json["thumbnail_url"].as_str().unwrap();
    assert!(img_url.starts_with("http://localhost:9000/contacts/fullsize/"));
    assert!(thumbnail_url.starts_with("http://localhost:9000/contacts/thumbnail/"));

    // One run, one shared prefix; the thumbnail keeps the t- marker.
    let original_name = img_url.rsplit('/').next().unwrap();
    let thumbnail_name = thumbnail_url.rsplit('/').next().unwrap();
    assert!(original_name.ends_with("portrait.png"));
    assert!(thumbnail_name.ends_with("t-portrait.png"));
    assert_eq!(
        original_name.strip_suffix("portrait.png").unwrap(),
        thumbnail_name.strip_suffix("t-portrait.png").unwrap()
    );

    // The stored thumbnail really is 128x128.
    let thumbnail_file = dir.path().join("contacts/thumbnail").join(thumbnail_name);
    let thumb = image::open(&thumbnail_file).unwrap();
    assert_eq!((thumb.width(), thumb.height()), (128, 128));

    let original_file = dir.path().join("contacts/fullsize").join(original_name);
    assert_eq!(tokio::fs::read(&original_file).await.unwrap(), picture);

    assert_eq!(row_count(&pool).await, 1);
}

#[tokio::test]
async fn test_identical_onboards_create_distinct_contacts() {
    let (app, pool, _dir) = setup_app().await;

    let payload = r#"{"first_name":"Twin","phone":"555-2000"}"#;

    let first = app
        .clone()
        .oneshot(post_contacts(multipart_body(Some(payload), None)))
        .await
        .unwrap();
    let second = app
        .oneshot(post_contacts(multipart_body(Some(payload), None)))
        .await
        .unwrap();

    let first_id = body_json(first).await["contact_id"].as_i64().unwrap();
    let second_id = body_json(second).await["contact_id"].as_i64().unwrap();

    assert_ne!(first_id, second_id);
    assert_eq!(row_count(&pool).await, 2);
}

#[tokio::test]
async fn test_caller_supplied_image_urls_are_overwritten() {
    let (app, _pool, _dir) = setup_app().await;
    let defaults = AppConfig::development();

    let body = multipart_body(
        Some(r#"{"first_name":"Cleo","img_url":"http://elsewhere/x.png","thumbnail_url":"http://elsewhere/t-x.png"}"#),
        None,
    );
    let response = app.oneshot(post_contacts(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["img_url"], defaults.default_img_url.as_str());
    assert_eq!(json["thumbnail_url"], defaults.default_thumbnail_url.as_str());
}

#[tokio::test]
async fn test_empty_picture_part_falls_back_to_defaults() {
    let (app, _pool, _dir) = setup_app().await;
    let defaults = AppConfig::development();

    let body = multipart_body(
        Some(r#"{"first_name":"Dion"}"#),
        Some(("empty.png", b"".as_slice())),
    );
    let response = app.oneshot(post_contacts(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["img_url"], defaults.default_img_url.as_str());
}

#[tokio::test]
async fn test_missing_contact_part_is_rejected() {
    let (app, pool, _dir) = setup_app().await;

    let picture = png_bytes(32, 32);
    let body = multipart_body(None, Some(("portrait.png", &picture)));
    let response = app.oneshot(post_contacts(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["ok"], false);
    assert_eq!(json["err"], "no contact supplied");

    assert_eq!(row_count(&pool).await, 0);
}

#[tokio::test]
async fn test_malformed_contact_json_is_rejected() {
    let (app, pool, _dir) = setup_app().await;

    let body = multipart_body(Some("this is not json"), None);
    let response = app.oneshot(post_contacts(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["ok"], false);
    assert_eq!(
        json["message"],
        "contact information was not received; nothing was saved"
    );

    assert_eq!(row_count(&pool).await, 0);
}

/// Store whose uploads always fail, standing in for an unreachable backend.
struct UnreachableStore;

#[async_trait]
impl ObjectStore for UnreachableStore {
    async fn ensure_bucket(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn put_public(
        &self,
        _key: &str,
        _content_type: &str,
        _data: Vec<u8>,
    ) -> Result<UploadDescriptor, StoreError> {
        Err(StoreError::Upload("connection refused".to_string()))
    }
}

#[tokio::test]
async fn test_upload_failure_persists_nothing() {
    let (app, pool) = setup_app_with_store(Arc::new(UnreachableStore)).await;

    let picture = png_bytes(64, 64);
    let body = multipart_body(
        Some(r#"{"first_name":"Eve","phone":"555-3000"}"#),
        Some(("portrait.png", &picture)),
    );
    let response = app.oneshot(post_contacts(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["ok"], false);
    assert_eq!(
        json["message"],
        "error while processing image; information was not saved"
    );
    assert!(json["err"].as_str().unwrap().contains("connection refused"));

    assert_eq!(row_count(&pool).await, 0);
}

#[tokio::test]
async fn test_traversal_filename_is_reduced_to_its_basename() {
    let (app, _pool, dir) = setup_app().await;

    let picture = png_bytes(32, 32);
    let body = multipart_body(
        Some(r#"{"first_name":"Fay"}"#),
        Some(("../../etc/avatar.png", &picture)),
    );
    let response = app.oneshot(post_contacts(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;

    let img_url = json["img_url"].as_str().unwrap();
    let original_name = img_url.rsplit('/').next().unwrap();
    assert!(original_name.ends_with("avatar.png"));
    assert!(!img_url.contains(".."));

    // Nothing escaped the bucket directory.
    assert!(dir.path().join("contacts/fullsize").is_dir());
    assert!(!dir.path().join("etc").exists());
}
