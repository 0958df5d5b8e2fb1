//! HttpBackend against a mock try-on service

use serde_json::json;
use tryon_core::api::{HttpBackend, TryOnBackend};
use tryon_core::models::TryOnRequest;
use tryon_core::{ClientConfig, ImageRef, LocalFile, RemoteId, TryOnError};
use wiremock::matchers::{body_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn backend(server: &MockServer) -> HttpBackend {
    HttpBackend::new(&ClientConfig::new(server.uri())).unwrap()
}

fn jpeg() -> LocalFile {
    LocalFile::new("me.jpg", "image/jpeg", b"jpeg-bytes".to_vec())
}

#[tokio::test]
async fn test_health() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "healthy", "gemini_api": "connected"})),
        )
        .mount(&server)
        .await;

    let health = backend(&server).await.health().await.unwrap();
    assert!(health.is_healthy());
    assert!(health.dependency_connected());
}

#[tokio::test]
async fn test_create_user_sends_name() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users"))
        .and(body_json(json!({"name": "Anonymous User"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7,
            "name": "Anonymous User",
            "created_at": "2024-05-01T10:20:30.000001"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let identity = backend(&server)
        .await
        .create_user("Anonymous User")
        .await
        .unwrap();
    assert_eq!(identity.id, RemoteId(7));
}

#[tokio::test]
async fn test_list_products() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "name": "Kurta", "filepath": "products/1.jpg", "created_at": "2024-05-01T10:20:30"},
            {"id": 2, "name": "Tee", "image_url": "/static/products/2.jpg", "created_at": "2024-05-02T10:20:30Z"}
        ])))
        .mount(&server)
        .await;

    let products = backend(&server).await.list_products().await.unwrap();
    assert_eq!(products.len(), 2);
    assert_eq!(
        products[0].image_ref,
        ImageRef::StoragePath("products/1.jpg".to_string())
    );
    assert_eq!(
        products[1].image_ref,
        ImageRef::Url("/static/products/2.jpg".to_string())
    );
}

#[tokio::test]
async fn test_upload_user_photo_is_multipart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload-user-photo"))
        .and(body_string_contains("name=\"user_id\""))
        .and(body_string_contains("filename=\"me.jpg\""))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"user_id": 7, "filepath": "users/7/photos/me.jpg"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let photo = backend(&server)
        .await
        .upload_user_photo(RemoteId(7), &jpeg())
        .await
        .unwrap();
    assert_eq!(photo.id, RemoteId(7));
}

#[tokio::test]
async fn test_upload_product_photo_returns_entry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload-product-photo"))
        .and(body_string_contains("name=\"name\""))
        .and(body_string_contains("Blue Shirt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 12,
            "name": "Blue Shirt",
            "filepath": "products/shirt.jpg",
            "created_at": "2024-05-01T10:20:30"
        })))
        .mount(&server)
        .await;

    let entry = backend(&server)
        .await
        .upload_product_photo("Blue Shirt", &jpeg())
        .await
        .unwrap();
    assert_eq!(entry.id, RemoteId(12));
    assert_eq!(entry.name, "Blue Shirt");
}

#[tokio::test]
async fn test_error_detail_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tryon"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({"detail": "missing product"})))
        .mount(&server)
        .await;

    let err = backend(&server)
        .await
        .create_tryon(TryOnRequest {
            user_id: RemoteId(1),
            product_id: RemoteId(99),
        })
        .await
        .unwrap_err();

    match &err {
        TryOnError::Http { status, detail } => {
            assert_eq!(*status, 422);
            assert_eq!(detail.as_deref(), Some("missing product"));
        }
        other => panic!("expected HTTP error, got {:?}", other),
    }
    assert_eq!(err.user_message("Try-on failed"), "missing product");
}

#[tokio::test]
async fn test_error_without_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let err = backend(&server).await.list_products().await.unwrap_err();
    assert!(matches!(err, TryOnError::Http { status: 500, detail: None }));
}

#[tokio::test]
async fn test_malformed_success_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .mount(&server)
        .await;

    let err = backend(&server).await.health().await.unwrap_err();
    assert!(matches!(err, TryOnError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_get_tryon_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tryon/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 5,
            "user_id": 1,
            "product_id": 2,
            "input_user_photo_path": "users/1/photos/a.jpg",
            "input_product_photo_path": "products/b.jpg",
            "output_image_path": "results/tryon_5.png",
            "created_at": "2024-05-01T10:20:30"
        })))
        .mount(&server)
        .await;

    let record = backend(&server)
        .await
        .get_tryon_session(RemoteId(5))
        .await
        .unwrap();
    assert_eq!(
        record.output_image_ref(),
        Some(ImageRef::StoragePath("results/tryon_5.png".to_string()))
    );
}

#[tokio::test]
async fn test_fetch_asset() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/static/results/1.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x89, b'P', b'N', b'G']))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/static/results/missing.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let backend = backend(&server).await;
    let bytes = backend
        .fetch_asset(&format!("{}/static/results/1.png", server.uri()))
        .await
        .unwrap();
    assert_eq!(bytes, vec![0x89, b'P', b'N', b'G']);

    let err = backend
        .fetch_asset(&format!("{}/static/results/missing.png", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, TryOnError::Http { status: 404, .. }));
}

#[tokio::test]
async fn test_unreachable_backend_is_network_error() {
    // Nothing listens on a port whose listener was just closed
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let backend = HttpBackend::new(&ClientConfig::new(format!("http://127.0.0.1:{}", port))).unwrap();
    let err = backend.health().await.unwrap_err();
    assert!(matches!(err, TryOnError::Network(_)));
    assert!(err.is_remote());
}
