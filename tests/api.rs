use std::sync::{Arc, Mutex};
use std::time::Duration;

use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde_json::{json, Value};

use storefront::auth::{create_token, hash_password};
use storefront::config::{AuthConfig, UploadBackend, UploadConfig};
use storefront::db::models::NewUser;
use storefront::db::MemoryStorage;
use storefront::images::{ImageHost, ImageHostError, LocalDiskHost};
use storefront::storage::Storage;
use storefront::{routes, AppState};

const SECRET: &str = "test-secret";
const MAX_UPLOAD: usize = 5 * 1024 * 1024;
const BOUNDARY: &str = "----storefront-test-boundary";

/// Pretends to be a CDN and remembers which assets it was asked to delete.
#[derive(Default)]
struct RecordingHost {
    deleted: Mutex<Vec<String>>,
}

impl RecordingHost {
    fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageHost for RecordingHost {
    async fn upload(
        &self,
        _bytes: Vec<u8>,
        _mime: &str,
        ext: &str,
    ) -> Result<String, ImageHostError> {
        Ok(format!("https://cdn.test/{}.{ext}", uuid::Uuid::new_v4()))
    }

    async fn delete(&self, url: &str) -> Result<(), ImageHostError> {
        self.deleted.lock().unwrap().push(url.to_string());
        Ok(())
    }

    fn owns(&self, url: &str) -> bool {
        url.starts_with("https://cdn.test/")
    }
}

fn state(storage: Arc<dyn Storage>, images: Arc<dyn ImageHost>) -> web::Data<AppState> {
    web::Data::new(AppState {
        storage,
        images,
        auth: AuthConfig {
            jwt_secret: SECRET.to_string(),
            token_ttl_hours: 1,
        },
        max_upload_bytes: MAX_UPLOAD,
    })
}

fn bearer() -> (header::HeaderName, String) {
    let token = create_token("admin", SECRET, 1).unwrap();
    (header::AUTHORIZATION, format!("Bearer {token}"))
}

macro_rules! app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data($state.clone())
                .configure(routes::configure),
        )
        .await
    };
    ($state:expr, $uploads:expr) => {
        test::init_service(
            App::new()
                .app_data($state.clone())
                .configure(routes::configure)
                .service(routes::uploads_service(&$uploads)),
        )
        .await
    };
}

fn multipart(filename: &str, mime: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: {mime}\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(filename: &str, mime: &str, bytes: &[u8]) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/api/upload")
        .insert_header(bearer())
        .insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        ))
        .set_payload(multipart(filename, mime, bytes))
}

fn png_of_size(size: usize) -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];
    bytes.resize(size, 0);
    bytes
}

#[actix_web::test]
async fn category_product_lifecycle() {
    let data = state(Arc::new(MemoryStorage::new()), Arc::new(RecordingHost::default()));
    let app = app!(data);

    let req = test::TestRequest::post()
        .uri("/api/categories")
        .insert_header(bearer())
        .set_json(json!({ "name": "Abayas", "slug": "abayas", "order": 0 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let category: Value = test::read_body_json(resp).await;
    let category_id = category["id"].as_i64().unwrap();

    let req = test::TestRequest::post()
        .uri("/api/products")
        .insert_header(bearer())
        .set_json(json!({
            "name": "Black Abaya",
            "slug": "black-abaya",
            "price": 12000,
            "categoryId": category_id
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let product: Value = test::read_body_json(resp).await;

    let req = test::TestRequest::get()
        .uri("/api/products/slug/black-abaya")
        .to_request();
    let fetched: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fetched["categoryId"].as_i64(), Some(category_id));
    assert_eq!(fetched["primaryImageUrl"], Value::Null);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/categories/{category_id}"))
        .insert_header(bearer())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["message"].as_str().unwrap().contains("existing products"));

    let req = test::TestRequest::delete()
        .uri(&format!("/api/products/{}", product["id"]))
        .insert_header(bearer())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({ "success": true }));

    let req = test::TestRequest::delete()
        .uri(&format!("/api/categories/{category_id}"))
        .insert_header(bearer())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri(&format!("/api/categories/{category_id}"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn duplicate_slug_is_rejected() {
    let storage = Arc::new(MemoryStorage::new());
    let data = state(storage.clone(), Arc::new(RecordingHost::default()));
    let app = app!(data);

    for expected in [StatusCode::CREATED, StatusCode::BAD_REQUEST] {
        let req = test::TestRequest::post()
            .uri("/api/categories")
            .insert_header(bearer())
            .set_json(json!({ "name": "Abayas", "slug": "abayas" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), expected);
    }
    assert_eq!(storage.list_categories().unwrap().len(), 1);
}

#[actix_web::test]
async fn invalid_bodies_are_bad_requests() {
    let data = state(Arc::new(MemoryStorage::new()), Arc::new(RecordingHost::default()));
    let app = app!(data);

    let req = test::TestRequest::post()
        .uri("/api/categories")
        .insert_header(bearer())
        .set_json(json!({ "slug": "no-name" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["message"].is_string());

    let req = test::TestRequest::post()
        .uri("/api/products")
        .insert_header(bearer())
        .set_json(json!({ "name": "Orphan", "price": 10, "categoryId": 999 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get().uri("/api/products/abc").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn primary_image_is_lowest_order() {
    let data = state(Arc::new(MemoryStorage::new()), Arc::new(RecordingHost::default()));
    let app = app!(data);

    let req = test::TestRequest::post()
        .uri("/api/categories")
        .insert_header(bearer())
        .set_json(json!({ "name": "Abayas" }))
        .to_request();
    let category: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(category["slug"], "abayas");
    let category_id = category["id"].as_i64().unwrap();

    for order in [3, 1, 2] {
        let req = test::TestRequest::post()
            .uri(&format!("/api/categories/{category_id}/images"))
            .insert_header(bearer())
            .set_json(json!({ "url": format!("https://cdn.test/{order}.jpg"), "order": order }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let req = test::TestRequest::get()
        .uri("/api/categories/slug/abayas")
        .to_request();
    let fetched: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fetched["primaryImageUrl"], "https://cdn.test/1.jpg");

    let req = test::TestRequest::get()
        .uri(&format!("/api/categories/{category_id}/images"))
        .to_request();
    let images: Value = test::call_and_read_body_json(&app, req).await;
    let orders: Vec<i64> = images
        .as_array()
        .unwrap()
        .iter()
        .map(|image| image["order"].as_i64().unwrap())
        .collect();
    assert_eq!(orders, vec![1, 2, 3]);
}

#[actix_web::test]
async fn deleting_parent_purges_hosted_images() {
    let host = Arc::new(RecordingHost::default());
    let data = state(Arc::new(MemoryStorage::new()), host.clone());
    let app = app!(data);

    let req = test::TestRequest::post()
        .uri("/api/categories")
        .insert_header(bearer())
        .set_json(json!({
            "name": "Prayer Accessories",
            "imageUrls": ["https://cdn.test/mat.jpg", "https://images.unsplash.com/beads.jpg"]
        }))
        .to_request();
    let category: Value = test::call_and_read_body_json(&app, req).await;

    let req = test::TestRequest::delete()
        .uri(&format!("/api/categories/{}", category["id"]))
        .insert_header(bearer())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(host.deleted(), vec!["https://cdn.test/mat.jpg".to_string()]);
}

#[actix_web::test]
async fn settings_are_created_once_and_patched() {
    let storage = Arc::new(MemoryStorage::new());
    let data = state(storage.clone(), Arc::new(RecordingHost::default()));
    let app = app!(data);

    let req = test::TestRequest::get().uri("/api/settings").to_request();
    let first: Value = test::call_and_read_body_json(&app, req).await;
    let req = test::TestRequest::get().uri("/api/settings").to_request();
    let second: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(first, second);
    assert_eq!(storage.settings_rows(), 1);
    assert!(first["storeName"].is_string());

    actix_web::rt::time::sleep(Duration::from_millis(20)).await;

    let req = test::TestRequest::patch()
        .uri("/api/settings")
        .insert_header(bearer())
        .set_json(json!({ "whatsapp": "2348000000000" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri("/api/settings").to_request();
    let patched: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(patched["whatsapp"], "2348000000000");
    assert_eq!(patched["storeName"], first["storeName"]);

    let before: NaiveDateTime = serde_json::from_value(first["updatedAt"].clone()).unwrap();
    let after: NaiveDateTime = serde_json::from_value(patched["updatedAt"].clone()).unwrap();
    assert!(after > before);
}

#[actix_web::test]
async fn whatsapp_link_uses_store_number() {
    let data = state(Arc::new(MemoryStorage::new()), Arc::new(RecordingHost::default()));
    let app = app!(data);

    let req = test::TestRequest::post()
        .uri("/api/categories")
        .insert_header(bearer())
        .set_json(json!({ "name": "Abayas" }))
        .to_request();
    let category: Value = test::call_and_read_body_json(&app, req).await;
    let req = test::TestRequest::post()
        .uri("/api/products")
        .insert_header(bearer())
        .set_json(json!({ "name": "Black Abaya", "price": 12000, "categoryId": category["id"] }))
        .to_request();
    let product: Value = test::call_and_read_body_json(&app, req).await;

    let req = test::TestRequest::patch()
        .uri("/api/settings")
        .insert_header(bearer())
        .set_json(json!({ "whatsapp": "+234 800 000 0000" }))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/products/{}/whatsapp", product["id"]))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(body["url"]
        .as_str()
        .unwrap()
        .starts_with("https://wa.me/2348000000000?text="));

    let req = test::TestRequest::get()
        .uri("/api/products/999/whatsapp")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn mutations_require_token() {
    let data = state(Arc::new(MemoryStorage::new()), Arc::new(RecordingHost::default()));
    let app = app!(data);

    let req = test::TestRequest::post()
        .uri("/api/categories")
        .set_json(json!({ "name": "Abayas" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let forged = create_token("admin", "wrong-secret", 1).unwrap();
    let req = test::TestRequest::delete()
        .uri("/api/hero-images/1")
        .insert_header((header::AUTHORIZATION, format!("Bearer {forged}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get().uri("/api/categories").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn login_issues_usable_token() {
    let storage = Arc::new(MemoryStorage::new());
    storage
        .create_user(NewUser {
            username: "admin".to_string(),
            password: hash_password("admin123").unwrap(),
        })
        .unwrap();
    let data = state(storage, Arc::new(RecordingHost::default()));
    let app = app!(data);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "username": "admin", "password": "nope" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "username": "admin", "password": "admin123" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["username"], "admin");
    let token = body["token"].as_str().unwrap();

    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
        .to_request();
    let me: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(me, json!({ "username": "admin" }));
}

#[actix_web::test]
async fn upload_validation() {
    let dir = tempfile::tempdir().unwrap();
    let uploads = UploadConfig {
        backend: UploadBackend::Local,
        dir: dir.path().to_string_lossy().into_owned(),
        public_path: "/uploads".to_string(),
        max_bytes: MAX_UPLOAD,
    };
    let host = LocalDiskHost::new(dir.path(), &uploads.public_path).unwrap();
    let data = state(Arc::new(MemoryStorage::new()), Arc::new(host));
    let app = app!(data, uploads);

    let req = upload_request("big.png", "image/png", &png_of_size(6 * 1024 * 1024)).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "File size exceeds 5MB limit");

    let req = upload_request("notes.txt", "text/plain", b"hello").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Only image files are allowed");

    let image = png_of_size(2 * 1024 * 1024);
    let req = upload_request("photo.png", "image/png", &image).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    let url = body["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/uploads/") && url.ends_with(".png"));

    let req = test::TestRequest::get().uri(&url).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/png"
    );
    let served = test::read_body(resp).await;
    assert_eq!(served.len(), image.len());
}

#[actix_web::test]
async fn upload_without_file_field() {
    let data = state(Arc::new(MemoryStorage::new()), Arc::new(RecordingHost::default()));
    let app = app!(data);

    let body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"caption\"\r\n\r\nhello\r\n--{BOUNDARY}--\r\n"
    );
    let req = test::TestRequest::post()
        .uri("/api/upload")
        .insert_header(bearer())
        .insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        ))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "No file uploaded");
}

macro_rules! create {
    ($app:expr, $uri:expr, $body:expr $(,)?) => {{
        let uri: &str = &$uri;
        let req = test::TestRequest::post()
            .uri(uri)
            .insert_header(bearer())
            .set_json($body)
            .to_request();
        let resp = test::call_service(&$app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED, "POST {uri}");
        let created: Value = test::read_body_json(resp).await;
        created
    }};
}

#[actix_web::test]
async fn product_delete_removes_its_images() {
    let host = Arc::new(RecordingHost::default());
    let data = state(Arc::new(MemoryStorage::new()), host.clone());
    let app = app!(data);

    let category = create!(app, "/api/categories", json!({ "name": "Abayas" }));
    let product = create!(
        app,
        "/api/products",
        json!({ "name": "Black Abaya", "price": 12000, "categoryId": category["id"] }),
    );
    let product_id = product["id"].as_i64().unwrap();

    for (name, order) in [("c", 3), ("a", 1), ("b", 2), ("late", 1)] {
        create!(
            app,
            format!("/api/products/{product_id}/images"),
            json!({ "url": format!("https://cdn.test/{name}.jpg"), "order": order }),
        );
    }

    let req = test::TestRequest::get()
        .uri(&format!("/api/products/{product_id}"))
        .to_request();
    let fetched: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fetched["primaryImageUrl"], "https://cdn.test/a.jpg");

    let req = test::TestRequest::delete()
        .uri(&format!("/api/products/{product_id}"))
        .insert_header(bearer())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri(&format!("/api/products/{product_id}/images"))
        .to_request();
    let images: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(images, json!([]));

    let mut deleted = host.deleted();
    deleted.sort();
    assert_eq!(
        deleted,
        ["a", "b", "c", "late"]
            .iter()
            .map(|name| format!("https://cdn.test/{name}.jpg"))
            .collect::<Vec<_>>()
    );
}

#[actix_web::test]
async fn patch_null_clears_optional_fields() {
    let data = state(Arc::new(MemoryStorage::new()), Arc::new(RecordingHost::default()));
    let app = app!(data);

    let req = test::TestRequest::patch()
        .uri("/api/settings")
        .insert_header(bearer())
        .set_json(json!({ "facebook": "https://facebook.com/shop" }))
        .to_request();
    let settings: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(settings["facebook"], "https://facebook.com/shop");

    let req = test::TestRequest::patch()
        .uri("/api/settings")
        .insert_header(bearer())
        .set_json(json!({ "facebook": null }))
        .to_request();
    let settings: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(settings["facebook"], Value::Null);

    let category = create!(app, "/api/categories", json!({ "name": "Abayas" }));
    let product = create!(
        app,
        "/api/products",
        json!({ "name": "Black Abaya", "price": 12000, "size": "XL", "categoryId": category["id"] }),
    );
    assert_eq!(product["size"], "XL");

    let uri = format!("/api/products/{}", product["id"]);
    let req = test::TestRequest::patch()
        .uri(&uri)
        .insert_header(bearer())
        .set_json(json!({ "price": 9000 }))
        .to_request();
    let patched: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(patched["size"], "XL");

    let req = test::TestRequest::patch()
        .uri(&uri)
        .insert_header(bearer())
        .set_json(json!({ "size": null }))
        .to_request();
    let patched: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(patched["size"], Value::Null);
    assert_eq!(patched["name"], "Black Abaya");
}

#[actix_web::test]
async fn single_image_deletes() {
    let host = Arc::new(RecordingHost::default());
    let data = state(Arc::new(MemoryStorage::new()), host.clone());
    let app = app!(data);

    for uri in [
        "/api/category-images/999",
        "/api/product-images/999",
        "/api/hero-images/999",
    ] {
        let req = test::TestRequest::delete()
            .uri(uri)
            .insert_header(bearer())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "DELETE {uri}");
    }

    let category = create!(app, "/api/categories", json!({ "name": "Abayas" }));
    let image = create!(
        app,
        format!("/api/categories/{}/images", category["id"]),
        json!({ "url": "https://cdn.test/cat.jpg" }),
    );
    let hero = create!(
        app,
        "/api/hero-images",
        json!({ "url": "https://cdn.test/hero.jpg", "order": 1 }),
    );

    let req = test::TestRequest::delete()
        .uri(&format!("/api/category-images/{}", image["id"]))
        .insert_header(bearer())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({ "success": true }));

    let req = test::TestRequest::delete()
        .uri(&format!("/api/hero-images/{}", hero["id"]))
        .insert_header(bearer())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({ "success": true }));

    assert_eq!(
        host.deleted(),
        vec![
            "https://cdn.test/cat.jpg".to_string(),
            "https://cdn.test/hero.jpg".to_string()
        ]
    );

    let req = test::TestRequest::get().uri("/api/hero-images").to_request();
    let heroes: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(heroes, json!([]));

    let req = test::TestRequest::delete()
        .uri(&format!("/api/hero-images/{}", hero["id"]))
        .insert_header(bearer())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn shared_image_url_survives_category_delete() {
    let host = Arc::new(RecordingHost::default());
    let data = state(Arc::new(MemoryStorage::new()), host.clone());
    let app = app!(data);

    let category = create!(
        app,
        "/api/categories",
        json!({
            "name": "Abayas",
            "imageUrls": ["https://cdn.test/shared.jpg", "https://cdn.test/own.jpg"]
        }),
    );
    create!(
        app,
        "/api/hero-images",
        json!({ "url": "https://cdn.test/shared.jpg" }),
    );

    let req = test::TestRequest::delete()
        .uri(&format!("/api/categories/{}", category["id"]))
        .insert_header(bearer())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(host.deleted(), vec!["https://cdn.test/own.jpg".to_string()]);

    let req = test::TestRequest::get().uri("/api/hero-images").to_request();
    let heroes: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(heroes[0]["url"], "https://cdn.test/shared.jpg");
}

#[actix_web::test]
async fn update_to_taken_slug_is_rejected() {
    let data = state(Arc::new(MemoryStorage::new()), Arc::new(RecordingHost::default()));
    let app = app!(data);

    create!(app, "/api/categories", json!({ "name": "Abayas" }));
    let other = create!(app, "/api/categories", json!({ "name": "Hijabs" }));

    let req = test::TestRequest::patch()
        .uri(&format!("/api/categories/{}", other["id"]))
        .insert_header(bearer())
        .set_json(json!({ "slug": "abayas" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri(&format!("/api/categories/{}", other["id"]))
        .to_request();
    let unchanged: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(unchanged["slug"], "hijabs");

    let first = create!(
        app,
        "/api/products",
        json!({ "name": "Black Abaya", "price": 100, "categoryId": other["id"] }),
    );
    let second = create!(
        app,
        "/api/products",
        json!({ "name": "Grey Abaya", "price": 100, "categoryId": other["id"] }),
    );
    let req = test::TestRequest::patch()
        .uri(&format!("/api/products/{}", second["id"]))
        .insert_header(bearer())
        .set_json(json!({ "slug": first["slug"] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
