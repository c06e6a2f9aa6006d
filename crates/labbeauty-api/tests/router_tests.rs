//! Router tests against in-memory repositories and a mock object store.

use async_trait::async_trait;
use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::{TestResponse, TestServer};
use bytes::Bytes;
use labbeauty_api::auth::password::hash_password;
use labbeauty_api::auth::SessionKeys;
use labbeauty_api::{setup_routes, AppState, HttpSettings, MediaCoordinator, NotificationSink, Notifier};
use labbeauty_core::{Category, Service};
use labbeauty_db::test_helpers::{InMemoryPhotoStore, InMemorySubCategoryStore, InMemoryUserStore};
use labbeauty_db::UserStore;
use labbeauty_storage::test_helpers::MockStorage;
use labbeauty_storage::{RetryPolicy, RetryingStorage};
use labbeauty_worker::BackgroundTasks;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const SECRET: &str = "router-tests-secret-0123456789abcdef";
const EMAIL: &str = "admin@cosmetcab.dp.ua";
const PASSWORD: &str = "correct horse battery";
const PNG: &[u8] = b"\x89PNG\r\n\x1a\n fake image";

#[derive(Clone, Default)]
struct RecordingNotifier {
    sent: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, text: &str) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

struct TestApp {
    server: TestServer,
    storage: MockStorage,
    notifier: RecordingNotifier,
    users: InMemoryUserStore,
    tasks: BackgroundTasks,
}

impl TestApp {
    async fn drain(&self) {
        assert!(self.tasks.drain(Duration::from_secs(5)).await);
    }

    async fn login(&self) -> String {
        let response = self
            .server
            .post("/user/login")
            .json(&json!({ "email": EMAIL, "password": PASSWORD }))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        session_cookie(&response)
    }
}

fn session_cookie(response: &TestResponse) -> String {
    let set_cookie = response
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .expect("login sets a cookie")
        .to_string();
    set_cookie
        .split(';')
        .next()
        .expect("cookie has a value")
        .to_string()
}

fn http_settings(limiter_enabled: bool) -> HttpSettings {
    HttpSettings {
        cors_origins: vec!["https://cosmetcab.dp.ua".to_string()],
        limiter_enabled,
        limiter_rps: 1.0,
        limiter_burst: 2,
    }
}

async fn test_app_with(settings: HttpSettings) -> TestApp {
    let storage = MockStorage::new();
    let tasks = BackgroundTasks::new();
    let notifier = RecordingNotifier::default();
    let users = InMemoryUserStore::default();

    users
        .insert("Admin", EMAIL, &hash_password(PASSWORD).unwrap(), true)
        .await
        .unwrap();
    users
        .insert("Dormant", "dormant@cosmetcab.dp.ua", &hash_password(PASSWORD).unwrap(), false)
        .await
        .unwrap();

    let retrying = RetryingStorage::new(
        Arc::new(storage.clone()),
        RetryPolicy::new(3, Duration::from_millis(5)),
    );
    let sink = NotificationSink::new(Arc::new(notifier.clone()), tasks.clone());

    let state = Arc::new(AppState {
        categories: Arc::new(InMemoryPhotoStore::<Category>::new()),
        services: Arc::new(InMemoryPhotoStore::<Service>::new()),
        subcategories: Arc::new(InMemorySubCategoryStore::default()),
        users: Arc::new(users.clone()),
        media: MediaCoordinator::new(Arc::new(retrying), tasks.clone(), sink),
        notifier: Arc::new(notifier.clone()),
        sessions: Arc::new(SessionKeys::new(SECRET, 3600, false)),
        tasks: tasks.clone(),
        pool: None,
        environment: "test".to_string(),
    });

    let app = setup_routes(state, &settings);
    let server = TestServer::new(app.into_make_service()).expect("test server starts");
    TestApp {
        server,
        storage,
        notifier,
        users,
        tasks,
    }
}

async fn test_app() -> TestApp {
    test_app_with(http_settings(false)).await
}

fn category_form(title: &str, description: &str, filename: &str) -> MultipartForm {
    MultipartForm::new()
        .add_text("title", title.to_string())
        .add_text("description", description.to_string())
        .add_part(
            "photo",
            Part::bytes(Bytes::from_static(PNG))
                .file_name(filename.to_string())
                .mime_type("image/png"),
        )
}

#[tokio::test]
async fn create_then_get_category_returns_same_photo_url() {
    let app = test_app().await;
    let cookie = app.login().await;

    let response = app
        .server
        .post("/categories")
        .add_header("Cookie", cookie.clone())
        .multipart(category_form(
            "Manicure",
            "Classic manicure service for clients",
            "nails.png",
        ))
        .await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body: Value = response.json();
    let id = body["category"]["id"].as_i64().expect("numeric id");
    let photo_url = body["category"]["photo_url"].as_str().unwrap().to_string();
    assert!(photo_url.ends_with(".png"));
    assert!(body["category"].get("photo_key").is_none());
    assert_eq!(
        response.headers()["location"],
        format!("/categories/{}", id).as_str()
    );

    let response = app.server.get(&format!("/categories/{}", id)).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["category"]["photo_url"], photo_url.as_str());
    assert_eq!(body["category"]["title"], "Manicure");
}

#[tokio::test]
async fn category_lifecycle_leaves_storage_empty() {
    let app = test_app().await;
    let cookie = app.login().await;

    let created: Value = app
        .server
        .post("/categories")
        .add_header("Cookie", cookie.clone())
        .multipart(category_form(
            "Manicure",
            "Classic manicure service for clients",
            "nails.png",
        ))
        .await
        .json();
    let id = created["category"]["id"].as_i64().unwrap();

    let form = MultipartForm::new()
        .add_text("title", "Manicure and care")
        .add_part(
            "photo",
            Part::bytes(Bytes::from_static(PNG))
                .file_name("fresh.jpg")
                .mime_type("image/jpeg"),
        );
    let response = app
        .server
        .patch(&format!("/categories/{}", id))
        .add_header("Cookie", cookie.clone())
        .multipart(form)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let updated: Value = response.json();
    assert_eq!(updated["category"]["title"], "Manicure and care");
    assert_eq!(
        updated["category"]["description"],
        "Classic manicure service for clients"
    );
    assert!(updated["category"]["photo_url"].as_str().unwrap().ends_with(".jpg"));
    assert_eq!(app.storage.object_count(), 1);

    let response = app
        .server
        .delete(&format!("/categories/{}", id))
        .add_header("Cookie", cookie.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(
        response.json::<Value>(),
        json!({ "message": "category successfully deleted" })
    );

    app.drain().await;
    assert_eq!(app.storage.object_count(), 0);

    let response = app
        .server
        .delete(&format!("/categories/{}", id))
        .add_header("Cookie", cookie)
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_category_is_rejected_and_photo_discarded() {
    let app = test_app().await;
    let cookie = app.login().await;

    let response = app
        .server
        .post("/categories")
        .add_header("Cookie", cookie)
        .multipart(category_form("", "too short", "nails.png"))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(body["error"]["title"], "title must be provided");
    assert_eq!(
        body["error"]["description"],
        "description must have more than 20 chars"
    );

    app.drain().await;
    assert_eq!(app.storage.uploads().len(), 1);
    assert_eq!(app.storage.object_count(), 0);
}

#[tokio::test]
async fn non_image_upload_is_a_bad_request() {
    let app = test_app().await;
    let cookie = app.login().await;

    let response = app
        .server
        .post("/categories")
        .add_header("Cookie", cookie)
        .multipart(category_form(
            "Manicure",
            "Classic manicure service for clients",
            "notes.txt",
        ))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert!(app.storage.calls().is_empty());
}

#[tokio::test]
async fn duplicate_title_is_a_conflict_without_orphans() {
    let app = test_app().await;
    let cookie = app.login().await;
    let form = || {
        category_form(
            "Manicure",
            "Classic manicure service for clients",
            "nails.png",
        )
    };

    let first = app
        .server
        .post("/categories")
        .add_header("Cookie", cookie.clone())
        .multipart(form())
        .await;
    assert_eq!(first.status_code(), StatusCode::CREATED);

    let second = app
        .server
        .post("/categories")
        .add_header("Cookie", cookie)
        .multipart(form())
        .await;
    assert_eq!(second.status_code(), StatusCode::CONFLICT);
    assert_eq!(
        second.json::<Value>()["error"],
        "A resource with the same identifier (Manicure)"
    );

    app.drain().await;
    assert_eq!(app.storage.object_count(), 1);
}

#[tokio::test]
async fn service_requires_booking_url() {
    let app = test_app().await;
    let cookie = app.login().await;

    let response = app
        .server
        .post("/services")
        .add_header("Cookie", cookie.clone())
        .multipart(category_form(
            "Gel polish",
            "Long lasting gel polish coating",
            "gel.webp",
        ))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json::<Value>()["error"]["url"], "url must be provided");

    let response = app
        .server
        .post("/services")
        .add_header("Cookie", cookie)
        .multipart(
            category_form(
                "Gel polish",
                "Long lasting gel polish coating",
                "gel.webp",
            )
            .add_text("url", "https://cosmetcab.dp.ua/book/gel"),
        )
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);

    let listed: Value = app.server.get("/services").await.json();
    assert_eq!(listed["services"].as_array().unwrap().len(), 1);
    assert_eq!(listed["services"][0]["url"], "https://cosmetcab.dp.ua/book/gel");
}

#[tokio::test]
async fn writes_require_a_session() {
    let app = test_app().await;

    let response = app
        .server
        .post("/categories")
        .multipart(category_form(
            "Manicure",
            "Classic manicure service for clients",
            "nails.png",
        ))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.json::<Value>()["error"],
        "you must be authenticated to access this resource"
    );

    let response = app
        .server
        .delete("/subcategories/1")
        .add_header("Cookie", "cookie-auth=not-a-token")
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert!(app.storage.calls().is_empty());
}

#[tokio::test]
async fn unknown_routes_and_methods_use_json_errors() {
    let app = test_app().await;

    let response = app.server.get("/nowhere").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.json::<Value>()["error"],
        "the requested resource could not be found"
    );

    let response = app.server.put("/categories").await;
    assert_eq!(response.status_code(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(
        response.json::<Value>()["error"],
        "Method PUT is not allowed for this resource"
    );

    for path in ["/categories/abc", "/categories/0", "/services/-3"] {
        let response = app.server.get(path).await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND, "{path}");
    }
}

#[tokio::test]
async fn subcategory_crud_with_strict_json() {
    let app = test_app().await;
    let cookie = app.login().await;

    let response = app
        .server
        .post("/subcategories")
        .add_header("Cookie", cookie.clone())
        .json(&json!({ "name": "Hardware manicure", "colour": "red" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["error"],
        "body contains unknown key \"colour\""
    );

    let response = app
        .server
        .post("/subcategories")
        .add_header("Cookie", cookie.clone())
        .json(&json!({ "name": "Nails" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = app
        .server
        .post("/subcategories")
        .add_header("Cookie", cookie.clone())
        .json(&json!({ "name": "Hardware manicure" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let id = response.json::<Value>()["subcategory"]["id"].as_i64().unwrap();

    let response = app
        .server
        .put(&format!("/subcategories/{}", id))
        .add_header("Cookie", cookie.clone())
        .json(&json!({ "name": "Combined manicure" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let listed: Value = app.server.get("/subcategories").await.json();
    assert_eq!(listed["sub_categories"][0]["name"], "Combined manicure");

    let response = app
        .server
        .delete(&format!("/subcategories/{}", id))
        .add_header("Cookie", cookie)
        .await;
    assert_eq!(
        response.json::<Value>(),
        json!({ "message": "subcategory successfully deleted" })
    );
    let response = app.server.get(&format!("/subcategories/{}", id)).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn login_rejects_bad_credentials_and_inactive_accounts() {
    let app = test_app().await;

    let response = app
        .server
        .post("/user/login")
        .json(&json!({ "email": EMAIL, "password": "wrong password" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    let response = app
        .server
        .post("/user/login")
        .json(&json!({ "email": "nobody@cosmetcab.dp.ua", "password": PASSWORD }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    let response = app
        .server
        .post("/user/login")
        .json(&json!({ "email": "dormant@cosmetcab.dp.ua", "password": PASSWORD }))
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let response = app.server.post("/user/login").text("").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "body must not be empty");
}

#[tokio::test]
async fn register_and_logout() {
    let app = test_app().await;
    let cookie = app.login().await;

    let response = app
        .server
        .post("/user/register")
        .add_header("Cookie", cookie.clone())
        .json(&json!({
            "name": "Iryna",
            "email": "iryna@cosmetcab.dp.ua",
            "password": "another long secret"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["user"]["email"], "iryna@cosmetcab.dp.ua");
    assert_eq!(body["user"]["activated"], true);
    assert!(body["user"].get("password_hash").is_none());
    assert!(app
        .users
        .get_by_email("iryna@cosmetcab.dp.ua")
        .await
        .unwrap()
        .is_some());

    let response = app
        .server
        .post("/user/register")
        .add_header("Cookie", cookie.clone())
        .json(&json!({
            "name": "Iryna again",
            "email": "IRYNA@cosmetcab.dp.ua",
            "password": "another long secret"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        response.json::<Value>()["error"]["email"],
        "a user with this email address already exists"
    );

    let response = app
        .server
        .post("/user/logout")
        .add_header("Cookie", cookie)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>(), json!({ "logout": "successful" }));
    let set_cookie = response.headers()["set-cookie"].to_str().unwrap().to_string();
    assert!(set_cookie.starts_with("cookie-auth=;"));
    assert!(set_cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn contact_form_is_relayed_to_the_bot() {
    let app = test_app().await;

    let response = app
        .server
        .post("/contact")
        .json(&json!({
            "name": "Olena",
            "phone": "+380 67 123 45 67",
            "message": "Хочу записатися на манікюр"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>(), json!({ "message": "sent" }));

    let sent = app.notifier.sent.lock().unwrap().clone();
    assert_eq!(
        sent,
        vec!["Ім'я: Olena\nТелефон: +380 67 123 45 67\nПовідомлення: Хочу записатися на манікюр"]
    );

    let response = app
        .server
        .post("/contact")
        .json(&json!({ "name": "Olena", "phone": "call me", "message": "hi" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        response.json::<Value>()["error"]["phone"],
        "must be valid phone number"
    );
}

#[tokio::test]
async fn responses_carry_security_and_cors_headers() {
    let app = test_app().await;

    let response = app
        .server
        .get("/categories")
        .add_header("Origin", "https://cosmetcab.dp.ua")
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>(), json!({ "categories": [] }));
    let headers = response.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(
        headers["strict-transport-security"],
        "max-age=31536000; includeSubDomains"
    );
    assert_eq!(
        headers["access-control-allow-origin"],
        "https://cosmetcab.dp.ua"
    );
    assert_eq!(headers["access-control-allow-credentials"], "true");
}

#[tokio::test]
async fn healthcheck_reports_probes() {
    let app = test_app().await;

    let response = app.server.get("/healthcheck").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["status"], "available");
    assert_eq!(body["environment"], "test");
    assert_eq!(body["database"], "not configured");
    assert_eq!(body["storage"], "available");
}

#[tokio::test]
async fn rate_limiter_answers_429_after_burst() {
    let app = test_app_with(http_settings(true)).await;

    for _ in 0..2 {
        let response = app.server.get("/categories").await;
        assert_eq!(response.status_code(), StatusCode::OK);
    }

    let response = app.server.get("/categories").await;
    assert_eq!(response.status_code(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key("retry-after"));
    assert_eq!(response.headers()["x-ratelimit-remaining"], "0");
}
