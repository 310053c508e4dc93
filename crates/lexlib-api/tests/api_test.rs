//! End-to-end HTTP tests against the in-memory backend.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use reqwest::{multipart, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

use lexlib_api::{build_router, AppState, ServerConfig};
use lexlib_core::{
    ContentPage, Document, DocumentMetadata, EventKind, InMemoryBackend, PageRepository,
    Subscription, SubscriptionStatus, UserProfile, UserRole,
};

const ADMIN: &str = "admin-token";
const SUBSCRIBER: &str = "subscriber-token";
const READER: &str = "reader-token";

struct TestServer {
    base: String,
    http: reqwest::Client,
    backend: InMemoryBackend,
}

impl TestServer {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn get(&self, path: &str, token: Option<&str>) -> reqwest::Response {
        let mut request = self.http.get(self.url(path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.expect("request")
    }
}

fn profile(email: &str, role: UserRole) -> UserProfile {
    UserProfile {
        id: Uuid::now_v7(),
        email: email.to_string(),
        full_name: None,
        role,
        created_at: Utc::now(),
    }
}

fn document(title: &str, category: &str, subcategory: &str, file: &str, mime: &str) -> Document {
    let id = Uuid::now_v7();
    let path = format!("{}/{}/{}-{}", category, subcategory, Uuid::new_v4(), file);
    Document {
        id,
        title: title.to_string(),
        category: category.to_string(),
        subcategory: subcategory.to_string(),
        file_url: format!("memory://storage/object/public/documents/{}", path),
        file_path: path,
        created_at: Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap(),
        metadata: DocumentMetadata {
            size: 4,
            mime_type: mime.to_string(),
            ..Default::default()
        },
    }
}

async fn spawn_with(backend: InMemoryBackend, config: ServerConfig) -> TestServer {
    let admin = profile("admin@lexlib.example", UserRole::Admin);
    let subscriber = profile("subscriber@lexlib.example", UserRole::Member);
    let reader = profile("reader@lexlib.example", UserRole::Member);
    backend
        .add_subscription(Subscription {
            id: Uuid::now_v7(),
            user_id: subscriber.id,
            plan: "annual".into(),
            status: SubscriptionStatus::Active,
            starts_at: Utc::now() - Duration::days(10),
            ends_at: Some(Utc::now() + Duration::days(355)),
        })
        .await;
    backend.add_user(admin, ADMIN).await;
    backend.add_user(subscriber, SUBSCRIBER).await;
    backend.add_user(reader, READER).await;

    let state = AppState::with_backend(Arc::new(backend.clone()), &config).expect("state");
    let app = build_router(state, &config);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });

    TestServer {
        base: format!("http://{}", addr),
        http: reqwest::Client::new(),
        backend,
    }
}

async fn spawn(backend: InMemoryBackend) -> TestServer {
    spawn_with(backend, ServerConfig::default().without_rate_limit()).await
}

#[tokio::test]
async fn test_health_and_request_id() {
    let server = spawn(InMemoryBackend::new()).await;
    let response = server.get("/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let request_id = response
        .headers()
        .get("x-request-id")
        .expect("request id header")
        .to_str()
        .unwrap()
        .to_string();
    assert_eq!(Uuid::parse_str(&request_id).unwrap().get_version_num(), 7);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_categories_and_subcategories() {
    let server = spawn(InMemoryBackend::new()).await;

    let categories: Vec<Value> = server
        .get("/api/v1/categories", None)
        .await
        .json()
        .await
        .unwrap();
    assert!(categories.iter().any(|c| c["name"] == "Hansards"));

    let response = server
        .get("/api/v1/categories/Hansards/subcategories", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let subcategories: Vec<String> = response.json().await.unwrap();
    assert!(subcategories.contains(&"Hansards 2024".to_string()));

    let response = server
        .get("/api/v1/categories/Nonexistent/subcategories", None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("Nonexistent"));
}

#[tokio::test]
async fn test_browse_resolves_filters() {
    let backend = InMemoryBackend::new();
    backend
        .seed_document(
            document("Budget debate", "Hansards", "Hansards 2024", "budget.pdf", "application/pdf"),
            None,
        )
        .await;
    backend
        .seed_document(
            document("Older debate", "Hansards", "Hansards 2023", "older.pdf", "application/pdf"),
            None,
        )
        .await;
    let server = spawn(backend).await;

    let page: Value = server
        .get("/api/v1/documents?category=Hansards&subcategory=Hansards%202024", None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(page["documents"].as_array().unwrap().len(), 1);
    assert_eq!(page["documents"][0]["title"], "Budget debate");

    // A subcategory from another category widens to the whole category.
    let page: Value = server
        .get("/api/v1/documents?category=Hansards&subcategory=Supreme%20Court", None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(page["pagination"]["total_rows"], 2);

    // Unknown categories fail closed.
    let page: Value = server
        .get("/api/v1/documents?category=Secret%20Files", None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(page["documents"].as_array().unwrap().len(), 0);
    assert_eq!(page["pagination"]["total_rows"], 0);

    let response = server
        .get("/api/v1/documents?date_from=2024-02-01&date_to=2024-01-01", None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = server.get("/api/v1/documents?sort_by=popularity", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_browse_clamps_page_past_end() {
    let backend = InMemoryBackend::new();
    for i in 0..23 {
        backend
            .seed_document(
                document(&format!("Act {}", i), "Hansards", "Hansards 2024", "a.pdf", "application/pdf"),
                None,
            )
            .await;
    }
    let server = spawn(backend).await;

    let page: Value = server
        .get("/api/v1/documents?page=5&page_size=10", None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(page["pagination"]["current_page"], 3);
    assert_eq!(page["pagination"]["total_pages"], 3);
    assert_eq!(page["documents"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_search_and_get() {
    let backend = InMemoryBackend::new();
    let doc = document("Finance Act", "Hansards", "Hansards 2024", "finance.pdf", "application/pdf");
    let id = doc.id;
    backend.seed_document(doc, None).await;
    let server = spawn(backend).await;

    let results: Vec<Value> = server
        .get("/api/v1/documents/search?q=finance", None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(results.len(), 1);

    let results: Vec<Value> = server
        .get("/api/v1/documents/search?q=%20%20", None)
        .await
        .json()
        .await
        .unwrap();
    assert!(results.is_empty());

    let fetched: Value = server
        .get(&format!("/api/v1/documents/{}", id), None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["title"], "Finance Act");

    let response = server
        .get(&format!("/api/v1/documents/{}", Uuid::now_v7()), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_preview_inline_and_fallback() {
    let backend = InMemoryBackend::new();
    let pdf = document("Act", "Hansards", "Hansards 2024", "act.pdf", "application/pdf");
    let docx = document(
        "Memo",
        "Hansards",
        "Hansards 2024",
        "memo.docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    );
    let (pdf_id, docx_id) = (pdf.id, docx.id);
    backend.seed_document(pdf, Some(b"%PDF".to_vec())).await;
    backend.seed_document(docx, Some(b"PK..".to_vec())).await;
    let server = spawn(backend).await;

    let response = server
        .get(&format!("/api/v1/documents/{}/preview", pdf_id), None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = server
        .get(&format!("/api/v1/documents/{}/preview", pdf_id), Some(READER))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "application/pdf");
    assert!(response.headers()["content-disposition"]
        .to_str()
        .unwrap()
        .starts_with("inline"));
    assert_eq!(response.bytes().await.unwrap().as_ref(), b"%PDF");

    let body: Value = server
        .get(&format!("/api/v1/documents/{}/preview", docx_id), Some(READER))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["preview"], "download_instead");
    assert_eq!(
        body["download_url"],
        format!("/api/v1/documents/{}/download", docx_id)
    );

    let views = server
        .backend
        .events()
        .await
        .into_iter()
        .filter(|e| e.kind == EventKind::View)
        .count();
    assert_eq!(views, 2);
}

#[tokio::test]
async fn test_download_requires_subscription_and_records_event() {
    let backend = InMemoryBackend::new();
    let doc = document("Act", "Hansards", "Hansards 2024", "act.pdf", "application/pdf");
    let id = doc.id;
    backend.seed_document(doc, Some(b"%PDF".to_vec())).await;
    let server = spawn(backend).await;
    let path = format!("/api/v1/documents/{}/download", id);

    let response = server.get(&path, Some(READER)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(server.backend.events().await.is_empty());

    let response = server.get(&path, Some(SUBSCRIBER)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-disposition"],
        "attachment; filename=\"act.pdf\""
    );

    let response = server.get(&path, Some(ADMIN)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let downloads: Vec<_> = server
        .backend
        .events()
        .await
        .into_iter()
        .filter(|e| e.kind == EventKind::Download)
        .collect();
    assert_eq!(downloads.len(), 2);
    assert!(downloads.iter().all(|e| e.document_id == Some(id)));
}

#[tokio::test]
async fn test_me_and_login_event() {
    let server = spawn(InMemoryBackend::new()).await;

    let me: Value = server
        .get("/api/v1/me", Some(SUBSCRIBER))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(me["profile"]["email"], "subscriber@lexlib.example");
    assert_eq!(me["can_download"], true);
    assert_eq!(me["subscription"]["status"], "active");

    let me: Value = server
        .get("/api/v1/me", Some(READER))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(me["can_download"], false);
    assert!(me["subscription"].is_null());

    let response = server.get("/api/v1/me", Some("forged")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = server
        .http
        .post(server.url("/api/v1/me/login"))
        .bearer_auth(READER)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let events = server.backend.events().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, EventKind::Login);
}

fn upload_form(category: &str, subcategory: Option<&str>) -> multipart::Form {
    let mut form = multipart::Form::new().text("category", category.to_string());
    if let Some(sub) = subcategory {
        form = form.text("subcategory", sub.to_string());
    }
    form.text("metadata", r#"{"status":"published","keywords":["budget"]}"#)
        .text("title", "Budget Statement")
        .part(
            "file",
            multipart::Part::bytes(b"%PDF-1.4 budget".to_vec()).file_name("budget.pdf"),
        )
        .part(
            "file",
            multipart::Part::bytes(b"plain text minutes".to_vec()).file_name("minutes.txt"),
        )
}

#[tokio::test]
async fn test_admin_upload_batch() {
    let server = spawn(InMemoryBackend::new()).await;

    let response = server
        .http
        .post(server.url("/api/v1/admin/documents"))
        .bearer_auth(READER)
        .multipart(upload_form("Hansards", Some("Hansards 2024")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = server
        .http
        .post(server.url("/api/v1/admin/documents"))
        .bearer_auth(ADMIN)
        .multipart(upload_form("Hansards", Some("Hansards 2024")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let report: Value = response.json().await.unwrap();
    assert_eq!(report["status"], "complete");
    assert_eq!(report["succeeded"], 2);
    assert_eq!(report["outcomes"][0]["document"]["title"], "Budget Statement");
    assert_eq!(report["outcomes"][1]["document"]["title"], "minutes");

    let documents = server.backend.documents().await;
    assert_eq!(documents.len(), 2);
    assert!(documents
        .iter()
        .all(|d| d.category == "Hansards" && d.subcategory == "Hansards 2024"));
    assert_eq!(server.backend.stored_paths().await.len(), 2);
}

#[tokio::test]
async fn test_admin_upload_partial_and_validation() {
    let server = spawn(InMemoryBackend::new().with_failing_upload("minutes.txt")).await;

    let response = server
        .http
        .post(server.url("/api/v1/admin/documents"))
        .bearer_auth(ADMIN)
        .multipart(upload_form("Hansards", Some("Hansards 2024")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::MULTI_STATUS);
    let report: Value = response.json().await.unwrap();
    assert_eq!(report["status"], "partial");
    assert_eq!(report["failed"], 1);

    let response = server
        .http
        .post(server.url("/api/v1/admin/documents"))
        .bearer_auth(ADMIN)
        .multipart(multipart::Form::new().text("category", "Hansards"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = server
        .http
        .post(server.url("/api/v1/admin/documents"))
        .bearer_auth(ADMIN)
        .multipart(upload_form("Secret Files", Some("Hansards 2024")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let report: Value = response.json().await.unwrap();
    assert_eq!(report["status"], "failed");
}

#[tokio::test]
async fn test_admin_update_and_delete() {
    let backend = InMemoryBackend::new();
    let doc = document("Act", "Hansards", "Hansards 2024", "act.pdf", "application/pdf");
    let id = doc.id;
    backend.seed_document(doc, Some(b"%PDF".to_vec())).await;
    let server = spawn(backend).await;
    let path = server.url(&format!("/api/v1/admin/documents/{}", id));

    let response = server
        .http
        .patch(&path)
        .bearer_auth(ADMIN)
        .json(&json!({ "category": "Hansards", "subcategory": "Supreme Court" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = server
        .http
        .patch(&path)
        .bearer_auth(ADMIN)
        .json(&json!({ "title": "Appropriation Act", "metadata": { "actNumber": "12 of 2024" } }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["title"], "Appropriation Act");
    assert_eq!(updated["metadata"]["actNumber"], "12 of 2024");

    let response = server.http.delete(&path).bearer_auth(ADMIN).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let outcome: Value = response.json().await.unwrap();
    assert_eq!(outcome["id"], id.to_string());
    assert!(outcome.get("orphaned_object").is_none());
    assert!(server.backend.stored_paths().await.is_empty());

    let response = server.http.delete(&path).bearer_auth(ADMIN).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_dashboards() {
    let server = spawn(InMemoryBackend::new()).await;

    let response = server.get("/api/v1/admin/users", Some(SUBSCRIBER)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let users: Value = server
        .get("/api/v1/admin/users?sort_by=email&sort_order=asc", Some(ADMIN))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(users["pagination"]["total_rows"], 3);
    assert_eq!(users["items"][0]["email"], "admin@lexlib.example");

    let admins: Value = server
        .get("/api/v1/admin/users?role=admin", Some(ADMIN))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(admins["items"].as_array().unwrap().len(), 1);

    let subscriptions: Value = server
        .get("/api/v1/admin/subscriptions?status=active", Some(ADMIN))
        .await
        .json()
        .await
        .unwrap();
    let items = subscriptions["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    let subscription_id = items[0]["id"].as_str().unwrap().to_string();

    let response = server
        .http
        .patch(server.url(&format!("/api/v1/admin/subscriptions/{}", subscription_id)))
        .bearer_auth(ADMIN)
        .json(&json!({ "status": "cancelled" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // A cancelled subscriber loses download access.
    let me: Value = server
        .get("/api/v1/me", Some(SUBSCRIBER))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(me["can_download"], false);
}

#[tokio::test]
async fn test_content_pages() {
    let backend = InMemoryBackend::new();
    backend
        .upsert_page(&ContentPage {
            slug: "draft".into(),
            title: "Draft".into(),
            body: "Not yet".into(),
            published: false,
            updated_at: Utc::now(),
        })
        .await
        .unwrap();
    let server = spawn(backend).await;

    let response = server.get("/api/v1/pages/draft", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = server
        .http
        .put(server.url("/api/v1/admin/pages/about"))
        .bearer_auth(ADMIN)
        .json(&json!({ "title": "About", "body": "The library.", "published": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let page: Value = server
        .get("/api/v1/pages/about", None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(page["body"], "The library.");

    let pages: Vec<Value> = server
        .get("/api/v1/admin/pages", Some(ADMIN))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(pages.len(), 2);

    let response = server
        .http
        .put(server.url("/api/v1/admin/pages/Bad%20Slug"))
        .bearer_auth(ADMIN)
        .json(&json!({ "title": "Bad" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = server
        .http
        .delete(server.url("/api/v1/admin/pages/about"))
        .bearer_auth(ADMIN)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = server.get("/api/v1/pages/about", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rate_limit() {
    let config = ServerConfig {
        rate_limit_requests: 2,
        rate_limit_period_secs: 3600,
        ..Default::default()
    };
    let server = spawn_with(InMemoryBackend::new(), config).await;

    assert_eq!(server.get("/health", None).await.status(), StatusCode::OK);
    assert_eq!(server.get("/health", None).await.status(), StatusCode::OK);
    let response = server.get("/health", None).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].is_string());
}
