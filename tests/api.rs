//! Black-box tests of the HTTP surface, served on an ephemeral port with the
//! in-memory store or with a store whose database is unreachable.

#![allow(clippy::panic, clippy::indexing_slicing)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde_json::{Value, json};

use hetero_inventory::api;
use hetero_inventory::app_state::AppState;
use hetero_inventory::config::PlacementConfig;
use hetero_inventory::domain::{Item, ItemDraft, ItemId, Topology};
use hetero_inventory::error::AppError;
use hetero_inventory::persistence::{ItemStore, MemoryItemStore};
use hetero_inventory::service::InventoryService;

/// Error text longer than the 80 characters `/arch` is allowed to show.
const OUTAGE: &str = "error communicating with database: Connection refused (os error 111) \
                      while connecting to hetero-pgcluster-primary.hetero-demo.svc:5432";

/// Store whose every query fails as if the database were down.
#[derive(Debug)]
struct DownStore;

impl DownStore {
    fn err() -> AppError {
        AppError::Database(OUTAGE.to_string())
    }
}

#[async_trait]
impl ItemStore for DownStore {
    async fn init_schema(&self) -> Result<(), AppError> {
        Err(Self::err())
    }
    async fn ping(&self) -> Result<(), AppError> {
        Err(Self::err())
    }
    async fn server_version(&self) -> Result<String, AppError> {
        Err(Self::err())
    }
    async fn list(&self) -> Result<Vec<Item>, AppError> {
        Err(Self::err())
    }
    async fn get(&self, _id: ItemId) -> Result<Option<Item>, AppError> {
        Err(Self::err())
    }
    async fn create(&self, _draft: &ItemDraft) -> Result<Item, AppError> {
        Err(Self::err())
    }
    async fn update(&self, _id: ItemId, _draft: &ItemDraft) -> Result<Option<Item>, AppError> {
        Err(Self::err())
    }
    async fn delete(&self, _id: ItemId) -> Result<Option<Item>, AppError> {
        Err(Self::err())
    }
}

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with(Arc::new(MemoryItemStore::new())).await
    }

    async fn spawn_with(store: Arc<dyn ItemStore>) -> Self {
        let placement = PlacementConfig {
            node_name: "power-node-1".to_string(),
            pod_name: "hetero-app-abc".to_string(),
            app_arch_label: "ppc64le (IBM Power)".to_string(),
            db_arch_label: "x86_64 (Intel)".to_string(),
            db_host: "db.test.svc".to_string(),
            db_port: 5432,
        };
        let state = AppState {
            inventory: Arc::new(InventoryService::new(store)),
            topology: Arc::new(Topology::with_host(&placement, "ppc64le", Some("5.14.0"))),
            request_timeout: Duration::from_secs(10),
        };
        let app = api::build_app(state);

        let listener = match tokio::net::TcpListener::bind("127.0.0.1:0").await {
            Ok(listener) => listener,
            Err(err) => panic!("failed to bind ephemeral port: {err}"),
        };
        let addr = match listener.local_addr() {
            Ok(addr) => addr,
            Err(err) => panic!("listener has no address: {err}"),
        };
        let handle = tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app).await {
                panic!("server failed: {err}");
            }
        });

        let client = match reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
        {
            Ok(client) => client,
            Err(err) => panic!("failed to build client: {err}"),
        };

        Self {
            base_url: format!("http://{addr}"),
            client,
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get_json(&self, path: &str) -> (StatusCode, Value) {
        let res = send(self.client.get(self.url(path))).await;
        (res.status(), json_body(res).await)
    }

    async fn get_html(&self, path: &str) -> (StatusCode, String) {
        let res = send(self.client.get(self.url(path))).await;
        let status = res.status();
        match res.text().await {
            Ok(html) => (status, html),
            Err(err) => panic!("unreadable body: {err}"),
        }
    }

    async fn send_json(&self, method: reqwest::Method, path: &str, body: &Value) -> (StatusCode, Value) {
        let res = send(self.client.request(method, self.url(path)).json(body)).await;
        (res.status(), json_body(res).await)
    }

    /// Posts an urlencoded form and returns the status and `Location` header.
    async fn post_form(&self, path: &str, body: &str) -> (StatusCode, String) {
        let res = send(
            self.client
                .post(self.url(path))
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(body.to_string()),
        )
        .await;
        let location = res
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        (res.status(), location)
    }

    async fn create(&self, name: &str, description: &str) -> i64 {
        let (status, body) = self
            .send_json(
                reqwest::Method::POST,
                "/items",
                &json!({ "name": name, "description": description }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        item_id(&body["item"])
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn send(request: RequestBuilder) -> Response {
    match request.send().await {
        Ok(res) => res,
        Err(err) => panic!("request failed: {err}"),
    }
}

async fn json_body(res: Response) -> Value {
    match res.json().await {
        Ok(body) => body,
        Err(err) => panic!("body is not JSON: {err}"),
    }
}

fn item_id(item: &Value) -> i64 {
    let Some(id) = item["id"].as_i64() else {
        panic!("item without integer id: {item}");
    };
    id
}

#[tokio::test]
async fn health_reports_ok() {
    let server = TestServer::spawn().await;
    let (status, body) = server.get_json("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn ready_when_store_answers() {
    let server = TestServer::spawn().await;
    let (status, body) = server.get_json("/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ready", "db": "connected" }));
}

#[tokio::test]
async fn arch_reports_both_tiers() {
    let server = TestServer::spawn().await;
    let (status, body) = server.get_json("/arch").await;
    assert_eq!(status, StatusCode::OK);

    let app = &body["heterogeneous_demo"]["app_server"];
    assert_eq!(app["architecture"], "ppc64le");
    assert_eq!(app["node"], "power-node-1");
    assert_eq!(app["pod"], "hetero-app-abc");
    let Some(platform) = app["platform"].as_str() else {
        panic!("platform should be a string");
    };
    assert!(platform.ends_with("-5.14.0-ppc64le"));

    let db = &body["heterogeneous_demo"]["database"];
    assert_eq!(db["architecture"], "x86_64 (Intel)");
    assert_eq!(db["host"], "db.test.svc");
    assert_eq!(db["port"], 5432);
    assert_eq!(db["connected"], true);
}

#[tokio::test]
async fn crud_round_trip() {
    let server = TestServer::spawn().await;

    let (status, created) = server
        .send_json(
            reqwest::Method::POST,
            "/items",
            &json!({ "name": "  power-widget ", "description": "made on ppc64le" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["message"], "Item created successfully");
    assert_eq!(created["item"]["name"], "power-widget");
    let id = item_id(&created["item"]);

    let (status, fetched) = server.get_json(&format!("/items/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["item"], created["item"]);
    assert!(fetched.get("message").is_none());

    let (status, updated) = server
        .send_json(
            reqwest::Method::PUT,
            &format!("/items/{id}"),
            &json!({ "name": "power-widget-2" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["message"], "Item updated successfully");
    assert_eq!(updated["item"]["name"], "power-widget-2");
    assert_eq!(updated["item"]["description"], "");
    assert_eq!(updated["item"]["created_at"], created["item"]["created_at"]);

    let res = send(server.client.delete(server.url(&format!("/items/{id}")))).await;
    assert_eq!(res.status(), StatusCode::OK);
    let deleted = json_body(res).await;
    assert_eq!(deleted["message"], format!("Item {id} deleted"));

    let (status, missing) = server.get_json(&format!("/items/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(missing, json!({ "error": format!("Item {id} not found") }));
}

#[tokio::test]
async fn list_is_newest_first() {
    let server = TestServer::spawn().await;
    let first = server.create("first", "").await;
    let second = server.create("second", "x").await;

    let (status, body) = server.get_json("/items").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    let Some(items) = body["items"].as_array() else {
        panic!("items should be an array");
    };
    let ids: Vec<i64> = items.iter().map(item_id).collect();
    assert_eq!(ids, vec![second, first]);
}

#[tokio::test]
async fn create_validation_errors() {
    let server = TestServer::spawn().await;

    let (status, body) = server
        .send_json(reqwest::Method::POST, "/items", &json!({ "description": "x" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Field 'name' is required" }));

    let (status, body) = server
        .send_json(reqwest::Method::POST, "/items", &json!({ "name": "   " }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Field 'name' must not be blank" }));

    let res = send(server.client.post(server.url("/items"))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = json_body(res).await;
    assert_eq!(body["error"], "Field 'name' is required");

    let (_, list) = server.get_json("/items").await;
    assert_eq!(list["count"], 0);
}

#[tokio::test]
async fn update_and_delete_errors() {
    let server = TestServer::spawn().await;
    let id = server.create("widget", "").await;

    let res = send(server.client.put(server.url(&format!("/items/{id}")))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = json_body(res).await;
    assert_eq!(body["error"], "JSON body required");

    let (status, body) = server
        .send_json(reqwest::Method::PUT, "/items/9999", &json!({ "name": "x" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Item 9999 not found");

    let res = send(server.client.delete(server.url("/items/9999"))).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let (status, body) = server.get_json("/items/not-a-number").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Not found" }));
}

#[tokio::test]
async fn index_page_lists_items() {
    let server = TestServer::spawn().await;
    server.create("<b>bold</b>", "escaped").await;

    let (status, html) = server.get_html("/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("power-node-1"));
    assert!(html.contains("(1 record)"));
    assert!(html.contains("&lt;b&gt;bold&lt;/b&gt;"));
    assert!(html.contains("Connected"));
}

#[tokio::test]
async fn index_page_shows_flash() {
    let server = TestServer::spawn().await;
    let (_, html) = server.get_html("/?msg=Item%201%20updated&type=error").await;
    assert!(html.contains("flash error"));
    assert!(html.contains("Item 1 updated"));
    assert!(html.contains("No items yet"));
}

#[tokio::test]
async fn ui_form_flows_redirect_with_flash() {
    let server = TestServer::spawn().await;

    let (status, location) = server
        .post_form("/ui/items", "name=rack+mount&description=from+the+form")
        .await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert!(location.starts_with("/?msg="));
    assert!(location.ends_with("&type=success"));

    let (_, list) = server.get_json("/items").await;
    assert_eq!(list["count"], 1);
    assert_eq!(list["items"][0]["name"], "rack mount");
    let id = item_id(&list["items"][0]);

    let (status, location) = server.post_form("/ui/items", "name=+++&description=").await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert!(location.ends_with("&type=error"));

    let (_, location) = server
        .post_form(&format!("/ui/items/{id}/edit"), "name=rack+mount+2&description=")
        .await;
    assert!(location.ends_with("&type=success"));
    let (_, item) = server.get_json(&format!("/items/{id}")).await;
    assert_eq!(item["item"]["name"], "rack mount 2");

    let (_, location) = server.post_form(&format!("/ui/items/{id}/delete"), "").await;
    assert!(location.ends_with("&type=success"));

    let (_, location) = server.post_form(&format!("/ui/items/{id}/delete"), "").await;
    assert!(location.ends_with("&type=error"));
    assert!(location.contains(&format!("Item%20{id}%20not%20found")));

    let (status, _) = server.post_form("/ui/items/abc/delete", "").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn database_down_ready_is_503() {
    let server = TestServer::spawn_with(Arc::new(DownStore)).await;
    let (status, body) = server.get_json("/ready").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, json!({ "status": "not ready", "db": OUTAGE }));
}

#[tokio::test]
async fn database_down_items_is_500() {
    let server = TestServer::spawn_with(Arc::new(DownStore)).await;
    let (status, body) = server.get_json("/items").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": OUTAGE }));

    let (status, body) = server
        .send_json(reqwest::Method::POST, "/items", &json!({ "name": "bolt" }))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], OUTAGE);
}

#[tokio::test]
async fn database_down_arch_truncates_error() {
    let server = TestServer::spawn_with(Arc::new(DownStore)).await;
    let (status, body) = server.get_json("/arch").await;
    assert_eq!(status, StatusCode::OK);

    let db = &body["heterogeneous_demo"]["database"];
    assert_eq!(db["connected"], false);
    let expected: String = OUTAGE.chars().take(80).collect();
    assert_eq!(db["postgres_version"], expected.as_str());
    assert_eq!(body["heterogeneous_demo"]["app_server"]["node"], "power-node-1");
}

#[tokio::test]
async fn database_down_index_shows_error_flash() {
    let server = TestServer::spawn_with(Arc::new(DownStore)).await;
    let (status, html) = server.get_html("/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("flash error"));
    assert!(html.contains("DB Error: "));
    assert!(html.contains("Disconnected"));
    assert!(html.contains("No items yet"));
}

#[cfg(feature = "swagger-ui")]
#[tokio::test]
async fn openapi_document_lists_item_paths() {
    let server = TestServer::spawn().await;
    let (status, doc) = server.get_json("/api-docs/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"].get("/items").is_some());
    assert!(doc["paths"].get("/items/{id}").is_some());
    assert!(doc["paths"].get("/arch").is_some());
}
