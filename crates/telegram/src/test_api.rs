//! In-process mock of the Telegram Bot API for transport tests.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use {
    axum::{
        Json, Router,
        body::Bytes,
        extract::State,
        http::{StatusCode, Uri},
        response::{IntoResponse, Response},
        routing::any,
    },
    serde_json::{Value, json},
    std::{
        collections::{HashMap, VecDeque},
        sync::{Arc, Mutex},
        time::Duration,
    },
    teloxide::Bot,
    tokio::{sync::oneshot, task::JoinHandle},
};

pub(crate) const TEST_TOKEN: &str = "test-token";

#[derive(Debug, Clone)]
pub(crate) struct CapturedRequest {
    pub method: String,
    pub body: String,
}

#[derive(Default)]
struct ApiState {
    requests: Mutex<Vec<CapturedRequest>>,
    files: Mutex<HashMap<String, Vec<u8>>>,
    updates: Mutex<VecDeque<Value>>,
    conflict: Mutex<bool>,
}

pub(crate) struct MockTelegramApi {
    state: Arc<ApiState>,
    url: reqwest::Url,
    shutdown_tx: Option<oneshot::Sender<()>>,
    server: Option<JoinHandle<()>>,
}

impl MockTelegramApi {
    pub async fn start() -> Self {
        let state = Arc::new(ApiState::default());
        let app = Router::new()
            .route("/{*path}", any(handler))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("serve mock telegram api");
        });

        Self {
            state,
            url: reqwest::Url::parse(&format!("http://{addr}/")).expect("parse api url"),
            shutdown_tx: Some(shutdown_tx),
            server: Some(server),
        }
    }

    pub fn bot(&self) -> Bot {
        Bot::new(TEST_TOKEN).set_api_url(self.url.clone())
    }

    pub fn insert_file(&self, file_id: &str, data: Vec<u8>) {
        self.state
            .files
            .lock()
            .unwrap()
            .insert(file_id.to_string(), data);
    }

    /// Queue an update for the next `getUpdates` call.
    pub fn push_update(&self, update: Value) {
        self.state.updates.lock().unwrap().push_back(update);
    }

    /// Make `getUpdates` answer with the "other instance" conflict error.
    pub fn fail_with_conflict(&self) {
        *self.state.conflict.lock().unwrap() = true;
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Raw bodies of every call to `method`.
    pub fn calls(&self, method: &str) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method)
            .map(|r| r.body)
            .collect()
    }

    /// `(chat_id, text)` of every `sendMessage` call.
    pub fn sent_messages(&self) -> Vec<(i64, String)> {
        self.calls("SendMessage")
            .iter()
            .map(|body| {
                let value: Value = serde_json::from_str(body).expect("sendMessage json");
                (
                    value["chat_id"].as_i64().expect("chat_id"),
                    value["text"].as_str().expect("text").to_string(),
                )
            })
            .collect()
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(server) = self.server.take() {
            let _ = server.await;
        }
    }
}

fn ok(result: Value) -> Json<Value> {
    Json(json!({ "ok": true, "result": result }))
}

fn message_result(chat_id: i64) -> Value {
    json!({
        "message_id": 1,
        "date": 0,
        "chat": { "id": chat_id, "type": "private", "first_name": "Test" },
        "text": "ok"
    })
}

async fn handler(State(state): State<Arc<ApiState>>, uri: Uri, body: Bytes) -> Response {
    if let Some(path) = uri.path().strip_prefix("/file/") {
        return file_response(&state, path);
    }
    api_response(&state, &uri, &body).await.into_response()
}

async fn api_response(state: &ApiState, uri: &Uri, body: &Bytes) -> Json<Value> {
    let method = uri.path().rsplit('/').next().unwrap_or_default().to_string();
    let raw_body = String::from_utf8_lossy(body).to_string();
    state.requests.lock().unwrap().push(CapturedRequest {
        method: method.clone(),
        body: raw_body,
    });

    let parsed: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
    match method.as_str() {
        "SendMessage" | "SendPhoto" => ok(message_result(
            parsed["chat_id"].as_i64().unwrap_or(42),
        )),
        "GetMe" => ok(json!({
            "id": 100,
            "is_bot": true,
            "first_name": "Lingua",
            "username": "lingua_test_bot",
            "can_join_groups": true,
            "can_read_all_group_messages": false,
            "supports_inline_queries": false,
            "can_connect_to_business": false,
            "has_main_web_app": false
        })),
        "GetFile" => {
            let file_id = parsed["file_id"].as_str().unwrap_or_default();
            ok(json!({
                "file_id": file_id,
                "file_unique_id": format!("unique-{file_id}"),
                "file_size": 16,
                "file_path": format!("files/{file_id}")
            }))
        },
        "GetUpdates" => {
            if *state.conflict.lock().unwrap() {
                return Json(json!({
                    "ok": false,
                    "error_code": 409,
                    "description": "Conflict: terminated by other getUpdates request; make sure that only one bot instance is running"
                }));
            }
            let updates: Vec<Value> = state.updates.lock().unwrap().drain(..).collect();
            if updates.is_empty() {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            ok(Value::Array(updates))
        },
        _ => ok(Value::Bool(true)),
    }
}

fn file_response(state: &ApiState, path: &str) -> Response {
    let file_id = path.rsplit('/').next().unwrap_or_default();
    match state.files.lock().unwrap().get(file_id) {
        Some(data) => (StatusCode::OK, data.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
