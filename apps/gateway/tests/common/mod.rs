//! 統合テスト共通のユーティリティ
//!
//! 127.0.0.1 の空きポートで起動するモックバックエンドと、
//! それに向けた本番と同じ構成のゲートウェイルーターを提供する。

#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    Router,
    body::{Body, Bytes, to_bytes},
    extract::State,
    http::{HeaderMap, Method, Request, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use surveygate_gateway::{
    build_app,
    client::BackendClientImpl,
    config::GatewayConfig,
    route::RouteSpec,
};
use tokio::net::TcpListener;
use tower::ServiceExt;

/// モックバックエンドが受け付けるトークン
pub const VALID_TOKEN: &str = "valid-token";

/// モックバックエンドが受信したリクエスト
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method:  Method,
    /// `/api/` を含むパス
    pub path:    String,
    pub query:   Option<String>,
    pub headers: HeaderMap,
    pub body:    Bytes,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// プログラム可能な応答
#[derive(Debug, Clone)]
struct MockResponse {
    status:       StatusCode,
    content_type: Option<&'static str>,
    body:         Bytes,
}

#[derive(Default)]
struct MockState {
    requests:  Mutex<Vec<RecordedRequest>>,
    responses: Mutex<HashMap<(Method, String), MockResponse>>,
}

/// 受信したリクエストを記録し、登録済みの応答を返すモックバックエンド
///
/// - `GET /api/auth/me`: [`VALID_TOKEN`] なら 200 + `user`、それ以外は 401
/// - 登録済みの (メソッド, パス): その応答
/// - それ以外: 200 `{"ok":true}`
pub struct MockBackend {
    pub base_url: String,
    state:        Arc<MockState>,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        let app = Router::new()
            .fallback(handle)
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    /// (メソッド, `/api/` を含むパス) に対する応答を登録する
    pub fn respond(&self, method: Method, path: &str, status: StatusCode, body: &str) {
        self.respond_with_type(method, path, status, Some("application/json"), body);
    }

    pub fn respond_with_type(
        &self,
        method: Method,
        path: &str,
        status: StatusCode,
        content_type: Option<&'static str>,
        body: &str,
    ) {
        self.respond_raw(method, path, status, content_type, body.as_bytes().to_vec());
    }

    /// UTF-8 とは限らないバイト列の応答を登録する
    pub fn respond_raw(
        &self,
        method: Method,
        path: &str,
        status: StatusCode,
        content_type: Option<&'static str>,
        body: Vec<u8>,
    ) {
        self.state.responses.lock().unwrap().insert(
            (method, path.to_string()),
            MockResponse {
                status,
                content_type,
                body: Bytes::from(body),
            },
        );
    }

    /// 受信した全リクエスト
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    /// `auth/me` 以外のリクエスト
    pub fn forwarded(&self) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path != "/api/auth/me")
            .collect()
    }

    /// `auth/me` の呼び出し回数
    pub fn identity_calls(&self) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.path == "/api/auth/me")
            .count()
    }

    /// このモックに転送するゲートウェイを構築する
    pub fn gateway(&self) -> Router {
        gateway_for(&self.base_url)
    }
}

async fn handle(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let recorded = RecordedRequest {
        method: method.clone(),
        path: uri.path().to_string(),
        query: uri.query().map(ToString::to_string),
        headers: headers.clone(),
        body,
    };
    state.requests.lock().unwrap().push(recorded);

    let registered = state
        .responses
        .lock()
        .unwrap()
        .get(&(method.clone(), uri.path().to_string()))
        .cloned();
    if let Some(response) = registered {
        let mut builder = Response::builder().status(response.status);
        if let Some(content_type) = response.content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        return builder.body(Body::from(response.body)).unwrap();
    }

    if method == Method::GET && uri.path() == "/api/auth/me" {
        let expected = format!("Bearer {VALID_TOKEN}");
        let authorized = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            == Some(expected.as_str());
        return if authorized {
            json_response(
                StatusCode::OK,
                r#"{"user":{"id":1,"email":"admin@example.com","role":"admin"}}"#,
            )
        } else {
            json_response(StatusCode::UNAUTHORIZED, r#"{"error":"Invalid token"}"#)
        };
    }

    json_response(StatusCode::OK, r#"{"ok":true}"#)
}

fn json_response(status: StatusCode, body: &'static str) -> Response {
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

/// 指定のバックエンド URL に転送するゲートウェイを構築する
pub fn gateway_for(backend_url: &str) -> Router {
    let backend_url = backend_url.to_string();
    let config = GatewayConfig::from_lookup(|key| match key {
        "BACKEND_URL" => Some(backend_url.clone()),
        "BACKEND_TIMEOUT_SECS" => Some("5".to_string()),
        _ => None,
    })
    .unwrap();
    let backend = BackendClientImpl::new(&config.backend_url, config.backend_timeout).unwrap();
    build_app(&config, Arc::new(backend))
}

/// 接続を拒否されるバックエンド URL
///
/// 空きポートを一度確保してすぐ解放する。
pub fn unreachable_backend_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

/// すべてのペイロード形状を満たすボディ（未知のフィールドは無視される）
pub const UNIVERSAL_BODY: &str = r#"{"title":"t","name":"n","category":"c","email":"a@example.com","password":"p","full_name":"n","survey_id":1,"question_id":1,"response_data":{}}"#;

/// パステンプレートの `{...}` を具体的な値に置き換えた受信 URI
pub fn concrete_uri(route: &RouteSpec) -> String {
    let path = route
        .path
        .split('/')
        .map(|segment| if segment.starts_with('{') { "1" } else { segment })
        .collect::<Vec<_>>()
        .join("/");
    format!("/api/{path}")
}

/// ルートのメソッドに合わせたボディ（GET / DELETE は空）
pub fn body_for(route: &RouteSpec) -> &'static str {
    if route.method.carries_body() { UNIVERSAL_BODY } else { "" }
}

/// リクエストを組み立てる
pub fn request(method: Method, uri: &str, token: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    if !body.is_empty() {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// ゲートウェイの応答
pub struct GatewayResponse {
    pub status:  StatusCode,
    pub headers: HeaderMap,
    pub body:    Bytes,
}

impl GatewayResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

/// ゲートウェイにリクエストを 1 件送る
pub async fn send(app: &Router, request: Request<Body>) -> GatewayResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    GatewayResponse {
        status,
        headers,
        body,
    }
}
