//! # バックエンドクライアント
//!
//! ゲートウェイからバックエンドへのリクエスト転送を担当する。
//!
//! 呼び出し先は常に `<BACKEND_URL>/api/<path>`。リトライは行わず、
//! 失敗は種別ごとの [`BackendError`] としてその場で返す。

mod call;
mod error;
mod response;

use std::time::Duration;

use async_trait::async_trait;
use http::header::CONTENT_TYPE;

pub use self::{
    call::{BackendMethod, BackendResponse, OutboundCall},
    error::BackendError,
};
use crate::middleware::request_id::inject_request_id;

/// バックエンドクライアントトレイト
///
/// テスト時にスタブを使用できるようトレイトで定義。
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// 1 回分の呼び出しを実行する
    ///
    /// サポート外のメソッドは通信前に `BackendError::InvalidMethod` で失敗する。
    async fn forward(&self, call: OutboundCall) -> Result<BackendResponse, BackendError>;
}

/// バックエンドクライアント実装
#[derive(Clone)]
pub struct BackendClientImpl {
    base_url: String,
    client:   reqwest::Client,
}

impl BackendClientImpl {
    /// 新しい BackendClient を作成する
    ///
    /// # 引数
    ///
    /// - `base_url`: バックエンドのベース URL（例: `http://localhost:8080`）
    /// - `timeout`: 呼び出し 1 回あたりのタイムアウト（`None` で無制限）
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, BackendError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client:   builder.build()?,
        })
    }

    fn url_for(&self, call: &OutboundCall) -> String {
        let path = call.path.trim_start_matches('/');
        match &call.query {
            Some(query) => format!("{}/api/{}?{}", self.base_url, path, query),
            None => format!("{}/api/{}", self.base_url, path),
        }
    }
}

#[async_trait]
impl BackendClient for BackendClientImpl {
    async fn forward(&self, call: OutboundCall) -> Result<BackendResponse, BackendError> {
        let method = BackendMethod::try_from(&call.method)?;
        let url = self.url_for(&call);

        let mut builder = self.client.request(method.as_http(), &url);
        if let Some(token) = &call.bearer {
            builder = builder.bearer_auth(token.as_str());
        }
        if method.carries_body()
            && let Some(body) = call.body
        {
            builder = builder.header(CONTENT_TYPE, "application/json").body(body);
        }
        let builder = inject_request_id(builder);

        tracing::debug!(
            http.method = %method,
            backend.path = %call.path,
            "バックエンドへ転送します"
        );

        let response = builder.send().await?;
        tracing::debug!(
            http.status_code = response.status().as_u16(),
            backend.path = %call.path,
            "バックエンドから応答を受信しました"
        );

        response::handle_response(response).await
    }
}
