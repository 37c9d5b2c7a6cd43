//! 転送リクエスト記述子とバックエンド応答の型

use bytes::Bytes;
use http::{Method, StatusCode};
use serde::de::DeserializeOwned;

use super::error::BackendError;
use crate::auth::BearerToken;

/// 転送可能な HTTP メソッド
///
/// バックエンドの API が受け付けるのはこの 4 種類のみ。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "UPPERCASE")]
pub enum BackendMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl BackendMethod {
    pub fn as_http(self) -> Method {
        match self {
            BackendMethod::Get => Method::GET,
            BackendMethod::Post => Method::POST,
            BackendMethod::Put => Method::PUT,
            BackendMethod::Delete => Method::DELETE,
        }
    }

    /// リクエストボディを送るメソッドか
    pub fn carries_body(self) -> bool {
        matches!(self, BackendMethod::Post | BackendMethod::Put)
    }
}

impl TryFrom<&Method> for BackendMethod {
    type Error = BackendError;

    fn try_from(method: &Method) -> Result<Self, Self::Error> {
        match *method {
            Method::GET => Ok(BackendMethod::Get),
            Method::POST => Ok(BackendMethod::Post),
            Method::PUT => Ok(BackendMethod::Put),
            Method::DELETE => Ok(BackendMethod::Delete),
            _ => Err(BackendError::InvalidMethod(method.clone())),
        }
    }
}

/// バックエンドへの 1 回分の呼び出し
///
/// 呼び出しごとに新しく組み立て、再利用しない。
/// `path` は API ルートからの相対パス（例: `surveys/42`）。
#[derive(Debug, Clone)]
pub struct OutboundCall {
    pub method: Method,
    pub path:   String,
    pub query:  Option<String>,
    /// 検証済みの JSON バイト列（受け取ったまま転送する）
    pub body:   Option<Bytes>,
    pub bearer: Option<BearerToken>,
}

impl OutboundCall {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: None,
            body: None,
            bearer: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// 空のクエリ文字列は付与しない
    pub fn with_query(mut self, query: Option<&str>) -> Self {
        self.query = query.filter(|q| !q.is_empty()).map(ToString::to_string);
        self
    }

    pub fn with_body(mut self, body: Bytes) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_bearer(mut self, token: BearerToken) -> Self {
        self.bearer = Some(token);
        self
    }
}

/// バックエンドの成功応答
///
/// `body` は JSON として解釈できることを確認済みのバイト列。
/// 空ボディ（204 など）の場合は空のまま保持する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendResponse {
    pub status:       StatusCode,
    pub body:         Bytes,
    /// バックエンドが付与した Content-Type（`charset` などのパラメータを含む）
    pub content_type: Option<String>,
}

impl BackendResponse {
    /// ボディが空か（空白のみも空とみなす）
    pub fn is_empty(&self) -> bool {
        self.body.iter().all(u8::is_ascii_whitespace)
    }

    /// ボディを任意の型にデシリアライズする
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, BackendError> {
        serde_json::from_slice(&self.body).map_err(|e| BackendError::InvalidResponse(e.to_string()))
    }
}
