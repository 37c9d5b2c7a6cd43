//! # ゲートウェイエラーハンドリング
//!
//! 転送経路で発生するエラーの定義と、axum レスポンスへの変換。
//!
//! ゲートウェイ自身が生成するエラーは RFC 9457 の [`ErrorResponse`] で返す。
//! バックエンドが返したエラー（2xx 以外）だけは包み直さず、ステータス・ボディ・
//! Content-Type をそのまま中継する。

use axum::{
    Json,
    body::Body,
    http::{
        HeaderValue,
        Method,
        StatusCode,
        header::{CONTENT_TYPE, WWW_AUTHENTICATE},
    },
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use surveygate_shared::ErrorResponse;
use thiserror::Error;

use crate::{auth::AuthError, client::BackendError};

// --- エラー型 ---

/// ゲートウェイエラー
#[derive(Debug, Error)]
pub enum GatewayError {
    /// 資格情報が無い、または受け付けられなかった
    ///
    /// 理由は区別せず同じ 401 を返す。
    #[error("認証に失敗しました")]
    Authentication,

    /// トークン検証中にバックエンドへ到達できなかった
    #[error("認証サービスに接続できません: {0}")]
    BackendUnavailable(String),

    /// 転送先のバックエンドへ到達できなかった
    #[error("バックエンドに接続できません: {0}")]
    BackendUnreachable(String),

    /// バックエンドが 2xx 以外を返した
    #[error("バックエンドがステータス {status} を返しました")]
    BackendStatus {
        status:       StatusCode,
        body:         Bytes,
        content_type: Option<String>,
    },

    /// バックエンドへ送る前に判明した入力の不備
    #[error("入力が不正です: {0}")]
    InvalidInput(String),

    /// ルートに宣言されていないメソッド（HEAD など）
    ///
    /// トークン検証より前に判定するため、バックエンドへの通信は発生しない。
    #[error("サポートされていない HTTP メソッドです: {0}")]
    MethodNotAllowed(Method),

    /// バックエンドの 2xx 応答が JSON として解釈できない
    #[error("バックエンドの応答が不正です: {0}")]
    InvalidBackendResponse(String),

    /// ゲートウェイが処理しないルート
    #[error("未実装です: {0}")]
    NotImplemented(String),

    /// 予期しない内部エラー（ハンドラのパニックを含む）
    ///
    /// 理由はログにのみ出力し、レスポンスには含めない。
    #[error("内部エラー: {0}")]
    Internal(String),
}

impl From<BackendError> for GatewayError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::InvalidMethod(method) => {
                GatewayError::InvalidInput(format!("サポートされていない HTTP メソッドです: {method}"))
            }
            BackendError::Unreachable(reason) => GatewayError::BackendUnreachable(reason),
            BackendError::Status {
                status,
                body,
                content_type,
            } => GatewayError::BackendStatus {
                status,
                body,
                content_type,
            },
            BackendError::InvalidResponse(reason) => GatewayError::InvalidBackendResponse(reason),
        }
    }
}

impl From<AuthError> for GatewayError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredential | AuthError::InvalidCredential(_) => {
                GatewayError::Authentication
            }
            AuthError::BackendUnavailable(reason) => GatewayError::BackendUnavailable(reason),
        }
    }
}

// --- IntoResponse ---

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match self {
            GatewayError::Authentication => unauthorized_response(),
            GatewayError::BackendUnavailable(reason) => {
                tracing::error!(
                    error.category = "external_service",
                    error.kind = "token_verification",
                    "トークン検証中にバックエンドへ接続できません: {}",
                    reason
                );
                service_unavailable_response()
            }
            GatewayError::BackendUnreachable(reason) => {
                tracing::error!(
                    error.category = "external_service",
                    error.kind = "service_communication",
                    "バックエンドへの転送に失敗しました: {}",
                    reason
                );
                (
                    StatusCode::BAD_GATEWAY,
                    Json(ErrorResponse::bad_gateway(
                        "backend-unreachable",
                        "バックエンドに接続できません",
                    )),
                )
                    .into_response()
            }
            GatewayError::BackendStatus {
                status,
                body,
                content_type,
            } => {
                tracing::debug!(
                    http.status_code = status.as_u16(),
                    "バックエンドのエラー応答を中継します"
                );
                relay_backend_error(status, body, content_type)
            }
            GatewayError::InvalidInput(detail) => validation_error_response(&detail),
            GatewayError::MethodNotAllowed(method) => {
                tracing::debug!(http.method = %method, "ルートに無いメソッドを拒否しました");
                method_not_allowed_response()
            }
            GatewayError::InvalidBackendResponse(reason) => {
                tracing::error!(
                    error.category = "external_service",
                    error.kind = "invalid_response",
                    "バックエンドの応答が JSON ではありません: {}",
                    reason
                );
                (
                    StatusCode::BAD_GATEWAY,
                    Json(ErrorResponse::bad_gateway(
                        "invalid-backend-response",
                        format!("バックエンドの応答を解釈できません: {reason}"),
                    )),
                )
                    .into_response()
            }
            GatewayError::NotImplemented(detail) => (
                StatusCode::NOT_IMPLEMENTED,
                Json(ErrorResponse::not_implemented(detail)),
            )
                .into_response(),
            GatewayError::Internal(reason) => {
                tracing::error!(
                    error.category = "internal",
                    error.kind = "unexpected",
                    "予期しない内部エラーが発生しました: {}",
                    reason
                );
                internal_error_response()
            }
        }
    }
}

/// バックエンドのエラー応答をそのまま返す
///
/// Content-Type が無い、またはヘッダー値として不正な場合は付与しない。
fn relay_backend_error(status: StatusCode, body: Bytes, content_type: Option<String>) -> Response {
    let mut response = (status, Body::from(body)).into_response();
    if let Some(value) = content_type.and_then(|ct| HeaderValue::from_str(&ct).ok()) {
        response.headers_mut().insert(CONTENT_TYPE, value);
    }
    response
}

// --- レスポンスヘルパー ---

/// 未認証レスポンス（`WWW-Authenticate: Bearer` 付き）
pub fn unauthorized_response() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"))],
        Json(ErrorResponse::unauthorized("認証が必要です")),
    )
        .into_response()
}

/// 認証サービス利用不可レスポンス
pub fn service_unavailable_response() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ErrorResponse::service_unavailable(
            "認証サービスが一時的に利用できません",
        )),
    )
        .into_response()
}

/// バリデーションエラーレスポンス
pub fn validation_error_response(detail: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::validation_error(detail)),
    )
        .into_response()
}

/// メソッド不許可レスポンス
pub fn method_not_allowed_response() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorResponse::method_not_allowed(
            "このエンドポイントはこの HTTP メソッドをサポートしていません",
        )),
    )
        .into_response()
}

/// 内部エラーレスポンス
pub fn internal_error_response() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::internal_error()),
    )
        .into_response()
}

// --- フォールバック ---

/// ルートテーブルに無いパスへのフォールバック
pub async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::not_found("指定されたエンドポイントは存在しません")),
    )
        .into_response()
}

/// パスは存在するがメソッドが登録されていない場合のフォールバック
pub async fn method_not_allowed() -> Response {
    method_not_allowed_response()
}

/// `CatchPanicLayer` 用のパニックハンドラ
pub fn handle_panic(err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let message = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("不明なパニック");

    GatewayError::Internal(format!("ハンドラでパニックが発生しました: {message}")).into_response()
}
