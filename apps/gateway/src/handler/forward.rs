//! # 汎用転送ハンドラ
//!
//! ルートテーブルの 1 エントリ分の処理を行う。
//!
//! 0. ルートに宣言されたメソッド以外（axum が GET に流す HEAD など）は 405 で拒否する
//! 1. 保護ルートならトークンを検証する（失敗時はバックエンドを呼ばない）
//! 2. ペイロードの形状を確認する（失敗時はバックエンドを呼ばない）
//! 3. 受信パスから `/api/` を取り除いたパスで転送する
//! 4. バックエンドのステータス・Content-Type・JSON ボディをそのまま返す

use std::sync::Arc;

use axum::{
    body::{Body, to_bytes},
    extract::Request,
    http::{HeaderValue, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};

use super::GatewayState;
use crate::{
    client::{BackendResponse, OutboundCall},
    error::GatewayError,
    route::{Access, RouteSpec, RouteTarget},
};

/// 受信ボディの上限（axum の既定値と同じ 2 MiB）
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// ルートテーブルの全エントリが束縛される汎用ハンドラ
#[tracing::instrument(
    skip_all,
    fields(
        route.method = %route.method,
        route.path = route.path,
        route.payload = %route.payload
    )
)]
pub async fn forward_route(
    state: Arc<GatewayState>,
    route: &'static RouteSpec,
    request: Request,
) -> Response {
    match forward(&state, route, request).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    }
}

async fn forward(
    state: &GatewayState,
    route: &RouteSpec,
    request: Request,
) -> Result<Response, GatewayError> {
    let (parts, body) = request.into_parts();

    let method = route.method.as_http();
    if parts.method != method {
        return Err(GatewayError::MethodNotAllowed(parts.method));
    }

    let user = match route.access {
        Access::Protected => {
            let user = state.verifier.verify(&parts.headers).await.inspect_err(|e| {
                tracing::debug!(reason = %e, "トークン検証に失敗しました");
            })?;
            tracing::debug!(user.id = ?user.user.get("id"), "トークンを検証しました");
            Some(user)
        }
        Access::Public => None,
    };

    if route.target == RouteTarget::NotImplemented {
        return Err(GatewayError::NotImplemented(
            "ファイルのアップロード・ダウンロードはゲートウェイでは提供していません".to_string(),
        ));
    }

    let body = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| GatewayError::InvalidInput(format!("リクエストボディを読み込めません: {e}")))?;
    let body = route.payload.accept(body).map_err(GatewayError::InvalidInput)?;

    let mut call = OutboundCall::new(method, backend_path(parts.uri.path()))
        .with_query(parts.uri.query());
    if let Some(body) = body {
        call = call.with_body(body);
    }
    if let Some(user) = user {
        call = call.with_bearer(user.token);
    }

    let response = state.backend.forward(call).await?;
    Ok(relay(response))
}

/// 受信パスからバックエンドの相対パスを求める
///
/// パーセントエンコードはデコードせずにそのまま渡す。
fn backend_path(inbound: &str) -> &str {
    inbound.strip_prefix("/api/").unwrap_or(inbound)
}

/// バックエンドの成功応答をそのまま返す
///
/// ボディが空の場合はステータスのみ返す。Content-Type はバックエンドの値を使い、
/// 無い場合やヘッダー値として不正な場合は `application/json` とする。
fn relay(response: BackendResponse) -> Response {
    if response.is_empty() {
        return response.status.into_response();
    }

    let content_type = response
        .content_type
        .as_deref()
        .and_then(|ct| HeaderValue::from_str(ct).ok())
        .unwrap_or_else(|| HeaderValue::from_static("application/json"));

    (
        response.status,
        [(CONTENT_TYPE, content_type)],
        Body::from(response.body),
    )
        .into_response()
}
