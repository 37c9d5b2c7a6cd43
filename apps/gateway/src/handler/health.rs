//! # ヘルスチェックハンドラ
//!
//! ゲートウェイの稼働状態と、バックエンドへの接続状態を返す。
//!
//! バックエンドに到達できない場合も 200 を返し、`status` を `degraded` にする。
//! レスポンス型は [`surveygate_shared::HealthResponse`] を参照。

use std::{sync::Arc, time::Duration};

use axum::{Json, extract::State};
use surveygate_shared::{BackendHealth, HealthResponse};

use super::GatewayState;
use crate::client::{BackendClient, OutboundCall};

/// バックエンドの疎通確認のタイムアウト
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// ゲートウェイのヘルスチェックエンドポイント
#[tracing::instrument(skip_all)]
pub async fn health_check(State(state): State<Arc<GatewayState>>) -> Json<HealthResponse> {
    let backend = check_backend(state.backend.as_ref()).await;
    Json(HealthResponse::new(env!("CARGO_PKG_VERSION"), backend))
}

/// バックエンドの `health` を呼び、接続状態を返す（タイムアウト: 5 秒）
async fn check_backend(backend: &dyn BackendClient) -> BackendHealth {
    match tokio::time::timeout(PROBE_TIMEOUT, backend.forward(OutboundCall::get("health"))).await {
        Ok(Ok(_)) => BackendHealth::connected(),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "health check: backend request failed");
            BackendHealth::disconnected(e.to_string())
        }
        Err(_) => {
            tracing::warn!("health check: backend check timed out");
            BackendHealth::disconnected("バックエンドの応答がタイムアウトしました")
        }
    }
}
