//! # ゲートウェイアプリケーション構築
//!
//! State の初期化とルーター構築を担当する。
//! `main.rs` はインフラ初期化とサーバー起動に集中する。
//!
//! 統合テストも本番と同じルーターを使うため、ライブラリ側に置く。

use std::sync::Arc;

use axum::{Router, middleware::from_fn, routing::get};
use surveygate_shared::observability::{MakeRequestUuidV7, make_request_span};
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::{
    client::BackendClient,
    config::GatewayConfig,
    error::{handle_panic, method_not_allowed, not_found},
    handler::{GatewayState, health_check},
    middleware::{cors_layer, request_id::store_request_id},
    route::build_api_router,
};

/// State の構築とルーター定義を行う
///
/// バックエンドクライアントは外から受け取る（テストではスタブや
/// モックサーバー向けのクライアントを渡す）。
pub fn build_app(config: &GatewayConfig, backend: Arc<dyn BackendClient>) -> Router {
    let state = Arc::new(GatewayState::new(backend));

    // ルーター構築
    // ヘルスチェック以外のエンドポイントはルートテーブルから生成する
    Router::new()
        .route("/api/health", get(health_check))
        .with_state(state.clone())
        .merge(build_api_router(state))
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        // ハンドラ内のパニックは 500 の ErrorResponse に変換する
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors_layer(&config.cors_allowed_origins))
        // Request ID レイヤー（レイヤー順序が重要: 下に書いたものが外側）
        // 1. SetRequestIdLayer（最外）: リクエスト受信時に UUID v7 を生成（またはクライアント提供値を使用）
        // 2. TraceLayer: カスタムスパンに request_id を含め、全ログに自動注入
        // 3. PropagateRequestIdLayer: レスポンスヘッダーに X-Request-Id をコピー
        // 4. store_request_id: task-local に保存し、ゲートウェイ → バックエンドのヘッダー伝播に使用
        .layer(from_fn(store_request_id))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
}
