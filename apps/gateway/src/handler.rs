//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! ## 設計方針
//!
//! - ルートテーブルの全エントリは汎用ハンドラ [`forward_route`] 1 つで処理する
//! - ハンドラは薄く保ち、業務ロジックはすべてバックエンドに委譲
//!
//! ## ハンドラ一覧
//!
//! - `forward`: 汎用転送（検証 → ペイロード確認 → 転送 → 中継）
//! - `health`: ヘルスチェック（バックエンドの接続状態を含む）

pub mod forward;
pub mod health;

use std::sync::Arc;

pub use forward::forward_route;
pub use health::health_check;

use crate::{auth::TokenVerifier, client::BackendClient};

/// ハンドラ共通の State
pub struct GatewayState {
    pub backend:  Arc<dyn BackendClient>,
    pub verifier: TokenVerifier,
}

impl GatewayState {
    /// 同じバックエンドクライアントで転送と検証を行う State を作成する
    pub fn new(backend: Arc<dyn BackendClient>) -> Self {
        Self {
            verifier: TokenVerifier::new(backend.clone()),
            backend,
        }
    }
}
