//! # SurveyGate 共有ユーティリティ
//!
//! ゲートウェイ本体から利用される、サービス非依存のユーティリティを提供する。
//!
//! ## 設計方針
//!
//! - ビジネスロジックを含まない純粋なユーティリティのみを配置
//! - axum への依存を持たない（`IntoResponse` 変換は各サービスの責務）
//! - トレーシング関連は `observability` feature の背後に置く

pub mod error_response;
pub mod health;
pub mod observability;

pub use error_response::ErrorResponse;
pub use health::{BackendConnection, BackendHealth, HealthResponse, HealthStatus};
