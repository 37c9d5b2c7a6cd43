//! # ヘルスチェック共通型
//!
//! `GET /api/health` が返すレスポンス型。
//! ゲートウェイ自身の稼働状態と、バックエンドへの疎通結果をまとめて返す。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// ゲートウェイ全体のステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// バックエンドまで疎通している
    Ok,
    /// ゲートウェイは稼働しているが、バックエンドに到達できない
    Degraded,
}

/// バックエンドへの接続状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendConnection {
    Connected,
    Disconnected,
}

/// バックエンドのヘルスチェック結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendHealth {
    pub status: BackendConnection,
    /// 失敗理由（接続時は出力しない）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl BackendHealth {
    pub fn connected() -> Self {
        Self {
            status: BackendConnection::Connected,
            detail: None,
        }
    }

    pub fn disconnected(detail: impl Into<String>) -> Self {
        Self {
            status: BackendConnection::Disconnected,
            detail: Some(detail.into()),
        }
    }
}

/// ヘルスチェックレスポンス
///
/// `status` はバックエンドの状態から導出する。
///
/// ## 使用例
///
/// ```
/// use surveygate_shared::{BackendHealth, HealthResponse, HealthStatus};
///
/// let response = HealthResponse::new("0.1.0", BackendHealth::connected());
/// assert_eq!(response.status, HealthStatus::Ok);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status:    HealthStatus,
    /// アプリケーションバージョン（Cargo.toml から取得）
    pub version:   String,
    pub timestamp: DateTime<Utc>,
    pub backend:   BackendHealth,
}

impl HealthResponse {
    /// 現在時刻でレスポンスを作成する
    pub fn new(version: impl Into<String>, backend: BackendHealth) -> Self {
        let status = match backend.status {
            BackendConnection::Connected => HealthStatus::Ok,
            BackendConnection::Disconnected => HealthStatus::Degraded,
        };
        Self {
            status,
            version: version.into(),
            timestamp: Utc::now(),
            backend,
        }
    }
}
