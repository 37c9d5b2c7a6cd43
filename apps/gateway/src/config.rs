//! # ゲートウェイ設定
//!
//! 環境変数からゲートウェイの設定を読み込む。
//!
//! 値の解釈は [`GatewayConfig::from_lookup`] に集約し、テストでは
//! プロセスの環境変数を書き換えずにクロージャで値を与える。

use std::{env, time::Duration};

use thiserror::Error;
use url::Url;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_CORS_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:3001";
const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 30;

/// 設定読み込みエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// 必須の環境変数が未設定
    #[error("{0} が設定されていません")]
    Missing(&'static str),

    /// 値の形式が不正
    #[error("{var} の値が不正です: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// ゲートウェイの設定
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// バインドアドレス
    pub host: String,
    /// ポート番号
    pub port: u16,
    /// バックエンドのベース URL（末尾の `/` は除去済み）
    pub backend_url: String,
    /// CORS で許可するオリジン
    pub cors_allowed_origins: Vec<String>,
    /// バックエンド呼び出し 1 回あたりのタイムアウト（`None` で無制限）
    pub backend_timeout: Option<Duration>,
}

impl GatewayConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 任意のキー検索関数から設定を組み立てる
    ///
    /// `BACKEND_URL` が無い場合は旧名の `PHP_BACKEND_URL` を参照する。
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = lookup("GATEWAY_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match lookup("GATEWAY_PORT") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                var:    "GATEWAY_PORT",
                reason: format!("有効なポート番号ではありません: {value}"),
            })?,
            None => DEFAULT_PORT,
        };

        let backend_url = lookup("BACKEND_URL")
            .or_else(|| lookup("PHP_BACKEND_URL"))
            .ok_or(ConfigError::Missing("BACKEND_URL"))?;
        let backend_url = parse_backend_url(&backend_url)?;

        let cors_allowed_origins = parse_origins(
            &lookup("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|| DEFAULT_CORS_ALLOWED_ORIGINS.to_string()),
        );

        let backend_timeout = match lookup("BACKEND_TIMEOUT_SECS") {
            Some(value) => parse_timeout(&value)?,
            None => Some(Duration::from_secs(DEFAULT_BACKEND_TIMEOUT_SECS)),
        };

        Ok(Self {
            host,
            port,
            backend_url,
            cors_allowed_origins,
            backend_timeout,
        })
    }
}

/// バックエンド URL を検証し、末尾の `/` を除去して返す
fn parse_backend_url(value: &str) -> Result<String, ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::Invalid {
        var:    "BACKEND_URL",
        reason: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid {
            var:    "BACKEND_URL",
            reason: format!("http または https である必要があります: {value}"),
        });
    }

    Ok(value.trim_end_matches('/').to_string())
}

/// カンマ区切りのオリジン一覧をパースする（空要素は無視）
fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// タイムアウト秒数をパースする（`0` はタイムアウト無し）
fn parse_timeout(value: &str) -> Result<Option<Duration>, ConfigError> {
    let secs: u64 = value.trim().parse().map_err(|_| ConfigError::Invalid {
        var:    "BACKEND_TIMEOUT_SECS",
        reason: format!("秒数ではありません: {value}"),
    })?;

    Ok((secs > 0).then_some(Duration::from_secs(secs)))
}
