//! # トークン検証
//!
//! 受信リクエストの Bearer トークンを取り出し、バックエンドの `auth/me` に
//! 問い合わせてユーザーコンテキストを解決する。
//!
//! ゲートウェイはトークンを解読しない。有効性の判断はすべてバックエンドに委譲し、
//! 検証結果もキャッシュしない（保護ルートへのリクエストごとに毎回検証する）。

use std::{fmt, sync::Arc};

use http::{HeaderMap, header::AUTHORIZATION};
use serde::Deserialize;
use thiserror::Error;

use crate::client::{BackendClient, BackendError, OutboundCall};

/// バックエンドの本人確認エンドポイント
pub const IDENTITY_PATH: &str = "auth/me";

/// Bearer トークン
///
/// 受け取った値をそのまま保持し、転送時に同じ値を付け直す。
/// ログへの漏洩を防ぐため `Debug` では値を伏せる。
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

/// `Authorization: Bearer <token>` ヘッダーからトークンを取り出す
///
/// スキーム名は大文字小文字を区別しない。トークンが空の場合は未指定として扱う。
pub fn extract_bearer(headers: &HeaderMap) -> Option<BearerToken> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    Some(BearerToken::new(token))
}

/// ユーザーコンテキスト
///
/// 1 リクエストの間だけ保持する。`token` は検証に成功した資格情報そのもので、
/// 後続の転送呼び出しに付け直すために使う。
#[derive(Debug, Clone)]
pub struct UserContext {
    pub token: BearerToken,
    /// バックエンドの `auth/me` が返した `user` オブジェクト
    pub user:  serde_json::Value,
}

/// トークン検証エラー
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// Bearer トークンが無い
    #[error("Bearer トークンがありません")]
    MissingCredential,

    /// バックエンドがトークンを受け付けなかった、または本人情報が不正
    #[error("トークンが無効です: {0}")]
    InvalidCredential(String),

    /// 検証中にバックエンドへ到達できなかった
    #[error("認証サービスに接続できません: {0}")]
    BackendUnavailable(String),
}

/// `auth/me` のレスポンス（`user` 以外は読まない）
#[derive(Debug, Deserialize)]
struct IdentityResponse {
    user: Option<serde_json::Value>,
}

/// トークン検証器
#[derive(Clone)]
pub struct TokenVerifier {
    backend: Arc<dyn BackendClient>,
}

impl TokenVerifier {
    pub fn new(backend: Arc<dyn BackendClient>) -> Self {
        Self { backend }
    }

    /// リクエストヘッダーからユーザーコンテキストを解決する
    ///
    /// トークンが無い場合はバックエンドに問い合わせずに失敗する。
    /// 通信エラーのみ `BackendUnavailable` とし、それ以外の失敗はすべて
    /// `InvalidCredential` にまとめる。
    pub async fn verify(&self, headers: &HeaderMap) -> Result<UserContext, AuthError> {
        let token = extract_bearer(headers).ok_or(AuthError::MissingCredential)?;

        let call = OutboundCall::get(IDENTITY_PATH).with_bearer(token.clone());
        let response = match self.backend.forward(call).await {
            Ok(response) => response,
            Err(BackendError::Unreachable(reason)) => {
                return Err(AuthError::BackendUnavailable(reason));
            }
            Err(e) => return Err(AuthError::InvalidCredential(e.to_string())),
        };

        let identity: IdentityResponse = response
            .json()
            .map_err(|e| AuthError::InvalidCredential(e.to_string()))?;

        match identity.user {
            Some(user) if user.is_object() => Ok(UserContext { token, user }),
            _ => Err(AuthError::InvalidCredential(
                "user オブジェクトがありません".to_string(),
            )),
        }
    }
}
