//! バックエンドクライアントのエラー型

use bytes::Bytes;
use http::{Method, StatusCode};
use thiserror::Error;

/// バックエンドクライアントエラー
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// GET / POST / PUT / DELETE 以外のメソッド（通信前に失敗する）
    #[error("サポートされていない HTTP メソッドです: {0}")]
    InvalidMethod(Method),

    /// 接続拒否・名前解決失敗・タイムアウトなどの通信エラー
    #[error("バックエンドに接続できません: {0}")]
    Unreachable(String),

    /// バックエンドが 2xx 以外を返した
    ///
    /// ボディと Content-Type は呼び出し元へそのまま中継するため加工しない。
    /// ボディは UTF-8 とは限らないのでバイト列のまま保持する。
    #[error("バックエンドがステータス {status} を返しました")]
    Status {
        status:       StatusCode,
        body:         Bytes,
        content_type: Option<String>,
    },

    /// 2xx だがボディが JSON として解釈できない
    #[error("バックエンドの応答が JSON ではありません: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        BackendError::Unreachable(err.to_string())
    }
}
