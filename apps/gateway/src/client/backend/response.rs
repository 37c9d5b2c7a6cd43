//! バックエンドレスポンスの共通ハンドリング

use http::header::CONTENT_TYPE;

use super::{call::BackendResponse, error::BackendError};

/// バックエンドレスポンスを [`BackendResponse`] に変換する
///
/// - 2xx: ボディが JSON（または空）であることを確認して返す
/// - 2xx 以外: ステータス・生ボディ・Content-Type を保持した `Status` エラー
/// - ボディ読み込み中の通信エラー: `Unreachable`
pub(super) async fn handle_response(
    response: reqwest::Response,
) -> Result<BackendResponse, BackendError> {
    let status = response.status();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);

    let body = response.bytes().await?;

    if !status.is_success() {
        return Err(BackendError::Status {
            status,
            body,
            content_type,
        });
    }

    let response = BackendResponse {
        status,
        body,
        content_type,
    };
    if !response.is_empty() {
        serde_json::from_slice::<serde::de::IgnoredAny>(&response.body)
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;
    }

    Ok(response)
}
