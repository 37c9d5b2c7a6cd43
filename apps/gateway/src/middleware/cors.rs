//! CORS レイヤーの構築
//!
//! 許可オリジンは設定から受け取る。資格情報（Cookie / Authorization）付きの
//! リクエストを許可するため、メソッドとヘッダーはワイルドカードではなく
//! リクエストの値をそのまま返す。

use std::time::Duration;

use axum::http::{HeaderName, HeaderValue};
use surveygate_shared::observability::REQUEST_ID_HEADER;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

/// プリフライト結果のキャッシュ期間
const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(3600);

/// 許可オリジンの一覧から CORS レイヤーを構築する
///
/// `*` を含む場合はリクエストのオリジンをそのまま許可する。
/// ヘッダー値として不正なオリジンは警告を出して無視する。
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let allow_origin = if allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::mirror_request()
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "不正な CORS オリジンを無視します");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)])
        .max_age(PREFLIGHT_MAX_AGE)
}
