//! # 転送経路の統合テスト
//!
//! 本番と同じルーター（`build_app`）をモックバックエンドに向けて動かし、
//! 転送・中継・エラー変換の振る舞いを検証する。

mod common;

use axum::http::{Method, StatusCode, header};
use common::{
    MockBackend,
    VALID_TOKEN,
    body_for,
    concrete_uri,
    gateway_for,
    request,
    send,
    unreachable_backend_url,
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use surveygate_gateway::route::{Access, ROUTES, RouteTarget};

// --- 転送 ---

#[tokio::test]
async fn test_検証済みトークンをそのまま付けて転送する() {
    let backend = MockBackend::start().await;
    let app = backend.gateway();

    let response = send(&app, request(Method::GET, "/api/surveys", Some(VALID_TOKEN), "")).await;

    assert_eq!(response.status, StatusCode::OK);
    let requests = backend.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].path, "/api/auth/me");
    assert_eq!(requests[1].method, Method::GET);
    assert_eq!(requests[1].path, "/api/surveys");
    assert_eq!(
        requests[1].header("authorization"),
        Some("Bearer valid-token")
    );
}

#[tokio::test]
async fn test_全保護ルートで検証済みトークンを付けて転送する() {
    let backend = MockBackend::start().await;
    let app = backend.gateway();

    let routes = ROUTES
        .iter()
        .filter(|r| r.access == Access::Protected && r.target == RouteTarget::Backend);
    for route in routes {
        let uri = concrete_uri(route);

        let response = send(
            &app,
            request(route.method.as_http(), &uri, Some(VALID_TOKEN), body_for(route)),
        )
        .await;

        assert_eq!(response.status, StatusCode::OK, "{} {uri} が転送されない", route.method);
        // 直前の記録が検証ではなく転送本体であること
        let requests = backend.requests();
        let last = requests.last().unwrap();
        assert_eq!(last.method, route.method.as_http());
        assert_eq!(last.path, uri);
        assert_eq!(
            last.header("authorization"),
            Some("Bearer valid-token"),
            "{} {uri} にトークンが付いていない",
            route.method
        );
    }
}

#[tokio::test]
async fn test_作成ボディはバイト単位で同一のまま届く() {
    let backend = MockBackend::start().await;
    backend.respond(
        Method::POST,
        "/api/surveys",
        StatusCode::CREATED,
        r#"{"id":42,"title":"顧客満足度"}"#,
    );
    let app = backend.gateway();
    let body = r#"{"title":"顧客満足度","description":null,"is_public":false,"questions":[{"type":"rating","max":5}],"x":1.0}"#;

    let response = send(&app, request(Method::POST, "/api/surveys", Some(VALID_TOKEN), body)).await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body.as_ref(), r#"{"id":42,"title":"顧客満足度"}"#.as_bytes());
    let forwarded = backend.forwarded();
    assert_eq!(forwarded.len(), 1);
    assert_eq!(forwarded[0].body.as_ref(), body.as_bytes());
    assert_eq!(forwarded[0].header("content-type"), Some("application/json"));
}

#[tokio::test]
async fn test_クエリ文字列をそのまま転送する() {
    let backend = MockBackend::start().await;
    let app = backend.gateway();

    send(
        &app,
        request(
            Method::GET,
            "/api/admin/users?page=2&search=a%20b",
            Some(VALID_TOKEN),
            "",
        ),
    )
    .await;

    let forwarded = backend.forwarded();
    assert_eq!(forwarded[0].path, "/api/admin/users");
    assert_eq!(forwarded[0].query.as_deref(), Some("page=2&search=a%20b"));
}

#[tokio::test]
async fn test_パスパラメータを含むパスを鏡像で転送する() {
    let backend = MockBackend::start().await;
    let app = backend.gateway();

    send(
        &app,
        request(
            Method::POST,
            "/api/templates/17/duplicate",
            Some(VALID_TOKEN),
            "",
        ),
    )
    .await;

    let forwarded = backend.forwarded();
    assert_eq!(forwarded[0].method, Method::POST);
    assert_eq!(forwarded[0].path, "/api/templates/17/duplicate");
    assert!(forwarded[0].body.is_empty());
}

#[tokio::test]
async fn test_deleteの204を空ボディで返す() {
    let backend = MockBackend::start().await;
    backend.respond_with_type(Method::DELETE, "/api/tasks/9", StatusCode::NO_CONTENT, None, "");
    let app = backend.gateway();

    let response = send(&app, request(Method::DELETE, "/api/tasks/9", Some(VALID_TOKEN), "")).await;

    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert!(response.body.is_empty());
}

// --- 公開ルート ---

#[rstest]
#[case(Method::GET, "/api/public/surveys", "")]
#[case(Method::GET, "/api/public/surveys/5", "")]
#[case(Method::POST, "/api/public/surveys/5/submit", r#"{"answers":[{"question_id":1,"value":"yes"}]}"#)]
#[tokio::test]
async fn test_公開ルートは検証せずに転送する(
    #[case] method: Method,
    #[case] uri: &str,
    #[case] body: &str,
) {
    let backend = MockBackend::start().await;
    let app = backend.gateway();

    let response = send(&app, request(method, uri, None, body)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(backend.identity_calls(), 0);
    let forwarded = backend.forwarded();
    assert_eq!(forwarded.len(), 1);
    assert_eq!(forwarded[0].path, uri);
    assert_eq!(forwarded[0].header("authorization"), None);
}

#[tokio::test]
async fn test_ログインは認証なしでボディを転送する() {
    let backend = MockBackend::start().await;
    let app = backend.gateway();
    let body = r#"{"email":"admin@example.com","password":"secret"}"#;

    let response = send(&app, request(Method::POST, "/api/auth/login", None, body)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(backend.identity_calls(), 0);
    assert_eq!(backend.forwarded()[0].body.as_ref(), body.as_bytes());
}

// --- エラー中継 ---

#[tokio::test]
async fn test_バックエンドの404をそのまま中継する() {
    let backend = MockBackend::start().await;
    backend.respond(
        Method::GET,
        "/api/surveys/999",
        StatusCode::NOT_FOUND,
        r#"{"message":"not found"}"#,
    );
    let app = backend.gateway();

    let response = send(&app, request(Method::GET, "/api/surveys/999", Some(VALID_TOKEN), "")).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body.as_ref(), br#"{"message":"not found"}"#);
    assert_eq!(
        response.headers.get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
}

#[tokio::test]
async fn test_到達不能と403は区別できる() {
    // 到達不能: 公開ルートなので検証を経ずに転送で失敗する
    let unreachable = gateway_for(&unreachable_backend_url());
    let down = send(&unreachable, request(Method::GET, "/api/public/surveys", None, "")).await;

    // 403: バックエンドは応答している
    let backend = MockBackend::start().await;
    backend.respond(
        Method::GET,
        "/api/admin/users",
        StatusCode::FORBIDDEN,
        r#"{"error":"Admin access required"}"#,
    );
    let forbidden = send(
        &backend.gateway(),
        request(Method::GET, "/api/admin/users", Some(VALID_TOKEN), ""),
    )
    .await;

    assert_eq!(down.status, StatusCode::BAD_GATEWAY);
    assert!(
        down.json()["type"]
            .as_str()
            .unwrap()
            .ends_with("/backend-unreachable")
    );
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);
    assert_eq!(forbidden.body.as_ref(), br#"{"error":"Admin access required"}"#);
}

#[tokio::test]
async fn test_json以外の成功応答は502() {
    let backend = MockBackend::start().await;
    backend.respond_with_type(
        Method::GET,
        "/api/analytics/dashboard",
        StatusCode::OK,
        Some("text/html"),
        "<html>maintenance</html>",
    );
    let app = backend.gateway();

    let response = send(
        &app,
        request(Method::GET, "/api/analytics/dashboard", Some(VALID_TOKEN), ""),
    )
    .await;

    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    assert!(
        response.json()["type"]
            .as_str()
            .unwrap()
            .ends_with("/invalid-backend-response")
    );
}

// --- 入力エラー（バックエンドを呼ばない） ---

#[tokio::test]
async fn test_patchは405でバックエンドを呼ばない() {
    let backend = MockBackend::start().await;
    let app = backend.gateway();

    let response = send(
        &app,
        request(Method::PATCH, "/api/surveys/1", Some(VALID_TOKEN), r#"{"title":"t"}"#),
    )
    .await;

    assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.json()["status"], 405);
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_getルートへのheadは405で検証も転送もしない() {
    let backend = MockBackend::start().await;
    let app = backend.gateway();

    let response = send(&app, request(Method::HEAD, "/api/surveys", Some(VALID_TOKEN), "")).await;

    assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(backend.identity_calls(), 0);
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_成功応答のcontent_typeをそのまま返す() {
    let backend = MockBackend::start().await;
    backend.respond_with_type(
        Method::GET,
        "/api/themes",
        StatusCode::OK,
        Some("application/json; charset=utf-8"),
        r#"{"themes":[]}"#,
    );
    let app = backend.gateway();

    let response = send(&app, request(Method::GET, "/api/themes", Some(VALID_TOKEN), "")).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.headers.get(header::CONTENT_TYPE).unwrap(),
        "application/json; charset=utf-8"
    );
}

#[tokio::test]
async fn test_utf8でないエラーボディもバイト単位で中継する() {
    let backend = MockBackend::start().await;
    backend.respond_raw(
        Method::GET,
        "/api/surveys/8",
        StatusCode::BAD_REQUEST,
        Some("text/plain; charset=shift_jis"),
        vec![0x82, 0xa0, 0xff],
    );
    let app = backend.gateway();

    let response = send(&app, request(Method::GET, "/api/surveys/8", Some(VALID_TOKEN), "")).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body.as_ref(), &[0x82_u8, 0xa0, 0xff][..]);
}

#[tokio::test]
async fn test_不正なjsonは400でバックエンドに転送しない() {
    let backend = MockBackend::start().await;
    let app = backend.gateway();

    let response = send(
        &app,
        request(Method::POST, "/api/surveys", Some(VALID_TOKEN), "{not json"),
    )
    .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(
        response.json()["type"]
            .as_str()
            .unwrap()
            .ends_with("/validation-error")
    );
    assert!(backend.forwarded().is_empty());
}

#[tokio::test]
async fn test_タイトルのないアンケートは400() {
    let backend = MockBackend::start().await;
    let app = backend.gateway();

    let response = send(
        &app,
        request(
            Method::PUT,
            "/api/surveys/3",
            Some(VALID_TOKEN),
            r#"{"description":"no title"}"#,
        ),
    )
    .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(backend.forwarded().is_empty());
}

#[tokio::test]
async fn test_未知のパスは404() {
    let backend = MockBackend::start().await;
    let app = backend.gateway();

    let response = send(&app, request(Method::GET, "/api/unknown", Some(VALID_TOKEN), "")).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.json()["status"], 404);
    assert!(backend.requests().is_empty());
}

// --- アップロード ---

#[rstest]
#[case(Method::POST, "/api/upload")]
#[case(Method::GET, "/api/upload/report.pdf")]
#[case(Method::DELETE, "/api/upload/report.pdf")]
#[tokio::test]
async fn test_アップロードは検証後に501を返す(#[case] method: Method, #[case] uri: &str) {
    let backend = MockBackend::start().await;
    let app = backend.gateway();

    let response = send(&app, request(method, uri, Some(VALID_TOKEN), "")).await;

    assert_eq!(response.status, StatusCode::NOT_IMPLEMENTED);
    assert_eq!(backend.identity_calls(), 1);
    assert!(backend.forwarded().is_empty());
}
