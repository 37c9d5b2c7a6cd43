//! # ルートテーブル
//!
//! ゲートウェイが公開するエンドポイントをデータとして宣言する。
//!
//! 各エントリは (HTTP メソッド, パステンプレート, 認証要否, ペイロード形状, 転送先)
//! の組で、すべて同じ汎用ハンドラ [`forward_route`] に束縛される。
//! バックエンド側のパスは受信パスから `/api/` を取り除いたもの（鏡像）になるため、
//! ルートごとの変換は持たない。
//!
//! `/api/health` はバックエンドへの転送ではないため、このテーブルには含めない。

use std::{collections::BTreeMap, sync::Arc};

use axum::{
    Router,
    extract::{Request, State},
    routing::{MethodFilter, MethodRouter, on},
};

use crate::{
    client::BackendMethod::{self, Delete, Get, Post, Put},
    handler::{GatewayState, forward_route},
    payload::PayloadShape::{
        self,
        AnyObject,
        Invite,
        Login,
        None as NoBody,
        OptionalObject,
        ResponseCreate,
        SurveyCreate,
        TemplateCreate,
        ThemeCreate,
        UserCreate,
    },
};

/// 認証要否
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// トークン検証を行ってから転送する
    Protected,
    /// 検証せずに転送する
    Public,
}

/// ルートの処理先
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteTarget {
    /// バックエンドへ転送する
    Backend,
    /// 検証後に 501 を返す（ファイル転送）
    NotImplemented,
}

/// ルート定義
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteSpec {
    pub method:  BackendMethod,
    /// `/api/` からの相対パステンプレート（例: `surveys/{id}`）
    pub path:    &'static str,
    pub access:  Access,
    pub payload: PayloadShape,
    pub target:  RouteTarget,
}

const fn protected(method: BackendMethod, path: &'static str, payload: PayloadShape) -> RouteSpec {
    RouteSpec {
        method,
        path,
        access: Access::Protected,
        payload,
        target: RouteTarget::Backend,
    }
}

const fn public(method: BackendMethod, path: &'static str, payload: PayloadShape) -> RouteSpec {
    RouteSpec {
        method,
        path,
        access: Access::Public,
        payload,
        target: RouteTarget::Backend,
    }
}

const fn not_implemented(method: BackendMethod, path: &'static str) -> RouteSpec {
    RouteSpec {
        method,
        path,
        access: Access::Protected,
        payload: PayloadShape::None,
        target: RouteTarget::NotImplemented,
    }
}

/// 全ルート
pub const ROUTES: &[RouteSpec] = &[
    // 認証
    public(Post, "auth/login", Login),
    protected(Get, "auth/me", NoBody),
    protected(Put, "auth/profile", AnyObject),
    protected(Post, "auth/change-password", AnyObject),
    protected(Post, "auth/register", AnyObject),
    // アンケート
    protected(Get, "surveys", NoBody),
    protected(Post, "surveys", SurveyCreate),
    protected(Get, "surveys/deleted", NoBody),
    protected(Get, "surveys/{id}", NoBody),
    protected(Put, "surveys/{id}", SurveyCreate),
    protected(Delete, "surveys/{id}", NoBody),
    protected(Post, "surveys/{id}/publish", OptionalObject),
    protected(Post, "surveys/{id}/unpublish", OptionalObject),
    protected(Post, "surveys/{id}/restore", OptionalObject),
    protected(Delete, "surveys/{id}/permanent", NoBody),
    protected(Get, "surveys/{id}/versions", NoBody),
    protected(Post, "surveys/{id}/restore-version/{version}", OptionalObject),
    protected(Get, "surveys/{id}/share", NoBody),
    // テンプレート
    protected(Get, "templates", NoBody),
    protected(Post, "templates", TemplateCreate),
    protected(Get, "templates/system", NoBody),
    protected(Get, "templates/custom", NoBody),
    protected(Get, "templates/deleted", NoBody),
    protected(Get, "templates/{id}", NoBody),
    protected(Put, "templates/{id}", TemplateCreate),
    protected(Delete, "templates/{id}", NoBody),
    protected(Post, "templates/{id}/duplicate", OptionalObject),
    protected(Post, "templates/{id}/create", OptionalObject),
    protected(Post, "templates/{id}/customize", OptionalObject),
    protected(Post, "templates/{id}/restore", OptionalObject),
    // 管理者
    protected(Get, "admin/stats", NoBody),
    protected(Get, "admin/users", NoBody),
    protected(Post, "admin/users", UserCreate),
    protected(Put, "admin/users/{id}", AnyObject),
    protected(Delete, "admin/users/{id}", NoBody),
    protected(Get, "admin/users/{id}/password", NoBody),
    protected(Post, "admin/users/{id}/reset-password", OptionalObject),
    protected(Post, "admin/invite", Invite),
    // 分析
    protected(Get, "analytics", NoBody),
    protected(Get, "analytics/dashboard", NoBody),
    protected(Get, "analytics/{survey_id}", NoBody),
    protected(Get, "analytics/survey/{id}", NoBody),
    // アップロード
    not_implemented(Post, "upload"),
    not_implemented(Get, "upload/{filename}"),
    not_implemented(Delete, "upload/{filename}"),
    // 回答
    protected(Get, "responses", NoBody),
    protected(Post, "responses", ResponseCreate),
    protected(Get, "responses/{id}", NoBody),
    protected(Delete, "responses/{id}", NoBody),
    protected(Get, "responses/survey/{id}", NoBody),
    // JSON 形式（`?format=json`）のみ中継できる。CSV はファイル転送となり 502 になる
    protected(Get, "responses/export/{id}", NoBody),
    // 質問
    protected(Get, "questions", NoBody),
    protected(Post, "questions", AnyObject),
    protected(Put, "questions/reorder", AnyObject),
    protected(Get, "questions/{id}", NoBody),
    protected(Get, "questions/survey/{id}", NoBody),
    protected(Put, "questions/{id}", AnyObject),
    protected(Delete, "questions/{id}", NoBody),
    // タスク
    protected(Get, "tasks", NoBody),
    protected(Post, "tasks", AnyObject),
    protected(Get, "tasks/stats/overview", NoBody),
    protected(Get, "tasks/{id}", NoBody),
    protected(Put, "tasks/{id}", AnyObject),
    protected(Delete, "tasks/{id}", NoBody),
    // ユーザー
    protected(Get, "users", NoBody),
    protected(Get, "users/stats/overview", NoBody),
    protected(Get, "users/{id}", NoBody),
    protected(Put, "users/{id}", AnyObject),
    protected(Delete, "users/{id}", NoBody),
    // テーマ
    protected(Get, "themes", NoBody),
    protected(Post, "themes", ThemeCreate),
    protected(Get, "themes/categories", NoBody),
    protected(Post, "themes/import", AnyObject),
    protected(Get, "themes/{id}", NoBody),
    protected(Put, "themes/{id}", AnyObject),
    protected(Delete, "themes/{id}", NoBody),
    protected(Post, "themes/{id}/duplicate", OptionalObject),
    protected(Get, "themes/{id}/preview", NoBody),
    protected(Get, "themes/{id}/export", NoBody),
    protected(Post, "themes/{id}/rate", AnyObject),
    // 公開アンケート（認証不要）
    public(Get, "public/surveys", NoBody),
    public(Get, "public/surveys/{id}", NoBody),
    public(Post, "public/surveys/{id}/submit", AnyObject),
];

fn method_filter(method: BackendMethod) -> MethodFilter {
    match method {
        BackendMethod::Get => MethodFilter::GET,
        BackendMethod::Post => MethodFilter::POST,
        BackendMethod::Put => MethodFilter::PUT,
        BackendMethod::Delete => MethodFilter::DELETE,
    }
}

/// ルートテーブルから API ルーターを構築する
///
/// 同じパスのエントリは 1 つの `MethodRouter` にまとめてから登録する
/// （axum は同一パスの二重登録でパニックするため）。
pub fn build_api_router(state: Arc<GatewayState>) -> Router {
    let mut by_path: BTreeMap<&'static str, MethodRouter<Arc<GatewayState>>> = BTreeMap::new();

    for route in ROUTES {
        let filter = method_filter(route.method);
        let handler = move |State(state): State<Arc<GatewayState>>, request: Request| async move {
            forward_route(state, route, request).await
        };

        let method_router = match by_path.remove(route.path) {
            Some(existing) => existing.on(filter, handler),
            None => on(filter, handler),
        };
        by_path.insert(route.path, method_router);
    }

    by_path
        .into_iter()
        .fold(Router::new(), |router, (path, method_router)| {
            router.route(&format!("/api/{path}"), method_router)
        })
        .with_state(state)
}
