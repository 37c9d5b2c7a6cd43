//! # SurveyGate ゲートウェイ ライブラリ
//!
//! アンケートバックエンドの REST API を `/api/...` 配下に再公開する
//! 認証付き HTTP ゲートウェイのコアモジュール。
//!
//! ゲートウェイは業務ロジックもデータも持たない。保護ルートではトークンを
//! バックエンドの `auth/me` で検証し、同じトークンを付けたまま転送する。
//!
//! ## モジュール構成
//!
//! - `app_builder`: ルーターとミドルウェアの組み立て
//! - `auth`: Bearer トークンの取り出しと検証
//! - `client`: バックエンドクライアント
//! - `config`: 環境変数からの設定読み込み
//! - `error`: エラー型とレスポンス変換
//! - `handler`: HTTP ハンドラ（汎用転送・ヘルスチェック）
//! - `middleware`: ミドルウェア（Request ID 伝播、CORS）
//! - `payload`: リクエストボディの形状チェック
//! - `route`: ルートテーブル

pub mod app_builder;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod payload;
pub mod route;

pub use app_builder::build_app;
