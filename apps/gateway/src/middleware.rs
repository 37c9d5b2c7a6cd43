//! # ミドルウェア
//!
//! ゲートウェイ用のミドルウェアを提供する。

mod cors;
pub mod request_id;

pub use cors::cors_layer;
