//! # 外部 API クライアント
//!
//! バックエンドとの通信を担当する。

pub mod backend;

pub use backend::{
    BackendClient,
    BackendClientImpl,
    BackendError,
    BackendMethod,
    BackendResponse,
    OutboundCall,
};
