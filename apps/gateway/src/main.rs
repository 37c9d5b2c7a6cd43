//! # SurveyGate ゲートウェイ サーバー
//!
//! フロントエンドからのリクエストを受け、バックエンド API へ転送する。
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `GATEWAY_HOST` | No | バインドアドレス（既定: `0.0.0.0`） |
//! | `GATEWAY_PORT` | No | ポート番号（既定: `8000`） |
//! | `BACKEND_URL` | **Yes** | バックエンドのベース URL（旧名 `PHP_BACKEND_URL` も可） |
//! | `CORS_ALLOWED_ORIGINS` | No | 許可オリジン（カンマ区切り） |
//! | `BACKEND_TIMEOUT_SECS` | No | バックエンド呼び出しのタイムアウト秒数（`0` で無制限） |
//! | `LOG_FORMAT` | No | `json` または `pretty` |
//! | `RUST_LOG` | No | ログレベル |

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use surveygate_gateway::{build_app, client::BackendClientImpl, config::GatewayConfig};
use surveygate_shared::observability::{TracingConfig, init_tracing};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    // 本番環境では .env ファイルは使用せず、環境変数を直接設定する
    dotenvy::dotenv().ok();

    // トレーシング初期化
    let tracing_config = TracingConfig::from_env("gateway");
    let service = tracing_config.service_name.clone();
    init_tracing(tracing_config);
    let _tracing_guard = tracing::info_span!("app", service = %service).entered();

    // 設定読み込み
    let config = GatewayConfig::from_env().inspect_err(|e| {
        tracing::error!(
            error.category = "configuration",
            error.kind = "invalid_config",
            "設定の読み込みに失敗しました: {}",
            e
        );
    })?;

    tracing::info!(
        "ゲートウェイを起動します: {}:{} → {}",
        config.host,
        config.port,
        config.backend_url
    );

    // 依存関係の初期化
    let backend = BackendClientImpl::new(&config.backend_url, config.backend_timeout)
        .context("バックエンドクライアントの初期化に失敗しました")?;
    let app = build_app(&config, Arc::new(backend));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("アドレスのパースに失敗しました")?;

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("ゲートウェイが起動しました: {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("ゲートウェイを停止しました");
    Ok(())
}

/// Ctrl-C または SIGTERM を待つ
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Ctrl-C ハンドラの登録に失敗しました: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("SIGTERM ハンドラの登録に失敗しました: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("シャットダウンシグナルを受信しました");
}
