//! # rollcall 웹 서버 진입점
//!
//! 1. 환경변수(.env) 로딩
//! 2. 로깅(tracing) 초기화
//! 3. SQLite 연결 풀 생성과 마이그레이션
//! 4. 만료 세션 정리 작업 시작
//! 5. API 라우터 구성과 HTTP 서버 시작

use anyhow::Result;
use rollcall::{config::Config, db, routes, services::sessions::spawn_cleanup_task};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // .env 파일이 없어도 시스템 환경변수로 동작합니다.
    dotenvy::dotenv().ok();

    // RUST_LOG가 없으면 rollcall, tower_http, axum을 debug 레벨로 출력
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rollcall=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!("Starting rollcall server on {}:{}", config.host, config.port);

    let pool = db::connect(&config.database_url, config.db_max_connections).await?;

    tracing::info!("Running database migrations...");
    db::MIGRATOR.run(&pool).await?;

    let state = routes::AppState::new(pool, &config);

    // 만료됐지만 활성으로 남은 세션을 주기적으로 닫습니다.
    let cleanup = spawn_cleanup_task(state.sessions.clone(), config.cleanup_interval());

    let app = routes::router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cleanup.abort();
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}
