//! Writing Arena API Server
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Client (Frontend)                     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Axum Web Server                         │
//! │  ┌─────────────────────────────────────────────────────────┐│
//! │  │                      Routes Layer                        ││
//! │  │  /health  /auth/*  /user/*  /topic/*  /submission/*     ││
//! │  │  /leaderboard                                            ││
//! │  └─────────────────────────────────────────────────────────┘│
//! │  ┌─────────────────────────────────────────────────────────┐│
//! │  │                    Services Layer                        ││
//! │  │  Auth (서명/JWT)   JudgeClient   Achievements            ││
//! │  └─────────────────────────────────────────────────────────┘│
//! │  ┌─────────────────────────────────────────────────────────┐│
//! │  │                    Data Layer                            ││
//! │  │  PostgreSQL (users/topics/submissions/achievements)      ││
//! │  └─────────────────────────────────────────────────────────┘│
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │              External AI Judge (chat completions)            │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// 라이브러리에서 가져오기
use writing_arena_api::{routes, AppState, Config, Database, JudgeClient, TokenService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 환경변수 로드
    dotenvy::dotenv().ok();

    // 로깅 초기화
    // RUST_LOG=debug,sqlx=warn 형태로 레벨 제어 가능
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "writing_arena_api=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("🚀 Starting Writing Arena API Server");

    // 설정 로드
    let config = Config::from_env()?;
    tracing::info!("📋 Configuration loaded");

    // 데이터베이스 연결
    let db = Database::connect(&config.database_url).await?;
    tracing::info!("🗄️  Database connected");

    // 마이그레이션 실행
    db.run_migrations().await?;
    tracing::info!("📦 Migrations completed");

    // 서비스 초기화
    let judge = JudgeClient::new(&config)?;
    tracing::info!("⚖️  AI Judge client ready ({})", config.judge_endpoint);

    let tokens = TokenService::new(&config.jwt_secret);
    tracing::info!("🔑 Token service initialized");

    // 앱 상태 구성
    let state = AppState {
        db: Arc::new(db),
        judge: Arc::new(judge),
        tokens: Arc::new(tokens),
        config: Arc::new(config.clone()),
    };

    // 라우터 구성
    let app = create_router(state);

    // 서버 시작
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🌐 Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// 라우터 생성
///
/// # Route Structure
///
/// ```text
/// GET  /health                              - 서버 상태 확인
///
/// POST /auth/login                          - 지갑 서명 로그인
///
/// GET  /user/stats                          - 사용자 통계 + 랭크 + 업적
///
/// GET  /topic/current                       - 랜덤 활성 토픽
/// GET  /topic/used-topics                   - 제출 있는 토픽 집계
///
/// POST /submission/submit                   - 글 제출 + AI 평가
/// GET  /submission/my-submissions           - 내 제출물 전체
/// GET  /submission/top-submissions/:topicId - 토픽별 top 3
///
/// GET  /leaderboard                         - 리더보드 top-N
/// ```
fn create_router(state: AppState) -> Router {
    // CORS 설정
    // 프로덕션에서는 특정 도메인만 허용
    // 개발 환경에서는 localhost 허용
    let cors = if state.config.is_production() {
        // 프로덕션: 특정 도메인만 허용 (환경변수로 설정)
        let allowed_origins = std::env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "https://yourdomain.com".to_string());
        let origins: Vec<_> = allowed_origins
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
            .allow_headers([
                axum::http::header::CONTENT_TYPE,
                axum::http::header::AUTHORIZATION,
            ])
    } else {
        // 개발: localhost 허용
        CorsLayer::new()
            .allow_origin([
                "http://localhost:5173".parse().unwrap(),  // Vite dev server
                "http://localhost:3000".parse().unwrap(),  // Alternative
                "http://127.0.0.1:5173".parse().unwrap(),
            ])
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        // Health check
        .route("/health", get(routes::health::health_check))

        // Auth
        .route("/auth/login", post(routes::auth::login))

        // User
        .route("/user/stats", get(routes::user::get_stats))

        // Topics
        .route("/topic/current", get(routes::topic::current_topic))
        .route("/topic/used-topics", get(routes::topic::used_topics))

        // Submissions
        .route("/submission/submit", post(routes::submission::submit))
        .route("/submission/my-submissions", get(routes::submission::my_submissions))
        .route("/submission/top-submissions/:topic_id", get(routes::submission::top_submissions))

        // Leaderboard
        .route("/leaderboard", get(routes::leaderboard::get_leaderboard))

        // 미들웨어
        .layer(TraceLayer::new_for_http())
        .layer(cors)

        // 상태 주입
        .with_state(state)
}
