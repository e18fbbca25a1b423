//! Writing Arena API Library
//!
//! # Overview
//!
//! 이 라이브러리는 AI Writing Arena의 백엔드 API를 제공합니다.
//! 지갑 서명 로그인 → 랜덤 토픽 → 제한 시간 내 글 제출 → AI 평가/피드백
//! → 리더보드/업적으로 이어지는 전체 흐름을 담당합니다.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                         API                              │
//! │                                                          │
//! │  ┌─────────┐  ┌─────────┐  ┌─────────┐  ┌─────────┐    │
//! │  │ Routes  │  │Services │  │   DB    │  │  Types  │    │
//! │  └────┬────┘  └────┬────┘  └────┬────┘  └────┬────┘    │
//! │       │            │            │            │          │
//! │       └────────────┴────────────┴────────────┘          │
//! │                         │                                │
//! └─────────────────────────┼────────────────────────────────┘
//!                           │
//!              ┌────────────┴────────────┐
//!              ▼                         ▼
//!     ┌────────────────┐       ┌────────────────┐
//!     │   PostgreSQL   │       │    AI Judge    │
//!     │  (submissions) │       │ (chat/compl.)  │
//!     └────────────────┘       └────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `config`: 환경 설정 관리
//! - `error`: 에러 타입 및 처리
//! - `routes`: HTTP 엔드포인트 핸들러
//! - `services`: 비즈니스 로직 (서명/토큰, AI Judge, 업적)
//! - `db`: 데이터베이스 연동
//! - `types`: 공통 타입 정의

use std::sync::Arc;

pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod services;
pub mod types;

// Re-exports for convenience
pub use config::Config;
pub use db::Database;
pub use error::ApiError;
pub use services::{JudgeClient, TokenService};

/// 애플리케이션 전역 상태
///
/// 외부 의존성(DB, Judge, 토큰 서비스)은 전부 여기로 주입.
/// 핸들러가 전역 싱글턴에 의존하지 않는다
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub judge: Arc<JudgeClient>,
    pub tokens: Arc<TokenService>,
    pub config: Arc<Config>,
}
