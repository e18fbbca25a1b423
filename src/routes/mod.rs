//! API Routes Module
//!
//! 모든 HTTP 엔드포인트 정의
//!
//! # Routes
//! - `/health` - 헬스 체크 (공개)
//! - `/auth/login` - 지갑 서명 로그인 (공개)
//! - `/user/stats` - 사용자 통계 (인증)
//! - `/topic/*` - 토픽 선택/집계 (인증)
//! - `/submission/*` - 제출/조회 (인증)
//! - `/leaderboard` - 리더보드 (인증)

pub mod auth;
pub mod health;
pub mod leaderboard;
pub mod submission;
pub mod topic;
pub mod user;
