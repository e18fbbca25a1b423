//! Services Module
//!
//! 비즈니스 로직을 담당하는 서비스 레이어
//!
//! # Services
//! - `auth`: 지갑 서명 검증 + JWT 세션 토큰
//! - `judge`: AI Judge 클라이언트 (외부 평가 엔드포인트)
//! - `achievements`: 업적 평가/수여 (멱등)

pub mod achievements;
pub mod auth;
pub mod judge;

pub use auth::{AuthenticatedWallet, TokenService};
pub use judge::{Evaluation, JudgeClient, JudgeError};
