//! User Endpoints

use axum::{extract::State, Json};
use serde::Serialize;

use crate::{error::ApiError, services::AuthenticatedWallet, AppState};

/// 사용자 통계 응답
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub success: bool,
    pub total_writings: i64,
    /// aggregate score (전체 제출 평균, 반올림)
    pub avg_score: i64,
    pub best_score: i32,
    /// 1-based 글로벌 랭크
    pub rank: i64,
    /// 획득 업적 이름 (최근 획득순)
    pub achievements: Vec<String>,
}

/// GET /user/stats
pub async fn get_stats(
    State(state): State<AppState>,
    wallet: AuthenticatedWallet,
) -> Result<Json<StatsResponse>, ApiError> {
    let user = state
        .db
        .find_user(&wallet.address)
        .await?
        .ok_or(ApiError::UserNotFound)?;

    let stats = state.db.user_score_stats(user.id).await?;
    let rank = state.db.user_rank(user.id).await?;
    let achievements = state.db.user_achievement_names(user.id).await?;

    Ok(Json(StatsResponse {
        success: true,
        total_writings: stats.total_writings,
        avg_score: stats.avg_score,
        best_score: stats.best_score,
        rank,
        achievements,
    }))
}
