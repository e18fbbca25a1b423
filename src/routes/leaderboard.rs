//! Leaderboard Endpoint

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, services::AuthenticatedWallet, types::mask_wallet, AppState};

/// limit 기본값/상한
const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardResponse {
    pub success: bool,
    pub leaderboard: Vec<LeaderboardEntry>,
    /// 제출 경험이 있는 전체 사용자 수
    pub total: i64,
    pub last_updated: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: i64,
    /// 마스킹된 주소: `0x1234...abcd`
    pub wallet_address: String,
    pub avg_score: i64,
    pub total_writings: i64,
    pub best_score: i32,
}

/// GET /leaderboard?limit=N
///
/// 평균 점수 내림차순 top-N. limit은 [1, 100]으로 클램프, 기본 10
pub async fn get_leaderboard(
    State(state): State<AppState>,
    _wallet: AuthenticatedWallet,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<LeaderboardResponse>, ApiError> {
    let limit = clamp_limit(query.limit);

    let rows = state.db.leaderboard(limit).await?;
    let total = state.db.participant_count().await?;

    let leaderboard = rows
        .into_iter()
        .map(|row| LeaderboardEntry {
            rank: row.rank,
            wallet_address: mask_wallet(&row.wallet_address),
            avg_score: row.avg_score,
            total_writings: row.total_writings,
            best_score: row.best_score,
        })
        .collect();

    Ok(Json(LeaderboardResponse {
        success: true,
        leaderboard,
        total,
        last_updated: chrono::Utc::now().to_rfc3339(),
    }))
}

/// limit 파라미터 클램프: 기본 10, [1, 100]
fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_clamping() {
        assert_eq!(clamp_limit(None), 10);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(250)), 100);
        assert_eq!(clamp_limit(Some(25)), 25);
    }
}
