//! Topic Endpoints

use axum::{extract::State, Json};
use serde::Serialize;

use crate::{db::Difficulty, error::ApiError, services::AuthenticatedWallet, AppState};

/// 현재 토픽 응답
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicResponse {
    pub success: bool,
    pub id: i64,
    pub topic: String,
    pub difficulty: Difficulty,
    /// 제한 시간 (초)
    pub time_limit: i32,
    pub created_at: String,
}

/// GET /topic/current
///
/// 활성 토픽 중 하나를 균등 랜덤으로 선택. 호출마다 독립적 (stateless)
pub async fn current_topic(
    State(state): State<AppState>,
    _wallet: AuthenticatedWallet,
) -> Result<Json<TopicResponse>, ApiError> {
    let topic = state
        .db
        .random_active_topic()
        .await?
        .ok_or(ApiError::NoTopics)?;

    Ok(Json(TopicResponse {
        success: true,
        id: topic.id,
        topic: topic.topic,
        difficulty: topic.difficulty,
        time_limit: topic.time_limit,
        created_at: topic.created_at.to_rfc3339(),
    }))
}

/// 제출이 있는 토픽 + 집계
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsedTopicsResponse {
    pub success: bool,
    pub topics: Vec<UsedTopic>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsedTopic {
    pub id: i64,
    pub topic: String,
    pub difficulty: Difficulty,
    pub time_limit: i32,
    pub created_at: String,
    pub submission_count: i64,
    pub highest_score: i32,
    pub average_score: f64,
    pub last_activity: String,
}

/// GET /topic/used-topics
///
/// 최소 1개 제출이 있는 토픽을 최근 활동순으로 반환
pub async fn used_topics(
    State(state): State<AppState>,
    _wallet: AuthenticatedWallet,
) -> Result<Json<UsedTopicsResponse>, ApiError> {
    let topics = state.db.used_topics().await?;

    let topics: Vec<UsedTopic> = topics
        .into_iter()
        .map(|t| UsedTopic {
            id: t.id,
            topic: t.topic,
            difficulty: t.difficulty,
            time_limit: t.time_limit,
            created_at: t.created_at.to_rfc3339(),
            submission_count: t.submission_count,
            highest_score: t.highest_score,
            average_score: t.average_score,
            last_activity: t.last_activity.to_rfc3339(),
        })
        .collect();

    let total = topics.len();

    Ok(Json(UsedTopicsResponse {
        success: true,
        topics,
        total,
    }))
}
