//! Database Models
//!
//! Data models for users, topics, submissions and achievements.
//! Feedback is a first-class structured type: serialized once on insert,
//! deserialized once on read (JSONB at the persistence edge).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

use crate::services::achievements::AchievementCriterion;

/// 토픽 난이도
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "difficulty", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// 사용자
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,

    /// 지갑 주소 (lowercase, identity key)
    pub wallet_address: String,

    pub created_at: DateTime<Utc>,

    /// 마지막 로그인 시간 (로그인 upsert 시 갱신)
    pub last_login: DateTime<Utc>,
}

/// 글쓰기 토픽
#[derive(Debug, Clone, FromRow)]
pub struct Topic {
    pub id: i64,

    /// 프롬프트 본문
    pub topic: String,

    pub difficulty: Difficulty,

    /// 제한 시간 (초). 클라이언트 카운트다운용 어드바이저리 값
    pub time_limit: i32,

    pub is_active: bool,

    pub created_at: DateTime<Utc>,
}

/// AI 평가 피드백 (JSONB로 저장)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub feedback_short: String,
    pub corrected_text: String,
    pub edits: Vec<Edit>,
    pub suggested_rewrite: String,
    pub tips: Vec<String>,
}

/// 개별 교정 항목
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edit {
    pub original: String,
    pub corrected: String,
    pub reason: String,
}

/// 제출물. 생성 이후 불변 (update 경로 없음)
#[derive(Debug, Clone, FromRow)]
pub struct Submission {
    /// `sub_<uuid>` 형식
    pub id: String,
    pub user_id: i64,
    pub topic_id: i64,
    pub text: String,
    pub word_count: i32,
    pub time_spent: i32,
    pub overall_score: i32,
    pub grammar_score: i32,
    pub vocabulary_score: i32,
    pub creativity_score: i32,
    pub coherence_score: i32,
    pub feedback: Json<Feedback>,
    pub submitted_at: DateTime<Utc>,
}

/// 제출물 + 토픽 조인 (my-submissions 조회용)
#[derive(Debug, Clone, FromRow)]
pub struct SubmissionWithTopic {
    pub id: String,
    pub topic_id: i64,
    pub topic: String,
    pub difficulty: Difficulty,
    pub text: String,
    pub word_count: i32,
    pub time_spent: i32,
    pub overall_score: i32,
    pub grammar_score: i32,
    pub vocabulary_score: i32,
    pub creativity_score: i32,
    pub coherence_score: i32,
    pub feedback: Json<Feedback>,
    pub submitted_at: DateTime<Utc>,
}

/// 토픽별 상위 제출물 (작성자 지갑 포함)
#[derive(Debug, Clone, FromRow)]
pub struct TopSubmission {
    pub id: String,
    pub user_id: i64,
    pub wallet_address: String,
    pub text: String,
    pub word_count: i32,
    pub time_spent: i32,
    pub overall_score: i32,
    pub grammar_score: i32,
    pub vocabulary_score: i32,
    pub creativity_score: i32,
    pub coherence_score: i32,
    pub feedback: Json<Feedback>,
    pub submitted_at: DateTime<Utc>,
}

/// 제출이 있는 토픽의 집계 통계
#[derive(Debug, Clone, FromRow)]
pub struct TopicStats {
    pub id: i64,
    pub topic: String,
    pub difficulty: Difficulty,
    pub time_limit: i32,
    pub created_at: DateTime<Utc>,
    pub submission_count: i64,
    pub highest_score: i32,
    pub average_score: f64,
    pub last_activity: DateTime<Utc>,
}

/// 사용자 점수 집계 (stats 조회용)
#[derive(Debug, Clone, FromRow)]
pub struct UserScoreStats {
    pub total_writings: i64,

    /// 반올림된 평균 (제출 없으면 0)
    pub avg_score: i64,

    pub best_score: i32,
}

/// 업적 평가에 쓰이는 제출 통계
#[derive(Debug, Clone, FromRow)]
pub struct SubmissionStats {
    pub count: i64,
    pub best_score: Option<i32>,
    pub fastest_time: Option<i32>,
    pub max_words: Option<i32>,
}

/// 리더보드 행 (aggregate score 내림차순)
#[derive(Debug, Clone, FromRow)]
pub struct LeaderboardRow {
    pub rank: i64,
    pub wallet_address: String,
    pub avg_score: i64,
    pub total_writings: i64,
    pub best_score: i32,
}

/// 업적 정의. API가 생성하지 않음 (시드 전용)
#[derive(Debug, Clone, FromRow)]
pub struct Achievement {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub criteria: Json<AchievementCriterion>,
}
