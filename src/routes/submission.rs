//! Submission Endpoints
//!
//! 제출 파이프라인의 순서가 곧 불변식:
//!
//! 1. 사용자/토픽 존재 확인 (없으면 404, 아무것도 쓰지 않음)
//! 2. 중복 사전 체크 (AI 호출 비용 절감용 어드바이저리)
//! 3. AI 평가 (실패 시 SCORING_FAILED, 아무것도 쓰지 않음)
//! 4. insert (UNIQUE 제약이 중복 제출 레이스를 최종 차단)
//! 5. 업적 평가 (제출은 이미 저장됨 → 실패해도 응답은 성공)

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    db::{Difficulty, Feedback, NewSubmission},
    error::ApiError,
    services::{achievements, AuthenticatedWallet},
    AppState,
};

// ============ Submit ============

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub topic_id: Option<i64>,
    pub text: Option<String>,
    pub time_spent: Option<i32>,
    pub word_count: Option<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub success: bool,
    pub submission_id: String,
    pub overall: i32,
    pub grammar: i32,
    pub vocabulary: i32,
    pub creativity: i32,
    pub coherence: i32,
    pub word_count: i32,
    pub feedback: Feedback,
    pub text: String,
    pub submitted_at: String,
}

/// POST /submission/submit
pub async fn submit(
    State(state): State<AppState>,
    wallet: AuthenticatedWallet,
    Json(req): Json<SubmitRequest>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let (Some(topic_id), Some(text), Some(time_spent), Some(word_count)) =
        (req.topic_id, req.text, req.time_spent, req.word_count)
    else {
        return Err(ApiError::MissingFields(
            "topicId, text, timeSpent, wordCount".to_string(),
        ));
    };

    let user = state
        .db
        .find_user(&wallet.address)
        .await?
        .ok_or(ApiError::UserNotFound)?;

    let topic = state
        .db
        .find_topic(topic_id)
        .await?
        .ok_or(ApiError::TopicNotFound)?;

    // 사전 체크: AI 평가 비용을 쓰기 전에 빠르게 거절.
    // 동시 제출 레이스는 insert의 UNIQUE 제약이 닫는다
    if state.db.submission_exists(user.id, topic.id).await? {
        return Err(ApiError::AlreadySubmitted);
    }

    // 외부 평가. 실패하면 여기서 끝 — Submission row는 생기지 않는다
    let evaluation = state.judge.analyze(&text, &topic.topic).await?;

    let new = NewSubmission {
        id: format!("sub_{}", Uuid::new_v4().simple()),
        user_id: user.id,
        topic_id: topic.id,
        text,
        word_count,
        time_spent,
        overall_score: evaluation.overall,
        grammar_score: evaluation.grammar,
        vocabulary_score: evaluation.vocabulary,
        creativity_score: evaluation.creativity,
        coherence_score: evaluation.coherence,
        feedback: evaluation.feedback,
    };

    let submission = state.db.insert_submission(&new).await?;

    // 제출은 이미 저장됨. 업적 평가 실패로 성공 응답을 뒤집지 않는다
    if let Err(err) = achievements::evaluate_for_user(&state.db, user.id).await {
        tracing::warn!(user_id = user.id, "achievement evaluation failed: {}", err);
    }

    tracing::info!(
        user_id = user.id,
        topic_id = topic.id,
        overall = submission.overall_score,
        "submission scored and stored"
    );

    Ok(Json(SubmitResponse {
        success: true,
        submission_id: submission.id,
        overall: submission.overall_score,
        grammar: submission.grammar_score,
        vocabulary: submission.vocabulary_score,
        creativity: submission.creativity_score,
        coherence: submission.coherence_score,
        word_count: submission.word_count,
        feedback: submission.feedback.0,
        text: submission.text,
        submitted_at: submission.submitted_at.to_rfc3339(),
    }))
}

// ============ My Submissions ============

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MySubmissionsResponse {
    pub success: bool,
    pub submissions: Vec<MySubmission>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MySubmission {
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
    /// JSONB에서 구조 그대로 디코딩 (read 시점 재파싱 없음)
    pub feedback: Feedback,
    pub submitted_at: String,
}

/// GET /submission/my-submissions
///
/// 호출자의 전체 제출물 (최신순, 토픽 조인)
pub async fn my_submissions(
    State(state): State<AppState>,
    wallet: AuthenticatedWallet,
) -> Result<Json<MySubmissionsResponse>, ApiError> {
    let user = state
        .db
        .find_user(&wallet.address)
        .await?
        .ok_or(ApiError::UserNotFound)?;

    let rows = state.db.my_submissions(user.id).await?;

    let submissions: Vec<MySubmission> = rows
        .into_iter()
        .map(|s| MySubmission {
            id: s.id,
            topic_id: s.topic_id,
            topic: s.topic,
            difficulty: s.difficulty,
            text: s.text,
            word_count: s.word_count,
            time_spent: s.time_spent,
            overall_score: s.overall_score,
            grammar_score: s.grammar_score,
            vocabulary_score: s.vocabulary_score,
            creativity_score: s.creativity_score,
            coherence_score: s.coherence_score,
            feedback: s.feedback.0,
            submitted_at: s.submitted_at.to_rfc3339(),
        })
        .collect();

    let total = submissions.len();

    Ok(Json(MySubmissionsResponse {
        success: true,
        submissions,
        total,
    }))
}

// ============ Top Submissions ============

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopSubmissionsResponse {
    pub success: bool,
    pub topic: TopicHeader,
    pub top_submissions: Vec<RankedSubmission>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicHeader {
    pub id: i64,
    pub topic: String,
    pub difficulty: Difficulty,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedSubmission {
    /// 토픽 내 순위 (1..=3)
    pub rank: usize,
    pub submission_id: String,
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
    pub feedback: Feedback,
    pub submitted_at: String,
}

/// GET /submission/top-submissions/:topicId
///
/// 해당 토픽의 상위 3개 (점수 내림차순, 동점은 먼저 제출한 쪽 우선)
pub async fn top_submissions(
    State(state): State<AppState>,
    _wallet: AuthenticatedWallet,
    Path(topic_id): Path<i64>,
) -> Result<Json<TopSubmissionsResponse>, ApiError> {
    let topic = state
        .db
        .find_topic(topic_id)
        .await?
        .ok_or(ApiError::TopicNotFound)?;

    let rows = state.db.top_submissions(topic.id).await?;

    let top_submissions: Vec<RankedSubmission> = rows
        .into_iter()
        .enumerate()
        .map(|(i, s)| RankedSubmission {
            rank: i + 1,
            submission_id: s.id,
            user_id: s.user_id,
            wallet_address: s.wallet_address,
            text: s.text,
            word_count: s.word_count,
            time_spent: s.time_spent,
            overall_score: s.overall_score,
            grammar_score: s.grammar_score,
            vocabulary_score: s.vocabulary_score,
            creativity_score: s.creativity_score,
            coherence_score: s.coherence_score,
            feedback: s.feedback.0,
            submitted_at: s.submitted_at.to_rfc3339(),
        })
        .collect();

    let total = top_submissions.len();

    Ok(Json(TopSubmissionsResponse {
        success: true,
        topic: TopicHeader {
            id: topic.id,
            topic: topic.topic,
            difficulty: topic.difficulty,
        },
        top_submissions,
        total,
    }))
}
