//! Database Module
//!
//! # Interview Q&A
//!
//! Q: 왜 PostgreSQL을 선택했는가?
//! A: 이 서비스의 데이터 특성에 적합
//!
//!    1. UNIQUE 제약: (user_id, topic_id) 중복 제출을 스토리지 레벨에서 차단
//!    2. JSONB: AI 피드백 페이로드를 구조 그대로 저장/조회
//!    3. 집계 쿼리: AVG/RANK 윈도우 함수로 리더보드 계산
//!    4. 인덱싱: 사용자별, 토픽별 조회 최적화
//!    5. 생태계: SQLx, Diesel 등 Rust 라이브러리 지원
//!
//! Q: 커넥션 풀은 어떻게 관리하는가?
//! A: SQLx의 PgPool 사용
//!    - 최소/최대 커넥션 수 설정
//!    - 커넥션 재사용 (오버헤드 감소)
//!    - 자동 health check
//!    - 타임아웃 처리
//!
//! Q: 중복 제출 체크를 어디서 하는가?
//! A: 두 단계
//!    - `submission_exists`: AI 평가 호출 전에 빠른 사전 체크 (비용 절감)
//!    - UNIQUE(user_id, topic_id): insert 시점의 최종 강제.
//!      동시 요청 둘이 사전 체크를 통과해도 하나만 insert에 성공한다.

mod models;

pub use models::*;

use anyhow::Result;
use sqlx::types::Json;
use sqlx::{postgres::PgPoolOptions, PgPool};

/// 데이터베이스 연결 및 쿼리 담당
pub struct Database {
    pool: PgPool,
}

/// 제출물 insert 페이로드 (점수/피드백 확정 후)
#[derive(Debug)]
pub struct NewSubmission {
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
    pub feedback: Feedback,
}

impl Database {
    /// 데이터베이스 연결
    ///
    /// # Connection Pool Settings
    ///
    /// - max_connections: 10 (트래픽에 따라 조정)
    /// - min_connections: 1 (idle 시 최소 유지)
    /// - acquire_timeout: 3초 (커넥션 획득 대기)
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .min_connections(1)
            .acquire_timeout(std::time::Duration::from_secs(3))
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// 마이그레이션 실행
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await?;
        Ok(())
    }

    /// Health check
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ============ Users ============

    /// 로그인 upsert: 없으면 생성, 있으면 last_login 갱신
    ///
    /// 단일 구문으로 처리해 get-or-create 레이스 제거
    pub async fn get_or_create_user(&self, wallet_address: &str) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (wallet_address)
            VALUES ($1)
            ON CONFLICT (wallet_address)
            DO UPDATE SET last_login = NOW()
            RETURNING id, wallet_address, created_at, last_login
            "#,
        )
        .bind(wallet_address)
        .fetch_one(&self.pool)
        .await
    }

    /// 지갑 주소로 사용자 조회 (주소는 호출 전에 lowercase 정규화됨)
    pub async fn find_user(&self, wallet_address: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, wallet_address, created_at, last_login
            FROM users
            WHERE wallet_address = $1
            "#,
        )
        .bind(wallet_address)
        .fetch_optional(&self.pool)
        .await
    }

    // ============ Topics ============

    /// 활성 토픽 중 하나를 균등 랜덤 선택
    pub async fn random_active_topic(&self) -> Result<Option<Topic>, sqlx::Error> {
        sqlx::query_as::<_, Topic>(
            r#"
            SELECT id, topic, difficulty, time_limit, is_active, created_at
            FROM topics
            WHERE is_active = TRUE
            ORDER BY RANDOM()
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await
    }

    /// 토픽 조회
    pub async fn find_topic(&self, topic_id: i64) -> Result<Option<Topic>, sqlx::Error> {
        sqlx::query_as::<_, Topic>(
            r#"
            SELECT id, topic, difficulty, time_limit, is_active, created_at
            FROM topics
            WHERE id = $1
            "#,
        )
        .bind(topic_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// 제출이 있는 토픽 + 집계 통계 (최근 활동순)
    pub async fn used_topics(&self) -> Result<Vec<TopicStats>, sqlx::Error> {
        sqlx::query_as::<_, TopicStats>(
            r#"
            SELECT
                t.id,
                t.topic,
                t.difficulty,
                t.time_limit,
                t.created_at,
                COUNT(s.id) AS submission_count,
                MAX(s.overall_score) AS highest_score,
                AVG(s.overall_score)::DOUBLE PRECISION AS average_score,
                MAX(s.submitted_at) AS last_activity
            FROM topics t
            JOIN submissions s ON t.id = s.topic_id
            GROUP BY t.id, t.topic, t.difficulty, t.time_limit, t.created_at
            ORDER BY last_activity DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    // ============ Submissions ============

    /// 사전 중복 체크 (어드바이저리).
    /// 최종 강제는 insert의 UNIQUE 제약이 담당
    pub async fn submission_exists(
        &self,
        user_id: i64,
        topic_id: i64,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM submissions WHERE user_id = $1 AND topic_id = $2)",
        )
        .bind(user_id)
        .bind(topic_id)
        .fetch_one(&self.pool)
        .await
    }

    /// 제출물 저장. UNIQUE(user_id, topic_id) 위반 시 sqlx 에러를 그대로 반환
    /// (error.rs에서 ALREADY_SUBMITTED로 매핑)
    pub async fn insert_submission(
        &self,
        new: &NewSubmission,
    ) -> Result<Submission, sqlx::Error> {
        sqlx::query_as::<_, Submission>(
            r#"
            INSERT INTO submissions
                (id, user_id, topic_id, text, word_count, time_spent,
                 overall_score, grammar_score, vocabulary_score,
                 creativity_score, coherence_score, feedback)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING
                id, user_id, topic_id, text, word_count, time_spent,
                overall_score, grammar_score, vocabulary_score,
                creativity_score, coherence_score, feedback, submitted_at
            "#,
        )
        .bind(&new.id)
        .bind(new.user_id)
        .bind(new.topic_id)
        .bind(&new.text)
        .bind(new.word_count)
        .bind(new.time_spent)
        .bind(new.overall_score)
        .bind(new.grammar_score)
        .bind(new.vocabulary_score)
        .bind(new.creativity_score)
        .bind(new.coherence_score)
        .bind(Json(&new.feedback))
        .fetch_one(&self.pool)
        .await
    }

    /// 사용자의 모든 제출물 (최신순, 토픽 조인)
    pub async fn my_submissions(
        &self,
        user_id: i64,
    ) -> Result<Vec<SubmissionWithTopic>, sqlx::Error> {
        sqlx::query_as::<_, SubmissionWithTopic>(
            r#"
            SELECT
                s.id,
                s.topic_id,
                t.topic,
                t.difficulty,
                s.text,
                s.word_count,
                s.time_spent,
                s.overall_score,
                s.grammar_score,
                s.vocabulary_score,
                s.creativity_score,
                s.coherence_score,
                s.feedback,
                s.submitted_at
            FROM submissions s
            JOIN topics t ON s.topic_id = t.id
            WHERE s.user_id = $1
            ORDER BY s.submitted_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    /// 토픽별 상위 3개 제출물 (점수 내림차순, 동점은 먼저 제출한 쪽)
    pub async fn top_submissions(
        &self,
        topic_id: i64,
    ) -> Result<Vec<TopSubmission>, sqlx::Error> {
        sqlx::query_as::<_, TopSubmission>(
            r#"
            SELECT
                s.id,
                s.user_id,
                u.wallet_address,
                s.text,
                s.word_count,
                s.time_spent,
                s.overall_score,
                s.grammar_score,
                s.vocabulary_score,
                s.creativity_score,
                s.coherence_score,
                s.feedback,
                s.submitted_at
            FROM submissions s
            JOIN users u ON s.user_id = u.id
            WHERE s.topic_id = $1
            ORDER BY s.overall_score DESC, s.submitted_at ASC
            LIMIT 3
            "#,
        )
        .bind(topic_id)
        .fetch_all(&self.pool)
        .await
    }

    // ============ Ranking ============

    /// 사용자 점수 집계 (횟수, 반올림 평균, 최고점)
    pub async fn user_score_stats(&self, user_id: i64) -> Result<UserScoreStats, sqlx::Error> {
        sqlx::query_as::<_, UserScoreStats>(
            r#"
            SELECT
                COUNT(*) AS total_writings,
                COALESCE(ROUND(AVG(overall_score)), 0)::BIGINT AS avg_score,
                COALESCE(MAX(overall_score), 0) AS best_score
            FROM submissions
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
    }

    /// 글로벌 랭크 = 1 + (평균 점수가 strictly 더 높은 사용자 수)
    ///
    /// strict 비교이므로 동점 사용자는 같은 랭크를 공유한다
    pub async fn user_rank(&self, user_id: i64) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) + 1
            FROM (
                SELECT user_id, AVG(overall_score) AS avg_score
                FROM submissions
                GROUP BY user_id
            ) AS user_scores
            WHERE avg_score > (
                SELECT COALESCE(AVG(overall_score), 0)
                FROM submissions
                WHERE user_id = $1
            )
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
    }

    /// 리더보드 top-N (평균 점수 내림차순)
    ///
    /// RANK() 윈도우 사용: user_rank의 strict-greater 정의와 일관되게
    /// 동점 사용자는 같은 랭크를 받는다
    pub async fn leaderboard(&self, limit: i64) -> Result<Vec<LeaderboardRow>, sqlx::Error> {
        sqlx::query_as::<_, LeaderboardRow>(
            r#"
            SELECT
                RANK() OVER (ORDER BY AVG(s.overall_score) DESC) AS rank,
                u.wallet_address,
                ROUND(AVG(s.overall_score))::BIGINT AS avg_score,
                COUNT(s.id) AS total_writings,
                MAX(s.overall_score) AS best_score
            FROM users u
            JOIN submissions s ON u.id = s.user_id
            GROUP BY u.id, u.wallet_address
            ORDER BY AVG(s.overall_score) DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    /// 제출 경험이 있는 사용자 수
    pub async fn participant_count(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(DISTINCT user_id) FROM submissions")
            .fetch_one(&self.pool)
            .await
    }

    // ============ Achievements ============

    /// 업적 평가용 제출 통계
    pub async fn submission_stats(&self, user_id: i64) -> Result<SubmissionStats, sqlx::Error> {
        sqlx::query_as::<_, SubmissionStats>(
            r#"
            SELECT
                COUNT(*) AS count,
                MAX(overall_score) AS best_score,
                MIN(time_spent) AS fastest_time,
                MAX(word_count) AS max_words
            FROM submissions
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
    }

    /// 전체 업적 정의 조회
    pub async fn all_achievements(&self) -> Result<Vec<Achievement>, sqlx::Error> {
        sqlx::query_as::<_, Achievement>(
            "SELECT id, name, description, criteria FROM achievements",
        )
        .fetch_all(&self.pool)
        .await
    }

    /// 사용자가 획득한 업적 이름 (최근 획득순)
    pub async fn user_achievement_names(
        &self,
        user_id: i64,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT a.name
            FROM user_achievements ua
            JOIN achievements a ON ua.achievement_id = a.id
            WHERE ua.user_id = $1
            ORDER BY ua.unlocked_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    /// 업적 수여 (멱등: 이미 있으면 no-op)
    pub async fn grant_achievement(
        &self,
        user_id: i64,
        achievement_id: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO user_achievements (user_id, achievement_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, achievement_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(achievement_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
