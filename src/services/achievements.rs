//! Achievement Evaluator
//!
//! 제출 성공 후 해당 사용자의 누적 통계를 다섯 가지 기준과 대조해
//! 충족된 업적을 수여한다. 수여는 (user, achievement) 키의
//! insert-if-absent이므로 몇 번을 재평가해도 결과가 같다 (멱등).
//!
//! criteria는 문자열 switch가 아니라 닫힌 enum으로 모델링:
//! 기준 종류가 추가되면 match가 컴파일 타임에 누락을 잡아낸다

use serde::{Deserialize, Serialize};

use crate::db::Database;

/// 업적 기준. DB의 criteria JSONB와 1:1 대응
///
/// 직렬화 형식: `{"type": "submission_count", "value": 10}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AchievementCriterion {
    /// 누적 제출 수 >= value
    SubmissionCount(i64),
    /// 단일 제출 최대 단어 수 >= value
    WordCount(i64),
    /// 최단 소요 시간 (초) <= value
    TimeSpent(i64),
    /// 최고 점수 >= value
    Score(i64),
    /// 글로벌 랭크 <= value
    Rank(i64),
}

/// 기준 평가에 쓰이는 사용자 누적 통계
#[derive(Debug, Clone, Copy)]
pub struct WriterStats {
    pub submissions: i64,
    pub best_score: i64,
    /// 제출이 없으면 None (time_spent 기준은 충족 불가)
    pub fastest_time: Option<i64>,
    pub max_words: i64,
    pub rank: i64,
}

impl AchievementCriterion {
    /// 통계가 기준을 충족하는지 판정
    pub fn is_met(&self, stats: &WriterStats) -> bool {
        match *self {
            AchievementCriterion::SubmissionCount(v) => stats.submissions >= v,
            AchievementCriterion::WordCount(v) => stats.max_words >= v,
            AchievementCriterion::TimeSpent(v) => {
                stats.fastest_time.map_or(false, |fastest| fastest <= v)
            }
            AchievementCriterion::Score(v) => stats.best_score >= v,
            AchievementCriterion::Rank(v) => stats.rank <= v,
        }
    }
}

/// 제출 성공 직후 호출: 통계 계산 → 전체 업적 스캔 → 충족분 수여
pub async fn evaluate_for_user(db: &Database, user_id: i64) -> Result<(), sqlx::Error> {
    let submission_stats = db.submission_stats(user_id).await?;
    let rank = db.user_rank(user_id).await?;

    let stats = WriterStats {
        submissions: submission_stats.count,
        best_score: submission_stats.best_score.unwrap_or(0) as i64,
        fastest_time: submission_stats.fastest_time.map(|t| t as i64),
        max_words: submission_stats.max_words.unwrap_or(0) as i64,
        rank,
    };

    for achievement in db.all_achievements().await? {
        if achievement.criteria.is_met(&stats) {
            db.grant_achievement(user_id, achievement.id).await?;
            tracing::debug!(
                user_id,
                achievement = %achievement.name,
                "achievement granted (idempotent)"
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats() -> WriterStats {
        WriterStats {
            submissions: 5,
            best_score: 88,
            fastest_time: Some(240),
            max_words: 150,
            rank: 4,
        }
    }

    #[test]
    fn test_criterion_serde_round_trip() {
        let json = r#"{"type": "submission_count", "value": 10}"#;
        let parsed: AchievementCriterion = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, AchievementCriterion::SubmissionCount(10));

        let back = serde_json::to_value(parsed).unwrap();
        assert_eq!(back["type"], "submission_count");
        assert_eq!(back["value"], 10);
    }

    #[test]
    fn test_all_kinds_deserialize() {
        for (json, expected) in [
            (r#"{"type":"word_count","value":300}"#, AchievementCriterion::WordCount(300)),
            (r#"{"type":"time_spent","value":120}"#, AchievementCriterion::TimeSpent(120)),
            (r#"{"type":"score","value":90}"#, AchievementCriterion::Score(90)),
            (r#"{"type":"rank","value":3}"#, AchievementCriterion::Rank(3)),
        ] {
            let parsed: AchievementCriterion = serde_json::from_str(json).unwrap();
            assert_eq!(parsed, expected);
        }
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let result: Result<AchievementCriterion, _> =
            serde_json::from_str(r#"{"type":"streak","value":7}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_submission_count_boundary() {
        assert!(AchievementCriterion::SubmissionCount(5).is_met(&stats()));
        assert!(!AchievementCriterion::SubmissionCount(6).is_met(&stats()));
    }

    #[test]
    fn test_word_count_boundary() {
        assert!(AchievementCriterion::WordCount(150).is_met(&stats()));
        assert!(!AchievementCriterion::WordCount(151).is_met(&stats()));
    }

    #[test]
    fn test_time_spent_is_at_most() {
        assert!(AchievementCriterion::TimeSpent(240).is_met(&stats()));
        assert!(!AchievementCriterion::TimeSpent(239).is_met(&stats()));
    }

    #[test]
    fn test_time_spent_without_submissions_never_met() {
        let mut s = stats();
        s.fastest_time = None;
        assert!(!AchievementCriterion::TimeSpent(10_000).is_met(&s));
    }

    #[test]
    fn test_score_boundary() {
        assert!(AchievementCriterion::Score(88).is_met(&stats()));
        assert!(!AchievementCriterion::Score(89).is_met(&stats()));
    }

    #[test]
    fn test_rank_is_at_most() {
        assert!(AchievementCriterion::Rank(4).is_met(&stats()));
        assert!(!AchievementCriterion::Rank(3).is_met(&stats()));
    }
}
