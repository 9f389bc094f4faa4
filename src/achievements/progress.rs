use anyhow::Result;
use serde::Serialize;

use crate::achievements::award::AchievementEngine;
use crate::achievements::evaluator::{CriterionMeasure, EvaluationSubject};
use crate::database::models::badge::{BadgeCategory, BadgeTier};
use crate::util::r#macro::unwrap_helper;

/// Completion snapshot for one not-yet-earned badge.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BadgeProgress {
    pub badge_id: String,
    pub badge_name: String,
    pub badge_icon: String,
    pub category: BadgeCategory,
    pub tier: BadgeTier,
    pub percent: u8,
    pub current: f64,
    pub target: f64,
}

/// Percentage for a measure, clamped to [0, 100]. Lower-is-better thresholds
/// invert the direction so closer-to-target always reads as higher percent;
/// existence-style checks are all-or-nothing.
fn percent_for(measure: &CriterionMeasure) -> Option<u8> {
    match measure {
        CriterionMeasure::Threshold { current, target, lower_is_better: false } => {
            if *target <= 0.0 || current >= target {
                return Some(100);
            }
            Some(((current / target) * 100.0).clamp(0.0, 100.0) as u8)
        }
        CriterionMeasure::Threshold { current, target, lower_is_better: true } => {
            if *current <= 0.0 || current <= target {
                return Some(100);
            }
            Some(((target / current) * 100.0).clamp(0.0, 100.0) as u8)
        }
        CriterionMeasure::Attained(true) => Some(100),
        CriterionMeasure::Attained(false) => Some(0),
        CriterionMeasure::Unsupported => None,
    }
}

impl AchievementEngine {
    /// Progress for every active badge the user has not earned yet, reusing
    /// the evaluator's aggregation so eligibility and progress can never
    /// disagree. Unsupported tags are omitted entirely.
    pub async fn progress_for(&self, subject: &EvaluationSubject) -> Result<Vec<BadgeProgress>> {
        let definitions = self.stores.catalog.active_badges().await?;
        let earned = self.stores.earned.earned_badge_ids(&subject.user_id).await?;
        let mut entries = Vec::new();

        for badge in definitions.into_iter().filter(|badge| !earned.contains(&badge.id)) {
            let measure = match self.evaluator.measure(subject, &badge.criteria).await {
                Ok(measure) => measure,
                Err(e) => {
                    warn!("Skipping progress for badge '{}': {:#}", badge.id, e);
                    continue;
                }
            };
            // unsupported tags never surface in the progress payload
            let percent = unwrap_helper::continue_default!(percent_for(&measure));
            let (current, target) = match measure {
                CriterionMeasure::Threshold { current, target, .. } => (current, target),
                _ => (0.0, 0.0),
            };
            entries.push(BadgeProgress {
                badge_id: badge.id,
                badge_name: badge.name,
                badge_icon: badge.icon,
                category: badge.category,
                tier: badge.tier,
                percent,
                current,
                target,
            });
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::FixedOffset;

    use super::*;
    use crate::achievements::repository::fakes::{badge, weight_pr, FakeStores};
    use crate::achievements::repository::AchievementStores;
    use crate::database::models::badge::Criteria;

    fn engine(data: Arc<FakeStores>) -> AchievementEngine {
        AchievementEngine::new(AchievementStores::fake(data), FixedOffset::east_opt(0).unwrap())
    }

    fn subject() -> EvaluationSubject {
        EvaluationSubject {
            user_id: String::from("user-1"),
            member_id: Some(String::from("member-1")),
        }
    }

    #[test]
    fn percent_is_proportional_and_clamped() {
        let halfway = CriterionMeasure::Threshold { current: 150.0, target: 300.0, lower_is_better: false };
        assert_eq!(percent_for(&halfway), Some(50));

        let over = CriterionMeasure::Threshold { current: 450.0, target: 300.0, lower_is_better: false };
        assert_eq!(percent_for(&over), Some(100));

        let nothing = CriterionMeasure::Threshold { current: 0.0, target: 300.0, lower_is_better: false };
        assert_eq!(percent_for(&nothing), Some(0));
    }

    #[test]
    fn lower_is_better_inverts_the_direction() {
        // 400s against a 345s target: closer means higher percent
        let close = CriterionMeasure::Threshold { current: 400.0, target: 345.0, lower_is_better: true };
        assert_eq!(percent_for(&close), Some(86));

        let met = CriterionMeasure::Threshold { current: 330.0, target: 345.0, lower_is_better: true };
        assert_eq!(percent_for(&met), Some(100));
    }

    #[test]
    fn existence_checks_are_binary() {
        assert_eq!(percent_for(&CriterionMeasure::Attained(true)), Some(100));
        assert_eq!(percent_for(&CriterionMeasure::Attained(false)), Some(0));
        assert_eq!(percent_for(&CriterionMeasure::Unsupported), None);
    }

    #[tokio::test]
    async fn rerunning_progress_yields_identical_results() {
        let data = Arc::new(FakeStores {
            badges: vec![
                badge("big-bench", Criteria::PrSingle { exercises: vec![String::from("bench")], threshold: 300.0 }),
                badge("sporty", Criteria::Sport { sport: String::from("climbing") }),
                badge("early-bird", Criteria::FirstLogin),
            ],
            records: vec![weight_pr("member-1", "Bench Press", 150.0)],
            ..Default::default()
        });
        let engine = engine(data);

        let first = engine.progress_for(&subject()).await.unwrap();
        let second = engine.progress_for(&subject()).await.unwrap();

        // the unsupported tag is omitted, the rest are stable and bounded
        assert_eq!(first.len(), 2);
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.badge_id, b.badge_id);
            assert_eq!(a.percent, b.percent);
            assert!(a.percent <= 100);
        }
        let bench = first.iter().find(|entry| entry.badge_id == "big-bench").unwrap();
        assert_eq!(bench.percent, 50);
    }

    #[tokio::test]
    async fn earned_badges_are_excluded_from_progress() {
        use crate::database::models::user_badge::UserBadge;
        use mongodb::bson;

        let data = Arc::new(FakeStores {
            badges: vec![badge("sporty", Criteria::Sport { sport: String::from("climbing") })],
            ..Default::default()
        });
        data.earned.lock().unwrap().push(UserBadge {
            id: String::from("row-1"),
            user_id: String::from("user-1"),
            badge_id: String::from("sporty"),
            earned_at: bson::DateTime::now(),
            metadata: None,
            is_featured: true,
            display_order: 0,
        });
        let engine = engine(data);
        assert!(engine.progress_for(&subject()).await.unwrap().is_empty());
    }
}
