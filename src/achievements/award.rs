use std::fmt::{self, Display};

use anyhow::Result;
use chrono::FixedOffset;
use mongodb::bson::{self, Document};
use uuid::Uuid;

use crate::achievements::evaluator::{CriteriaEvaluator, EvaluationSubject};
use crate::achievements::goal_match::{match_pr_against_goals, GoalMatch};
use crate::achievements::repository::{AchievementStores, EarnedInsert};
use crate::achievements::streak::{current_streak, longest_streak, StreakSummary};
use crate::achievements::{AchievementTrigger, AwardedBadge, EvaluationContext, EvaluationOutcome};
use crate::database::models::user_badge::UserBadge;

/// The first few earned badges auto-surface on a profile.
pub const AUTO_FEATURE_LIMIT: u64 = 3;
/// Hard ceiling on simultaneously featured badges, manual toggles included.
pub const FEATURED_CAP: u64 = 6;

#[derive(Debug)]
pub struct AwardResult {
    pub success: bool,
    pub already_earned: bool,
}

/// The one error this engine intentionally raises to a direct caller.
#[derive(Debug)]
pub enum FeatureToggleError {
    CapExceeded,
    NotEarned,
    Storage(anyhow::Error),
}

impl Display for FeatureToggleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureToggleError::CapExceeded => {
                write!(f, "featuring this badge would exceed the {} slot limit", FEATURED_CAP)
            }
            FeatureToggleError::NotEarned => write!(f, "the user has not earned this badge"),
            FeatureToggleError::Storage(e) => write!(f, "storage failure while toggling featured: {}", e),
        }
    }
}

impl std::error::Error for FeatureToggleError {}

pub struct AchievementEngine {
    pub(crate) stores: AchievementStores,
    pub(crate) evaluator: CriteriaEvaluator,
    offset: FixedOffset,
}

impl AchievementEngine {
    pub fn new(stores: AchievementStores, offset: FixedOffset) -> Self {
        let evaluator = CriteriaEvaluator::new(stores.clone(), offset);
        AchievementEngine { stores, evaluator, offset }
    }

    /// Streak readings for profile display, independent of badge awarding.
    pub async fn streaks_for(&self, member_id: &str) -> Result<StreakSummary> {
        let timestamps = self.stores.sessions.completed_timestamps(member_id).await?;
        Ok(StreakSummary {
            current: current_streak(&timestamps, self.offset, chrono::Utc::now()),
            longest: longest_streak(&timestamps, self.offset),
        })
    }

    /// Idempotent earn transition. The unique (userId, badgeId) index is the
    /// arbiter under concurrency: a losing writer observes a duplicate key
    /// and reports `already_earned` instead of failing.
    pub async fn award(&self, user_id: &str, badge_id: &str, metadata: Option<Document>) -> Result<AwardResult> {
        if self.stores.earned.find(user_id, badge_id).await?.is_some() {
            return Ok(AwardResult { success: false, already_earned: true });
        }
        let featured_count = self.stores.earned.featured_count(user_id).await?;
        let auto_feature = featured_count < AUTO_FEATURE_LIMIT;
        let row = UserBadge {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_owned(),
            badge_id: badge_id.to_owned(),
            earned_at: bson::DateTime::now(),
            metadata,
            is_featured: auto_feature,
            display_order: if auto_feature { featured_count as i32 } else { 0 },
        };
        match self.stores.earned.insert(&row).await? {
            EarnedInsert::Inserted => Ok(AwardResult { success: true, already_earned: false }),
            EarnedInsert::AlreadyEarned => Ok(AwardResult { success: false, already_earned: true }),
        }
    }

    /// Earned badges for profile display, featured rows first.
    pub async fn earned_badges(&self, user_id: &str) -> Result<Vec<UserBadge>> {
        self.stores.earned.for_user(user_id).await
    }

    /// Manual feature/unfeature of an earned badge. Auto-featured rows count
    /// against the same cap.
    pub async fn set_featured(
        &self,
        user_id: &str,
        badge_id: &str,
        featured: bool,
        display_order: Option<i32>,
    ) -> std::result::Result<(), FeatureToggleError> {
        let existing = self
            .stores
            .earned
            .find(user_id, badge_id)
            .await
            .map_err(FeatureToggleError::Storage)?
            .ok_or(FeatureToggleError::NotEarned)?;
        if featured && !existing.is_featured {
            let featured_count = self
                .stores
                .earned
                .featured_count(user_id)
                .await
                .map_err(FeatureToggleError::Storage)?;
            if featured_count >= FEATURED_CAP {
                return Err(FeatureToggleError::CapExceeded);
            }
        }
        let updated = self
            .stores
            .earned
            .set_featured(user_id, badge_id, featured, display_order)
            .await
            .map_err(FeatureToggleError::Storage)?;
        if !updated {
            return Err(FeatureToggleError::NotEarned);
        }
        Ok(())
    }

    /// Top-level entry point for external triggers. Never raises: an
    /// unexpected fault yields an empty outcome and a log line, and the next
    /// trigger re-derives everything from scratch anyway.
    pub async fn evaluate_and_award(&self, context: &EvaluationContext) -> EvaluationOutcome {
        match self.run_evaluation(context).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Badge evaluation failed for user {}: {:#}", context.user_id, e);
                EvaluationOutcome::default()
            }
        }
    }

    async fn run_evaluation(&self, context: &EvaluationContext) -> Result<EvaluationOutcome> {
        let definitions = self.stores.catalog.automatic_badges().await?;
        let earned = self.stores.earned.earned_badge_ids(&context.user_id).await?;
        let subject = EvaluationSubject::from(context);
        let mut outcome = EvaluationOutcome::default();

        for badge in definitions.into_iter().filter(|badge| !earned.contains(&badge.id)) {
            // one bad criterion never sinks the rest of the batch
            let verdict = match self.evaluator.evaluate(&subject, &badge.criteria).await {
                Ok(verdict) => verdict,
                Err(e) => {
                    warn!("Skipping badge '{}' for user {}: {:#}", badge.id, context.user_id, e);
                    continue;
                }
            };
            if !verdict.eligible {
                continue;
            }
            match self.award(&context.user_id, &badge.id, verdict.metadata.clone()).await {
                Ok(result) if result.success => outcome.awarded.push(AwardedBadge {
                    badge_id: badge.id,
                    badge_name: badge.name,
                    badge_icon: badge.icon,
                    badge_tier: badge.tier,
                    metadata: verdict.metadata,
                }),
                Ok(_) => {} // lost a race with a concurrent evaluation
                Err(e) => warn!("Could not award badge '{}' to user {}: {:#}", badge.id, context.user_id, e),
            }
        }

        if context.trigger == AchievementTrigger::Pr {
            outcome.goal_matches = self.goal_matches_for(context).await?;
        }
        Ok(outcome)
    }

    async fn goal_matches_for(&self, context: &EvaluationContext) -> Result<Vec<GoalMatch>> {
        let (member_id, exercise_name, value, unit) = match (
            &context.member_id,
            &context.exercise_name,
            context.exercise_value,
            &context.exercise_unit,
        ) {
            (Some(member_id), Some(name), Some(value), Some(unit)) => (member_id, name, value, unit),
            _ => {
                debug!("PR trigger for user {} is missing exercise details, skipping goal matching", context.user_id);
                return Ok(Vec::new());
            }
        };
        let goals = self.stores.goals.active_for_member(member_id).await?;
        Ok(match_pr_against_goals(exercise_name, value, unit, &goals))
    }
}
