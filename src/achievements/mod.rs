use mongodb::bson::Document;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::achievements::goal_match::GoalMatch;
use crate::database::models::badge::BadgeTier;

pub mod award;
pub mod evaluator;
pub mod goal_match;
pub mod progress;
pub mod repository;
pub mod streak;
pub mod worker;

/// Lift keywords used to group synonymous exercise names for total-based
/// badges and for goal/PR cross-referencing.
pub(crate) const CANONICAL_LIFTS: [&str; 3] = ["squat", "bench", "deadlift"];

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AchievementTrigger {
    Pr,
    Skill,
    Sport,
    Workout,
    Social,
}

/// The small record an external trigger hands to the engine. `memberId` is
/// required for all per-member checks (PRs, sessions, goals); the exercise
/// fields are only populated on PR triggers.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationContext {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_id: Option<String>,
    pub trigger: AchievementTrigger,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exercise_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exercise_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exercise_unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skill_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sport: Option<String>,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AwardedBadge {
    pub badge_id: String,
    pub badge_name: String,
    pub badge_icon: String,
    pub badge_tier: BadgeTier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Document>,
}

#[derive(Debug, Serialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationOutcome {
    pub awarded: Vec<AwardedBadge>,
    pub goal_matches: Vec<GoalMatch>,
}
