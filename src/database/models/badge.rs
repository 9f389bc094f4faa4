use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::database::{CollectionOwner, Database, IdentifiableDocument};

impl CollectionOwner<Badge> for Badge {
    fn get_collection(database: &Database) -> &mongodb::Collection<Badge> {
        &database.badges
    }

    fn get_collection_name() -> &'static str {
        "badge"
    }
}

impl IdentifiableDocument for Badge {
    fn get_id(&self) -> &str {
        &self.id
    }
}

/// A single catalog entry. Definitions are externally authored and read-only
/// from the engine's perspective; only `isActive && isAutomatic` entries are
/// picked up by automatic evaluation.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub category: BadgeCategory,
    pub tier: BadgeTier,
    pub criteria: Criteria,
    pub is_active: bool,
    pub is_automatic: bool,
    pub display_order: i32,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BadgeCategory {
    Strength,
    Skill,
    Sport,
    Consistency,
    Challenge,
    Program,
    Social,
    Track,
    Milestone,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BadgeTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

/// Machine-checkable rule attached to a badge definition. Exactly one variant
/// is active per definition; each variant carries only the fields its check
/// needs. The last three tags exist in authored catalogs but have no evaluator
/// semantics yet and are never eligible.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "type")]
pub enum Criteria {
    #[serde(rename = "pr_total", rename_all = "camelCase")]
    PrTotal { exercises: Vec<String>, threshold: f64 },

    #[serde(rename = "pr_single", rename_all = "camelCase")]
    PrSingle { exercises: Vec<String>, threshold: f64 },

    #[serde(rename = "pr_bodyweight_ratio", rename_all = "camelCase")]
    PrBodyweightRatio { exercises: Vec<String>, ratio: f64 },

    #[serde(rename = "skill_achieved", rename_all = "camelCase")]
    SkillAchieved { skill: String, status: RequiredSkillStatus },

    #[serde(rename = "sport", rename_all = "camelCase")]
    Sport { sport: String },

    #[serde(rename = "streak", rename_all = "camelCase")]
    Streak { days: u32 },

    #[serde(rename = "workout_count", rename_all = "camelCase")]
    WorkoutCount { count: u64 },

    #[serde(rename = "challenge_complete", rename_all = "camelCase")]
    ChallengeComplete {
        #[serde(skip_serializing_if = "Option::is_none")]
        challenge_id: Option<String>,
    },

    #[serde(rename = "program_complete", rename_all = "camelCase")]
    ProgramComplete {
        #[serde(skip_serializing_if = "Option::is_none")]
        program_id: Option<String>,
    },

    #[serde(rename = "followers", rename_all = "camelCase")]
    Followers { count: u64 },

    #[serde(rename = "circles_created", rename_all = "camelCase")]
    CirclesCreated { count: u64 },

    #[serde(rename = "track_time", rename_all = "camelCase")]
    TrackTime { seconds: f64 },

    // declared in authored catalogs, no evaluator semantics yet
    #[serde(rename = "first_login")]
    FirstLogin,

    #[serde(rename = "profile_complete")]
    ProfileComplete,

    #[serde(rename = "onboarding_complete")]
    OnboardingComplete,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RequiredSkillStatus {
    Achieved,
    Mastered,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn criteria_round_trips_through_tagged_json() {
        let json = r#"{"type":"pr_total","exercises":["Back Squat","Bench Press","Deadlift"],"threshold":1000.0}"#;
        let criteria: Criteria = serde_json::from_str(json).unwrap();
        match &criteria {
            Criteria::PrTotal { exercises, threshold } => {
                assert_eq!(exercises.len(), 3);
                assert_eq!(*threshold, 1000.0);
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn unscoped_challenge_criteria_omits_the_id_field() {
        let criteria: Criteria = serde_json::from_str(r#"{"type":"challenge_complete"}"#).unwrap();
        match criteria {
            Criteria::ChallengeComplete { challenge_id } => assert!(challenge_id.is_none()),
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn declared_but_unimplemented_tags_still_parse() {
        let criteria: Criteria = serde_json::from_str(r#"{"type":"first_login"}"#).unwrap();
        assert!(matches!(criteria, Criteria::FirstLogin));
    }
}
