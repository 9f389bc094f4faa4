use mongodb::bson;
use serde::{Deserialize, Serialize};

use crate::database::{CollectionOwner, Database};

impl CollectionOwner<Skill> for Skill {
    fn get_collection(database: &Database) -> &mongodb::Collection<Skill> {
        &database.skills
    }

    fn get_collection_name() -> &'static str {
        "skill"
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub user_id: String,
    pub name: String,
    pub current_status: SkillStatus,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SkillStatus {
    InProgress,
    Achieved,
    Mastered,
}

impl CollectionOwner<Sport> for Sport {
    fn get_collection(database: &Database) -> &mongodb::Collection<Sport> {
        &database.sports
    }

    fn get_collection_name() -> &'static str {
        "sport"
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Sport {
    pub user_id: String,
    pub sport: String,
    pub level: Option<String>,
}

impl CollectionOwner<WorkoutSession> for WorkoutSession {
    fn get_collection(database: &Database) -> &mongodb::Collection<WorkoutSession> {
        &database.workout_sessions
    }

    fn get_collection_name() -> &'static str {
        "workout_session"
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSession {
    pub member_id: String,
    pub status: SessionStatus,
    pub started_at: bson::DateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<bson::DateTime>,
}

impl WorkoutSession {
    /// Completion timestamp used for streak day bucketing.
    pub fn completed_at(&self) -> bson::DateTime {
        self.ended_at.unwrap_or(self.started_at)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Planned,
    InProgress,
    Completed,
    Abandoned,
}
