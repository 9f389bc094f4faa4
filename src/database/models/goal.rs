use serde::{Deserialize, Serialize};

use crate::database::{CollectionOwner, Database, IdentifiableDocument};

impl CollectionOwner<Goal> for Goal {
    fn get_collection(database: &Database) -> &mongodb::Collection<Goal> {
        &database.goals
    }

    fn get_collection_name() -> &'static str {
        "goal"
    }
}

impl IdentifiableDocument for Goal {
    fn get_id(&self) -> &str {
        &self.id
    }
}

/// A member-authored training goal. Goals without a numeric target and unit
/// are free-text and never participate in PR matching.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    #[serde(rename = "_id")]
    pub id: String,
    pub member_id: String,
    pub title: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_unit: Option<String>,
    pub status: GoalStatus,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    Active,
    Completed,
    Abandoned,
}
