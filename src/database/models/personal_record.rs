use mongodb::bson;
use serde::{Deserialize, Serialize};

use crate::database::{CollectionOwner, Database};

impl CollectionOwner<PersonalRecord> for PersonalRecord {
    fn get_collection(database: &Database) -> &mongodb::Collection<PersonalRecord> {
        &database.personal_records
    }

    fn get_collection_name() -> &'static str {
        "personal_record"
    }
}

/// Best recorded performance for one exercise. Owned by the workouts
/// subsystem; the engine only ever reads these.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PersonalRecord {
    pub member_id: String,
    pub exercise_id: String,
    pub exercise_name: String,
    pub value: f64,
    pub unit: String,
    pub record_type: RecordType,
    pub recorded_at: bson::DateTime,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    Weight,
    Reps,
    Time,
    Distance,
}

impl CollectionOwner<BodyweightMetric> for BodyweightMetric {
    fn get_collection(database: &Database) -> &mongodb::Collection<BodyweightMetric> {
        &database.bodyweight_metrics
    }

    fn get_collection_name() -> &'static str {
        "bodyweight_metric"
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BodyweightMetric {
    pub user_id: String,
    pub value: f64,
    pub unit: String,
    pub recorded_at: bson::DateTime,
}
