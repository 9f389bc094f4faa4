use serde::{Deserialize, Serialize};

use crate::database::{CollectionOwner, Database};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    Active,
    Completed,
    Dropped,
}

impl CollectionOwner<ChallengeEnrollment> for ChallengeEnrollment {
    fn get_collection(database: &Database) -> &mongodb::Collection<ChallengeEnrollment> {
        &database.challenge_enrollments
    }

    fn get_collection_name() -> &'static str {
        "challenge_enrollment"
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeEnrollment {
    pub user_id: String,
    pub challenge_id: String,
    pub status: EnrollmentStatus,
}

impl CollectionOwner<ProgramEnrollment> for ProgramEnrollment {
    fn get_collection(database: &Database) -> &mongodb::Collection<ProgramEnrollment> {
        &database.program_enrollments
    }

    fn get_collection_name() -> &'static str {
        "program_enrollment"
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ProgramEnrollment {
    pub user_id: String,
    pub program_id: String,
    pub status: EnrollmentStatus,
}
