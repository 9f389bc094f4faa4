use serde::{Deserialize, Serialize};

use crate::database::{CollectionOwner, Database};

impl CollectionOwner<Follow> for Follow {
    fn get_collection(database: &Database) -> &mongodb::Collection<Follow> {
        &database.follows
    }

    fn get_collection_name() -> &'static str {
        "follow"
    }
}

/// One directed edge in the follow graph: `followerId` follows `followingId`.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Follow {
    pub follower_id: String,
    pub following_id: String,
}

impl CollectionOwner<CircleMembership> for CircleMembership {
    fn get_collection(database: &Database) -> &mongodb::Collection<CircleMembership> {
        &database.circle_memberships
    }

    fn get_collection_name() -> &'static str {
        "circle_membership"
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CircleMembership {
    pub user_id: String,
    pub circle_id: String,
    pub role: CircleRole,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CircleRole {
    Owner,
    Admin,
    Member,
}
