use mongodb::bson::{self, Document};
use serde::{Deserialize, Serialize};

use crate::database::{CollectionOwner, Database, IdentifiableDocument};

impl CollectionOwner<UserBadge> for UserBadge {
    fn get_collection(database: &Database) -> &mongodb::Collection<UserBadge> {
        &database.user_badges
    }

    fn get_collection_name() -> &'static str {
        "user_badge"
    }
}

impl IdentifiableDocument for UserBadge {
    fn get_id(&self) -> &str {
        &self.id
    }
}

/// One earned badge. `(userId, badgeId)` is unique at the storage layer and
/// is the source of truth for "already earned"; `earnedAt` and `metadata` are
/// written once at award time and never touched again.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserBadge {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub badge_id: String,
    pub earned_at: bson::DateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Document>,
    pub is_featured: bool,
    pub display_order: i32,
}
