use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::doc;
use mongodb::options::{FindOneOptions, FindOptions};

use crate::database::models::badge::Badge;
use crate::database::models::goal::Goal;
use crate::database::models::personal_record::{BodyweightMetric, PersonalRecord};
use crate::database::models::training::{Skill, Sport};
use crate::database::models::user_badge::UserBadge;
use crate::database::{is_duplicate_key_error, Database};

/// Outcome of the unique-constrained earned-badge insert. A losing concurrent
/// writer gets `AlreadyEarned`, never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EarnedInsert {
    Inserted,
    AlreadyEarned,
}

#[async_trait]
pub trait BadgeCatalog: Send + Sync {
    /// Definitions picked up by automatic evaluation (active and automatic).
    async fn automatic_badges(&self) -> Result<Vec<Badge>>;
    /// All active definitions, in display order.
    async fn active_badges(&self) -> Result<Vec<Badge>>;
}

#[async_trait]
pub trait UserBadgeStore: Send + Sync {
    async fn earned_badge_ids(&self, user_id: &str) -> Result<HashSet<String>>;
    async fn find(&self, user_id: &str, badge_id: &str) -> Result<Option<UserBadge>>;
    async fn for_user(&self, user_id: &str) -> Result<Vec<UserBadge>>;
    async fn featured_count(&self, user_id: &str) -> Result<u64>;
    async fn insert(&self, row: &UserBadge) -> Result<EarnedInsert>;
    /// Returns false when the row does not exist.
    async fn set_featured(
        &self,
        user_id: &str,
        badge_id: &str,
        featured: bool,
        display_order: Option<i32>,
    ) -> Result<bool>;
}

#[async_trait]
pub trait PersonalRecordStore: Send + Sync {
    async fn for_member(&self, member_id: &str) -> Result<Vec<PersonalRecord>>;
}

#[async_trait]
pub trait BodyweightStore: Send + Sync {
    async fn latest_for_user(&self, user_id: &str) -> Result<Option<BodyweightMetric>>;
}

#[async_trait]
pub trait SkillStore: Send + Sync {
    async fn for_user(&self, user_id: &str) -> Result<Vec<Skill>>;
}

#[async_trait]
pub trait SportStore: Send + Sync {
    async fn for_user(&self, user_id: &str) -> Result<Vec<Sport>>;
}

#[async_trait]
pub trait WorkoutSessionStore: Send + Sync {
    async fn completed_count(&self, member_id: &str) -> Result<u64>;
    async fn completed_timestamps(&self, member_id: &str) -> Result<Vec<DateTime<Utc>>>;
}

#[async_trait]
pub trait FollowStore: Send + Sync {
    async fn follower_count(&self, user_id: &str) -> Result<u64>;
}

#[async_trait]
pub trait CircleStore: Send + Sync {
    async fn owned_circle_count(&self, user_id: &str) -> Result<u64>;
}

#[async_trait]
pub trait GoalStore: Send + Sync {
    async fn active_for_member(&self, member_id: &str) -> Result<Vec<Goal>>;
}

#[async_trait]
pub trait EnrollmentStore: Send + Sync {
    async fn has_completed_challenge(&self, user_id: &str, challenge_id: Option<&str>) -> Result<bool>;
    async fn has_completed_program(&self, user_id: &str, program_id: Option<&str>) -> Result<bool>;
}

/// Everything the engine reads or writes, bundled so evaluator, award service
/// and progress calculator can be handed one value and tested against fakes.
#[derive(Clone)]
pub struct AchievementStores {
    pub catalog: Arc<dyn BadgeCatalog>,
    pub earned: Arc<dyn UserBadgeStore>,
    pub personal_records: Arc<dyn PersonalRecordStore>,
    pub bodyweight: Arc<dyn BodyweightStore>,
    pub skills: Arc<dyn SkillStore>,
    pub sports: Arc<dyn SportStore>,
    pub sessions: Arc<dyn WorkoutSessionStore>,
    pub follows: Arc<dyn FollowStore>,
    pub circles: Arc<dyn CircleStore>,
    pub goals: Arc<dyn GoalStore>,
    pub enrollments: Arc<dyn EnrollmentStore>,
}

impl AchievementStores {
    pub fn mongo(database: Arc<Database>) -> Self {
        let stores = Arc::new(MongoStores { database });
        AchievementStores {
            catalog: stores.clone(),
            earned: stores.clone(),
            personal_records: stores.clone(),
            bodyweight: stores.clone(),
            skills: stores.clone(),
            sports: stores.clone(),
            sessions: stores.clone(),
            follows: stores.clone(),
            circles: stores.clone(),
            goals: stores.clone(),
            enrollments: stores,
        }
    }
}

pub struct MongoStores {
    database: Arc<Database>,
}

#[async_trait]
impl BadgeCatalog for MongoStores {
    async fn automatic_badges(&self) -> Result<Vec<Badge>> {
        let cursor = self
            .database
            .badges
            .find(doc! { "isActive": true, "isAutomatic": true }, None)
            .await?;
        Ok(Database::consume_cursor_into_owning_vec(cursor).await)
    }

    async fn active_badges(&self) -> Result<Vec<Badge>> {
        let options = FindOptions::builder().sort(doc! { "displayOrder": 1 }).build();
        let cursor = self.database.badges.find(doc! { "isActive": true }, options).await?;
        Ok(Database::consume_cursor_into_owning_vec(cursor).await)
    }
}

#[async_trait]
impl UserBadgeStore for MongoStores {
    async fn earned_badge_ids(&self, user_id: &str) -> Result<HashSet<String>> {
        let cursor = self.database.user_badges.find(doc! { "userId": user_id }, None).await?;
        let rows = Database::consume_cursor_into_owning_vec(cursor).await;
        Ok(rows.into_iter().map(|row| row.badge_id).collect())
    }

    async fn find(&self, user_id: &str, badge_id: &str) -> Result<Option<UserBadge>> {
        let filter = doc! { "userId": user_id, "badgeId": badge_id };
        Ok(self.database.user_badges.find_one(filter, None).await?)
    }

    async fn for_user(&self, user_id: &str) -> Result<Vec<UserBadge>> {
        let options = FindOptions::builder()
            .sort(doc! { "isFeatured": -1, "displayOrder": 1, "earnedAt": -1 })
            .build();
        let cursor = self.database.user_badges.find(doc! { "userId": user_id }, options).await?;
        Ok(Database::consume_cursor_into_owning_vec(cursor).await)
    }

    async fn featured_count(&self, user_id: &str) -> Result<u64> {
        let filter = doc! { "userId": user_id, "isFeatured": true };
        Ok(self.database.user_badges.count_documents(filter, None).await?)
    }

    async fn insert(&self, row: &UserBadge) -> Result<EarnedInsert> {
        match self.database.user_badges.insert_one(row, None).await {
            Ok(_) => Ok(EarnedInsert::Inserted),
            Err(e) if is_duplicate_key_error(&e) => Ok(EarnedInsert::AlreadyEarned),
            Err(e) => Err(e.into()),
        }
    }

    async fn set_featured(
        &self,
        user_id: &str,
        badge_id: &str,
        featured: bool,
        display_order: Option<i32>,
    ) -> Result<bool> {
        let filter = doc! { "userId": user_id, "badgeId": badge_id };
        let mut fields = doc! { "isFeatured": featured };
        if let Some(order) = display_order {
            fields.insert("displayOrder", order);
        }
        let result = self.database.user_badges.update_one(filter, doc! { "$set": fields }, None).await?;
        Ok(result.matched_count > 0)
    }
}

#[async_trait]
impl PersonalRecordStore for MongoStores {
    async fn for_member(&self, member_id: &str) -> Result<Vec<PersonalRecord>> {
        let cursor = self.database.personal_records.find(doc! { "memberId": member_id }, None).await?;
        Ok(Database::consume_cursor_into_owning_vec(cursor).await)
    }
}

#[async_trait]
impl BodyweightStore for MongoStores {
    async fn latest_for_user(&self, user_id: &str) -> Result<Option<BodyweightMetric>> {
        let options = FindOneOptions::builder().sort(doc! { "recordedAt": -1 }).build();
        Ok(self
            .database
            .bodyweight_metrics
            .find_one(doc! { "userId": user_id }, options)
            .await?)
    }
}

#[async_trait]
impl SkillStore for MongoStores {
    async fn for_user(&self, user_id: &str) -> Result<Vec<Skill>> {
        let cursor = self.database.skills.find(doc! { "userId": user_id }, None).await?;
        Ok(Database::consume_cursor_into_owning_vec(cursor).await)
    }
}

#[async_trait]
impl SportStore for MongoStores {
    async fn for_user(&self, user_id: &str) -> Result<Vec<Sport>> {
        let cursor = self.database.sports.find(doc! { "userId": user_id }, None).await?;
        Ok(Database::consume_cursor_into_owning_vec(cursor).await)
    }
}

#[async_trait]
impl WorkoutSessionStore for MongoStores {
    async fn completed_count(&self, member_id: &str) -> Result<u64> {
        let filter = doc! { "memberId": member_id, "status": "completed" };
        Ok(self.database.workout_sessions.count_documents(filter, None).await?)
    }

    async fn completed_timestamps(&self, member_id: &str) -> Result<Vec<DateTime<Utc>>> {
        let filter = doc! { "memberId": member_id, "status": "completed" };
        let cursor = self.database.workout_sessions.find(filter, None).await?;
        let sessions = Database::consume_cursor_into_owning_vec(cursor).await;
        Ok(sessions.iter().map(|session| session.completed_at().to_chrono()).collect())
    }
}

#[async_trait]
impl FollowStore for MongoStores {
    async fn follower_count(&self, user_id: &str) -> Result<u64> {
        Ok(self.database.follows.count_documents(doc! { "followingId": user_id }, None).await?)
    }
}

#[async_trait]
impl CircleStore for MongoStores {
    async fn owned_circle_count(&self, user_id: &str) -> Result<u64> {
        let filter = doc! { "userId": user_id, "role": "owner" };
        Ok(self.database.circle_memberships.count_documents(filter, None).await?)
    }
}

#[async_trait]
impl GoalStore for MongoStores {
    async fn active_for_member(&self, member_id: &str) -> Result<Vec<Goal>> {
        let filter = doc! { "memberId": member_id, "status": "active" };
        let cursor = self.database.goals.find(filter, None).await?;
        Ok(Database::consume_cursor_into_owning_vec(cursor).await)
    }
}

#[async_trait]
impl EnrollmentStore for MongoStores {
    async fn has_completed_challenge(&self, user_id: &str, challenge_id: Option<&str>) -> Result<bool> {
        let mut filter = doc! { "userId": user_id, "status": "completed" };
        if let Some(id) = challenge_id {
            filter.insert("challengeId", id);
        }
        Ok(self.database.challenge_enrollments.find_one(filter, None).await?.is_some())
    }

    async fn has_completed_program(&self, user_id: &str, program_id: Option<&str>) -> Result<bool> {
        let mut filter = doc! { "userId": user_id, "status": "completed" };
        if let Some(id) = program_id {
            filter.insert("programId", id);
        }
        Ok(self.database.program_enrollments.find_one(filter, None).await?.is_some())
    }
}
