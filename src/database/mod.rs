use anyhow::Result;
use futures::StreamExt;
use mongodb::bson::doc;
use mongodb::options::{ClientOptions, IndexOptions, ReplaceOptions};
use mongodb::results::DeleteResult;
use mongodb::{Client, Collection, Cursor, IndexModel};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::MongoConfig;
use crate::util::validation::verbose_result_ok;
use crate::database::models::badge::Badge;
use crate::database::models::enrollment::{ChallengeEnrollment, ProgramEnrollment};
use crate::database::models::goal::Goal;
use crate::database::models::personal_record::{BodyweightMetric, PersonalRecord};
use crate::database::models::social::{CircleMembership, Follow};
use crate::database::models::training::{Skill, Sport, WorkoutSession};
use crate::database::models::user_badge::UserBadge;

pub mod models;

pub trait CollectionOwner<T> {
    fn get_collection(database: &Database) -> &Collection<T>;
    fn get_collection_name() -> &'static str;
}

pub trait IdentifiableDocument {
    fn get_id(&self) -> &str;
}

pub struct Database {
    pub badges: Collection<Badge>,
    pub user_badges: Collection<UserBadge>,
    pub personal_records: Collection<PersonalRecord>,
    pub bodyweight_metrics: Collection<BodyweightMetric>,
    pub skills: Collection<Skill>,
    pub sports: Collection<Sport>,
    pub workout_sessions: Collection<WorkoutSession>,
    pub goals: Collection<Goal>,
    pub follows: Collection<Follow>,
    pub circle_memberships: Collection<CircleMembership>,
    pub challenge_enrollments: Collection<ChallengeEnrollment>,
    pub program_enrollments: Collection<ProgramEnrollment>,
}

impl Database {
    pub async fn connect(config: &MongoConfig) -> Result<Database> {
        let options = ClientOptions::parse(&config.url).await?;
        let client = Client::with_options(options)?;
        let database = client.database(&config.database);
        Ok(Database {
            badges: database.collection("badge"),
            user_badges: database.collection("user_badge"),
            personal_records: database.collection("personal_record"),
            bodyweight_metrics: database.collection("bodyweight_metric"),
            skills: database.collection("skill"),
            sports: database.collection("sport"),
            workout_sessions: database.collection("workout_session"),
            goals: database.collection("goal"),
            follows: database.collection("follow"),
            circle_memberships: database.collection("circle_membership"),
            challenge_enrollments: database.collection("challenge_enrollment"),
            program_enrollments: database.collection("program_enrollment"),
        })
    }

    /// The unique index on (userId, badgeId) is what makes concurrent award
    /// attempts collapse into a single row; losing writers see a duplicate key
    /// error and must report `alreadyEarned`.
    pub async fn ensure_indexes(&self) -> Result<()> {
        let unique_earned = IndexModel::builder()
            .keys(doc! { "userId": 1, "badgeId": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.user_badges.create_index(unique_earned, None).await?;
        Ok(())
    }

    pub async fn find_by_id<T>(&self, id: &str) -> Option<T>
    where
        T: CollectionOwner<T> + DeserializeOwned + Unpin + Send + Sync,
    {
        let result = T::get_collection(self).find_one(doc! { "_id": id }, None).await;
        verbose_result_ok(format!("Lookup in '{}' failed", T::get_collection_name()), result).flatten()
    }

    pub async fn find_by_id_or_name<T>(&self, id_or_name: &str) -> Option<T>
    where
        T: CollectionOwner<T> + DeserializeOwned + Unpin + Send + Sync,
    {
        let filter = doc! { "$or": [ { "_id": id_or_name }, { "name": id_or_name } ] };
        let result = T::get_collection(self).find_one(filter, None).await;
        verbose_result_ok(format!("Lookup in '{}' failed", T::get_collection_name()), result).flatten()
    }

    pub async fn save<T>(&self, document: &T)
    where
        T: CollectionOwner<T> + IdentifiableDocument + Serialize + Send + Sync,
    {
        let options = ReplaceOptions::builder().upsert(true).build();
        let result = T::get_collection(self)
            .replace_one(doc! { "_id": document.get_id() }, document, options)
            .await;
        if let Err(e) = result {
            warn!("Could not save document to '{}': {}", T::get_collection_name(), e);
        }
    }

    pub async fn delete_by_id<T>(&self, id: &str) -> Option<DeleteResult>
    where
        T: CollectionOwner<T> + Send + Sync,
    {
        let result = T::get_collection(self).delete_one(doc! { "_id": id }, None).await;
        verbose_result_ok(format!("Delete from '{}' failed", T::get_collection_name()), result)
    }

    pub async fn get_all_documents<T>(&self) -> Vec<T>
    where
        T: CollectionOwner<T> + DeserializeOwned + Unpin + Send + Sync,
    {
        Self::consume_cursor_into_owning_vec_option(T::get_collection(self).find(doc! {}, None).await.ok()).await
    }

    pub async fn consume_cursor_into_owning_vec<T>(mut cursor: Cursor<T>) -> Vec<T>
    where
        T: DeserializeOwned + Unpin + Send + Sync,
    {
        let mut documents: Vec<T> = Vec::new();
        while let Some(next) = cursor.next().await {
            match next {
                Ok(document) => documents.push(document),
                Err(e) => warn!("Skipping unreadable document: {}", e),
            }
        }
        documents
    }

    pub async fn consume_cursor_into_owning_vec_option<T>(cursor: Option<Cursor<T>>) -> Vec<T>
    where
        T: DeserializeOwned + Unpin + Send + Sync,
    {
        match cursor {
            Some(cursor) => Self::consume_cursor_into_owning_vec(cursor).await,
            None => Vec::new(),
        }
    }
}

/// True when a write failed only because it collided with the unique index.
pub fn is_duplicate_key_error(error: &mongodb::error::Error) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};
    match error.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => write_error.code == 11000,
        _ => false,
    }
}
