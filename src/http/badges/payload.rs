use serde::{Deserialize, Serialize};

use crate::database::models::badge::{BadgeCategory, BadgeTier, Criteria};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeCreateRequest {
    pub name: String,
    pub description: String,
    pub icon: String,
    pub category: BadgeCategory,
    pub tier: BadgeTier,
    pub criteria: Criteria,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default = "default_true")]
    pub is_automatic: bool,
    #[serde(default)]
    pub display_order: i32,
}

fn default_true() -> bool {
    true
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeaturedUpdateRequest {
    pub featured: bool,
    #[serde(default)]
    pub display_order: Option<i32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationQueuedResponse {
    pub queued: bool,
}
