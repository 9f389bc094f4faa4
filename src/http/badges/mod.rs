use mongodb::results::DeleteResult;
use rocket::http::Status;
use rocket::{serde::json::Json, Build, Rocket, State};
use uuid::Uuid;

use crate::achievements::award::FeatureToggleError;
use crate::achievements::evaluator::EvaluationSubject;
use crate::achievements::progress::BadgeProgress;
use crate::achievements::streak::StreakSummary;
use crate::achievements::EvaluationContext;
use crate::database::models::badge::Badge;
use crate::database::models::user_badge::UserBadge;
use crate::http::badges::payload::{BadgeCreateRequest, EvaluationQueuedResponse, FeaturedUpdateRequest};
use crate::util::auth::AuthorizationToken;
use crate::util::error::ApiErrorResponder;
use crate::util::r#macro::unwrap_helper;
use crate::util::responder::JsonResponder;
use crate::ForgeAPIState;

mod payload;

#[get("/")]
async fn get_badges(state: &State<ForgeAPIState>) -> Json<Vec<Badge>> {
    Json(state.database.get_all_documents::<Badge>().await)
}

#[get("/<badge_id>")]
async fn get_badge_by_id(
    state: &State<ForgeAPIState>,
    badge_id: &str,
) -> Result<JsonResponder<Badge>, ApiErrorResponder> {
    Ok(JsonResponder::ok(unwrap_helper::return_default!(
        state.database.find_by_id_or_name(badge_id).await,
        Err(ApiErrorResponder::badge_missing())
    )))
}

#[post("/", format = "json", data = "<badge_create_req>")]
async fn add_badge(
    state: &State<ForgeAPIState>,
    badge_create_req: Json<BadgeCreateRequest>,
    _auth_guard: AuthorizationToken,
) -> Result<JsonResponder<Badge>, ApiErrorResponder> {
    match state.database.find_by_id_or_name::<Badge>(&badge_create_req.name).await {
        Some(_existing) => return Err(ApiErrorResponder::badge_conflict()),
        None => {}
    };

    let BadgeCreateRequest {
        name,
        description,
        icon,
        category,
        tier,
        criteria,
        is_active,
        is_automatic,
        display_order,
    } = badge_create_req.0;

    let new_badge = Badge {
        id: Uuid::new_v4().to_string(),
        name,
        description,
        icon,
        category,
        tier,
        criteria,
        is_active,
        is_automatic,
        display_order,
    };
    state.database.save::<Badge>(&new_badge).await;
    Ok(JsonResponder::created(new_badge))
}

#[delete("/<badge_id>")]
async fn delete_badge(
    state: &State<ForgeAPIState>,
    badge_id: &str,
    _auth_guard: AuthorizationToken,
) -> Result<(), ApiErrorResponder> {
    match state.database.delete_by_id::<Badge>(badge_id).await {
        Some(DeleteResult { deleted_count: 0, .. }) | None => Err(ApiErrorResponder::badge_missing()),
        _ => Ok(()),
    }
}

#[get("/earned/<user_id>")]
async fn get_earned_badges(
    state: &State<ForgeAPIState>,
    user_id: &str,
) -> Result<JsonResponder<Vec<UserBadge>>, ApiErrorResponder> {
    match state.engine.earned_badges(user_id).await {
        Ok(earned) => Ok(JsonResponder::ok(earned)),
        Err(e) => {
            warn!("Could not load earned badges for user {}: {:#}", user_id, e);
            Err(ApiErrorResponder::internal_error())
        }
    }
}

/// Fire-and-forget trigger intake: the caller's transaction has already
/// committed, so we only enqueue and reply. The worker does the actual
/// evaluation and awarding.
#[post("/evaluate", format = "json", data = "<context>")]
async fn evaluate(
    state: &State<ForgeAPIState>,
    context: Json<EvaluationContext>,
) -> JsonResponder<EvaluationQueuedResponse> {
    state.evaluation_queue.dispatch(context.0);
    JsonResponder::from(EvaluationQueuedResponse { queued: true }, Status::Accepted)
}

#[get("/progress/<user_id>?<member_id>")]
async fn get_progress(
    state: &State<ForgeAPIState>,
    user_id: &str,
    member_id: Option<&str>,
) -> Result<JsonResponder<Vec<BadgeProgress>>, ApiErrorResponder> {
    let subject = EvaluationSubject {
        user_id: user_id.to_owned(),
        member_id: member_id.map(str::to_owned),
    };
    match state.engine.progress_for(&subject).await {
        Ok(progress) => Ok(JsonResponder::ok(progress)),
        Err(e) => {
            warn!("Could not compute badge progress for user {}: {:#}", user_id, e);
            Err(ApiErrorResponder::internal_error())
        }
    }
}

#[get("/streak/<member_id>")]
async fn get_streaks(
    state: &State<ForgeAPIState>,
    member_id: &str,
) -> Result<JsonResponder<StreakSummary>, ApiErrorResponder> {
    match state.engine.streaks_for(member_id).await {
        Ok(summary) => Ok(JsonResponder::ok(summary)),
        Err(e) => {
            warn!("Could not compute streaks for member {}: {:#}", member_id, e);
            Err(ApiErrorResponder::internal_error())
        }
    }
}

#[put("/earned/<user_id>/<badge_id>/featured", format = "json", data = "<update>")]
async fn set_featured(
    state: &State<ForgeAPIState>,
    user_id: &str,
    badge_id: &str,
    update: Json<FeaturedUpdateRequest>,
) -> Result<Status, ApiErrorResponder> {
    match state
        .engine
        .set_featured(user_id, badge_id, update.featured, update.display_order)
        .await
    {
        Ok(()) => Ok(Status::NoContent),
        Err(FeatureToggleError::CapExceeded) => Err(ApiErrorResponder::featured_cap_exceeded()),
        Err(FeatureToggleError::NotEarned) => Err(ApiErrorResponder::badge_not_earned()),
        Err(FeatureToggleError::Storage(e)) => {
            warn!("Could not toggle featured badge '{}' for user {}: {:#}", badge_id, user_id, e);
            Err(ApiErrorResponder::internal_error())
        }
    }
}

pub fn mount(rocket_build: Rocket<Build>) -> Rocket<Build> {
    rocket_build.mount("/fit/badges", routes![
        get_badges,
        get_badge_by_id,
        add_badge,
        delete_badge,
        get_earned_badges,
        evaluate,
        get_progress,
        get_streaks,
        set_featured,
    ])
}
