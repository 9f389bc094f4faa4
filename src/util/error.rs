use rocket::http::Status;
use rocket::request::Request;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

pub struct ApiErrorResponder {
    error: Json<ApiError>,
    status: Status,
}

impl<'r> Responder<'r, 'static> for ApiErrorResponder {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        response::status::Custom(self.status, self.error).respond_to(request)
    }
}

impl ApiErrorResponder {
    fn new(code: &str, message: &str, status: Status) -> Self {
        ApiErrorResponder {
            error: Json(ApiError {
                code: code.to_owned(),
                message: message.to_owned(),
            }),
            status,
        }
    }

    pub fn validation_error() -> Self {
        Self::new("VALIDATION", "Malformed or missing request data", Status::UnprocessableEntity)
    }

    pub fn unauthorized() -> Self {
        Self::new("UNAUTHORIZED", "Missing or invalid authorization token", Status::Unauthorized)
    }

    pub fn internal_error() -> Self {
        Self::new("INTERNAL", "Something went wrong handling the request", Status::InternalServerError)
    }

    pub fn badge_missing() -> Self {
        Self::new("BADGE_MISSING", "No badge exists with the given id", Status::NotFound)
    }

    pub fn badge_conflict() -> Self {
        Self::new("BADGE_CONFLICT", "A badge with this name already exists", Status::Conflict)
    }

    pub fn badge_not_earned() -> Self {
        Self::new("BADGE_NOT_EARNED", "The user has not earned this badge", Status::NotFound)
    }

    pub fn featured_cap_exceeded() -> Self {
        Self::new(
            "FEATURED_CAP_EXCEEDED",
            "Cannot feature more badges than the featured slot limit allows",
            Status::Conflict,
        )
    }
}
