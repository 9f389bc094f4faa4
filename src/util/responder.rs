use rocket::http::Status;
use rocket::request::Request;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use serde::Serialize;

pub struct JsonResponder<T: Serialize> {
    data: Json<T>,
    status: Status,
}

impl<T: Serialize> JsonResponder<T> {
    pub fn from(data: T, status: Status) -> Self {
        JsonResponder { data: Json(data), status }
    }

    pub fn ok(data: T) -> Self {
        Self::from(data, Status::Ok)
    }

    pub fn created(data: T) -> Self {
        Self::from(data, Status::Created)
    }
}

impl<'r, T: Serialize> Responder<'r, 'static> for JsonResponder<T> {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        response::status::Custom(self.status, self.data).respond_to(request)
    }
}
