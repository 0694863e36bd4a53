mod auth;
mod keys;
mod trips;
mod users;

use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};

use log::warn;

use serde_json::{Map, Value as JsonValue};

use crate::orm::Error;

#[derive(Serialize)]
struct WsError {
    error: String,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    users::config(cfg);
    trips::config(cfg);
    keys::config(cfg);
}

pub fn error_status(error: &Error) -> StatusCode {
    match error {
        Error::InvalidArgument(_)
        | Error::MalformedKey(_)
        | Error::MalformedId(_)
        | Error::UnknownModel(_) => StatusCode::BAD_REQUEST,
        Error::NotFound { .. } => StatusCode::NOT_FOUND,
        Error::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        Error::DuplicateModel(_) | Error::Password(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn error_response(error: Error) -> HttpResponse {
    let status = error_status(&error);
    if status.is_server_error() {
        warn!("Request failed: {}", error);
    }

    HttpResponse::build(status).json(WsError {
        error: error.to_string(),
    })
}

/// Checks that every one of `params` is in the body, answering 422 otherwise.
pub fn parameters(body: &Map<String, JsonValue>, params: &[&str]) -> Result<(), HttpResponse> {
    match params.iter().find(|param| !body.contains_key(**param)) {
        Some(param) => Err(HttpResponse::UnprocessableEntity().json(WsError {
            error: format!("Missing parameter \"{}\"", param),
        })),
        None => Ok(()),
    }
}
