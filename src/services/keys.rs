use actix_web::{get, web, HttpResponse, Responder};

use serde_json::json;

use crate::data::Data;
use crate::services;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(get_key);
}

/// Resolves a URL-safe key token into its model name and id.
#[get("/keys/{token}")]
pub async fn get_key(data: web::Data<Data>, token: web::Path<String>) -> impl Responder {
    match data.decode_key(&token) {
        Ok(key) => HttpResponse::Ok().json(json!({
            "model": key.model_name(),
            "id": key.id(),
            "serial": key.serialize(),
        })),
        Err(e) => services::error_response(e),
    }
}
