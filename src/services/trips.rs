use actix_web::{delete, get, post, web, HttpResponse, Responder};

use serde_json::{json, Map, Value as JsonValue};

use crate::data::Data;
use crate::models::ModelType;
use crate::services::{self, WsError};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(post_trip);
    cfg.service(get_trips);
    cfg.service(delete_trips);
    cfg.service(get_trip);
    cfg.service(delete_trip);
}

#[post("/trips")]
pub async fn post_trip(
    data: web::Data<Data>,
    body: web::Json<Map<String, JsonValue>>,
) -> impl Responder {
    let body = body.into_inner();
    if let Err(response) = services::parameters(&body, &["name", "author"]) {
        return response;
    }

    match data.create_trip(body).await {
        Ok(trip) => HttpResponse::Created().json(json!({
            "id": trip.key().map(|key| key.id()),
        })),
        Err(e) => services::error_response(e),
    }
}

#[get("/trips")]
pub async fn get_trips(data: web::Data<Data>) -> impl Responder {
    match data.get_all_trips().await {
        Ok(trips) => HttpResponse::Ok().json(
            trips
                .iter()
                .map(ModelType::to_public)
                .collect::<Vec<_>>(),
        ),
        Err(e) => services::error_response(e),
    }
}

#[delete("/trips")]
pub async fn delete_trips(data: web::Data<Data>) -> impl Responder {
    match data.delete_all_trips().await {
        Ok(deleted) => HttpResponse::Ok().json(json!({ "deleted": deleted })),
        Err(e) => services::error_response(e),
    }
}

#[get("/trips/{id}")]
pub async fn get_trip(data: web::Data<Data>, id: web::Path<String>) -> impl Responder {
    match data.get_trip(&id).await {
        Ok(Some(trip)) => HttpResponse::Ok().json(trip.to_public()),
        Ok(None) => HttpResponse::BadRequest().json(WsError {
            error: format!("No trip with id {}", id),
        }),
        Err(e) => services::error_response(e),
    }
}

#[delete("/trips/{id}")]
pub async fn delete_trip(data: web::Data<Data>, id: web::Path<String>) -> impl Responder {
    match data.delete_trip(&id).await {
        Ok(deleted) => HttpResponse::Ok().json(json!({ "deleted": deleted })),
        Err(e) => services::error_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use actix_web::http::StatusCode;
    use actix_web::{test, App};

    use crate::services::tests::data;

    const AUTHOR_ID: &str = "5f1d7c2e9a1b4c3d2e1f0a9b";

    #[actix_rt::test]
    async fn test_trip_lifecycle() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(data()))
                .configure(config),
        )
        .await;

        let request = test::TestRequest::post()
            .uri("/trips")
            .set_json(json!({
                "name": "Coast",
                "author": AUTHOR_ID,
                "waypoints": [{ "x": 1.0, "y": 2.0 }],
            }))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body: JsonValue = test::read_body_json(response).await;
        let id = body["id"].as_str().unwrap().to_string();

        let request = test::TestRequest::get()
            .uri(&format!("/trips/{}", id))
            .to_request();
        let body: JsonValue = test::call_and_read_body_json(&app, request).await;
        assert_eq!(
            body,
            json!({
                "name": "Coast",
                "author": AUTHOR_ID,
                "waypoints": [{ "x": 1.0, "y": 2.0 }],
            })
        );

        let request = test::TestRequest::get().uri("/trips").to_request();
        let body: JsonValue = test::call_and_read_body_json(&app, request).await;
        assert_eq!(body.as_array().unwrap().len(), 1);

        let request = test::TestRequest::delete()
            .uri(&format!("/trips/{}", id))
            .to_request();
        let body: JsonValue = test::call_and_read_body_json(&app, request).await;
        assert_eq!(body, json!({ "deleted": 1 }));

        let request = test::TestRequest::delete()
            .uri(&format!("/trips/{}", id))
            .to_request();
        let body: JsonValue = test::call_and_read_body_json(&app, request).await;
        assert_eq!(body, json!({ "deleted": 0 }));

        let request = test::TestRequest::get()
            .uri(&format!("/trips/{}", id))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_rt::test]
    async fn test_delete_all_trips() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(data()))
                .configure(config),
        )
        .await;

        for name in &["One", "Two"] {
            let request = test::TestRequest::post()
                .uri("/trips")
                .set_json(json!({ "name": name, "author": AUTHOR_ID }))
                .to_request();
            let response = test::call_service(&app, request).await;
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let request = test::TestRequest::delete().uri("/trips").to_request();
        let body: JsonValue = test::call_and_read_body_json(&app, request).await;
        assert_eq!(body, json!({ "deleted": 2 }));
    }

    #[actix_rt::test]
    async fn test_bad_requests() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(data()))
                .configure(config),
        )
        .await;

        let request = test::TestRequest::post()
            .uri("/trips")
            .set_json(json!({ "name": "Coast" }))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let request = test::TestRequest::post()
            .uri("/trips")
            .set_json(json!({ "name": "Coast", "author": AUTHOR_ID, "color": "red" }))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let request = test::TestRequest::delete().uri("/trips/abc123").to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let request = test::TestRequest::get().uri("/trips/abc123").to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
