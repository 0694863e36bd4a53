use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};

use serde_json::{json, Map, Value as JsonValue};

use crate::data::Data;
use crate::models::ModelType;
use crate::services::{self, auth, WsError};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(post_user);
    cfg.service(get_user);
}

#[post("/users")]
pub async fn post_user(
    data: web::Data<Data>,
    body: web::Json<Map<String, JsonValue>>,
) -> impl Responder {
    let body = body.into_inner();
    if let Err(response) = services::parameters(&body, &["email", "password"]) {
        return response;
    }

    match (body.get("email"), body.get("password")) {
        (Some(JsonValue::String(email)), Some(JsonValue::String(password))) => {
            match data.create_user(email.clone(), password.clone()).await {
                Ok(user) => HttpResponse::Created().json(json!({
                    "id": user.key().map(|key| key.id()),
                })),
                Err(e) => services::error_response(e),
            }
        }
        _ => HttpResponse::UnprocessableEntity().json(WsError {
            error: "email and password must be strings".into(),
        }),
    }
}

#[get("/users")]
pub async fn get_user(data: web::Data<Data>, request: HttpRequest) -> impl Responder {
    let credentials = match auth::basic_credentials(&request) {
        Some(credentials) => credentials,
        None => {
            return HttpResponse::Unauthorized().json(WsError {
                error: "Basic authorization required".into(),
            })
        }
    };

    match data
        .authenticate(&credentials.email, credentials.password)
        .await
    {
        Ok(Some(user)) => HttpResponse::Ok().json(user.to_public()),
        Ok(None) => HttpResponse::Unauthorized().json(WsError {
            error: "Invalid credentials".into(),
        }),
        Err(e) => services::error_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use actix_web::http::header::AUTHORIZATION;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};

    use base64::prelude::*;

    use crate::services::tests::data;

    fn basic(email: &str, password: &str) -> String {
        format!(
            "Basic {}",
            BASE64_STANDARD.encode(format!("{}:{}", email, password))
        )
    }

    #[actix_rt::test]
    async fn test_create_and_authenticate() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(data()))
                .configure(config),
        )
        .await;

        let request = test::TestRequest::post()
            .uri("/users")
            .set_json(json!({ "email": "a@example.com", "password": "secret" }))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body: JsonValue = test::read_body_json(response).await;
        assert!(body["id"].is_string());

        let request = test::TestRequest::get()
            .uri("/users")
            .insert_header((AUTHORIZATION, basic("a@example.com", "secret")))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: JsonValue = test::read_body_json(response).await;
        assert_eq!(body, json!({ "email": "a@example.com" }));

        let request = test::TestRequest::get()
            .uri("/users")
            .insert_header((AUTHORIZATION, basic("a@example.com", "wrong")))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_rt::test]
    async fn test_missing_parameters() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(data()))
                .configure(config),
        )
        .await;

        let request = test::TestRequest::post()
            .uri("/users")
            .set_json(json!({ "email": "a@example.com" }))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let request = test::TestRequest::get().uri("/users").to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
