//! Request handling that is settled before any query runs: routing, auth
//! failures, body parsing and the unimplemented seat endpoints. The pool
//! connects lazily, so no database is needed.

use actix_web::http::header::AUTHORIZATION;
use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use diesel::r2d2::ConnectionManager;
use diesel::PgConnection;
use r2d2::Pool;

use cinema_api::config::{AuthSettings, DatabaseSettings, ServerSettings, Settings};
use cinema_api::pricing::SeatPricing;
use cinema_api::routes;
use cinema_api::state::AppState;

fn settings() -> Settings {
    Settings {
        server: ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
            workers: 1,
        },
        database: DatabaseSettings {
            url: "postgres://nobody@127.0.0.1:1/none".to_string(),
            pool_size: 1,
        },
        auth: AuthSettings {
            jwt_secret: "0123456789abcdef0123456789abcdef".to_string(),
            token_ttl_minutes: 120,
        },
        pricing: SeatPricing::default(),
    }
}

fn state() -> web::Data<AppState> {
    let settings = settings();
    let manager = ConnectionManager::<PgConnection>::new(settings.database.url.clone());
    let pool = Pool::builder()
        .max_size(1)
        .connection_timeout(std::time::Duration::from_millis(200))
        .build_unchecked(manager);
    web::Data::new(AppState::new(pool, &settings))
}

macro_rules! app {
    () => {
        test::init_service(
            App::new()
                .app_data(state())
                .configure(routes::configure),
        )
        .await
    };
}

#[actix_web::test]
async fn reports_without_a_token_are_unauthorized() {
    let app = app!();
    let req = test::TestRequest::get()
        .uri("/api/reports/statistic")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], 401);
    assert_eq!(body["internalCode"], "UA-00401");

    let req = test::TestRequest::get()
        .uri("/api/reports/revenue/monthly")
        .insert_header((AUTHORIZATION, "Basic dXNlcjpwYXNz"))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["internalCode"], "UA-00401");
}

#[actix_web::test]
async fn reports_with_a_forged_token_are_unauthorized() {
    let app = app!();
    let req = test::TestRequest::get()
        .uri("/api/reports/topCustomers")
        .insert_header((AUTHORIZATION, "Bearer not-a-jwt"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn admin_routes_reject_missing_and_invalid_tokens() {
    let app = app!();

    let req = test::TestRequest::get().uri("/api/orders").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/api/customers")
        .insert_header((AUTHORIZATION, "Bearer abc.def.ghi"))
        .to_request();
    let resp: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(resp["status"], 401);
    assert_eq!(resp["internalCode"], "UA-00401");
}

#[actix_web::test]
async fn malformed_json_is_a_validation_error() {
    let app = app!();
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .insert_header(("content-type", "application/json"))
        .set_payload("{\"email\": ")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], 400);
    assert_eq!(body["internalCode"], "VE-00400");
}

#[actix_web::test]
async fn unknown_body_fields_are_rejected() {
    let app = app!();
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(serde_json::json!({
            "email": "lan@example.com",
            "password": "correct horse",
            "rememberMe": true
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn unknown_query_parameters_are_rejected() {
    let app = app!();
    let req = test::TestRequest::get()
        .uri("/api/showtimes?theater=CIN001")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn single_seat_endpoints_are_not_implemented() {
    let app = app!();

    let req = test::TestRequest::get().uri("/api/seats/A1").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_IMPLEMENTED);

    let req = test::TestRequest::post().uri("/api/seats").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_IMPLEMENTED);
}

#[actix_web::test]
async fn unknown_routes_are_not_found() {
    let app = app!();
    let req = test::TestRequest::get().uri("/api/tickets").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
