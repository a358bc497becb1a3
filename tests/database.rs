//! End-to-end checks against a real PostgreSQL database. They are ignored by
//! default; run them with `cargo test -- --ignored` and
//! `CINEMA_TEST_DATABASE_URL` pointing at a database the tests may write to.

use std::sync::{Arc, Barrier, Once};
use std::thread;

use actix_web::http::header::AUTHORIZATION;
use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use chrono::{NaiveDate, NaiveTime};
use diesel::{ExpressionMethods, QueryDsl, RunQueryDsl};
use serde_json::json;
use uuid::Uuid;

use cinema_api::cinemas::{CinemaInput, RoomInput, SeatLayoutInput};
use cinema_api::config::{AuthSettings, DatabaseSettings, ServerSettings, Settings};
use cinema_api::customers::CustomerProfile;
use cinema_api::db;
use cinema_api::error::ApiError;
use cinema_api::model::{FoodItemRow, PaymentMethod, SeatType, ShowtimeFormat, VoucherRow};
use cinema_api::movies::{GenreList, MovieInput};
use cinema_api::orders::PlaceOrder;
use cinema_api::pricing::SeatPricing;
use cinema_api::routes;
use cinema_api::schema::{
    food_items, food_orders, movie_genres, orders, rooms, seats, showtime_seats, showtimes,
    vouchers,
};
use cinema_api::showtimes::ShowtimeInput;
use cinema_api::state::{build_pool, AppState, DbPool};

const NEEDS_DATABASE: &str = "needs CINEMA_TEST_DATABASE_URL";

static MIGRATE: Once = Once::new();

fn pool() -> DbPool {
    let url = std::env::var("CINEMA_TEST_DATABASE_URL").expect(NEEDS_DATABASE);
    let pool = build_pool(&url, 4).expect("test database is reachable");
    MIGRATE.call_once(|| db::run_migrations(&pool).expect("migrations apply"));
    pool
}

fn state(pool: DbPool) -> web::Data<AppState> {
    let settings = Settings {
        server: ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
            workers: 1,
        },
        database: DatabaseSettings {
            url: String::new(),
            pool_size: 4,
        },
        auth: AuthSettings {
            jwt_secret: "integration-secret-0123456789abcdef".to_string(),
            token_ttl_minutes: 120,
        },
        pricing: SeatPricing::default(),
    };
    web::Data::new(AppState::new(pool, &settings))
}

struct Fixture {
    movie_id: String,
    cinema_id: String,
    showtime_id: String,
    food_id: String,
    customer_id: String,
    customer_token: String,
    admin_token: String,
}

fn movie(genres: &str) -> MovieInput {
    MovieInput {
        title: "Midnight Ferry".to_string(),
        release_date: NaiveDate::from_ymd_opt(2024, 3, 1),
        duration: 105,
        language: "English".to_string(),
        description: "A night crossing goes wrong.".to_string(),
        poster_url: "https://example.com/ferry.jpg".to_string(),
        age_rating: "T13".to_string(),
        studio: "Harbor Films".to_string(),
        country: "UK".to_string(),
        director: "A. Reed".to_string(),
        rating: None,
        is_showing: true,
        genres: GenreList::Csv(genres.to_string()),
    }
}

fn customer(conn: &mut diesel::PgConnection, membership: &str) -> String {
    let profile = CustomerProfile {
        name: format!("{} tester", membership),
        email: format!("{}@example.com", Uuid::new_v4()),
        phone: None,
        membership_level: membership.to_string(),
    };
    db::customers::create(conn, profile, "not-a-real-hash".to_string())
        .unwrap()
        .id
}

fn showtime(movie_id: &str, cinema_id: &str, room_number: i32) -> ShowtimeInput {
    ShowtimeInput {
        movie_id: movie_id.to_string(),
        cinema_id: cinema_id.to_string(),
        room_number,
        start_time: NaiveDate::from_ymd_opt(2030, 6, 1)
            .unwrap()
            .and_hms_opt(19, 0, 0)
            .unwrap(),
        format: ShowtimeFormat::TwoD,
        subtitle: true,
        dubbing: false,
    }
}

/// Food items are catalogued outside the API, so tests insert them directly.
fn food_item(conn: &mut diesel::PgConnection, stock_quantity: i32, is_available: bool) -> String {
    let id = format!("F{}", &Uuid::new_v4().simple().to_string()[..8]);
    diesel::insert_into(food_items::table)
        .values(&FoodItemRow {
            id: id.clone(),
            name: "Nachos".to_string(),
            price: 45000.0,
            stock_quantity,
            is_available,
            item_type: "other".to_string(),
        })
        .execute(conn)
        .unwrap();
    id
}

fn stock_of(conn: &mut diesel::PgConnection, item_id: &str) -> i32 {
    food_items::table
        .find(item_id)
        .select(food_items::stock_quantity)
        .first(conn)
        .unwrap()
}

fn fixture(state: &AppState) -> Fixture {
    let mut conn = state.pool.get().unwrap();
    let conn = &mut *conn;

    let movie_id = db::movies::create(conn, movie("Thriller")).unwrap().id;
    let cinema_id = db::cinemas::create(
        conn,
        CinemaInput {
            name: "Riverside".to_string(),
            opening_hour: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            closing_hour: NaiveTime::from_hms_opt(23, 30, 0).unwrap(),
            location: "12 Quay Street".to_string(),
            phone_numbers: vec!["0281234567".to_string()],
        },
    )
    .unwrap()
    .id;
    db::cinemas::create_room(
        conn,
        &cinema_id,
        RoomInput {
            room_number: 1,
            room_type: "Standard".to_string(),
            seats: ["A1", "A2", "A3"]
                .iter()
                .map(|n| SeatLayoutInput {
                    seat_number: n.to_string(),
                    seat_type: if *n == "A3" { SeatType::Vip } else { SeatType::Standard },
                })
                .collect(),
        },
    )
    .unwrap();
    let showtime_id = db::showtimes::create(conn, showtime(&movie_id, &cinema_id, 1))
        .unwrap()
        .id;

    let food_id = food_item(conn, 50, true);

    let customer_id = customer(conn, "Standard");
    let admin_id = customer(conn, "Admin");

    Fixture {
        movie_id,
        customer_token: state.tokens.issue(&customer_id).unwrap().0,
        admin_token: state.tokens.issue(&admin_id).unwrap().0,
        cinema_id,
        showtime_id,
        food_id,
        customer_id,
    }
}

fn bearer(token: &str) -> (actix_web::http::header::HeaderName, String) {
    (AUTHORIZATION, format!("Bearer {}", token))
}

macro_rules! app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data($state.clone())
                .configure(routes::configure),
        )
        .await
    };
}

#[actix_web::test]
#[ignore = "needs CINEMA_TEST_DATABASE_URL"]
async fn order_books_seats_and_food_in_one_go() {
    let pool = pool();
    let state = state(pool);
    let fx = fixture(&state);
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/orders")
        .insert_header(bearer(&fx.customer_token))
        .set_json(json!({
            "showtimeId": fx.showtime_id,
            "seatNumbers": ["A1", "A2"],
            "foodItems": [{"itemId": fx.food_id, "quantity": 2}],
            "paymentMethod": "Credit Card"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(created["totalPrice"], 75000.0 * 2.0 + 45000.0 * 2.0);
    let order_id = Uuid::parse_str(created["orderId"].as_str().unwrap()).unwrap();

    let mut conn = state.pool.get().unwrap();
    let order_rows: i64 = orders::table
        .filter(orders::id.eq(order_id))
        .count()
        .get_result(&mut *conn)
        .unwrap();
    let seat_rows: i64 = showtime_seats::table
        .filter(showtime_seats::order_id.eq(order_id))
        .count()
        .get_result(&mut *conn)
        .unwrap();
    let food_rows: i64 = food_orders::table
        .filter(food_orders::order_id.eq(order_id))
        .count()
        .get_result(&mut *conn)
        .unwrap();
    let stock = stock_of(&mut conn, &fx.food_id);
    assert_eq!((order_rows, seat_rows, food_rows, stock), (1, 2, 1, 48));

    let req = test::TestRequest::get()
        .uri(&format!("/api/seats/showtimes/{}", fx.showtime_id))
        .to_request();
    let seats: Vec<serde_json::Value> = test::call_and_read_body_json(&app, req).await;
    let status_of = |n: &str| {
        seats
            .iter()
            .find(|s| s["seatNumber"] == n)
            .map(|s| s["status"].clone())
            .unwrap()
    };
    assert_eq!(status_of("A1"), "occupied");
    assert_eq!(status_of("A2"), "occupied");
    assert_eq!(status_of("A3"), "available");

    let req = test::TestRequest::get()
        .uri(&format!("/api/customers/{}", fx.customer_id))
        .insert_header(bearer(&fx.customer_token))
        .to_request();
    let profile: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(profile["orderCount"], 1);
}

#[actix_web::test]
#[ignore = "needs CINEMA_TEST_DATABASE_URL"]
async fn double_booking_is_rejected_without_partial_writes() {
    let pool = pool();
    let state = state(pool);
    let fx = fixture(&state);
    let app = app!(state);

    let order = |seats: serde_json::Value| {
        test::TestRequest::post()
            .uri("/api/orders")
            .insert_header(bearer(&fx.customer_token))
            .set_json(json!({
                "showtimeId": fx.showtime_id,
                "seatNumbers": seats,
                "foodItems": [{"itemId": fx.food_id, "quantity": 1}],
                "paymentMethod": "Cash"
            }))
            .to_request()
    };

    let resp = test::call_service(&app, order(json!(["A1"]))).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = test::call_service(&app, order(json!(["A2", "A1"]))).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let mut conn = state.pool.get().unwrap();
    let booked: Vec<String> = showtime_seats::table
        .filter(showtime_seats::showtime_id.eq(&fx.showtime_id))
        .select(showtime_seats::seat_number)
        .load(&mut *conn)
        .unwrap();
    assert_eq!(booked, vec!["A1".to_string()]);
    let stock = stock_of(&mut conn, &fx.food_id);
    assert_eq!(stock, 49);
}

#[actix_web::test]
#[ignore = "needs CINEMA_TEST_DATABASE_URL"]
async fn cancelling_releases_seats_and_cannot_be_undone() {
    let pool = pool();
    let state = state(pool);
    let fx = fixture(&state);
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/orders")
        .insert_header(bearer(&fx.customer_token))
        .set_json(json!({
            "showtimeId": fx.showtime_id,
            "seatNumbers": ["A3"],
            "paymentMethod": "Mobile App"
        }))
        .to_request();
    let created: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let order_id = created["orderId"].as_str().unwrap().to_string();

    let update = |status: &str| {
        test::TestRequest::put()
            .uri(&format!("/api/orders/{}", order_id))
            .insert_header(bearer(&fx.admin_token))
            .set_json(json!({"status": status, "paymentMethod": "Mobile App"}))
            .to_request()
    };
    let resp = test::call_service(&app, update("Cancelled")).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(&app, update("Completed")).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let mut conn = state.pool.get().unwrap();
    let booked: i64 = showtime_seats::table
        .filter(showtime_seats::showtime_id.eq(&fx.showtime_id))
        .count()
        .get_result(&mut *conn)
        .unwrap();
    assert_eq!(booked, 0);
}

#[actix_web::test]
#[ignore = "needs CINEMA_TEST_DATABASE_URL"]
async fn duplicate_genres_are_stored_once_in_first_seen_order() {
    let pool = pool();
    let state = state(pool);
    let fx = fixture(&state);
    let app = app!(state);

    let body = json!({
        "title": "Two Rivers",
        "releaseDate": "2024-05-10",
        "duration": 98,
        "language": "English",
        "description": "Brothers reunite.",
        "posterUrl": "https://example.com/rivers.jpg",
        "ageRating": "P",
        "studio": "Delta",
        "country": "US",
        "director": "M. Cole",
        "isShowing": true,
        "genres": "Drama, Action, drama"
    });

    let req = test::TestRequest::post()
        .uri("/api/movies")
        .insert_header(bearer(&fx.admin_token))
        .set_json(&body)
        .to_request();
    let created: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/movies/{}", created["id"].as_str().unwrap()))
        .to_request();
    let fetched: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fetched["genres"], json!(["Drama", "Action"]));

    // Catalog writes need an admin.
    let req = test::TestRequest::post()
        .uri("/api/movies")
        .insert_header(bearer(&fx.customer_token))
        .set_json(&body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
#[ignore = "needs CINEMA_TEST_DATABASE_URL"]
async fn deleting_a_cinema_removes_rooms_seats_and_showtimes() {
    let pool = pool();
    let state = state(pool);
    let fx = fixture(&state);
    let app = app!(state);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/cinemas/{}", fx.cinema_id))
        .insert_header(bearer(&fx.admin_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let mut conn = state.pool.get().unwrap();
    let left: (i64, i64, i64) = (
        rooms::table
            .filter(rooms::cinema_id.eq(&fx.cinema_id))
            .count()
            .get_result(&mut *conn)
            .unwrap(),
        seats::table
            .filter(seats::cinema_id.eq(&fx.cinema_id))
            .count()
            .get_result(&mut *conn)
            .unwrap(),
        showtimes::table
            .filter(showtimes::cinema_id.eq(&fx.cinema_id))
            .count()
            .get_result(&mut *conn)
            .unwrap(),
    );
    assert_eq!(left, (0, 0, 0));

    let req = test::TestRequest::get()
        .uri(&format!("/api/cinemas/{}", fx.cinema_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
#[ignore = "needs CINEMA_TEST_DATABASE_URL"]
async fn reports_are_for_admins_only() {
    let pool = pool();
    let state = state(pool);
    let fx = fixture(&state);
    let app = app!(state);

    let req = test::TestRequest::get()
        .uri("/api/reports/statistic")
        .insert_header(bearer(&fx.customer_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri("/api/reports/statistic")
        .insert_header(bearer(&fx.admin_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/api/reports/revenue/monthly?year=2030")
        .insert_header(bearer(&fx.admin_token))
        .to_request();
    let months: Vec<serde_json::Value> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(months.len(), 12);

    let req = test::TestRequest::get()
        .uri("/api/reports/topCustomers?limit=3")
        .insert_header(bearer(&fx.admin_token))
        .to_request();
    let top: Vec<serde_json::Value> = test::call_and_read_body_json(&app, req).await;
    assert!(top.len() <= 3);
}

#[actix_web::test]
#[ignore = "needs CINEMA_TEST_DATABASE_URL"]
async fn registration_login_and_password_reset() {
    let pool = pool();
    let state = state(pool);
    let app = app!(state);
    let email = format!("{}@example.com", Uuid::new_v4());

    let register = || {
        test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({
                "name": "Lan Tran",
                "email": email,
                "password": "first-password"
            }))
            .to_request()
    };
    let resp = test::call_service(&app, register()).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let registered: serde_json::Value = test::read_body_json(resp).await;
    let token = registered["token"].as_str().unwrap().to_string();

    let body: serde_json::Value = test::call_and_read_body_json(&app, register()).await;
    assert_eq!(body["status"], 400);
    assert_eq!(body["internalCode"], "ENA-00400");

    // A freshly registered customer is not an admin.
    let req = test::TestRequest::get()
        .uri("/api/reports/statistic")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let login = |password: &str| {
        test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({"email": email, "password": password}))
            .to_request()
    };
    let resp = test::call_service(&app, login("first-password")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = test::call_service(&app, login("wrong-password")).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/auth/password/reset")
        .set_json(json!({
            "email": email,
            "currentPassword": "first-password",
            "newPassword": "second-password"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = test::call_service(&app, login("first-password")).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let logged_in: serde_json::Value =
        test::call_and_read_body_json(&app, login("second-password")).await;
    assert_eq!(logged_in["customer"]["id"], registered["customer"]["id"]);
}

#[actix_web::test]
#[ignore = "needs CINEMA_TEST_DATABASE_URL"]
async fn food_that_is_short_or_switched_off_is_refused() {
    let pool = pool();
    let state = state(pool);
    let fx = fixture(&state);
    let app = app!(state);
    let switched_off = food_item(&mut state.pool.get().unwrap(), 10, false);

    let order = |item_id: &str, quantity: i32| {
        test::TestRequest::post()
            .uri("/api/orders")
            .insert_header(bearer(&fx.customer_token))
            .set_json(json!({
                "showtimeId": fx.showtime_id,
                "seatNumbers": ["A1"],
                "foodItems": [{"itemId": item_id, "quantity": quantity}],
                "paymentMethod": "Cash"
            }))
            .to_request()
    };

    let body: serde_json::Value = test::call_and_read_body_json(&app, order(&fx.food_id, 51)).await;
    assert_eq!(body["status"], 409);
    assert_eq!(body["internalCode"], "IS-00409");

    let body: serde_json::Value = test::call_and_read_body_json(&app, order(&switched_off, 1)).await;
    assert_eq!(body["status"], 409);
    assert_eq!(body["internalCode"], "IU-00409");

    let mut conn = state.pool.get().unwrap();
    assert_eq!(stock_of(&mut conn, &fx.food_id), 50);
    assert_eq!(stock_of(&mut conn, &switched_off), 10);
    let booked: i64 = showtime_seats::table
        .filter(showtime_seats::showtime_id.eq(&fx.showtime_id))
        .count()
        .get_result(&mut *conn)
        .unwrap();
    assert_eq!(booked, 0);
}

#[actix_web::test]
#[ignore = "needs CINEMA_TEST_DATABASE_URL"]
async fn vouchers_discount_the_order_and_are_given_back_on_cancel() {
    let pool = pool();
    let state = state(pool);
    let fx = fixture(&state);
    let app = app!(state);

    let code = format!("SAVE10-{}", &Uuid::new_v4().simple().to_string()[..6]);
    let usage_count = |conn: &mut diesel::PgConnection| -> i32 {
        vouchers::table
            .find(&code)
            .select(vouchers::usage_count)
            .first(conn)
            .unwrap()
    };
    diesel::insert_into(vouchers::table)
        .values(&VoucherRow {
            code: code.clone(),
            discount_type: "percentage".to_string(),
            discount_amount: 10.0,
            usage_count: 0,
        })
        .execute(&mut *state.pool.get().unwrap())
        .unwrap();

    let req = test::TestRequest::post()
        .uri("/api/orders")
        .insert_header(bearer(&fx.customer_token))
        .set_json(json!({
            "showtimeId": fx.showtime_id,
            "seatNumbers": ["A1", "A3"],
            "voucherCode": code,
            "paymentMethod": "Credit Card"
        }))
        .to_request();
    let created: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    // Standard 75000 plus VIP 100000, less 10%.
    assert_eq!(created["totalPrice"], 157500.0);
    assert_eq!(usage_count(&mut state.pool.get().unwrap()), 1);

    let req = test::TestRequest::put()
        .uri(&format!("/api/orders/{}", created["orderId"].as_str().unwrap()))
        .insert_header(bearer(&fx.admin_token))
        .set_json(json!({"status": "Cancelled", "paymentMethod": "Credit Card"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(usage_count(&mut state.pool.get().unwrap()), 0);
}

#[actix_web::test]
#[ignore = "needs CINEMA_TEST_DATABASE_URL"]
async fn showtimes_with_bookings_keep_their_room() {
    let pool = pool();
    let state = state(pool);
    let fx = fixture(&state);
    let app = app!(state);
    db::cinemas::create_room(
        &mut state.pool.get().unwrap(),
        &fx.cinema_id,
        RoomInput {
            room_number: 2,
            room_type: "Standard".to_string(),
            seats: vec![SeatLayoutInput {
                seat_number: "B1".to_string(),
                seat_type: SeatType::Standard,
            }],
        },
    )
    .unwrap();

    let move_to = |room_number: i32| {
        test::TestRequest::put()
            .uri(&format!("/api/showtimes/{}", fx.showtime_id))
            .insert_header(bearer(&fx.admin_token))
            .set_json(json!({
                "movieId": fx.movie_id,
                "cinemaId": fx.cinema_id,
                "roomNumber": room_number,
                "startTime": "2030-06-01T20:00:00",
                "format": "2D",
                "subtitle": true,
                "dubbing": false
            }))
            .to_request()
    };

    // Nothing booked yet, so the room may change.
    let resp = test::call_service(&app, move_to(2)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = test::call_service(&app, move_to(1)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/api/orders")
        .insert_header(bearer(&fx.customer_token))
        .set_json(json!({
            "showtimeId": fx.showtime_id,
            "seatNumbers": ["A2"],
            "paymentMethod": "Cash"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: serde_json::Value = test::call_and_read_body_json(&app, move_to(2)).await;
    assert_eq!(body["status"], 409);
    assert_eq!(body["internalCode"], "SHB-00409");

    let room: i32 = showtimes::table
        .find(&fx.showtime_id)
        .select(showtimes::room_number)
        .first(&mut *state.pool.get().unwrap())
        .unwrap();
    assert_eq!(room, 1);
}

#[actix_web::test]
#[ignore = "needs CINEMA_TEST_DATABASE_URL"]
async fn deleting_a_movie_removes_its_showtimes_genres_and_bookings() {
    let pool = pool();
    let state = state(pool);
    let fx = fixture(&state);
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/orders")
        .insert_header(bearer(&fx.customer_token))
        .set_json(json!({
            "showtimeId": fx.showtime_id,
            "seatNumbers": ["A1"],
            "paymentMethod": "Cash"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/movies/{}", fx.movie_id))
        .insert_header(bearer(&fx.admin_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let mut conn = state.pool.get().unwrap();
    let left: (i64, i64, i64) = (
        showtimes::table
            .filter(showtimes::movie_id.eq(&fx.movie_id))
            .count()
            .get_result(&mut *conn)
            .unwrap(),
        movie_genres::table
            .filter(movie_genres::movie_id.eq(&fx.movie_id))
            .count()
            .get_result(&mut *conn)
            .unwrap(),
        showtime_seats::table
            .filter(showtime_seats::showtime_id.eq(&fx.showtime_id))
            .count()
            .get_result(&mut *conn)
            .unwrap(),
    );
    assert_eq!(left, (0, 0, 0));
}

#[actix_web::test]
#[ignore = "needs CINEMA_TEST_DATABASE_URL"]
async fn deleting_a_customer_removes_their_orders() {
    let pool = pool();
    let state = state(pool);
    let fx = fixture(&state);
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/orders")
        .insert_header(bearer(&fx.customer_token))
        .set_json(json!({
            "showtimeId": fx.showtime_id,
            "seatNumbers": ["A1"],
            "foodItems": [{"itemId": fx.food_id, "quantity": 1}],
            "paymentMethod": "Cash"
        }))
        .to_request();
    let created: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let order_id = Uuid::parse_str(created["orderId"].as_str().unwrap()).unwrap();

    // Customers cannot delete accounts, admins can.
    let delete = |token: &str| {
        test::TestRequest::delete()
            .uri(&format!("/api/customers/{}", fx.customer_id))
            .insert_header(bearer(token))
            .to_request()
    };
    let resp = test::call_service(&app, delete(&fx.customer_token)).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let resp = test::call_service(&app, delete(&fx.admin_token)).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let mut conn = state.pool.get().unwrap();
    let left: (i64, i64, i64) = (
        orders::table
            .filter(orders::customer_id.eq(&fx.customer_id))
            .count()
            .get_result(&mut *conn)
            .unwrap(),
        food_orders::table
            .filter(food_orders::order_id.eq(order_id))
            .count()
            .get_result(&mut *conn)
            .unwrap(),
        showtime_seats::table
            .filter(showtime_seats::order_id.eq(order_id))
            .count()
            .get_result(&mut *conn)
            .unwrap(),
    );
    assert_eq!(left, (0, 0, 0));

    let req = test::TestRequest::get()
        .uri(&format!("/api/customers/{}", fx.customer_id))
        .insert_header(bearer(&fx.admin_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
#[ignore = "needs CINEMA_TEST_DATABASE_URL"]
async fn overlapping_orders_in_opposite_seat_order_conflict_cleanly() {
    let pool = pool();
    let state = state(pool.clone());

    for _ in 0..5 {
        let fx = fixture(&state);
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = [["A1", "A2", "A3"], ["A3", "A2", "A1"]]
            .into_iter()
            .map(|seat_numbers| {
                let pool = pool.clone();
                let barrier = Arc::clone(&barrier);
                let order = PlaceOrder {
                    customer_id: fx.customer_id.clone(),
                    showtime_id: Some(fx.showtime_id.clone()),
                    seat_numbers: seat_numbers.iter().map(|s| s.to_string()).collect(),
                    food_lines: vec![(fx.food_id.clone(), 1)],
                    voucher_code: None,
                    payment_method: PaymentMethod::Cash,
                };
                thread::spawn(move || {
                    let mut conn = pool.get().unwrap();
                    barrier.wait();
                    db::orders::place(&mut conn, &SeatPricing::default(), order)
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let placed = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(placed, 1, "{:?}", results);
        assert!(
            results
                .iter()
                .any(|r| matches!(r, Err(ApiError::SeatAlreadyBooked(_)))),
            "{:?}",
            results
        );

        let mut conn = pool.get().unwrap();
        let booked: i64 = showtime_seats::table
            .filter(showtime_seats::showtime_id.eq(&fx.showtime_id))
            .count()
            .get_result(&mut *conn)
            .unwrap();
        assert_eq!(booked, 3);
        assert_eq!(stock_of(&mut conn, &fx.food_id), 49);
    }
}
