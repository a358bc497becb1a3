use std::collections::HashSet;

use actix_web::{delete, get, post, put, web, HttpResponse};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::auth::AdminCustomer;
use crate::db;
use crate::error::{ApiError, Result};
use crate::model::{CinemaRow, SeatType};
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CinemaInput {
    pub name: String,
    pub opening_hour: NaiveTime,
    pub closing_hour: NaiveTime,
    pub location: String,
    #[serde(default)]
    pub phone_numbers: Vec<String>,
}

impl CinemaInput {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ApiError::validation("name must not be empty"));
        }
        if self.location.trim().is_empty() {
            return Err(ApiError::validation("location must not be empty"));
        }
        if self.phones().iter().any(|p| p.len() > 20) {
            return Err(ApiError::validation("phone numbers are limited to 20 characters"));
        }
        Ok(())
    }

    /// Trimmed phone numbers without duplicates, in input order.
    pub fn phones(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.phone_numbers
            .iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty() && seen.insert(p.clone()))
            .collect()
    }

    pub fn into_row(self, id: String) -> CinemaRow {
        CinemaRow {
            id,
            name: self.name.trim().to_string(),
            opening_hour: self.opening_hour,
            closing_hour: self.closing_hour,
            location: self.location,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SeatLayoutInput {
    pub seat_number: String,
    pub seat_type: SeatType,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RoomInput {
    pub room_number: i32,
    pub room_type: String,
    pub seats: Vec<SeatLayoutInput>,
}

impl RoomInput {
    pub fn validate(&self) -> Result<()> {
        if self.room_number <= 0 {
            return Err(ApiError::validation("roomNumber must be positive"));
        }
        if self.room_type.trim().is_empty() {
            return Err(ApiError::validation("roomType must not be empty"));
        }
        if self.seats.is_empty() {
            return Err(ApiError::validation("a room needs at least one seat"));
        }

        let mut seen = HashSet::new();
        for seat in &self.seats {
            let number = seat.seat_number.trim();
            if number.is_empty() || number.len() > 8 {
                return Err(ApiError::validation(
                    "seat numbers must be between 1 and 8 characters",
                ));
            }
            if !seen.insert(number.to_ascii_uppercase()) {
                return Err(ApiError::validation(format!(
                    "seat {} is listed more than once",
                    number
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomResponse {
    pub cinema_id: String,
    pub room_number: i32,
    pub room_type: String,
    pub seat_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CinemaResponse {
    pub id: String,
    pub name: String,
    pub opening_hour: NaiveTime,
    pub closing_hour: NaiveTime,
    pub location: String,
    pub phone_numbers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rooms: Option<Vec<RoomResponse>>,
}

impl CinemaResponse {
    pub fn new(row: CinemaRow, phone_numbers: Vec<String>) -> Self {
        Self {
            id: row.id,
            name: row.name,
            opening_hour: row.opening_hour,
            closing_hour: row.closing_hour,
            location: row.location,
            phone_numbers,
            rooms: None,
        }
    }
}

#[get("/cinemas")]
pub async fn list_cinemas(state: web::Data<AppState>) -> Result<HttpResponse> {
    let cinemas = state.run(db::cinemas::list).await?;
    Ok(HttpResponse::Ok().json(cinemas))
}

#[get("/cinemas/{id}")]
pub async fn get_cinema(state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse> {
    let id = path.into_inner();
    let cinema = state.run(move |conn| db::cinemas::find(conn, &id)).await?;
    Ok(HttpResponse::Ok().json(cinema))
}

#[post("/cinemas")]
pub async fn create_cinema(
    state: web::Data<AppState>,
    _admin: AdminCustomer,
    input: web::Json<CinemaInput>,
) -> Result<HttpResponse> {
    let input = input.into_inner();
    input.validate()?;

    let cinema = state.run(move |conn| db::cinemas::create(conn, input)).await?;
    log::info!("created cinema {} ({})", cinema.id, cinema.name);
    Ok(HttpResponse::Created().json(cinema))
}

#[put("/cinemas/{id}")]
pub async fn update_cinema(
    state: web::Data<AppState>,
    _admin: AdminCustomer,
    path: web::Path<String>,
    input: web::Json<CinemaInput>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    let input = input.into_inner();
    input.validate()?;

    let cinema = state.run(move |conn| db::cinemas::update(conn, &id, input)).await?;
    Ok(HttpResponse::Ok().json(cinema))
}

#[delete("/cinemas/{id}")]
pub async fn delete_cinema(
    state: web::Data<AppState>,
    _admin: AdminCustomer,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    let deleted = id.clone();
    state.run(move |conn| db::cinemas::delete(conn, &id)).await?;
    log::info!("deleted cinema {} with its rooms, seats and showtimes", deleted);
    Ok(HttpResponse::NoContent().finish())
}

#[get("/cinemas/{id}/rooms")]
pub async fn list_rooms(state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse> {
    let id = path.into_inner();
    let rooms = state.run(move |conn| db::cinemas::list_rooms(conn, &id)).await?;
    Ok(HttpResponse::Ok().json(rooms))
}

#[post("/cinemas/{id}/rooms")]
pub async fn create_room(
    state: web::Data<AppState>,
    _admin: AdminCustomer,
    path: web::Path<String>,
    input: web::Json<RoomInput>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    let input = input.into_inner();
    input.validate()?;

    let room = state
        .run(move |conn| db::cinemas::create_room(conn, &id, input))
        .await?;
    Ok(HttpResponse::Created().json(room))
}

#[get("/cinemas/{id}/rooms/{room}/seats")]
pub async fn room_seats(
    state: web::Data<AppState>,
    path: web::Path<(String, i32)>,
) -> Result<HttpResponse> {
    let (id, room) = path.into_inner();
    let seats = state
        .run(move |conn| db::cinemas::room_seats(conn, &id, room))
        .await?;
    Ok(HttpResponse::Ok().json(seats))
}

#[delete("/cinemas/{id}/rooms/{room}")]
pub async fn delete_room(
    state: web::Data<AppState>,
    _admin: AdminCustomer,
    path: web::Path<(String, i32)>,
) -> Result<HttpResponse> {
    let (id, room) = path.into_inner();
    state
        .run(move |conn| db::cinemas::delete_room(conn, &id, room))
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
