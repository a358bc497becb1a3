use actix_web::{get, post, web, HttpResponse};
use serde::Serialize;

use crate::db;
use crate::error::{ApiError, Result};
use crate::model::{parse_column, SeatRow, SeatType};
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatResponse {
    pub cinema_id: String,
    pub room_number: i32,
    pub seat_number: String,
    pub seat_type: SeatType,
}

impl TryFrom<SeatRow> for SeatResponse {
    type Error = ApiError;

    fn try_from(row: SeatRow) -> Result<Self> {
        Ok(Self {
            seat_type: parse_column(&row.seat_type)?,
            cinema_id: row.cinema_id,
            room_number: row.room_number,
            seat_number: row.seat_number,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatStatus {
    Available,
    Occupied,
}

/// One seat of a showtime's room, as shown on the seat map.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowtimeSeatResponse {
    pub seat_number: String,
    pub seat_type: SeatType,
    pub status: SeatStatus,
    pub price: f64,
}

#[get("/seats")]
pub async fn list_seats(state: web::Data<AppState>) -> Result<HttpResponse> {
    let seats = state.run(db::seats::list).await?;
    Ok(HttpResponse::Ok().json(seats))
}

#[get("/seats/showtimes/{id}")]
pub async fn showtime_seats(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    let pricing = state.pricing;
    let seats = state
        .run(move |conn| db::seats::availability(conn, &id, &pricing))
        .await?;
    Ok(HttpResponse::Ok().json(seats))
}

/// Seats are addressed by cinema, room and seat number; a single-id lookup
/// has no defined meaning.
#[get("/seats/{id}")]
pub async fn get_seat(_path: web::Path<String>) -> Result<HttpResponse> {
    Err(ApiError::NotImplemented)
}

/// Seats are created with their room through `POST /api/cinemas/{id}/rooms`.
#[post("/seats")]
pub async fn create_seat() -> Result<HttpResponse> {
    Err(ApiError::NotImplemented)
}
