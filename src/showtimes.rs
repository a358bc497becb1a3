use actix_web::{delete, get, post, put, web, HttpResponse};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::auth::AdminCustomer;
use crate::db;
use crate::error::{ApiError, Result};
use crate::model::{parse_column, ShowtimeFormat, ShowtimeRow};
use crate::movies::format_duration;
use crate::state::AppState;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ShowtimeFilter {
    pub movie_id: Option<String>,
    pub cinema_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ShowtimeInput {
    pub movie_id: String,
    pub cinema_id: String,
    pub room_number: i32,
    pub start_time: NaiveDateTime,
    pub format: ShowtimeFormat,
    pub subtitle: bool,
    pub dubbing: bool,
}

impl ShowtimeInput {
    pub fn validate(&self) -> Result<()> {
        if self.movie_id.trim().is_empty() || self.cinema_id.trim().is_empty() {
            return Err(ApiError::validation("movieId and cinemaId are required"));
        }
        if self.room_number <= 0 {
            return Err(ApiError::validation("roomNumber must be positive"));
        }
        Ok(())
    }

    /// The running time is copied from the movie; the end time follows from it.
    pub fn into_row(self, id: String, movie_duration: i32) -> ShowtimeRow {
        ShowtimeRow {
            id,
            end_time: self.start_time + chrono::Duration::minutes(i64::from(movie_duration)),
            movie_id: self.movie_id,
            cinema_id: self.cinema_id,
            room_number: self.room_number,
            start_time: self.start_time,
            duration: movie_duration,
            format: self.format.as_str().to_string(),
            subtitle: self.subtitle,
            dubbing: self.dubbing,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowtimeResponse {
    pub id: String,
    pub movie_id: String,
    pub movie_title: String,
    pub cinema_id: String,
    pub cinema_name: String,
    pub room_number: i32,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub duration: i32,
    pub duration_label: String,
    pub format: ShowtimeFormat,
    pub subtitle: bool,
    pub dubbing: bool,
}

impl ShowtimeResponse {
    pub fn new(row: ShowtimeRow, movie_title: String, cinema_name: String) -> Result<Self> {
        Ok(Self {
            format: parse_column(&row.format)?,
            duration_label: format_duration(row.duration),
            id: row.id,
            movie_id: row.movie_id,
            movie_title,
            cinema_id: row.cinema_id,
            cinema_name,
            room_number: row.room_number,
            start_time: row.start_time,
            end_time: row.end_time,
            duration: row.duration,
            subtitle: row.subtitle,
            dubbing: row.dubbing,
        })
    }
}

#[get("/showtimes")]
pub async fn list_showtimes(
    state: web::Data<AppState>,
    filter: web::Query<ShowtimeFilter>,
) -> Result<HttpResponse> {
    let filter = filter.into_inner();
    let showtimes = state.run(move |conn| db::showtimes::list(conn, &filter)).await?;
    Ok(HttpResponse::Ok().json(showtimes))
}

#[get("/showtimes/{id}")]
pub async fn get_showtime(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    let showtime = state.run(move |conn| db::showtimes::find(conn, &id)).await?;
    Ok(HttpResponse::Ok().json(showtime))
}

#[post("/showtimes")]
pub async fn create_showtime(
    state: web::Data<AppState>,
    _admin: AdminCustomer,
    input: web::Json<ShowtimeInput>,
) -> Result<HttpResponse> {
    let input = input.into_inner();
    input.validate()?;

    let showtime = state.run(move |conn| db::showtimes::create(conn, input)).await?;
    log::info!(
        "scheduled showtime {} of {} in {} room {}",
        showtime.id,
        showtime.movie_id,
        showtime.cinema_id,
        showtime.room_number
    );
    Ok(HttpResponse::Created().json(showtime))
}

#[put("/showtimes/{id}")]
pub async fn update_showtime(
    state: web::Data<AppState>,
    _admin: AdminCustomer,
    path: web::Path<String>,
    input: web::Json<ShowtimeInput>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    let input = input.into_inner();
    input.validate()?;

    let showtime = state
        .run(move |conn| db::showtimes::update(conn, &id, input))
        .await?;
    Ok(HttpResponse::Ok().json(showtime))
}

#[delete("/showtimes/{id}")]
pub async fn delete_showtime(
    state: web::Data<AppState>,
    _admin: AdminCustomer,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    state.run(move |conn| db::showtimes::delete(conn, &id)).await?;
    Ok(HttpResponse::NoContent().finish())
}
