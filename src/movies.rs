use actix_web::{delete, get, post, put, web, HttpResponse};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::auth::AdminCustomer;
use crate::error::{ApiError, Result};
use crate::model::MovieRow;
use crate::showtimes::ShowtimeFilter;
use crate::state::AppState;
use crate::db;

/// Genres arrive either as a JSON array or as one comma-separated string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum GenreList {
    List(Vec<String>),
    Csv(String),
}

impl GenreList {
    /// Trimmed, non-empty genres without case-insensitive duplicates, in
    /// first-seen order.
    pub fn normalized(&self) -> Vec<String> {
        let raw: Vec<&str> = match self {
            GenreList::List(items) => items.iter().map(String::as_str).collect(),
            GenreList::Csv(text) => text.split(',').collect(),
        };

        let mut genres: Vec<String> = Vec::new();
        for genre in raw.into_iter().map(str::trim).filter(|g| !g.is_empty()) {
            if !genres.iter().any(|g| g.eq_ignore_ascii_case(genre)) {
                genres.push(genre.to_string());
            }
        }
        genres
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MovieInput {
    pub title: String,
    pub release_date: Option<NaiveDate>,
    pub duration: i32,
    pub language: String,
    pub description: String,
    pub poster_url: String,
    pub age_rating: String,
    pub studio: String,
    pub country: String,
    pub director: String,
    pub rating: Option<f64>,
    pub is_showing: bool,
    pub genres: GenreList,
}

impl MovieInput {
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(ApiError::validation("title must not be empty"));
        }
        if self.duration <= 0 {
            return Err(ApiError::validation("duration must be a positive number of minutes"));
        }
        if let Some(rating) = self.rating {
            if !(0.0..=10.0).contains(&rating) {
                return Err(ApiError::validation("rating must be between 0 and 10"));
            }
        }
        if self.normalized_genres().iter().any(|g| g.len() > 50) {
            return Err(ApiError::validation("genre names are limited to 50 characters"));
        }
        Ok(())
    }

    pub fn normalized_genres(&self) -> Vec<String> {
        self.genres.normalized()
    }

    pub fn into_row(self, id: String) -> MovieRow {
        MovieRow {
            id,
            title: self.title.trim().to_string(),
            release_date: self.release_date,
            duration: self.duration,
            language: self.language,
            description: self.description,
            poster_url: self.poster_url,
            age_rating: self.age_rating,
            studio: self.studio,
            country: self.country,
            director: self.director,
            rating: self.rating,
            is_showing: self.is_showing,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieResponse {
    pub id: String,
    pub title: String,
    pub release_date: Option<NaiveDate>,
    pub duration: i32,
    pub duration_label: String,
    pub language: String,
    pub description: String,
    pub poster_url: String,
    pub age_rating: String,
    pub studio: String,
    pub country: String,
    pub director: String,
    pub rating: Option<f64>,
    pub is_showing: bool,
    pub genres: Vec<String>,
}

impl MovieResponse {
    pub fn new(row: MovieRow, genres: Vec<String>) -> Self {
        Self {
            duration_label: format_duration(row.duration),
            id: row.id,
            title: row.title,
            release_date: row.release_date,
            duration: row.duration,
            language: row.language,
            description: row.description,
            poster_url: row.poster_url,
            age_rating: row.age_rating,
            studio: row.studio,
            country: row.country,
            director: row.director,
            rating: row.rating,
            is_showing: row.is_showing,
            genres,
        }
    }
}

/// `135` -> `"2h 15m"`, `45` -> `"45m"`, `120` -> `"2h"`.
pub fn format_duration(minutes: i32) -> String {
    let minutes = minutes.max(0);
    match (minutes / 60, minutes % 60) {
        (0, m) => format!("{}m", m),
        (h, 0) => format!("{}h", h),
        (h, m) => format!("{}h {}m", h, m),
    }
}

#[get("/movies")]
pub async fn list_movies(state: web::Data<AppState>) -> Result<HttpResponse> {
    let movies = state.run(db::movies::list).await?;
    Ok(HttpResponse::Ok().json(movies))
}

#[get("/movies/now-showing")]
pub async fn now_showing(state: web::Data<AppState>) -> Result<HttpResponse> {
    let movies = state.run(db::movies::list_showing).await?;
    Ok(HttpResponse::Ok().json(movies))
}

#[get("/movies/{id}")]
pub async fn get_movie(state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse> {
    let id = path.into_inner();
    let movie = state.run(move |conn| db::movies::find(conn, &id)).await?;
    Ok(HttpResponse::Ok().json(movie))
}

#[get("/movies/{id}/showtimes")]
pub async fn movie_showtimes(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    let showtimes = state
        .run(move |conn| {
            db::movies::ensure_exists(conn, &id)?;
            db::showtimes::list(
                conn,
                &ShowtimeFilter {
                    movie_id: Some(id),
                    cinema_id: None,
                },
            )
        })
        .await?;
    Ok(HttpResponse::Ok().json(showtimes))
}

#[post("/movies")]
pub async fn create_movie(
    state: web::Data<AppState>,
    _admin: AdminCustomer,
    input: web::Json<MovieInput>,
) -> Result<HttpResponse> {
    let input = input.into_inner();
    input.validate()?;

    let movie = state.run(move |conn| db::movies::create(conn, input)).await?;
    log::info!("created movie {} ({})", movie.id, movie.title);
    Ok(HttpResponse::Created().json(movie))
}

#[put("/movies/{id}")]
pub async fn update_movie(
    state: web::Data<AppState>,
    _admin: AdminCustomer,
    path: web::Path<String>,
    input: web::Json<MovieInput>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    let input = input.into_inner();
    input.validate()?;

    let movie = state.run(move |conn| db::movies::update(conn, &id, input)).await?;
    Ok(HttpResponse::Ok().json(movie))
}

#[delete("/movies/{id}")]
pub async fn delete_movie(
    state: web::Data<AppState>,
    _admin: AdminCustomer,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    let deleted = id.clone();
    state.run(move |conn| db::movies::delete(conn, &id)).await?;
    log::info!("deleted movie {}", deleted);
    Ok(HttpResponse::NoContent().finish())
}
