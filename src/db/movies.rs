use std::collections::HashMap;

use diesel::{
    Connection, ExpressionMethods, OptionalExtension, PgConnection, QueryDsl, RunQueryDsl,
    SelectableHelper,
};

use crate::db::ids::{next_id, IdKind};
use crate::error::{ApiError, Result};
use crate::model::{GenreRow, MovieRow};
use crate::movies::{MovieInput, MovieResponse};
use crate::schema::{movie_genres, movies, showtime_seats, showtimes};

fn genres_by_movie(
    conn: &mut PgConnection,
    movie_ids: Vec<String>,
) -> Result<HashMap<String, Vec<String>>> {
    let rows = movie_genres::table
        .filter(movie_genres::movie_id.eq_any(movie_ids))
        .order((movie_genres::movie_id.asc(), movie_genres::position.asc()))
        .select(GenreRow::as_select())
        .load(conn)?;

    let mut grouped: HashMap<String, Vec<String>> = HashMap::new();
    for row in rows {
        grouped.entry(row.movie_id).or_default().push(row.genre);
    }
    Ok(grouped)
}

fn with_genres(conn: &mut PgConnection, rows: Vec<MovieRow>) -> Result<Vec<MovieResponse>> {
    let ids = rows.iter().map(|m| m.id.clone()).collect();
    let mut genres = genres_by_movie(conn, ids)?;
    Ok(rows
        .into_iter()
        .map(|row| {
            let movie_genres = genres.remove(&row.id).unwrap_or_default();
            MovieResponse::new(row, movie_genres)
        })
        .collect())
}

pub fn list(conn: &mut PgConnection) -> Result<Vec<MovieResponse>> {
    let rows = movies::table
        .order(movies::id.asc())
        .select(MovieRow::as_select())
        .load(conn)?;
    with_genres(conn, rows)
}

pub fn list_showing(conn: &mut PgConnection) -> Result<Vec<MovieResponse>> {
    let rows = movies::table
        .filter(movies::is_showing.eq(true))
        .order(movies::id.asc())
        .select(MovieRow::as_select())
        .load(conn)?;
    with_genres(conn, rows)
}

pub fn find_row(conn: &mut PgConnection, id: &str) -> Result<MovieRow> {
    movies::table
        .find(id)
        .select(MovieRow::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ApiError::not_found(format!("Movie {}", id)))
}

pub fn ensure_exists(conn: &mut PgConnection, id: &str) -> Result<()> {
    find_row(conn, id).map(|_| ())
}

pub fn find(conn: &mut PgConnection, id: &str) -> Result<MovieResponse> {
    let row = find_row(conn, id)?;
    let mut movies = with_genres(conn, vec![row])?;
    movies
        .pop()
        .ok_or_else(|| ApiError::not_found(format!("Movie {}", id)))
}

fn insert_genres(conn: &mut PgConnection, movie_id: &str, genres: Vec<String>) -> Result<()> {
    if genres.is_empty() {
        return Ok(());
    }
    let rows: Vec<GenreRow> = genres
        .into_iter()
        .zip(0..)
        .map(|(genre, position)| GenreRow {
            movie_id: movie_id.to_string(),
            genre,
            position,
        })
        .collect();
    diesel::insert_into(movie_genres::table)
        .values(&rows)
        .execute(conn)?;
    Ok(())
}

pub fn create(conn: &mut PgConnection, input: MovieInput) -> Result<MovieResponse> {
    let genres = input.normalized_genres();

    let id = conn.transaction::<_, ApiError, _>(|conn| {
        let id = next_id(conn, IdKind::Movie)?;
        let row = input.into_row(id.clone());
        diesel::insert_into(movies::table).values(&row).execute(conn)?;
        insert_genres(conn, &id, genres)?;
        Ok(id)
    })?;

    find(conn, &id)
}

/// Overwrites every column and replaces the genre list.
pub fn update(conn: &mut PgConnection, id: &str, input: MovieInput) -> Result<MovieResponse> {
    let genres = input.normalized_genres();
    let row = input.into_row(id.to_string());

    conn.transaction::<_, ApiError, _>(|conn| {
        let updated = diesel::update(movies::table.find(id))
            .set(&row)
            .execute(conn)?;
        if updated == 0 {
            return Err(ApiError::not_found(format!("Movie {}", id)));
        }
        diesel::delete(movie_genres::table.filter(movie_genres::movie_id.eq(id))).execute(conn)?;
        insert_genres(conn, id, genres)
    })?;

    find(conn, id)
}

/// Removes the movie with its showtimes, their seat bookings and its genres.
/// Orders that referenced a removed showtime are kept.
pub fn delete(conn: &mut PgConnection, id: &str) -> Result<()> {
    conn.transaction::<_, ApiError, _>(|conn| {
        let movie_showtimes = showtimes::table
            .filter(showtimes::movie_id.eq(id))
            .select(showtimes::id);
        diesel::delete(
            showtime_seats::table.filter(showtime_seats::showtime_id.eq_any(movie_showtimes)),
        )
        .execute(conn)?;
        diesel::delete(showtimes::table.filter(showtimes::movie_id.eq(id))).execute(conn)?;
        diesel::delete(movie_genres::table.filter(movie_genres::movie_id.eq(id))).execute(conn)?;

        let deleted = diesel::delete(movies::table.find(id)).execute(conn)?;
        if deleted == 0 {
            return Err(ApiError::not_found(format!("Movie {}", id)));
        }
        Ok(())
    })
}
