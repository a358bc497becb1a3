use diesel::{
    Connection, ExpressionMethods, OptionalExtension, PgConnection, QueryDsl, RunQueryDsl,
    SelectableHelper,
};

use crate::db::ids::{next_id, IdKind};
use crate::db::{cinemas, movies as movie_store};
use crate::error::{ApiError, Result};
use crate::model::ShowtimeRow;
use crate::schema::{cinemas as cinema_table, movies, showtime_seats, showtimes};
use crate::showtimes::{ShowtimeFilter, ShowtimeInput, ShowtimeResponse};

pub fn list(conn: &mut PgConnection, filter: &ShowtimeFilter) -> Result<Vec<ShowtimeResponse>> {
    let mut query = showtimes::table
        .inner_join(movies::table)
        .inner_join(cinema_table::table)
        .select((ShowtimeRow::as_select(), movies::title, cinema_table::name))
        .order((showtimes::start_time.asc(), showtimes::id.asc()))
        .into_boxed();

    if let Some(movie_id) = &filter.movie_id {
        query = query.filter(showtimes::movie_id.eq(movie_id.clone()));
    }
    if let Some(cinema_id) = &filter.cinema_id {
        query = query.filter(showtimes::cinema_id.eq(cinema_id.clone()));
    }

    query
        .load::<(ShowtimeRow, String, String)>(conn)?
        .into_iter()
        .map(|(row, title, cinema_name)| ShowtimeResponse::new(row, title, cinema_name))
        .collect()
}

pub fn find_row(conn: &mut PgConnection, id: &str) -> Result<ShowtimeRow> {
    showtimes::table
        .find(id)
        .select(ShowtimeRow::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ApiError::not_found(format!("Showtime {}", id)))
}

pub fn find(conn: &mut PgConnection, id: &str) -> Result<ShowtimeResponse> {
    let (row, title, cinema_name) = showtimes::table
        .inner_join(movies::table)
        .inner_join(cinema_table::table)
        .filter(showtimes::id.eq(id))
        .select((ShowtimeRow::as_select(), movies::title, cinema_table::name))
        .first::<(ShowtimeRow, String, String)>(conn)
        .optional()?
        .ok_or_else(|| ApiError::not_found(format!("Showtime {}", id)))?;

    ShowtimeResponse::new(row, title, cinema_name)
}

/// Looks up the movie and the room the showtime refers to; the movie's
/// running time becomes the showtime duration.
fn checked_row(conn: &mut PgConnection, id: String, input: ShowtimeInput) -> Result<ShowtimeRow> {
    let movie = movie_store::find_row(conn, &input.movie_id)?;
    cinemas::find_room(conn, &input.cinema_id, input.room_number)?;
    Ok(input.into_row(id, movie.duration))
}

pub fn create(conn: &mut PgConnection, input: ShowtimeInput) -> Result<ShowtimeResponse> {
    let id = conn.transaction::<_, ApiError, _>(|conn| {
        let id = next_id(conn, IdKind::Showtime)?;
        let row = checked_row(conn, id.clone(), input)?;
        diesel::insert_into(showtimes::table)
            .values(&row)
            .execute(conn)?;
        Ok(id)
    })?;

    find(conn, &id)
}

/// Overwrites the showtime. Moving it to another room is refused once seats
/// are booked, since bookings are keyed by the seat numbers of the old room.
pub fn update(conn: &mut PgConnection, id: &str, input: ShowtimeInput) -> Result<ShowtimeResponse> {
    conn.transaction::<_, ApiError, _>(|conn| {
        let existing = find_row(conn, id)?;
        let moves_room =
            existing.cinema_id != input.cinema_id || existing.room_number != input.room_number;
        if moves_room {
            let booked = showtime_seats::table
                .filter(showtime_seats::showtime_id.eq(id))
                .select(showtime_seats::seat_number)
                .first::<String>(conn)
                .optional()?;
            if booked.is_some() {
                return Err(ApiError::ShowtimeHasBookings(id.to_string()));
            }
        }
        let row = checked_row(conn, id.to_string(), input)?;
        diesel::update(showtimes::table.find(id))
            .set(&row)
            .execute(conn)?;
        Ok(())
    })?;

    find(conn, id)
}

pub fn delete(conn: &mut PgConnection, id: &str) -> Result<()> {
    conn.transaction::<_, ApiError, _>(|conn| {
        diesel::delete(showtime_seats::table.filter(showtime_seats::showtime_id.eq(id)))
            .execute(conn)?;
        let deleted = diesel::delete(showtimes::table.find(id)).execute(conn)?;
        if deleted == 0 {
            return Err(ApiError::not_found(format!("Showtime {}", id)));
        }
        Ok(())
    })
}
