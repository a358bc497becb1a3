use std::collections::HashMap;

use diesel::{
    BoolExpressionMethods, Connection, ExpressionMethods, OptionalExtension, PgConnection,
    QueryDsl, RunQueryDsl, SelectableHelper,
};

use crate::cinemas::{CinemaInput, CinemaResponse, RoomInput, RoomResponse};
use crate::db::ids::{next_id, IdKind};
use crate::error::{ApiError, Result};
use crate::model::{CinemaPhoneRow, CinemaRow, RoomRow, SeatRow};
use crate::schema::{cinema_phones, cinemas, rooms, seats, showtime_seats, showtimes};
use crate::seats::SeatResponse;

fn phones_by_cinema(
    conn: &mut PgConnection,
    cinema_ids: Vec<String>,
) -> Result<HashMap<String, Vec<String>>> {
    let rows = cinema_phones::table
        .filter(cinema_phones::cinema_id.eq_any(cinema_ids))
        .order((cinema_phones::cinema_id.asc(), cinema_phones::phone.asc()))
        .select(CinemaPhoneRow::as_select())
        .load(conn)?;

    let mut grouped: HashMap<String, Vec<String>> = HashMap::new();
    for row in rows {
        grouped.entry(row.cinema_id).or_default().push(row.phone);
    }
    Ok(grouped)
}

pub fn list(conn: &mut PgConnection) -> Result<Vec<CinemaResponse>> {
    let rows = cinemas::table
        .order(cinemas::id.asc())
        .select(CinemaRow::as_select())
        .load(conn)?;
    let mut phones = phones_by_cinema(conn, rows.iter().map(|c| c.id.clone()).collect())?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let numbers = phones.remove(&row.id).unwrap_or_default();
            CinemaResponse::new(row, numbers)
        })
        .collect())
}

pub fn find_row(conn: &mut PgConnection, id: &str) -> Result<CinemaRow> {
    cinemas::table
        .find(id)
        .select(CinemaRow::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ApiError::not_found(format!("Cinema {}", id)))
}

/// The cinema with its phone numbers and rooms.
pub fn find(conn: &mut PgConnection, id: &str) -> Result<CinemaResponse> {
    let row = find_row(conn, id)?;
    let numbers = phones_by_cinema(conn, vec![row.id.clone()])?
        .remove(&row.id)
        .unwrap_or_default();
    let rooms = room_summaries(conn, id)?;

    let mut cinema = CinemaResponse::new(row, numbers);
    cinema.rooms = Some(rooms);
    Ok(cinema)
}

fn insert_phones(conn: &mut PgConnection, cinema_id: &str, phones: Vec<String>) -> Result<()> {
    if phones.is_empty() {
        return Ok(());
    }
    let rows: Vec<CinemaPhoneRow> = phones
        .into_iter()
        .map(|phone| CinemaPhoneRow {
            cinema_id: cinema_id.to_string(),
            phone,
        })
        .collect();
    diesel::insert_into(cinema_phones::table)
        .values(&rows)
        .execute(conn)?;
    Ok(())
}

pub fn create(conn: &mut PgConnection, input: CinemaInput) -> Result<CinemaResponse> {
    let phones = input.phones();

    let id = conn.transaction::<_, ApiError, _>(|conn| {
        let id = next_id(conn, IdKind::Cinema)?;
        let row = input.into_row(id.clone());
        diesel::insert_into(cinemas::table).values(&row).execute(conn)?;
        insert_phones(conn, &id, phones)?;
        Ok(id)
    })?;

    find(conn, &id)
}

/// Overwrites the cinema and replaces its phone numbers. Rooms are untouched.
pub fn update(conn: &mut PgConnection, id: &str, input: CinemaInput) -> Result<CinemaResponse> {
    let phones = input.phones();
    let row = input.into_row(id.to_string());

    conn.transaction::<_, ApiError, _>(|conn| {
        let updated = diesel::update(cinemas::table.find(id))
            .set(&row)
            .execute(conn)?;
        if updated == 0 {
            return Err(ApiError::not_found(format!("Cinema {}", id)));
        }
        diesel::delete(cinema_phones::table.filter(cinema_phones::cinema_id.eq(id)))
            .execute(conn)?;
        insert_phones(conn, id, phones)
    })?;

    find(conn, id)
}

/// Deletes bookings, showtimes, seats, rooms and phone numbers of the cinema,
/// then the cinema itself.
pub fn delete(conn: &mut PgConnection, id: &str) -> Result<()> {
    conn.transaction::<_, ApiError, _>(|conn| {
        let cinema_showtimes = showtimes::table
            .filter(showtimes::cinema_id.eq(id))
            .select(showtimes::id);
        diesel::delete(
            showtime_seats::table.filter(showtime_seats::showtime_id.eq_any(cinema_showtimes)),
        )
        .execute(conn)?;
        diesel::delete(showtimes::table.filter(showtimes::cinema_id.eq(id))).execute(conn)?;
        diesel::delete(seats::table.filter(seats::cinema_id.eq(id))).execute(conn)?;
        diesel::delete(rooms::table.filter(rooms::cinema_id.eq(id))).execute(conn)?;
        diesel::delete(cinema_phones::table.filter(cinema_phones::cinema_id.eq(id)))
            .execute(conn)?;

        let deleted = diesel::delete(cinemas::table.find(id)).execute(conn)?;
        if deleted == 0 {
            return Err(ApiError::not_found(format!("Cinema {}", id)));
        }
        Ok(())
    })
}

pub fn find_room(conn: &mut PgConnection, cinema_id: &str, room_number: i32) -> Result<RoomRow> {
    rooms::table
        .find((cinema_id, room_number))
        .select(RoomRow::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| {
            ApiError::not_found(format!("Room {} of cinema {}", room_number, cinema_id))
        })
}

fn room_summaries(conn: &mut PgConnection, cinema_id: &str) -> Result<Vec<RoomResponse>> {
    let rows = rooms::table
        .filter(rooms::cinema_id.eq(cinema_id))
        .order(rooms::room_number.asc())
        .select(RoomRow::as_select())
        .load(conn)?;
    let seat_rooms = seats::table
        .filter(seats::cinema_id.eq(cinema_id))
        .select(seats::room_number)
        .load::<i32>(conn)?;

    let mut counts: HashMap<i32, usize> = HashMap::new();
    for room_number in seat_rooms {
        *counts.entry(room_number).or_default() += 1;
    }

    Ok(rows
        .into_iter()
        .map(|room| RoomResponse {
            seat_count: counts.get(&room.room_number).copied().unwrap_or(0),
            cinema_id: room.cinema_id,
            room_number: room.room_number,
            room_type: room.room_type,
        })
        .collect())
}

pub fn list_rooms(conn: &mut PgConnection, cinema_id: &str) -> Result<Vec<RoomResponse>> {
    find_row(conn, cinema_id)?;
    room_summaries(conn, cinema_id)
}

/// Creates a room together with its seat layout.
pub fn create_room(conn: &mut PgConnection, cinema_id: &str, input: RoomInput) -> Result<RoomResponse> {
    conn.transaction::<_, ApiError, _>(|conn| {
        find_row(conn, cinema_id)?;
        if find_room(conn, cinema_id, input.room_number).is_ok() {
            return Err(ApiError::validation(format!(
                "room {} already exists in cinema {}",
                input.room_number, cinema_id
            )));
        }

        let room = RoomRow {
            cinema_id: cinema_id.to_string(),
            room_number: input.room_number,
            room_type: input.room_type.trim().to_string(),
        };
        diesel::insert_into(rooms::table).values(&room).execute(conn)?;

        let layout: Vec<SeatRow> = input
            .seats
            .iter()
            .map(|seat| SeatRow {
                cinema_id: cinema_id.to_string(),
                room_number: input.room_number,
                seat_number: seat.seat_number.trim().to_ascii_uppercase(),
                seat_type: seat.seat_type.as_str().to_string(),
            })
            .collect();
        diesel::insert_into(seats::table).values(&layout).execute(conn)?;

        Ok(RoomResponse {
            cinema_id: room.cinema_id,
            room_number: room.room_number,
            room_type: room.room_type,
            seat_count: layout.len(),
        })
    })
}

pub fn room_seats(conn: &mut PgConnection, cinema_id: &str, room_number: i32) -> Result<Vec<SeatResponse>> {
    find_room(conn, cinema_id, room_number)?;
    seats::table
        .filter(
            seats::cinema_id
                .eq(cinema_id)
                .and(seats::room_number.eq(room_number)),
        )
        .order(seats::seat_number.asc())
        .select(SeatRow::as_select())
        .load(conn)?
        .into_iter()
        .map(SeatResponse::try_from)
        .collect()
}

/// Deletes the room's showtimes (with their bookings) and seats, then the room.
pub fn delete_room(conn: &mut PgConnection, cinema_id: &str, room_number: i32) -> Result<()> {
    conn.transaction::<_, ApiError, _>(|conn| {
        find_room(conn, cinema_id, room_number)?;

        let room_showtimes = showtimes::table
            .filter(
                showtimes::cinema_id
                    .eq(cinema_id)
                    .and(showtimes::room_number.eq(room_number)),
            )
            .select(showtimes::id);
        diesel::delete(
            showtime_seats::table.filter(showtime_seats::showtime_id.eq_any(room_showtimes)),
        )
        .execute(conn)?;
        diesel::delete(
            showtimes::table.filter(
                showtimes::cinema_id
                    .eq(cinema_id)
                    .and(showtimes::room_number.eq(room_number)),
            ),
        )
        .execute(conn)?;
        diesel::delete(
            seats::table.filter(
                seats::cinema_id
                    .eq(cinema_id)
                    .and(seats::room_number.eq(room_number)),
            ),
        )
        .execute(conn)?;
        diesel::delete(rooms::table.find((cinema_id, room_number))).execute(conn)?;
        Ok(())
    })
}
