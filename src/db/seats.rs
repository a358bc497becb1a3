use diesel::{
    BoolExpressionMethods, ExpressionMethods, JoinOnDsl, NullableExpressionMethods, PgConnection,
    QueryDsl, RunQueryDsl, SelectableHelper,
};
use uuid::Uuid;

use crate::db::showtimes;
use crate::error::Result;
use crate::model::{parse_column, SeatRow, SeatType, ShowtimeFormat};
use crate::pricing::SeatPricing;
use crate::schema::{seats, showtime_seats};
use crate::seats::{SeatResponse, SeatStatus, ShowtimeSeatResponse};

pub fn list(conn: &mut PgConnection) -> Result<Vec<SeatResponse>> {
    seats::table
        .order((
            seats::cinema_id.asc(),
            seats::room_number.asc(),
            seats::seat_number.asc(),
        ))
        .select(SeatRow::as_select())
        .load(conn)?
        .into_iter()
        .map(SeatResponse::try_from)
        .collect()
}

/// Seat map of a showtime: every seat of its room, left-joined with the
/// bookings of that showtime. Recomputed from current rows on every call.
pub fn availability(
    conn: &mut PgConnection,
    showtime_id: &str,
    pricing: &SeatPricing,
) -> Result<Vec<ShowtimeSeatResponse>> {
    let showtime = showtimes::find_row(conn, showtime_id)?;
    let format: ShowtimeFormat = parse_column(&showtime.format)?;

    let rows = seats::table
        .left_join(
            showtime_seats::table.on(showtime_seats::seat_number
                .eq(seats::seat_number)
                .and(showtime_seats::showtime_id.eq(showtime_id))),
        )
        .filter(seats::cinema_id.eq(showtime.cinema_id.as_str()))
        .filter(seats::room_number.eq(showtime.room_number))
        .order(seats::seat_number.asc())
        .select((
            seats::seat_number,
            seats::seat_type,
            showtime_seats::order_id.nullable(),
        ))
        .load::<(String, String, Option<Uuid>)>(conn)?;

    rows.into_iter()
        .map(|(seat_number, seat_type, order_id)| -> Result<ShowtimeSeatResponse> {
            let seat_type: SeatType = parse_column(&seat_type)?;
            Ok(ShowtimeSeatResponse {
                seat_number,
                seat_type,
                status: if order_id.is_some() {
                    SeatStatus::Occupied
                } else {
                    SeatStatus::Available
                },
                price: pricing.seat_price(seat_type, format),
            })
        })
        .collect()
}
