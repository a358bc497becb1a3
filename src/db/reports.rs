use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use diesel::dsl::count_star;
use diesel::{ExpressionMethods, PgConnection, QueryDsl, RunQueryDsl, SelectableHelper};
use rust_decimal::Decimal;

use crate::error::{ApiError, Result};
use crate::model::{CustomerRow, OrderStatus};
use crate::pricing::{to_decimal, to_f64};
use crate::reports::{
    DailyRevenue, MonthlyRevenue, MovieRevenue, Statistic, TopCustomer,
};
use crate::schema::{cinemas, customers, movies, orders, showtime_seats, showtimes};

fn cancelled() -> &'static str {
    OrderStatus::Cancelled.as_str()
}

fn start_of(date: Option<NaiveDate>) -> Result<NaiveDateTime> {
    date.and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| ApiError::validation("date is out of range"))
}

/// `(created_at, total_price)` of the non-cancelled orders placed in `[from, to)`.
fn revenue_rows(
    conn: &mut PgConnection,
    from: NaiveDateTime,
    to: NaiveDateTime,
) -> Result<Vec<(NaiveDateTime, f64)>> {
    Ok(orders::table
        .filter(orders::status.ne(cancelled()))
        .filter(orders::created_at.ge(from))
        .filter(orders::created_at.lt(to))
        .select((orders::created_at, orders::total_price))
        .load(conn)?)
}

pub fn statistic(conn: &mut PgConnection) -> Result<Statistic> {
    let movies_total = movies::table.select(count_star()).first::<i64>(conn)?;
    let movies_showing = movies::table
        .filter(movies::is_showing.eq(true))
        .select(count_star())
        .first::<i64>(conn)?;
    let cinemas_total = cinemas::table.select(count_star()).first::<i64>(conn)?;
    let customers_total = customers::table.select(count_star()).first::<i64>(conn)?;
    let orders_total = orders::table
        .filter(orders::status.ne(cancelled()))
        .select(count_star())
        .first::<i64>(conn)?;
    // Cancelled orders release their seats, so every booking is a sold ticket.
    let tickets_sold = showtime_seats::table
        .select(count_star())
        .first::<i64>(conn)?;
    let revenue: Decimal = orders::table
        .filter(orders::status.ne(cancelled()))
        .select(orders::total_price)
        .load::<f64>(conn)?
        .into_iter()
        .map(to_decimal)
        .sum();

    Ok(Statistic {
        movies: movies_total,
        movies_showing,
        cinemas: cinemas_total,
        customers: customers_total,
        orders: orders_total,
        tickets_sold,
        revenue: to_f64(revenue),
    })
}

/// Twelve entries, one per month, months without orders included.
pub fn monthly_revenue(conn: &mut PgConnection, year: i32) -> Result<Vec<MonthlyRevenue>> {
    let from = start_of(NaiveDate::from_ymd_opt(year, 1, 1))?;
    let to = start_of(NaiveDate::from_ymd_opt(year + 1, 1, 1))?;

    let mut totals = [(Decimal::ZERO, 0_i64); 12];
    for (created_at, total) in revenue_rows(conn, from, to)? {
        let entry = &mut totals[created_at.month0() as usize];
        entry.0 += to_decimal(total);
        entry.1 += 1;
    }
    Ok((1..=12)
        .zip(totals)
        .map(|(month, (revenue, orders))| MonthlyRevenue {
            month,
            revenue: to_f64(revenue),
            orders,
        })
        .collect())
}

/// One entry per calendar day of the month.
pub fn daily_revenue(conn: &mut PgConnection, year: i32, month: u32) -> Result<Vec<DailyRevenue>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| ApiError::validation(format!("{}-{} is not a valid month", year, month)))?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    let from = start_of(Some(first))?;
    let to = start_of(next)?;
    let days = (to.date() - first).num_days() as u32;

    let mut totals = vec![(Decimal::ZERO, 0_i64); days as usize];
    for (created_at, total) in revenue_rows(conn, from, to)? {
        let entry = &mut totals[created_at.day0() as usize];
        entry.0 += to_decimal(total);
        entry.1 += 1;
    }
    Ok(first
        .iter_days()
        .zip(totals)
        .map(|(date, (revenue, orders))| DailyRevenue {
            date,
            revenue: to_f64(revenue),
            orders,
        })
        .collect())
}

/// Ticket revenue per movie, highest first. Movies without sold seats are left out.
pub fn movie_revenue(conn: &mut PgConnection) -> Result<Vec<MovieRevenue>> {
    let bookings = showtime_seats::table
        .inner_join(showtimes::table.inner_join(movies::table))
        .inner_join(orders::table)
        .filter(orders::status.ne(cancelled()))
        .select((movies::id, movies::title, showtime_seats::price))
        .load::<(String, String, f64)>(conn)?;

    // movie id -> (title, tickets, revenue)
    let mut by_movie: BTreeMap<String, (String, i64, Decimal)> = BTreeMap::new();
    for (movie_id, title, price) in bookings {
        let entry = by_movie
            .entry(movie_id)
            .or_insert_with(|| (title, 0, Decimal::ZERO));
        entry.1 += 1;
        entry.2 += to_decimal(price);
    }

    let mut movies: Vec<MovieRevenue> = by_movie
        .into_iter()
        .map(|(movie_id, (title, tickets_sold, revenue))| MovieRevenue {
            movie_id,
            title,
            tickets_sold,
            revenue: to_f64(revenue),
        })
        .collect();
    movies.sort_by(|a, b| b.revenue.total_cmp(&a.revenue));
    Ok(movies)
}

pub fn top_customers(conn: &mut PgConnection, limit: i64) -> Result<Vec<TopCustomer>> {
    Ok(customers::table
        .order((customers::total_spent.desc(), customers::id.asc()))
        .limit(limit)
        .select(CustomerRow::as_select())
        .load(conn)?
        .into_iter()
        .map(TopCustomer::from)
        .collect())
}
