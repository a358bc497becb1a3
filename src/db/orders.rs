use std::collections::HashMap;

use diesel::{
    Connection, ExpressionMethods, OptionalExtension, PgConnection, QueryDsl, RunQueryDsl,
    SelectableHelper,
};
use uuid::Uuid;

use crate::db::{food, is_lock_conflict, is_unique_violation, showtimes, vouchers};
use crate::error::{ApiError, Result};
use crate::model::{
    parse_column, DiscountType, FoodOrderRow, OrderRow, OrderStatus, SeatType, ShowtimeFormat,
    ShowtimeSeatRow,
};
use crate::orders::{
    OrderCreated, OrderFoodLine, OrderResponse, OrderSeat, OrderUpdate, PlaceOrder,
};
use crate::pricing::{order_total, SeatPricing};
use crate::schema::{customers, food_items, food_orders, orders, seats, showtime_seats};

/// Prices the requested seats of the showtime's room, in request order.
fn price_seats(
    conn: &mut PgConnection,
    pricing: &SeatPricing,
    showtime_id: &str,
    seat_numbers: &[String],
) -> Result<Vec<(String, f64)>> {
    let showtime = showtimes::find_row(conn, showtime_id)?;
    let format: ShowtimeFormat = parse_column(&showtime.format)?;

    let room_seats: HashMap<String, String> = seats::table
        .filter(seats::cinema_id.eq(showtime.cinema_id.as_str()))
        .filter(seats::room_number.eq(showtime.room_number))
        .filter(seats::seat_number.eq_any(seat_numbers.to_vec()))
        .select((seats::seat_number, seats::seat_type))
        .load::<(String, String)>(conn)?
        .into_iter()
        .collect();

    seat_numbers
        .iter()
        .map(|seat_number| -> Result<(String, f64)> {
            let seat_type = room_seats.get(seat_number).ok_or_else(|| {
                ApiError::validation(format!(
                    "seat {} does not exist in room {} of cinema {}",
                    seat_number, showtime.room_number, showtime.cinema_id
                ))
            })?;
            let seat_type: SeatType = parse_column(seat_type)?;
            Ok((seat_number.clone(), pricing.seat_price(seat_type, format)))
        })
        .collect()
}

/// Takes `quantity` units out of stock, failing when the item is switched off
/// or there is not enough left. Returns the unit price charged.
fn reserve_food(conn: &mut PgConnection, item_id: &str, quantity: i32) -> Result<f64> {
    let item = food::find_row(conn, item_id)?;
    if !item.is_available {
        return Err(ApiError::ItemUnavailable(item.id));
    }

    let updated = diesel::update(
        food_items::table
            .filter(food_items::id.eq(item_id))
            .filter(food_items::stock_quantity.ge(quantity)),
    )
    .set(food_items::stock_quantity.eq(food_items::stock_quantity - quantity))
    .execute(conn)?;
    if updated == 0 {
        return Err(ApiError::InsufficientStock(item.id));
    }
    Ok(item.price)
}

/// Writes an order with its seat bookings and food lines in one transaction.
///
/// The `(showtime, seat)` primary key of `showtime_seats` is what prevents
/// double booking: whichever transaction inserts a seat first wins, and the
/// loser's unique violation is reported as `SeatAlreadyBooked` after the
/// whole order has been rolled back. Seats and food items are written in
/// key order so two orders never wait on each other's locks in a cycle.
pub fn place(conn: &mut PgConnection, pricing: &SeatPricing, order: PlaceOrder) -> Result<OrderCreated> {
    conn.transaction::<_, ApiError, _>(|conn| {
        let seat_lines = match &order.showtime_id {
            Some(showtime_id) if !order.seat_numbers.is_empty() => {
                let mut lines = price_seats(conn, pricing, showtime_id, &order.seat_numbers)?;
                lines.sort_by(|a, b| a.0.cmp(&b.0));
                let taken = showtime_seats::table
                    .filter(showtime_seats::showtime_id.eq(showtime_id.as_str()))
                    .filter(showtime_seats::seat_number.eq_any(order.seat_numbers.clone()))
                    .select(showtime_seats::seat_number)
                    .order(showtime_seats::seat_number.asc())
                    .first::<String>(conn)
                    .optional()?;
                if let Some(seat) = taken {
                    return Err(ApiError::SeatAlreadyBooked(seat));
                }
                lines
            }
            _ => Vec::new(),
        };

        let mut requested_food = order.food_lines.clone();
        requested_food.sort();
        let mut food_lines = Vec::with_capacity(requested_food.len());
        for (item_id, quantity) in &requested_food {
            let unit_price = reserve_food(conn, item_id, *quantity)?;
            food_lines.push((item_id.clone(), *quantity, unit_price));
        }

        let voucher = match &order.voucher_code {
            Some(code) => {
                let voucher = vouchers::find_row(conn, code)?;
                let discount_type: DiscountType = parse_column(&voucher.discount_type)?;
                Some((voucher.code, discount_type, voucher.discount_amount))
            }
            None => None,
        };

        let seat_prices: Vec<f64> = seat_lines.iter().map(|(_, price)| *price).collect();
        let food_prices: Vec<(f64, i32)> = food_lines
            .iter()
            .map(|(_, quantity, unit_price)| (*unit_price, *quantity))
            .collect();
        let total = order_total(
            &seat_prices,
            &food_prices,
            voucher.as_ref().map(|(_, kind, amount)| (*kind, *amount)),
        );

        let order_row = OrderRow {
            id: Uuid::new_v4(),
            customer_id: order.customer_id.clone(),
            showtime_id: order.showtime_id.clone(),
            payment_method: order.payment_method.as_str().to_string(),
            voucher_code: voucher.as_ref().map(|(code, _, _)| code.clone()),
            status: OrderStatus::Processing.as_str().to_string(),
            total_price: total.total,
            has_tickets: !seat_lines.is_empty(),
            has_food: !food_lines.is_empty(),
            created_at: chrono::Utc::now().naive_utc(),
        };
        diesel::insert_into(orders::table)
            .values(&order_row)
            .execute(conn)?;

        if let Some(showtime_id) = &order_row.showtime_id {
            for (seat_number, price) in seat_lines {
                let booking = ShowtimeSeatRow {
                    showtime_id: showtime_id.clone(),
                    seat_number: seat_number.clone(),
                    order_id: order_row.id,
                    price,
                };
                match diesel::insert_into(showtime_seats::table)
                    .values(&booking)
                    .execute(conn)
                {
                    Err(e) if is_unique_violation(&e) || is_lock_conflict(&e) => {
                        return Err(ApiError::SeatAlreadyBooked(seat_number))
                    }
                    other => other?,
                };
            }
        }

        if !food_lines.is_empty() {
            let rows: Vec<FoodOrderRow> = food_lines
                .into_iter()
                .map(|(item_id, quantity, unit_price)| FoodOrderRow {
                    order_id: order_row.id,
                    item_id,
                    quantity,
                    unit_price,
                })
                .collect();
            diesel::insert_into(food_orders::table)
                .values(&rows)
                .execute(conn)?;
        }

        if let Some(code) = &order_row.voucher_code {
            vouchers::increment_usage(conn, code)?;
        }

        diesel::update(customers::table.find(order_row.customer_id.as_str()))
            .set((
                customers::total_spent.eq(customers::total_spent + order_row.total_price),
                customers::order_count.eq(customers::order_count + 1),
            ))
            .execute(conn)?;

        Ok(OrderCreated {
            order_id: order_row.id,
            total_price: order_row.total_price,
        })
    })
}

fn find_row(conn: &mut PgConnection, id: Uuid) -> Result<OrderRow> {
    orders::table
        .find(id)
        .select(OrderRow::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ApiError::not_found(format!("Order {}", id)))
}

/// Loads seat and food lines for `rows` and assembles the responses.
fn with_lines(conn: &mut PgConnection, rows: Vec<OrderRow>) -> Result<Vec<OrderResponse>> {
    let ids: Vec<Uuid> = rows.iter().map(|o| o.id).collect();

    let mut seats_by_order: HashMap<Uuid, Vec<OrderSeat>> = HashMap::new();
    let bookings = showtime_seats::table
        .filter(showtime_seats::order_id.eq_any(ids.clone()))
        .order(showtime_seats::seat_number.asc())
        .select(ShowtimeSeatRow::as_select())
        .load(conn)?;
    for booking in bookings {
        seats_by_order
            .entry(booking.order_id)
            .or_default()
            .push(OrderSeat {
                seat_number: booking.seat_number,
                price: booking.price,
            });
    }

    let mut food_by_order: HashMap<Uuid, Vec<OrderFoodLine>> = HashMap::new();
    let lines = food_orders::table
        .inner_join(food_items::table)
        .filter(food_orders::order_id.eq_any(ids))
        .order(food_orders::item_id.asc())
        .select((FoodOrderRow::as_select(), food_items::name))
        .load::<(FoodOrderRow, String)>(conn)?;
    for (line, name) in lines {
        food_by_order
            .entry(line.order_id)
            .or_default()
            .push(OrderFoodLine {
                item_id: line.item_id,
                name,
                quantity: line.quantity,
                unit_price: line.unit_price,
            });
    }

    rows.into_iter()
        .map(|row| -> Result<OrderResponse> {
            Ok(OrderResponse {
                payment_method: parse_column(&row.payment_method)?,
                status: parse_column(&row.status)?,
                seats: seats_by_order.remove(&row.id).unwrap_or_default(),
                food_items: food_by_order.remove(&row.id).unwrap_or_default(),
                id: row.id,
                customer_id: row.customer_id,
                showtime_id: row.showtime_id,
                voucher_code: row.voucher_code,
                total_price: row.total_price,
                has_tickets: row.has_tickets,
                has_food: row.has_food,
                created_at: row.created_at,
            })
        })
        .collect()
}

pub fn find(conn: &mut PgConnection, id: Uuid) -> Result<OrderResponse> {
    let row = find_row(conn, id)?;
    with_lines(conn, vec![row])?
        .pop()
        .ok_or_else(|| ApiError::not_found(format!("Order {}", id)))
}

pub fn list(conn: &mut PgConnection) -> Result<Vec<OrderResponse>> {
    let rows = orders::table
        .order(orders::created_at.desc())
        .select(OrderRow::as_select())
        .load(conn)?;
    with_lines(conn, rows)
}

pub fn list_for_customer(conn: &mut PgConnection, customer_id: &str) -> Result<Vec<OrderResponse>> {
    let rows = orders::table
        .filter(orders::customer_id.eq(customer_id))
        .order(orders::created_at.desc())
        .select(OrderRow::as_select())
        .load(conn)?;
    with_lines(conn, rows)
}

/// Undoes the side effects of a live order: frees its seats, puts its food
/// back in stock, gives back the voucher use and takes it out of the
/// customer's totals.
fn release(conn: &mut PgConnection, order: &OrderRow) -> Result<()> {
    diesel::delete(showtime_seats::table.filter(showtime_seats::order_id.eq(order.id)))
        .execute(conn)?;

    let lines = food_orders::table
        .filter(food_orders::order_id.eq(order.id))
        .order(food_orders::item_id.asc())
        .select(FoodOrderRow::as_select())
        .load(conn)?;
    for line in lines {
        diesel::update(food_items::table.find(line.item_id.as_str()))
            .set(food_items::stock_quantity.eq(food_items::stock_quantity + line.quantity))
            .execute(conn)?;
    }

    if let Some(code) = &order.voucher_code {
        vouchers::decrement_usage(conn, code)?;
    }

    diesel::update(customers::table.find(order.customer_id.as_str()))
        .set((
            customers::total_spent.eq(customers::total_spent - order.total_price),
            customers::order_count.eq(customers::order_count - 1),
        ))
        .execute(conn)?;
    Ok(())
}

/// Overwrites status and payment method. Cancelling releases the order; a
/// cancelled order stays cancelled.
pub fn update(conn: &mut PgConnection, id: Uuid, update: OrderUpdate) -> Result<OrderResponse> {
    conn.transaction::<_, ApiError, _>(|conn| {
        let order = find_row(conn, id)?;
        let current: OrderStatus = parse_column(&order.status)?;

        match (current, update.status) {
            (OrderStatus::Cancelled, OrderStatus::Cancelled) => {}
            (OrderStatus::Cancelled, _) => {
                return Err(ApiError::OrderAlreadyCancelled(id.to_string()))
            }
            (_, OrderStatus::Cancelled) => release(conn, &order)?,
            _ => {}
        }

        diesel::update(orders::table.find(id))
            .set((
                orders::status.eq(update.status.as_str()),
                orders::payment_method.eq(update.payment_method.as_str()),
            ))
            .execute(conn)?;
        Ok(())
    })?;

    find(conn, id)
}

pub fn delete(conn: &mut PgConnection, id: Uuid) -> Result<()> {
    conn.transaction::<_, ApiError, _>(|conn| {
        let order = find_row(conn, id)?;
        if parse_column::<OrderStatus>(&order.status)? != OrderStatus::Cancelled {
            release(conn, &order)?;
        }

        diesel::delete(showtime_seats::table.filter(showtime_seats::order_id.eq(id)))
            .execute(conn)?;
        diesel::delete(food_orders::table.filter(food_orders::order_id.eq(id))).execute(conn)?;
        diesel::delete(orders::table.find(id)).execute(conn)?;
        Ok(())
    })
}
