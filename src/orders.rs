use std::collections::HashSet;

use actix_web::{delete, get, post, put, web, HttpResponse};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{AdminCustomer, CurrentCustomer};
use crate::db;
use crate::error::{ApiError, Result};
use crate::model::{OrderStatus, PaymentMethod};
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FoodLineInput {
    pub item_id: String,
    pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OrderRequest {
    pub showtime_id: Option<String>,
    #[serde(default)]
    pub seat_numbers: Vec<String>,
    #[serde(default)]
    pub food_items: Vec<FoodLineInput>,
    #[serde(alias = "voucherId")]
    pub voucher_code: Option<String>,
    pub payment_method: PaymentMethod,
}

/// A validated purchase, ready to be written in one transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceOrder {
    pub customer_id: String,
    pub showtime_id: Option<String>,
    pub seat_numbers: Vec<String>,
    /// `(food item id, quantity)`
    pub food_lines: Vec<(String, i32)>,
    pub voucher_code: Option<String>,
    pub payment_method: PaymentMethod,
}

impl OrderRequest {
    pub fn into_command(self, customer_id: String) -> Result<PlaceOrder> {
        let seat_numbers: Vec<String> = self
            .seat_numbers
            .iter()
            .map(|s| s.trim().to_ascii_uppercase())
            .collect();
        if seat_numbers.is_empty() && self.food_items.is_empty() {
            return Err(ApiError::validation(
                "an order needs at least one seat or one food item",
            ));
        }
        if seat_numbers.iter().any(String::is_empty) {
            return Err(ApiError::validation("seat numbers must not be empty"));
        }
        if let Some(seat) = first_duplicate(&seat_numbers) {
            return Err(ApiError::validation(format!(
                "seat {} is requested more than once",
                seat
            )));
        }

        let showtime_id = self
            .showtime_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());
        if !seat_numbers.is_empty() && showtime_id.is_none() {
            return Err(ApiError::validation("showtimeId is required when booking seats"));
        }

        let mut seen = HashSet::new();
        let mut food_lines = Vec::with_capacity(self.food_items.len());
        for line in self.food_items {
            let item_id = line.item_id.trim().to_string();
            if item_id.is_empty() {
                return Err(ApiError::validation("itemId must not be empty"));
            }
            if line.quantity < 1 {
                return Err(ApiError::validation(format!(
                    "quantity of {} must be at least 1",
                    item_id
                )));
            }
            if !seen.insert(item_id.clone()) {
                return Err(ApiError::validation(format!(
                    "food item {} is listed more than once",
                    item_id
                )));
            }
            food_lines.push((item_id, line.quantity));
        }

        Ok(PlaceOrder {
            customer_id,
            showtime_id: if seat_numbers.is_empty() { None } else { showtime_id },
            seat_numbers,
            food_lines,
            voucher_code: self
                .voucher_code
                .map(|code| code.trim().to_string())
                .filter(|code| !code.is_empty()),
            payment_method: self.payment_method,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OrderUpdate {
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreated {
    pub order_id: Uuid,
    pub total_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSeat {
    pub seat_number: String,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFoodLine {
    pub item_id: String,
    pub name: String,
    pub quantity: i32,
    pub unit_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: Uuid,
    pub customer_id: String,
    pub showtime_id: Option<String>,
    pub payment_method: PaymentMethod,
    pub voucher_code: Option<String>,
    pub status: OrderStatus,
    pub total_price: f64,
    pub has_tickets: bool,
    pub has_food: bool,
    pub created_at: NaiveDateTime,
    pub seats: Vec<OrderSeat>,
    pub food_items: Vec<OrderFoodLine>,
}

fn first_duplicate(items: &[String]) -> Option<&String> {
    let mut seen = HashSet::new();
    items.iter().find(|item| !seen.insert(item.as_str()))
}

fn parse_order_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id).map_err(|_| ApiError::not_found(format!("Order {}", id)))
}

#[post("/orders")]
pub async fn create_order(
    state: web::Data<AppState>,
    customer: CurrentCustomer,
    request: web::Json<OrderRequest>,
) -> Result<HttpResponse> {
    let command = request.into_inner().into_command(customer.id)?;
    let pricing = state.pricing;

    let created = state
        .run(move |conn| db::orders::place(conn, &pricing, command))
        .await?;
    log::info!(
        "order {} placed, total {:.2}",
        created.order_id,
        created.total_price
    );
    Ok(HttpResponse::Created().json(created))
}

#[get("/orders")]
pub async fn list_orders(state: web::Data<AppState>, _admin: AdminCustomer) -> Result<HttpResponse> {
    let orders = state.run(db::orders::list).await?;
    Ok(HttpResponse::Ok().json(orders))
}

#[get("/orders/{id}")]
pub async fn get_order(
    state: web::Data<AppState>,
    customer: CurrentCustomer,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let id = parse_order_id(&path.into_inner())?;
    let order = state.run(move |conn| db::orders::find(conn, id)).await?;

    // Someone else's order is reported as missing rather than forbidden.
    if customer.ensure_can_access(&order.customer_id).is_err() {
        return Err(ApiError::not_found(format!("Order {}", id)));
    }
    Ok(HttpResponse::Ok().json(order))
}

#[put("/orders/{id}")]
pub async fn update_order(
    state: web::Data<AppState>,
    _admin: AdminCustomer,
    path: web::Path<String>,
    update: web::Json<OrderUpdate>,
) -> Result<HttpResponse> {
    let id = parse_order_id(&path.into_inner())?;
    let update = update.into_inner();

    let order = state
        .run(move |conn| db::orders::update(conn, id, update))
        .await?;
    log::info!("order {} is now {}", order.id, order.status);
    Ok(HttpResponse::Ok().json(order))
}

#[delete("/orders/{id}")]
pub async fn delete_order(
    state: web::Data<AppState>,
    _admin: AdminCustomer,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let id = parse_order_id(&path.into_inner())?;
    state.run(move |conn| db::orders::delete(conn, id)).await?;
    log::info!("deleted order {}", id);
    Ok(HttpResponse::NoContent().finish())
}
