//! Admin reports. The routes live in a scope guarded by
//! `auth::admin_validator`, so handlers here never check the caller.

use actix_web::{get, web, HttpResponse};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::db;
use crate::error::{ApiError, Result};
use crate::model::CustomerRow;
use crate::state::AppState;

pub const DEFAULT_TOP_CUSTOMERS: i64 = 10;
pub const MAX_TOP_CUSTOMERS: i64 = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistic {
    pub movies: i64,
    pub movies_showing: i64,
    pub cinemas: i64,
    pub customers: i64,
    pub orders: i64,
    pub tickets_sold: i64,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyRevenue {
    pub month: u32,
    pub revenue: f64,
    pub orders: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRevenue {
    pub date: NaiveDate,
    pub revenue: f64,
    pub orders: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieRevenue {
    pub movie_id: String,
    pub title: String,
    pub tickets_sold: i64,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopCustomer {
    pub id: String,
    pub name: String,
    pub email: String,
    pub membership_level: String,
    pub total_spent: f64,
    pub order_count: i32,
}

impl From<CustomerRow> for TopCustomer {
    fn from(row: CustomerRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            membership_level: row.membership_level,
            total_spent: row.total_spent,
            order_count: row.order_count,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct YearQuery {
    pub year: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MonthQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TopCustomersQuery {
    pub limit: Option<i64>,
}

impl TopCustomersQuery {
    /// Defaults to 10, capped at 100.
    pub fn limit(&self) -> Result<i64> {
        match self.limit {
            None => Ok(DEFAULT_TOP_CUSTOMERS),
            Some(limit) if limit < 1 => Err(ApiError::validation("limit must be at least 1")),
            Some(limit) => Ok(limit.min(MAX_TOP_CUSTOMERS)),
        }
    }
}

fn current_date() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

fn check_month(month: u32) -> Result<u32> {
    if (1..=12).contains(&month) {
        Ok(month)
    } else {
        Err(ApiError::validation(format!("month {} is not between 1 and 12", month)))
    }
}

#[get("/statistic")]
pub async fn statistic(state: web::Data<AppState>) -> Result<HttpResponse> {
    let statistic = state.run(db::reports::statistic).await?;
    Ok(HttpResponse::Ok().json(statistic))
}

#[get("/revenue/monthly")]
pub async fn monthly_revenue(
    state: web::Data<AppState>,
    query: web::Query<YearQuery>,
) -> Result<HttpResponse> {
    let year = query.year.unwrap_or_else(|| current_date().year());
    let months = state
        .run(move |conn| db::reports::monthly_revenue(conn, year))
        .await?;
    Ok(HttpResponse::Ok().json(months))
}

#[get("/revenue/daily")]
pub async fn daily_revenue(
    state: web::Data<AppState>,
    query: web::Query<MonthQuery>,
) -> Result<HttpResponse> {
    let today = current_date();
    let year = query.year.unwrap_or_else(|| today.year());
    let month = check_month(query.month.unwrap_or_else(|| today.month()))?;

    let days = state
        .run(move |conn| db::reports::daily_revenue(conn, year, month))
        .await?;
    Ok(HttpResponse::Ok().json(days))
}

#[get("/revenue/movie")]
pub async fn movie_revenue(state: web::Data<AppState>) -> Result<HttpResponse> {
    let movies = state.run(db::reports::movie_revenue).await?;
    Ok(HttpResponse::Ok().json(movies))
}

#[get("/topCustomers")]
pub async fn top_customers(
    state: web::Data<AppState>,
    query: web::Query<TopCustomersQuery>,
) -> Result<HttpResponse> {
    let limit = query.limit()?;
    let customers = state
        .run(move |conn| db::reports::top_customers(conn, limit))
        .await?;
    Ok(HttpResponse::Ok().json(customers))
}
