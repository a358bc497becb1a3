use actix_web::{delete, get, post, put, web, HttpResponse};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::auth::{hash_password, AdminCustomer, CurrentCustomer};
use crate::db;
use crate::error::{ApiError, Result};
use crate::model::CustomerRow;
use crate::state::AppState;

pub const DEFAULT_MEMBERSHIP: &str = "Standard";
const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub membership_level: String,
    pub total_spent: f64,
    pub order_count: i32,
    pub registered_at: NaiveDateTime,
}

impl From<CustomerRow> for CustomerResponse {
    fn from(row: CustomerRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            membership_level: row.membership_level,
            total_spent: row.total_spent,
            order_count: row.order_count,
            registered_at: row.registered_at,
        }
    }
}

/// Fields of a customer that are written on create and overwritten on update.
#[derive(Debug, Clone)]
pub struct CustomerProfile {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub membership_level: String,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

pub fn validate_email(email: &str) -> Result<()> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(ApiError::validation(format!("'{}' is not a valid email address", email)))
    }
}

pub fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ApiError::validation("name must not be empty"));
    }
    Ok(())
}

fn clean_phone(phone: Option<String>) -> Option<String> {
    phone
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password: String,
    pub membership_level: Option<String>,
}

impl NewCustomer {
    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        validate_email(&normalize_email(&self.email))?;
        validate_password(&self.password)
    }

    pub fn profile(&self) -> CustomerProfile {
        CustomerProfile {
            name: self.name.trim().to_string(),
            email: normalize_email(&self.email),
            phone: clean_phone(self.phone.clone()),
            membership_level: self
                .membership_level
                .as_deref()
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .unwrap_or(DEFAULT_MEMBERSHIP)
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CustomerUpdate {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub membership_level: String,
}

impl CustomerUpdate {
    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        validate_email(&normalize_email(&self.email))?;
        if self.membership_level.trim().is_empty() {
            return Err(ApiError::validation("membershipLevel must not be empty"));
        }
        Ok(())
    }

    pub fn into_profile(self) -> CustomerProfile {
        CustomerProfile {
            name: self.name.trim().to_string(),
            email: normalize_email(&self.email),
            phone: clean_phone(self.phone),
            membership_level: self.membership_level.trim().to_string(),
        }
    }
}

#[get("/customers")]
pub async fn list_customers(
    state: web::Data<AppState>,
    _admin: AdminCustomer,
) -> Result<HttpResponse> {
    let customers = state.run(db::customers::list).await?;
    Ok(HttpResponse::Ok().json(customers))
}

#[get("/customers/{id}")]
pub async fn get_customer(
    state: web::Data<AppState>,
    current: CurrentCustomer,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    current.ensure_can_access(&id)?;

    let customer = state.run(move |conn| db::customers::find(conn, &id)).await?;
    Ok(HttpResponse::Ok().json(customer))
}

#[post("/customers")]
pub async fn create_customer(
    state: web::Data<AppState>,
    _admin: AdminCustomer,
    input: web::Json<NewCustomer>,
) -> Result<HttpResponse> {
    let input = input.into_inner();
    input.validate()?;

    let customer = state
        .run(move |conn| {
            let password_hash = hash_password(&input.password)?;
            db::customers::create(conn, input.profile(), password_hash)
        })
        .await?;
    Ok(HttpResponse::Created().json(customer))
}

/// Customers may edit their own profile; only admins change membership levels.
#[put("/customers/{id}")]
pub async fn update_customer(
    state: web::Data<AppState>,
    current: CurrentCustomer,
    path: web::Path<String>,
    input: web::Json<CustomerUpdate>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    current.ensure_can_access(&id)?;
    let input = input.into_inner();
    input.validate()?;

    let is_admin = current.is_admin();
    let customer = state
        .run(move |conn| db::customers::update(conn, &id, input.into_profile(), is_admin))
        .await?;
    Ok(HttpResponse::Ok().json(customer))
}

#[delete("/customers/{id}")]
pub async fn delete_customer(
    state: web::Data<AppState>,
    _admin: AdminCustomer,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    let deleted = id.clone();
    state.run(move |conn| db::customers::delete(conn, &id)).await?;
    log::info!("deleted customer {} and their orders", deleted);
    Ok(HttpResponse::NoContent().finish())
}

#[get("/customers/{id}/orders")]
pub async fn customer_orders(
    state: web::Data<AppState>,
    current: CurrentCustomer,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    current.ensure_can_access(&id)?;

    let orders = state
        .run(move |conn| {
            db::customers::find_row(conn, &id)?
                .ok_or_else(|| ApiError::not_found(format!("Customer {}", id)))?;
            db::orders::list_for_customer(conn, &id)
        })
        .await?;
    Ok(HttpResponse::Ok().json(orders))
}
