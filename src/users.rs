use actix_web::{post, web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{hash_password, verify_password};
use crate::customers::{
    normalize_email, validate_email, validate_password, CustomerResponse, NewCustomer,
};
use crate::db;
use crate::error::{ApiError, Result};
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PasswordResetRequest {
    pub email: String,
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub token: String,
    pub expires_in: i64,
    pub customer: CustomerResponse,
}

#[post("/auth/register")]
pub async fn register(
    state: web::Data<AppState>,
    request: web::Json<RegisterRequest>,
) -> Result<HttpResponse> {
    let request = request.into_inner();
    // Self-registration always starts at the default membership level.
    let new_customer = NewCustomer {
        name: request.name,
        email: request.email,
        phone: request.phone,
        password: request.password,
        membership_level: None,
    };
    new_customer.validate()?;

    let customer = state
        .run(move |conn| {
            let password_hash = hash_password(&new_customer.password)?;
            db::customers::create(conn, new_customer.profile(), password_hash)
        })
        .await?;

    let (token, expires_in) = state.tokens.issue(&customer.id)?;
    log::info!("registered customer {}", customer.id);
    Ok(HttpResponse::Created().json(TokenResponse {
        token,
        expires_in,
        customer,
    }))
}

#[post("/auth/login")]
pub async fn login(
    state: web::Data<AppState>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    let LoginRequest { email, password } = request.into_inner();
    let email = normalize_email(&email);

    let customer = state
        .run(move |conn| {
            let customer = db::customers::find_by_email(conn, &email)?
                .ok_or(ApiError::InvalidCredentials)?;
            if !verify_password(&password, &customer.password_hash) {
                return Err(ApiError::InvalidCredentials);
            }
            Ok(CustomerResponse::from(customer))
        })
        .await?;

    let (token, expires_in) = state.tokens.issue(&customer.id)?;
    Ok(HttpResponse::Ok().json(TokenResponse {
        token,
        expires_in,
        customer,
    }))
}

#[post("/auth/password/reset")]
pub async fn reset_password(
    state: web::Data<AppState>,
    request: web::Json<PasswordResetRequest>,
) -> Result<HttpResponse> {
    let request = request.into_inner();
    let email = normalize_email(&request.email);
    validate_email(&email)?;
    validate_password(&request.new_password)?;

    state
        .run(move |conn| {
            let customer = db::customers::find_by_email(conn, &email)?
                .ok_or(ApiError::InvalidCredentials)?;
            if !verify_password(&request.current_password, &customer.password_hash) {
                return Err(ApiError::InvalidCredentials);
            }
            let password_hash = hash_password(&request.new_password)?;
            db::customers::update_password(conn, &customer.id, &password_hash)
        })
        .await?;

    Ok(HttpResponse::NoContent().finish())
}
