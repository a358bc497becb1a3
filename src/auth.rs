use std::future::Future;
use std::pin::Pin;

use actix_web::dev::{Payload, ServiceRequest};
use actix_web::http::header::Header;
use actix_web::{web, Error, FromRequest, HttpMessage, HttpRequest};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use actix_web_httpauth::headers::authorization::{Authorization, Bearer};
use anyhow::anyhow;
use bcrypt::{hash, verify, DEFAULT_COST};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header as JwtHeader, Validation};
use serde::{Deserialize, Serialize};

use crate::db;
use crate::error::{ApiError, Result};
use crate::state::AppState;

const ADMIN_LEVEL: &str = "Admin";

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Customer id.
    pub id: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone)]
pub struct TokenService {
    secret: String,
    ttl_minutes: i64,
}

impl TokenService {
    pub fn new(secret: String, ttl_minutes: i64) -> Self {
        Self { secret, ttl_minutes }
    }

    /// Returns the signed token and its lifetime in seconds.
    pub fn issue(&self, customer_id: &str) -> anyhow::Result<(String, i64)> {
        let now = chrono::Utc::now();
        let expiration = now + chrono::Duration::minutes(self.ttl_minutes);
        let claims = TokenClaims {
            id: customer_id.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
        };
        let token = encode(
            &JwtHeader::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )
        .map_err(|e| anyhow!("{}", e))?;

        Ok((token, expiration.timestamp() - now.timestamp()))
    }

    pub fn validate(&self, token: &str) -> Result<TokenClaims> {
        let token = token.trim_start_matches("Bearer ");
        decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &Validation::new(Algorithm::HS256),
        )
        .map(|data| data.claims)
        .map_err(|e| {
            log::debug!("rejected token: {}", e);
            ApiError::Unauthorized
        })
    }
}

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    hash(password, DEFAULT_COST).map_err(|e| anyhow!("Failed to hash password: {}", e))
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    verify(password, password_hash).unwrap_or(false)
}

/// The customer a bearer token belongs to, loaded from the database.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentCustomer {
    pub id: String,
    pub name: String,
    pub email: String,
    pub membership_level: String,
}

impl CurrentCustomer {
    pub fn is_admin(&self) -> bool {
        self.membership_level.eq_ignore_ascii_case(ADMIN_LEVEL)
    }

    pub fn require_admin(self) -> Result<Self> {
        if self.is_admin() {
            Ok(self)
        } else {
            Err(ApiError::Forbidden)
        }
    }

    /// Customers may only see their own records; admins see everything.
    pub fn ensure_can_access(&self, customer_id: &str) -> Result<()> {
        if self.is_admin() || self.id == customer_id {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }
}

pub async fn authenticate(state: &AppState, token: &str) -> Result<CurrentCustomer> {
    let claims = state.tokens.validate(token)?;
    let customer = state
        .run(move |conn| db::customers::find_row(conn, &claims.id))
        .await?
        .ok_or(ApiError::Unauthorized)?;

    Ok(CurrentCustomer {
        id: customer.id,
        name: customer.name,
        email: customer.email,
        membership_level: customer.membership_level,
    })
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
    Authorization::<Bearer>::parse(req)
        .ok()
        .map(|auth| auth.into_scheme().token().to_string())
}

impl FromRequest for CurrentCustomer {
    type Error = ApiError;
    type Future = Pin<Box<dyn Future<Output = Result<Self>>>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        if let Some(customer) = req.extensions().get::<CurrentCustomer>().cloned() {
            return Box::pin(async move { Ok(customer) });
        }
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let token = bearer_token(req);

        Box::pin(async move {
            let state = state.ok_or_else(|| anyhow!("application state is not registered"))?;
            let token = token.ok_or(ApiError::Unauthorized)?;
            authenticate(&state, &token).await
        })
    }
}

/// Extractor for handlers restricted to admins.
#[derive(Debug, Clone)]
pub struct AdminCustomer(pub CurrentCustomer);

impl FromRequest for AdminCustomer {
    type Error = ApiError;
    type Future = Pin<Box<dyn Future<Output = Result<Self>>>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let customer = CurrentCustomer::from_request(req, payload);
        Box::pin(async move { Ok(AdminCustomer(customer.await?.require_admin()?)) })
    }
}

/// Bearer middleware validator for scopes that only admins may enter. The
/// authenticated customer is stored in the request extensions.
///
/// A missing or malformed header arrives as `None` so it gets the same JSON
/// error body as every other 401.
pub async fn admin_validator(
    req: ServiceRequest,
    credentials: Option<BearerAuth>,
) -> std::result::Result<ServiceRequest, (Error, ServiceRequest)> {
    let Some(credentials) = credentials else {
        return Err((Error::from(ApiError::Unauthorized), req));
    };
    let Some(state) = req.app_data::<web::Data<AppState>>().cloned() else {
        let err = ApiError::from(anyhow!("application state is not registered"));
        return Err((Error::from(err), req));
    };

    match authenticate(&state, credentials.token()).await.and_then(CurrentCustomer::require_admin) {
        Ok(customer) => {
            req.extensions_mut().insert(customer);
            Ok(req)
        }
        Err(e) => Err((Error::from(e), req)),
    }
}
