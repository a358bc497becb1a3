use actix_web::body::BoxBody;
use actix_web::error::BlockingError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("An unspecified internal error ocurred: {0}")]
    InternalError(#[from] anyhow::Error),
    #[error("An unspecified internal error ocurred")]
    DatabaseError(#[from] BlockingError),
    #[error("{0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("The Email is not available")]
    EmailNotAvailable,
    #[error("Invalid Credentials")]
    InvalidCredentials,
    #[error("Missing or invalid token")]
    Unauthorized,
    #[error("Forbidden")]
    Forbidden,
    #[error("Seat {0} is already booked for this showtime")]
    SeatAlreadyBooked(String),
    #[error("Not enough stock left for food item {0}")]
    InsufficientStock(String),
    #[error("Food item {0} is not available")]
    ItemUnavailable(String),
    #[error("Order {0} is already cancelled")]
    OrderAlreadyCancelled(String),
    #[error("Showtime {0} has bookings and cannot change room")]
    ShowtimeHasBookings(String),
    #[error("Not implemented")]
    NotImplemented,
}

impl ApiError {
    pub fn not_found(what: impl Into<String>) -> Self {
        ApiError::NotFound(what.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    fn get_error_code(&self) -> String {
        match self {
            ApiError::InternalError(_) => "IE-00500".to_string(),
            ApiError::DatabaseError(_) => "DE-00500".to_string(),
            ApiError::Validation(_) => "VE-00400".to_string(),
            ApiError::NotFound(_) => "NF-00404".to_string(),
            ApiError::EmailNotAvailable => "ENA-00400".to_string(),
            ApiError::InvalidCredentials => "IC-00401".to_string(),
            ApiError::Unauthorized => "UA-00401".to_string(),
            ApiError::Forbidden => "FB-00403".to_string(),
            ApiError::SeatAlreadyBooked(_) => "SAB-00409".to_string(),
            ApiError::InsufficientStock(_) => "IS-00409".to_string(),
            ApiError::ItemUnavailable(_) => "IU-00409".to_string(),
            ApiError::OrderAlreadyCancelled(_) => "OAC-00409".to_string(),
            ApiError::ShowtimeHasBookings(_) => "SHB-00409".to_string(),
            ApiError::NotImplemented => "NI-00501".to_string(),
        }
    }

    /// Text sent to the client. Internal causes stay in the server log.
    fn public_message(&self) -> String {
        match self {
            ApiError::InternalError(_) | ApiError::DatabaseError(_) => {
                "An unspecified internal error ocurred".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<diesel::result::Error> for ApiError {
    fn from(value: diesel::result::Error) -> Self {
        match value {
            diesel::result::Error::NotFound => ApiError::not_found("Record"),
            other => ApiError::InternalError(anyhow::Error::new(other)),
        }
    }
}

impl From<r2d2::Error> for ApiError {
    fn from(value: r2d2::Error) -> Self {
        ApiError::InternalError(anyhow::anyhow!("Couldn't get db connection from pool: {}", value))
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub message: String,
    pub status: u16,
    pub timestamp: NaiveDateTime,
    pub internal_code: String,
}

impl From<&ApiError> for ErrorResponse {
    fn from(value: &ApiError) -> Self {
        Self {
            message: value.public_message(),
            status: value.status_code().as_u16(),
            timestamp: chrono::Utc::now().naive_utc(),
            internal_code: value.get_error_code(),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match &self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::EmailNotAvailable => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::SeatAlreadyBooked(_)
            | ApiError::InsufficientStock(_)
            | ApiError::ItemUnavailable(_)
            | ApiError::OrderAlreadyCancelled(_)
            | ApiError::ShowtimeHasBookings(_) => StatusCode::CONFLICT,
            ApiError::NotImplemented => StatusCode::NOT_IMPLEMENTED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse<BoxBody> {
        if self.status_code().is_server_error() && !matches!(self, ApiError::NotImplemented) {
            log::error!("{:?}", self);
        }
        HttpResponse::build(self.status_code()).json(ErrorResponse::from(self))
    }
}
