pub mod auth;
pub mod cinemas;
pub mod config;
pub mod customers;
pub mod db;
pub mod error;
pub mod food;
pub mod model;
pub mod movies;
pub mod orders;
pub mod pricing;
pub mod reports;
pub mod routes;
pub mod schema;
pub mod seats;
pub mod showtimes;
pub mod state;
pub mod users;
pub mod vouchers;
