use actix_web::error::{JsonPayloadError, QueryPayloadError};
use actix_web::{web, HttpRequest};
use actix_web_httpauth::middleware::HttpAuthentication;

use crate::error::ApiError;
use crate::{
    auth, cinemas, customers, food, movies, orders, reports, seats, showtimes, users, vouchers,
};

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::validation(err.to_string()).into()
}

fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::validation(err.to_string()).into()
}

/// Registers every endpoint under `/api`. Literal paths go before the
/// `{id}` routes they would otherwise be captured by.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .app_data(web::QueryConfig::default().error_handler(query_error))
        .service(
            web::scope("/api")
                .service(
                    web::scope("/reports")
                        .wrap(HttpAuthentication::with_fn(auth::admin_validator))
                        .service(reports::statistic)
                        .service(reports::monthly_revenue)
                        .service(reports::daily_revenue)
                        .service(reports::movie_revenue)
                        .service(reports::top_customers),
                )
                .service(users::register)
                .service(users::login)
                .service(users::reset_password)
                .service(movies::list_movies)
                .service(movies::now_showing)
                .service(movies::get_movie)
                .service(movies::movie_showtimes)
                .service(movies::create_movie)
                .service(movies::update_movie)
                .service(movies::delete_movie)
                .service(cinemas::list_cinemas)
                .service(cinemas::get_cinema)
                .service(cinemas::create_cinema)
                .service(cinemas::update_cinema)
                .service(cinemas::delete_cinema)
                .service(cinemas::list_rooms)
                .service(cinemas::create_room)
                .service(cinemas::room_seats)
                .service(cinemas::delete_room)
                .service(showtimes::list_showtimes)
                .service(showtimes::get_showtime)
                .service(showtimes::create_showtime)
                .service(showtimes::update_showtime)
                .service(showtimes::delete_showtime)
                .service(seats::list_seats)
                .service(seats::showtime_seats)
                .service(seats::get_seat)
                .service(seats::create_seat)
                .service(food::list_food)
                .service(food::list_popcorn)
                .service(food::list_drinks)
                .service(food::list_others)
                .service(food::get_food)
                .service(vouchers::list_vouchers)
                .service(vouchers::get_voucher)
                .service(customers::list_customers)
                .service(customers::get_customer)
                .service(customers::create_customer)
                .service(customers::update_customer)
                .service(customers::delete_customer)
                .service(customers::customer_orders)
                .service(orders::create_order)
                .service(orders::list_orders)
                .service(orders::get_order)
                .service(orders::update_order)
                .service(orders::delete_order),
        );
}
