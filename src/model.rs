use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use diesel::{AsChangeset, Insertable, Queryable, Selectable};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::schema::*;

/// Closed set of values persisted as text columns.
///
/// Parsing is case-insensitive; the first spelling listed for a variant is
/// the canonical one written to the database and to JSON.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal $(| $alias:literal)*),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                $(
                    if s.eq_ignore_ascii_case($text) $(|| s.eq_ignore_ascii_case($alias))* {
                        return Ok($name::$variant);
                    }
                )+
                Err(format!(
                    "invalid {} '{}', expected one of: {}",
                    stringify!($name),
                    s,
                    [$($text),+].join(", ")
                ))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

text_enum!(SeatType {
    Standard => "standard" | "normal",
    Vip => "vip",
});

text_enum!(
    /// Projection format of a showtime. IMAX and 4DX are priced as premium.
    ShowtimeFormat {
        TwoD => "2D",
        ThreeD => "3D",
        Imax => "IMAX",
        FourDx => "4DX",
    }
);

impl ShowtimeFormat {
    pub fn is_premium(&self) -> bool {
        matches!(self, ShowtimeFormat::Imax | ShowtimeFormat::FourDx)
    }
}

text_enum!(FoodType {
    Popcorn => "popcorn",
    Drink => "drink" | "drinks",
    Other => "other" | "others",
});

text_enum!(PaymentMethod {
    CreditCard => "Credit Card" | "credit_card",
    Cash => "Cash",
    MobileApp => "Mobile App" | "mobile_app",
});

text_enum!(OrderStatus {
    Processing => "Processing",
    Completed => "Completed",
    Cancelled => "Cancelled" | "Canceled",
});

text_enum!(DiscountType {
    Fixed => "fixed" | "amount",
    Percentage => "percentage" | "percent",
});

/// Reads an enum back from its text column. A value outside the closed set
/// means the row was written by something other than this service.
pub fn parse_column<T: FromStr<Err = String>>(value: &str) -> anyhow::Result<T> {
    value.parse::<T>().map_err(|e| anyhow::anyhow!("{}", e))
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = movies)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct MovieRow {
    pub id: String,
    pub title: String,
    pub release_date: Option<NaiveDate>,
    pub duration: i32,
    pub language: String,
    pub description: String,
    pub poster_url: String,
    pub age_rating: String,
    pub studio: String,
    pub country: String,
    pub director: String,
    pub rating: Option<f64>,
    pub is_showing: bool,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable)]
#[diesel(table_name = movie_genres)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct GenreRow {
    pub movie_id: String,
    pub genre: String,
    /// Index of the genre in the list the movie was saved with.
    pub position: i32,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = cinemas)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CinemaRow {
    pub id: String,
    pub name: String,
    pub opening_hour: NaiveTime,
    pub closing_hour: NaiveTime,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable)]
#[diesel(table_name = cinema_phones)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CinemaPhoneRow {
    pub cinema_id: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable)]
#[diesel(table_name = rooms)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RoomRow {
    pub cinema_id: String,
    pub room_number: i32,
    pub room_type: String,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable)]
#[diesel(table_name = seats)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SeatRow {
    pub cinema_id: String,
    pub room_number: i32,
    pub seat_number: String,
    pub seat_type: String,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = showtimes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ShowtimeRow {
    pub id: String,
    pub movie_id: String,
    pub cinema_id: String,
    pub room_number: i32,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub duration: i32,
    pub format: String,
    pub subtitle: bool,
    pub dubbing: bool,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable)]
#[diesel(table_name = showtime_seats)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ShowtimeSeatRow {
    pub showtime_id: String,
    pub seat_number: String,
    pub order_id: Uuid,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable)]
#[diesel(table_name = food_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FoodItemRow {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub stock_quantity: i32,
    pub is_available: bool,
    pub item_type: String,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable)]
#[diesel(table_name = popcorn)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PopcornRow {
    pub item_id: String,
    pub flavor: String,
    pub size: String,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable)]
#[diesel(table_name = drinks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DrinkRow {
    pub item_id: String,
    pub size: String,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: Uuid,
    pub customer_id: String,
    pub showtime_id: Option<String>,
    pub payment_method: String,
    pub voucher_code: Option<String>,
    pub status: String,
    pub total_price: f64,
    pub has_tickets: bool,
    pub has_food: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable)]
#[diesel(table_name = food_orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FoodOrderRow {
    pub order_id: Uuid,
    pub item_id: String,
    pub quantity: i32,
    pub unit_price: f64,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable)]
#[diesel(table_name = vouchers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct VoucherRow {
    pub code: String,
    pub discount_type: String,
    pub discount_amount: f64,
    pub usage_count: i32,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable)]
#[diesel(table_name = customers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CustomerRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub membership_level: String,
    pub total_spent: f64,
    pub order_count: i32,
    pub password_hash: String,
    pub registered_at: NaiveDateTime,
}
