//! Ticket, food and voucher arithmetic shared by seat availability reads and
//! order creation, so a seat is charged exactly what the seat map showed.

use anyhow::anyhow;
use rust_decimal::prelude::*;
use serde::Deserialize;

use crate::model::{DiscountType, SeatType, ShowtimeFormat};

/// Amounts are kept to 2 decimal places, rounding half away from zero.
const DECIMAL_PLACES: u32 = 2;

/// Prices as configured. Arithmetic on them goes through [`Decimal`].
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SeatPricing {
    pub standard_seat: f64,
    pub vip_seat: f64,
    /// Applied to every seat of an IMAX or 4DX showtime.
    pub premium_multiplier: f64,
}

impl Default for SeatPricing {
    fn default() -> Self {
        Self {
            standard_seat: 75000.0,
            vip_seat: 100000.0,
            premium_multiplier: 1.5,
        }
    }
}

impl SeatPricing {
    pub fn seat_price(&self, seat_type: SeatType, format: ShowtimeFormat) -> f64 {
        let base = match seat_type {
            SeatType::Standard => to_decimal(self.standard_seat),
            SeatType::Vip => to_decimal(self.vip_seat),
        };
        if format.is_premium() {
            to_f64(base * to_decimal(self.premium_multiplier))
        } else {
            to_f64(base)
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.standard_seat < 0.0 || self.vip_seat < 0.0 {
            return Err(anyhow!("seat prices must not be negative"));
        }
        if self.premium_multiplier < 1.0 {
            return Err(anyhow!("pricing.premium_multiplier must be at least 1"));
        }
        Ok(())
    }
}

/// Converts a stored amount for exact arithmetic. Non-finite values become zero.
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Rounds to cents and converts back for storage and JSON.
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    round(value).to_f64().unwrap_or_default()
}

fn round(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Discount a voucher grants on `subtotal`; never more than the subtotal.
pub fn voucher_discount(discount_type: DiscountType, amount: f64, subtotal: Decimal) -> Decimal {
    let subtotal = subtotal.max(Decimal::ZERO);
    let discount = match discount_type {
        DiscountType::Fixed => to_decimal(amount),
        DiscountType::Percentage => {
            subtotal * to_decimal(amount).clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
                / Decimal::ONE_HUNDRED
        }
    };
    round(discount.clamp(Decimal::ZERO, subtotal))
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct OrderTotal {
    pub tickets: f64,
    pub food: f64,
    pub discount: f64,
    pub total: f64,
}

/// Totals an order from the seat prices and `(unit price, quantity)` food lines.
pub fn order_total(
    seat_prices: &[f64],
    food_lines: &[(f64, i32)],
    voucher: Option<(DiscountType, f64)>,
) -> OrderTotal {
    let tickets: Decimal = seat_prices.iter().copied().map(to_decimal).sum();
    let food: Decimal = food_lines
        .iter()
        .map(|(unit_price, quantity)| to_decimal(*unit_price) * Decimal::from(*quantity))
        .sum();
    let subtotal = round(tickets) + round(food);
    let discount = voucher
        .map(|(discount_type, amount)| voucher_discount(discount_type, amount, subtotal))
        .unwrap_or(Decimal::ZERO);

    OrderTotal {
        tickets: to_f64(tickets),
        food: to_f64(food),
        discount: to_f64(discount),
        total: to_f64((subtotal - discount).max(Decimal::ZERO)),
    }
}
