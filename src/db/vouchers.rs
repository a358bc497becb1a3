use diesel::{ExpressionMethods, OptionalExtension, PgConnection, QueryDsl, RunQueryDsl, SelectableHelper};

use crate::error::{ApiError, Result};
use crate::model::VoucherRow;
use crate::schema::vouchers;
use crate::vouchers::VoucherResponse;

pub fn list(conn: &mut PgConnection) -> Result<Vec<VoucherResponse>> {
    vouchers::table
        .order(vouchers::code.asc())
        .select(VoucherRow::as_select())
        .load(conn)?
        .into_iter()
        .map(VoucherResponse::try_from)
        .collect()
}

pub fn find_row(conn: &mut PgConnection, code: &str) -> Result<VoucherRow> {
    vouchers::table
        .find(code)
        .select(VoucherRow::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ApiError::not_found(format!("Voucher {}", code)))
}

pub fn find(conn: &mut PgConnection, code: &str) -> Result<VoucherResponse> {
    VoucherResponse::try_from(find_row(conn, code)?)
}

pub fn increment_usage(conn: &mut PgConnection, code: &str) -> Result<()> {
    diesel::update(vouchers::table.find(code))
        .set(vouchers::usage_count.eq(vouchers::usage_count + 1))
        .execute(conn)?;
    Ok(())
}

/// Undoes one `increment_usage`, never going below zero.
pub fn decrement_usage(conn: &mut PgConnection, code: &str) -> Result<()> {
    diesel::update(
        vouchers::table
            .find(code)
            .filter(vouchers::usage_count.gt(0)),
    )
    .set(vouchers::usage_count.eq(vouchers::usage_count - 1))
    .execute(conn)?;
    Ok(())
}
