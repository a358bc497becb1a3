use actix_web::{get, web, HttpResponse};
use serde::Serialize;

use crate::db;
use crate::error::{ApiError, Result};
use crate::model::{parse_column, DiscountType, VoucherRow};
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoucherResponse {
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_amount: f64,
    pub usage_count: i32,
}

impl TryFrom<VoucherRow> for VoucherResponse {
    type Error = ApiError;

    fn try_from(row: VoucherRow) -> Result<Self> {
        Ok(Self {
            discount_type: parse_column(&row.discount_type)?,
            code: row.code,
            discount_amount: row.discount_amount,
            usage_count: row.usage_count,
        })
    }
}

#[get("/vouchers")]
pub async fn list_vouchers(state: web::Data<AppState>) -> Result<HttpResponse> {
    let vouchers = state.run(db::vouchers::list).await?;
    Ok(HttpResponse::Ok().json(vouchers))
}

#[get("/vouchers/{code}")]
pub async fn get_voucher(state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse> {
    let code = path.into_inner();
    let voucher = state.run(move |conn| db::vouchers::find(conn, &code)).await?;
    Ok(HttpResponse::Ok().json(voucher))
}
