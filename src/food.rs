use actix_web::{get, web, HttpResponse};
use serde::Serialize;

use crate::db;
use crate::error::Result;
use crate::model::FoodType;
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodResponse {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub stock_quantity: i32,
    pub is_available: bool,
    #[serde(rename = "type")]
    pub item_type: FoodType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flavor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

#[get("/food")]
pub async fn list_food(state: web::Data<AppState>) -> Result<HttpResponse> {
    let items = state.run(|conn| db::food::list(conn, None)).await?;
    Ok(HttpResponse::Ok().json(items))
}

#[get("/food/popcorn")]
pub async fn list_popcorn(state: web::Data<AppState>) -> Result<HttpResponse> {
    let items = state
        .run(|conn| db::food::list(conn, Some(FoodType::Popcorn)))
        .await?;
    Ok(HttpResponse::Ok().json(items))
}

#[get("/food/drinks")]
pub async fn list_drinks(state: web::Data<AppState>) -> Result<HttpResponse> {
    let items = state
        .run(|conn| db::food::list(conn, Some(FoodType::Drink)))
        .await?;
    Ok(HttpResponse::Ok().json(items))
}

#[get("/food/others")]
pub async fn list_others(state: web::Data<AppState>) -> Result<HttpResponse> {
    let items = state
        .run(|conn| db::food::list(conn, Some(FoodType::Other)))
        .await?;
    Ok(HttpResponse::Ok().json(items))
}

#[get("/food/{id}")]
pub async fn get_food(state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse> {
    let id = path.into_inner();
    let item = state.run(move |conn| db::food::find(conn, &id)).await?;
    Ok(HttpResponse::Ok().json(item))
}
