use std::collections::HashMap;

use diesel::{ExpressionMethods, OptionalExtension, PgConnection, QueryDsl, RunQueryDsl, SelectableHelper};

use crate::error::{ApiError, Result};
use crate::food::FoodResponse;
use crate::model::{parse_column, DrinkRow, FoodItemRow, FoodType, PopcornRow};
use crate::schema::{drinks, food_items, popcorn};

/// Attaches the popcorn/drink subtype attributes to each item.
fn with_details(conn: &mut PgConnection, rows: Vec<FoodItemRow>) -> Result<Vec<FoodResponse>> {
    let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();

    let mut popcorn_rows: HashMap<String, PopcornRow> = popcorn::table
        .filter(popcorn::item_id.eq_any(ids.clone()))
        .select(PopcornRow::as_select())
        .load(conn)?
        .into_iter()
        .map(|row| (row.item_id.clone(), row))
        .collect();
    let mut drink_rows: HashMap<String, DrinkRow> = drinks::table
        .filter(drinks::item_id.eq_any(ids))
        .select(DrinkRow::as_select())
        .load(conn)?
        .into_iter()
        .map(|row| (row.item_id.clone(), row))
        .collect();

    rows.into_iter()
        .map(|row| -> Result<FoodResponse> {
            let item_type: FoodType = parse_column(&row.item_type)?;
            let (flavor, size) = match item_type {
                FoodType::Popcorn => popcorn_rows
                    .remove(&row.id)
                    .map(|p| (Some(p.flavor), Some(p.size)))
                    .unwrap_or((None, None)),
                FoodType::Drink => (None, drink_rows.remove(&row.id).map(|d| d.size)),
                FoodType::Other => (None, None),
            };
            Ok(FoodResponse {
                id: row.id,
                name: row.name,
                price: row.price,
                stock_quantity: row.stock_quantity,
                is_available: row.is_available,
                item_type,
                flavor,
                size,
            })
        })
        .collect()
}

pub fn list(conn: &mut PgConnection, item_type: Option<FoodType>) -> Result<Vec<FoodResponse>> {
    let mut query = food_items::table
        .order(food_items::id.asc())
        .select(FoodItemRow::as_select())
        .into_boxed();
    if let Some(item_type) = item_type {
        query = query.filter(food_items::item_type.eq(item_type.as_str()));
    }
    let rows = query.load(conn)?;
    with_details(conn, rows)
}

pub fn find_row(conn: &mut PgConnection, id: &str) -> Result<FoodItemRow> {
    food_items::table
        .find(id)
        .select(FoodItemRow::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ApiError::not_found(format!("Food item {}", id)))
}

pub fn find(conn: &mut PgConnection, id: &str) -> Result<FoodResponse> {
    let row = find_row(conn, id)?;
    with_details(conn, vec![row])?
        .pop()
        .ok_or_else(|| ApiError::not_found(format!("Food item {}", id)))
}
