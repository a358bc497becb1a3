use diesel::{
    Connection, ExpressionMethods, OptionalExtension, PgConnection, QueryDsl, RunQueryDsl,
    SelectableHelper,
};

use crate::customers::{CustomerProfile, CustomerResponse};
use crate::db::ids::{next_id, IdKind};
use crate::db::is_unique_violation;
use crate::error::{ApiError, Result};
use crate::model::CustomerRow;
use crate::schema::{customers, food_orders, orders, showtime_seats};

pub fn find_row(conn: &mut PgConnection, id: &str) -> Result<Option<CustomerRow>> {
    Ok(customers::table
        .find(id)
        .select(CustomerRow::as_select())
        .first(conn)
        .optional()?)
}

pub fn find_by_email(conn: &mut PgConnection, email: &str) -> Result<Option<CustomerRow>> {
    Ok(customers::table
        .filter(customers::email.eq(email))
        .select(CustomerRow::as_select())
        .first(conn)
        .optional()?)
}

pub fn list(conn: &mut PgConnection) -> Result<Vec<CustomerResponse>> {
    Ok(customers::table
        .order(customers::id.asc())
        .select(CustomerRow::as_select())
        .load(conn)?
        .into_iter()
        .map(CustomerResponse::from)
        .collect())
}

pub fn find(conn: &mut PgConnection, id: &str) -> Result<CustomerResponse> {
    find_row(conn, id)?
        .map(CustomerResponse::from)
        .ok_or_else(|| ApiError::not_found(format!("Customer {}", id)))
}

/// Inserts a customer. A taken email is reported as `EmailNotAvailable`, both
/// when seen up front and when a concurrent insert wins the unique index.
pub fn create(
    conn: &mut PgConnection,
    profile: CustomerProfile,
    password_hash: String,
) -> Result<CustomerResponse> {
    conn.transaction::<_, ApiError, _>(|conn| {
        if find_by_email(conn, &profile.email)?.is_some() {
            return Err(ApiError::EmailNotAvailable);
        }

        let row = CustomerRow {
            id: next_id(conn, IdKind::Customer)?,
            name: profile.name,
            email: profile.email,
            phone: profile.phone,
            membership_level: profile.membership_level,
            total_spent: 0.0,
            order_count: 0,
            password_hash,
            registered_at: chrono::Utc::now().naive_utc(),
        };

        match diesel::insert_into(customers::table).values(&row).execute(conn) {
            Err(e) if is_unique_violation(&e) => Err(ApiError::EmailNotAvailable),
            Err(e) => Err(e.into()),
            Ok(_) => Ok(CustomerResponse::from(row)),
        }
    })
}

pub fn update(
    conn: &mut PgConnection,
    id: &str,
    profile: CustomerProfile,
    may_change_membership: bool,
) -> Result<CustomerResponse> {
    conn.transaction::<_, ApiError, _>(|conn| {
        let existing = find_row(conn, id)?
            .ok_or_else(|| ApiError::not_found(format!("Customer {}", id)))?;
        if !may_change_membership
            && !existing
                .membership_level
                .eq_ignore_ascii_case(&profile.membership_level)
        {
            return Err(ApiError::Forbidden);
        }
        if let Some(other) = find_by_email(conn, &profile.email)? {
            if other.id != id {
                return Err(ApiError::EmailNotAvailable);
            }
        }

        let result = diesel::update(customers::table.find(id))
            .set((
                customers::name.eq(&profile.name),
                customers::email.eq(&profile.email),
                customers::phone.eq(&profile.phone),
                customers::membership_level.eq(&profile.membership_level),
            ))
            .returning(CustomerRow::as_returning())
            .get_result::<CustomerRow>(conn);

        match result {
            Err(e) if is_unique_violation(&e) => Err(ApiError::EmailNotAvailable),
            Err(e) => Err(e.into()),
            Ok(row) => Ok(CustomerResponse::from(row)),
        }
    })
}

pub fn update_password(conn: &mut PgConnection, id: &str, password_hash: &str) -> Result<()> {
    diesel::update(customers::table.find(id))
        .set(customers::password_hash.eq(password_hash))
        .execute(conn)?;
    Ok(())
}

/// Removes the customer's orders (with their seat bookings and food lines)
/// and then the customer.
pub fn delete(conn: &mut PgConnection, id: &str) -> Result<()> {
    conn.transaction::<_, ApiError, _>(|conn| {
        let customer_orders = orders::table
            .filter(orders::customer_id.eq(id))
            .select(orders::id);
        diesel::delete(showtime_seats::table.filter(showtime_seats::order_id.eq_any(customer_orders)))
            .execute(conn)?;

        let customer_orders = orders::table
            .filter(orders::customer_id.eq(id))
            .select(orders::id);
        diesel::delete(food_orders::table.filter(food_orders::order_id.eq_any(customer_orders)))
            .execute(conn)?;
        diesel::delete(orders::table.filter(orders::customer_id.eq(id))).execute(conn)?;

        let deleted = diesel::delete(customers::table.find(id)).execute(conn)?;
        if deleted == 0 {
            return Err(ApiError::not_found(format!("Customer {}", id)));
        }
        Ok(())
    })
}
