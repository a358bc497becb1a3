use diesel::{ExpressionMethods, PgConnection, QueryResult, RunQueryDsl};

/// Entities identified by a human-readable prefixed id such as `CIN001`.
/// Food items are catalogued outside the API and keep their own ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    Movie,
    Cinema,
    Showtime,
    Customer,
}

impl IdKind {
    fn counter(&self) -> &'static str {
        match self {
            IdKind::Movie => "movie",
            IdKind::Cinema => "cinema",
            IdKind::Showtime => "showtime",
            IdKind::Customer => "customer",
        }
    }

    fn prefix(&self) -> &'static str {
        match self {
            IdKind::Movie => "MOV",
            IdKind::Cinema => "CIN",
            IdKind::Showtime => "ST",
            IdKind::Customer => "CUS",
        }
    }

    pub fn format(&self, number: i32) -> String {
        format!("{}{:03}", self.prefix(), number)
    }
}

/// Bumps the counter for `kind` and returns the formatted id. The upsert
/// takes a row lock, so concurrent callers never receive the same number.
pub fn next_id(conn: &mut PgConnection, kind: IdKind) -> QueryResult<String> {
    use crate::schema::id_counters::dsl::*;

    let number = diesel::insert_into(id_counters)
        .values((entity.eq(kind.counter()), last_value.eq(1)))
        .on_conflict(entity)
        .do_update()
        .set(last_value.eq(last_value + 1))
        .returning(last_value)
        .get_result::<i32>(conn)?;

    Ok(kind.format(number))
}
