use actix_web::web;
use anyhow::anyhow;
use diesel::r2d2::ConnectionManager;
use diesel::PgConnection;
use r2d2::Pool;

use crate::auth::TokenService;
use crate::config::Settings;
use crate::error::Result;
use crate::pricing::SeatPricing;

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

/// Services shared by every handler, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub tokens: TokenService,
    pub pricing: SeatPricing,
}

impl AppState {
    pub fn new(pool: DbPool, settings: &Settings) -> Self {
        Self {
            pool,
            tokens: TokenService::new(
                settings.auth.jwt_secret.clone(),
                settings.auth.token_ttl_minutes,
            ),
            pricing: settings.pricing,
        }
    }

    /// Runs `f` with a pooled connection on the blocking thread pool.
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut PgConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        web::block(move || {
            let mut conn = pool
                .get()
                .map_err(|e| anyhow!("Couldn't get db connection from pool: {}", e))?;
            f(&mut conn)
        })
        .await?
    }
}

pub fn build_pool(database_url: &str, max_size: u32) -> anyhow::Result<DbPool> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Pool::builder()
        .max_size(max_size)
        .build(manager)
        .map_err(|e| anyhow!("Failed to create pool: {}", e))
}
