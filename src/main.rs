use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use dotenvy::dotenv;
use env_logger::Env;

use cinema_api::config::Settings;
use cinema_api::db;
use cinema_api::routes;
use cinema_api::state::{build_pool, AppState};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let settings = Settings::load()?;
    let pool = build_pool(&settings.database.url, settings.database.pool_size)?;
    db::run_migrations(&pool)?;

    let state = web::Data::new(AppState::new(pool, &settings));
    let (host, port) = (settings.server.host.clone(), settings.server.port);
    log::info!("listening on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(routes::configure)
    })
    .workers(settings.server.workers)
    .bind((host.as_str(), port))
    .with_context(|| format!("Failed to bind {}:{}", host, port))?
    .run()
    .await?;
    Ok(())
}
