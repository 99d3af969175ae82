//! Single binary web server: REST API for scheduling, rating, and deleting chess matches.
//! Run with: cargo run --bin web
//! Uses PostgreSQL when DATABASE_URL is set (migrations run at startup), otherwise an
//! in-memory store seeded from the CSV files in SEED_DIR. See `config` for all variables.

use actix_web::{middleware::Logger, web::Data, App, HttpServer};
use chess_tournament_web::config::Config;
use chess_tournament_web::{api, auth, Clock, MatchStore, MemoryStore, PgStore, Scheduler};
use std::io::{Error, ErrorKind};
use std::sync::Arc;

async fn open_store(config: &Config) -> std::io::Result<Arc<dyn MatchStore>> {
    match &config.database_url {
        Some(url) => {
            let store = PgStore::connect(url, config.max_connections)
                .await
                .map_err(|e| Error::new(ErrorKind::ConnectionRefused, e))?;
            store.migrate().await.map_err(|e| Error::new(ErrorKind::Other, e))?;
            Ok(Arc::new(store))
        }
        None => {
            log::info!(
                "DATABASE_URL not set, using the in-memory store seeded from {}",
                config.seed_dir.display()
            );
            let store = MemoryStore::from_csv_dir(&config.seed_dir)
                .map_err(|e| Error::new(ErrorKind::InvalidData, e))?;
            Ok(Arc::new(store))
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    let config = Config::from_env();

    let store = open_store(&config).await?;
    let scheduler = Data::new(Scheduler::new(store, Clock::System, config.store_timeout));
    let session_key = config.session_key();
    let session_secure = config.session_secure;

    let bind = (config.host.as_str(), config.port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        App::new()
            .app_data(scheduler.clone())
            .wrap(auth::session_middleware(session_key.clone(), session_secure))
            .wrap(Logger::default())
            .configure(api::configure)
    })
    .bind(bind)?
    .run()
    .await
}
