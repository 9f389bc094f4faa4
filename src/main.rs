#[macro_use]
extern crate rocket;
#[macro_use]
extern crate log;

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::FixedOffset;

use crate::achievements::award::AchievementEngine;
use crate::achievements::repository::AchievementStores;
use crate::achievements::worker::{spawn_evaluation_worker, AchievementQueue};
use crate::config::ApiConfig;
use crate::database::Database;
use crate::util::error::ApiErrorResponder;

mod achievements;
mod config;
mod database;
mod http;
mod util;

pub struct ForgeAPIState {
    pub config: ApiConfig,
    pub database: Arc<Database>,
    pub engine: Arc<AchievementEngine>,
    pub evaluation_queue: AchievementQueue,
}

fn setup_logging(configured_level: &str) -> Result<()> {
    let level = configured_level.parse::<log::LevelFilter>().unwrap_or(log::LevelFilter::Info);
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{}] [{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .level_for("rocket", log::LevelFilter::Warn)
        .chain(std::io::stdout())
        .apply()
        .context("Could not install the logger")?;
    Ok(())
}

#[catch(401)]
fn catch_unauthorized() -> ApiErrorResponder {
    ApiErrorResponder::unauthorized()
}

#[catch(422)]
fn catch_unprocessable() -> ApiErrorResponder {
    ApiErrorResponder::validation_error()
}

#[rocket::main]
async fn main() -> Result<()> {
    let config = config::load_config()?;
    setup_logging(&config.log_level)?;

    let database = Arc::new(Database::connect(&config.mongo).await?);
    database.ensure_indexes().await?;
    info!("Connected to MongoDB database '{}'", config.mongo.database);

    let offset = FixedOffset::east_opt(config.utc_offset_hours * 3600)
        .context("utcOffsetHours is out of range")?;
    let engine = Arc::new(AchievementEngine::new(AchievementStores::mongo(database.clone()), offset));
    let evaluation_queue = spawn_evaluation_worker(engine.clone());

    let state = ForgeAPIState {
        config: config.clone(),
        database,
        engine,
        evaluation_queue,
    };

    let cors = rocket_cors::CorsOptions::default()
        .to_cors()
        .context("Invalid CORS configuration")?;
    let figment = rocket::Config::figment()
        .merge(("address", config.listen.host.clone()))
        .merge(("port", config.listen.port));
    let rocket_build = rocket::custom(figment)
        .manage(state)
        .attach(cors)
        .register("/", catchers![catch_unauthorized, catch_unprocessable]);
    let rocket_build = http::badges::mount(rocket_build);
    rocket_build.launch().await?;
    Ok(())
}
