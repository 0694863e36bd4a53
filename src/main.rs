#[macro_use]
extern crate serde_derive;

mod config;
mod data;
mod logger;
mod models;
mod mongo;
mod orm;
mod services;

use std::sync::Arc;

use actix_web::{
    middleware::{Logger, NormalizePath, TrailingSlash},
    web, App, HttpServer,
};

use clap::{App as Cli, Arg};

use log::info;

use crate::config::Config;
use crate::data::Data;
use crate::logger::Logger as AppLogger;
use crate::mongo::MongoDB;
use crate::orm::store::memory::Memory;
use crate::orm::{Db, Store};

const API_VERSION: &str = "v1";
const DEFAULT_CONFIG: &str = "config/config.toml";

#[actix_rt::main]
async fn main() -> std::io::Result<()> {
    let matches = Cli::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("FILE")
                .help("Path of the TOML configuration")
                .takes_value(true),
        )
        .get_matches();

    let path = matches.value_of("config").unwrap_or(DEFAULT_CONFIG);
    let config = Config::new(path);

    AppLogger::init(config.log.as_ref());
    info!("\"{}\" loaded correctly.", path);

    let _guard = config
        .sentry
        .as_ref()
        .map(|sentry| sentry::init(sentry.dsn.as_str()));

    let store: Arc<dyn Store> = if config.store.backend == "memory" {
        info!("Using the in-memory store, nothing will be persisted");

        Arc::new(Memory::new())
    } else {
        let mongo = config.mongo.as_ref().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Missing [mongo] configuration",
            )
        })?;

        Arc::new(
            MongoDB::new(mongo)
                .await
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?,
        )
    };

    let registry = models::registry()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    info!("Registered models: {:?}", registry.names());

    let data = Data::new(Db::new(store, registry), &config.auth);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(data.clone()))
            .wrap(NormalizePath::new(TrailingSlash::Trim))
            .wrap(Logger::default())
            .service(web::scope(&format!("/api/{}", API_VERSION)).configure(services::config))
    })
    .bind(format!(
        "{}:{}",
        config.server.bind_address, config.server.bind_port
    ))?
    .run()
    .await
}
