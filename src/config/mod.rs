use std::env;

use serde::Deserialize;

use crate::models::UserModel;

#[derive(Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    pub mongo: Option<MongoConfig>,
    #[serde(default)]
    pub auth: AuthConfig,
    pub log: Option<LogConfig>,
    pub sentry: Option<SentryConfig>,
}

#[derive(Clone, Deserialize)]
pub struct ServerConfig {
    pub bind_address: String,
    pub bind_port: u32,
}

#[derive(Clone, Deserialize)]
pub struct StoreConfig {
    /// `mongo` or `memory`.
    pub backend: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: "mongo".into(),
        }
    }
}

#[derive(Clone, Deserialize)]
pub struct MongoConfig {
    pub string: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub db_name: String,
    pub user: Option<String>,
    pub password: Option<String>,
}

#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    pub bcrypt_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            bcrypt_cost: UserModel::BCRYPT_ROUNDS,
        }
    }
}

#[derive(Clone, Deserialize)]
pub struct LogConfig {
    pub level: String,
}

#[derive(Clone, Deserialize)]
pub struct SentryConfig {
    pub dsn: String,
}

impl Config {
    /// Called before the logger is initialised; failures panic.
    pub fn new<S: AsRef<str>>(path: S) -> Self {
        match crystalsoft_utils::read_file_string(path.as_ref()) {
            Ok(configuration) => Self::parse(configuration),
            Err(e) => panic!("Couldn't open \"{}\", error: {:#?}", path.as_ref(), e),
        }
    }

    fn parse(configuration: String) -> Self {
        let configuration = envsubst::substitute(configuration, &env::vars().collect())
            .unwrap_or_else(|e| panic!("Error {:#?} expanding the configuration", e));

        toml::from_str(&configuration).unwrap_or_else(|e| {
            panic!(
                "Error {:#?} loading this configuration: {:#?}",
                e, configuration
            )
        })
    }
}
