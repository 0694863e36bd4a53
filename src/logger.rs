use env_logger::Env;

use crate::config::LogConfig;

pub struct Logger {}

impl Logger {
    const DEFAULT_LEVEL: &'static str = "info";

    /// `RUST_LOG` wins over the configured level.
    pub fn init(config: Option<&LogConfig>) {
        let level = config
            .map(|config| config.level.as_str())
            .unwrap_or(Self::DEFAULT_LEVEL);

        env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();
    }
}
