use clap::Parser;
use log::LevelFilter;

#[derive(Parser, Clone)]
#[command(version, about)]
pub struct BootstrapConfig {
    #[clap(short('c'), long("config"), env("SHUTTLE_CONFIG"), default_value_os = "config.yaml")]
    pub config_file: String,
    #[clap(short('l'), long("log-level"), env("SHUTTLE_LOG_LEVEL"), default_value_t, value_enum)]
    pub log_level: LogLevel,
    /// Key for the directions service. Without it every travel time is estimated.
    #[clap(long("maps-api-key"), env("SHUTTLE_MAPS_API_KEY"), hide_env_values = true)]
    pub maps_api_key: Option<String>,
    /// Token appended to realtime database reads
    #[clap(long("demand-auth"), env("SHUTTLE_DEMAND_AUTH"), hide_env_values = true)]
    pub demand_auth: Option<String>,
    /// Plan once, print the routes and exit instead of serving
    #[clap(long("once"))]
    pub once: bool,
}

impl BootstrapConfig {
    pub fn read() -> Self {
        BootstrapConfig::parse()
    }
}

#[derive(clap::ValueEnum, Clone, Default)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Off => Self::Off,
            LogLevel::Error => Self::Error,
            LogLevel::Warn => Self::Warn,
            LogLevel::Info => Self::Info,
            LogLevel::Debug => Self::Debug,
            LogLevel::Trace => Self::Trace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags() {
        let config = BootstrapConfig::try_parse_from([
            "shuttle", "--config", "prod.yaml", "--log-level", "debug", "--once",
        ]).unwrap();

        assert_eq!(config.config_file, "prod.yaml");
        assert_eq!(LevelFilter::from(config.log_level), LevelFilter::Debug);
        assert!(config.once);
    }
}
