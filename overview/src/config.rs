use docstore::config::StoreConfig;
use ingest::config::Config as IngestConfig;
use serde::Deserialize;
use std::fs::File;

#[derive(Debug, Deserialize)]
pub struct MetricsConfig {
    pub statsd_host: String,
    pub statsd_port: u16,
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    pub sentry_dsn: String,
}

#[derive(Debug, Deserialize)]
pub struct CommonConfig {
    pub metrics: Option<MetricsConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(flatten)]
    pub common: CommonConfig,
    pub ingest: IngestConfig,
    pub store: StoreConfig,
}

impl Config {
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let config: Config = serde_yaml::from_reader(file)?;
        config.ingest.validate()?;
        config.store.validate()?;

        Ok(config)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
    #[error("invalid ingest config: {0}")]
    InvalidIngest(#[from] ingest::config::ValidationError),
    #[error("invalid store config: {0}")]
    InvalidStore(#[from] docstore::config::ValidationError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_tmp_file(s: &str) -> tempfile::NamedTempFile {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        write!(tmp, "{}", s).expect("write yaml");

        tmp
    }

    #[test]
    fn test_full_config() {
        let yaml = r#"
            metrics:
                statsd_host: 127.0.0.1
                statsd_port: 8125
            logging:
                sentry_dsn: https://key@sentry.example.com/1
            ingest:
                listener:
                    host: 0.0.0.0
                    port: 8080
                collection: companies
            store:
                project_id: easy-companies-overview
                base_url: https://store.example.com
                api_key: secret
            "#;
        let tmp = write_tmp_file(yaml);
        let config = Config::from_file(tmp.path()).expect("load config");

        assert_eq!(config.ingest.listener.port, 8080);
        assert_eq!(config.ingest.collection, "companies");
        assert_eq!(config.store.project_id, "easy-companies-overview");
        assert_eq!(
            config.common.metrics.expect("metrics config").statsd_port,
            8125
        );
        assert!(config.common.logging.is_some());
    }

    #[test]
    fn test_metrics_and_logging_are_optional() {
        let yaml = r#"
            ingest:
                listener:
                    host: 127.0.0.1
                    port: 8080
            store:
                project_id: p
                base_url: http://127.0.0.1:9000
            "#;
        let tmp = write_tmp_file(yaml);
        let config = Config::from_file(tmp.path()).expect("load config");

        assert!(config.common.metrics.is_none());
        assert!(config.common.logging.is_none());
        assert_eq!(config.ingest.collection, "companies");
    }

    #[test]
    fn test_invalid_component_config_is_rejected() {
        let yaml = r#"
            ingest:
                listener:
                    host: 127.0.0.1
                    port: 0
            store:
                project_id: p
                base_url: http://127.0.0.1:9000
            "#;
        let tmp = write_tmp_file(yaml);
        assert!(matches!(
            Config::from_file(tmp.path()).unwrap_err(),
            ConfigError::InvalidIngest(_)
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = Config::from_file(std::path::Path::new("/nonexistent.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::LoadError(_)));
    }
}
