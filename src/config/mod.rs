// Configuration module entry point
// Loads settings from file and environment and holds the shared runtime state

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{Config, HttpConfig, LoggingConfig, StorageConfig};

/// Environment variable prefix, e.g. `ISSUES_SERVER__PORT=8080`
const ENV_PREFIX: &str = "ISSUES";

impl Config {
    /// Load configuration from specified file path (extension optional).
    ///
    /// The file is optional; `ISSUES_*` environment variables override it and
    /// anything still missing takes its default.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let cfg: Self = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values that would only fail later, at runtime build or on
    /// every response
    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.server.workers == Some(0) {
            return Err(config::ConfigError::Message(
                "server.workers must be at least 1".to_string(),
            ));
        }
        if hyper::header::HeaderValue::from_str(&self.http.server_name).is_err() {
            return Err(config::ConfigError::Message(format!(
                "http.server_name {:?} is not a valid header value",
                self.http.server_name
            )));
        }
        Ok(())
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::types::ServerConfig;
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent");
        let cfg = Config::load_from(path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.server.port, ServerConfig::default().port);
        assert_eq!(cfg.http, HttpConfig::default());
        assert_eq!(cfg.storage, StorageConfig::default());
    }

    #[test]
    fn test_file_overrides_some_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("issues.toml");
        std::fs::write(
            &path,
            r#"
[server]
port = 9090

[logging]
access_log_format = "json"

[storage]
path = "data/issues.json"
"#,
        )
        .unwrap();

        let cfg = Config::load_from(path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.logging.access_log_format, "json");
        assert!(cfg.logging.access_log);
        assert_eq!(
            cfg.storage.path.as_deref(),
            Some(std::path::Path::new("data/issues.json"))
        );
    }

    #[test]
    fn test_zero_workers_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zero.toml");
        std::fs::write(&path, "[server]\nworkers = 0\n").unwrap();
        let err = Config::load_from(path.to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("server.workers"));

        std::fs::write(&path, "[server]\nworkers = 2\n").unwrap();
        let cfg = Config::load_from(path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.server.workers, Some(2));
    }

    #[test]
    fn test_bad_server_name_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("name.toml");
        std::fs::write(&path, "[http]\nserver_name = \"bad\\nname\"\n").unwrap();
        let err = Config::load_from(path.to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("http.server_name"));
    }

    #[test]
    fn test_socket_addr() {
        let mut cfg = Config::default();
        assert_eq!(
            cfg.get_socket_addr().unwrap(),
            "127.0.0.1:3000".parse().unwrap()
        );
        cfg.server.host = "not a host".to_string();
        assert!(cfg.get_socket_addr().is_err());
    }
}
