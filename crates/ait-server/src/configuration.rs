use crate::error::{to_env_var, ConfigError};
use ait::store::JsonFileStore;
use config::{Config, Environment};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::InvalidValue {
                env_var: to_env_var("server.host"),
                reason: e.to_string(),
            })
    }
}

#[derive(Debug, Deserialize)]
pub struct CoordinatorSettings {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl CoordinatorSettings {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct StoreSettings {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl StoreSettings {
    pub fn path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(JsonFileStore::default_path)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub coordinator: CoordinatorSettings,
    #[serde(default)]
    pub store: StoreSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Self::load()?;
        settings.validate()?;
        Ok(settings)
    }

    fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port())?
            .set_default("coordinator.debounce_ms", default_debounce_ms())?
            .set_default(
                "coordinator.request_timeout_secs",
                default_request_timeout_secs(),
            )?
            .add_source(
                Environment::with_prefix("AIT")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        match config.try_deserialize::<Self>() {
            Ok(settings) => Ok(settings),
            Err(err) => {
                tracing::debug!("Configuration error: {:?}", &err);

                let error_str = err.to_string();
                if error_str.starts_with("missing field") {
                    let field = error_str
                        .trim_start_matches("missing field `")
                        .trim_end_matches('`');
                    Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(field),
                    })
                } else if let config::ConfigError::NotFound(field) = &err {
                    Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(field),
                    })
                } else {
                    Err(ConfigError::Other(err))
                }
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.coordinator.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                env_var: to_env_var("coordinator.request_timeout_secs"),
                reason: "must be at least one second".to_string(),
            });
        }
        self.server.socket_addr()?;
        Ok(())
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_request_timeout_secs() -> u64 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn clean_env() {
        for (key, _) in env::vars() {
            if key.starts_with("AIT_") {
                env::remove_var(&key);
            }
        }
    }

    #[test]
    #[serial]
    fn test_default_settings() {
        clean_env();

        let settings = Settings::new().unwrap();
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.coordinator.debounce(), Duration::from_millis(300));
        assert_eq!(settings.coordinator.request_timeout(), Duration::from_secs(60));
        assert_eq!(settings.store.path(), JsonFileStore::default_path());
    }

    #[test]
    #[serial]
    fn test_environment_override() {
        clean_env();
        env::set_var("AIT_SERVER__PORT", "8080");
        env::set_var("AIT_COORDINATOR__DEBOUNCE_MS", "50");
        env::set_var("AIT_STORE__PATH", "/tmp/ait-test/storage.json");

        let settings = Settings::new().unwrap();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.coordinator.debounce_ms, 50);
        assert_eq!(
            settings.store.path(),
            PathBuf::from("/tmp/ait-test/storage.json")
        );

        clean_env();
    }

    #[test]
    #[serial]
    fn test_zero_timeout_is_rejected() {
        clean_env();
        env::set_var("AIT_COORDINATOR__REQUEST_TIMEOUT_SECS", "0");

        let err = Settings::new().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref env_var, .. }
                if env_var == "AIT_COORDINATOR__REQUEST_TIMEOUT_SECS"
        ));

        clean_env();
    }

    #[test]
    #[serial]
    fn test_bad_host_is_rejected() {
        clean_env();
        env::set_var("AIT_SERVER__HOST", "not a host");

        assert!(matches!(
            Settings::new(),
            Err(ConfigError::InvalidValue { .. })
        ));

        clean_env();
    }

    #[test]
    fn test_socket_addr_conversion() {
        let server_settings = ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 3000,
        };
        let addr = server_settings.socket_addr().unwrap();
        assert_eq!(addr.to_string(), "127.0.0.1:3000");
    }
}
