use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {env_var}")]
    MissingEnvVar { env_var: String },

    #[error("Invalid value for {env_var}: {reason}")]
    InvalidValue { env_var: String, reason: String },

    #[error("Configuration error: {0}")]
    Other(#[from] config::ConfigError),
}

/// `server.port` -> `AIT_SERVER__PORT`
pub fn to_env_var(field: &str) -> String {
    format!("AIT_{}", field.to_uppercase().replace('.', "__"))
}
