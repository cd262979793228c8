use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {env_var}: {reason}")]
    InvalidValue { env_var: String, reason: String },

    #[error(transparent)]
    Load(#[from] config::ConfigError),
}

/// Environment variable that sets the dotted settings key `field`
pub fn to_env_var(field: &str) -> String {
    format!("TEAMBRIDGE_{}", field.replace('.', "__").to_uppercase())
}
