use dotenvy::dotenv;
use regex::{Captures, Regex};
use serde::de::DeserializeOwned;
use std::sync::LazyLock;
use std::{env, fs};
use thiserror::Error;

static ENV_VAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([a-zA-Z_][0-9a-zA-Z_]*)\}").expect("static regex"));

#[allow(clippy::enum_variant_names)]
#[derive(Debug, Error)]
pub enum LoadConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
    #[error("Error loading config: {0}")]
    ConfigError(String),
}

/// A struct that lives under its own `[section]` of a TOML config file
pub trait ConfigSection: DeserializeOwned {
    const SECTION: &'static str;

    fn load_section_from_file_sync(file_name: &str) -> Result<Self, LoadConfigError> {
        let table: toml::Table = load_from_file_sync(file_name)?;
        section_from_table(table, Self::SECTION)
    }

    #[allow(async_fn_in_trait)]
    async fn load_section_from_file(file_name: &str) -> Result<Self, LoadConfigError> {
        let table: toml::Table = load_from_file(file_name).await?;
        section_from_table(table, Self::SECTION)
    }
}

fn section_from_table<T: DeserializeOwned>(mut table: toml::Table, section: &str) -> Result<T, LoadConfigError> {
    let value = table
        .remove(section)
        .ok_or_else(|| LoadConfigError::ConfigError(format!("missing [{}] section", section)))?;
    Ok(value.try_into::<T>()?)
}

pub async fn load_from_file<T: DeserializeOwned>(file_name: &str) -> Result<T, LoadConfigError> {
    dotenv().ok();
    let contents = tokio::fs::read_to_string(file_name).await?;
    parse_config(&contents)
}

pub fn load_from_file_sync<T: DeserializeOwned>(file_name: &str) -> Result<T, LoadConfigError> {
    dotenv().ok();
    let contents = fs::read_to_string(file_name)?;
    parse_config(&contents)
}

/// Parse TOML after substituting `${VAR}` references from the environment
pub fn parse_config<T: DeserializeOwned>(raw_config: &str) -> Result<T, LoadConfigError> {
    let contents = expand_vars(raw_config);
    Ok(toml::from_str(&contents)?)
}

fn expand_vars(raw_config: &str) -> String {
    // unknown variables are left as-is
    ENV_VAR_RE
        .replace_all(raw_config, |caps: &Captures| match env::var(&caps[1]) {
            Ok(val) => val,
            Err(_) => caps[0].to_string(),
        })
        .to_string()
}
