use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub cloudflare_token: String,
    pub zone: String,
    pub subdomain: String,
}

impl Settings {
    /// Loads settings from `path`, or from `./config.*` and `/config.*` when no path is given.
    /// `DDNS_`-prefixed environment variables override file values.
    pub fn load(path: Option<&str>) -> Result<Self, SettingsError> {
        Self::from_sources(file_sources(path).add_source(Environment::with_prefix("DDNS")))
    }

    fn from_sources(builder: ConfigBuilder<DefaultState>) -> Result<Self, SettingsError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        for (key, value) in [
            ("cloudflare_token", &self.cloudflare_token),
            ("zone", &self.zone),
            ("subdomain", &self.subdomain),
        ] {
            if value.is_empty() {
                return Err(SettingsError::Empty(key));
            }
        }
        Ok(())
    }

    /// Fully-qualified name of the managed record.
    pub fn record_name(&self) -> String {
        format!("{}.{}", self.subdomain, self.zone)
    }
}

fn file_sources(path: Option<&str>) -> ConfigBuilder<DefaultState> {
    let builder = Config::builder();
    match path {
        Some(path) => builder.add_source(File::with_name(&shellexpand::tilde(path)).required(true)),
        None => builder
            .add_source(File::with_name("config").required(false))
            .add_source(File::with_name("/config").required(false)),
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("error reading config: {0}")]
    Config(#[from] ConfigError),
    #[error("config key `{0}` must not be empty")]
    Empty(&'static str),
}
