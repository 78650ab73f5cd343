use crate::config::AppConfig;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads application configuration by merging the default TOML file and
    /// environment variables.
    ///
    /// Environment variables use the `EDGEBET_` prefix with `__` as the
    /// section separator, e.g. `EDGEBET_TRADING__DRY_RUN=false`.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be read or parsed.
    pub fn load() -> Result<AppConfig> {
        Self::load_from("config/Config.toml")
    }

    /// Loads application configuration from a specific TOML file.
    ///
    /// A missing file is not an error: defaults plus environment variables
    /// apply.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed, or an
    /// environment override has the wrong shape.
    pub fn load_from(path: &str) -> Result<AppConfig> {
        let config: AppConfig = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("EDGEBET_").split("__"))
            .extract()?;

        Ok(config)
    }
}
