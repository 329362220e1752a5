use crate::config::EngineConfig;
use crate::validation::validate_config;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads engine configuration by merging defaults, TOML, environment
    /// variables, and JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be read or parsed, or
    /// if the merged values violate documented ranges.
    pub fn load() -> Result<EngineConfig> {
        let config: EngineConfig = Figment::from(Serialized::defaults(EngineConfig::default()))
            .merge(Toml::file("config/Engine.toml"))
            .merge(Env::prefixed("PATTERN_BET_"))
            .join(Json::file("config/Engine.json"))
            .extract()?;

        validate_config(&config)?;
        Ok(config)
    }

    /// Loads engine configuration with a specific profile overlay.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be read or parsed, or
    /// if the merged values violate documented ranges.
    pub fn load_with_profile(profile: &str) -> Result<EngineConfig> {
        let config: EngineConfig = Figment::from(Serialized::defaults(EngineConfig::default()))
            .merge(Toml::file("config/Engine.toml"))
            .merge(Toml::file(format!("config/Engine.{profile}.toml")))
            .merge(Env::prefixed("PATTERN_BET_"))
            .join(Json::file("config/Engine.json"))
            .extract()?;

        validate_config(&config)?;
        Ok(config)
    }
}
