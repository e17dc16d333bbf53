use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::config::AppConfig;
use crate::{BridgeError, BridgeResult};

/// Config file picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "bg-remover.toml";
/// Prefix for environment overrides, e.g. `BG_REMOVER_SERVER__PORT=8080`.
pub const ENV_PREFIX: &str = "BG_REMOVER_";

/// Load configuration from defaults, an optional TOML file and the environment, in that order.
///
/// An explicit `path` must exist; the default file is optional.
pub fn load_config(path: Option<&Path>) -> BridgeResult<AppConfig> {
    let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

    match path {
        Some(path) if !path.exists() => {
            return Err(BridgeError::Config {
                message: format!("Config file not found: {}", path.display()),
            });
        }
        Some(path) => figment = figment.merge(Toml::file(path)),
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            figment = figment.merge(Toml::file(DEFAULT_CONFIG_FILE));
        }
        None => {}
    }

    let config: AppConfig = figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| BridgeError::Config {
            message: format!("Failed to load configuration: {e}"),
        })?;

    config.validate()?;
    Ok(config)
}
