use serde::de::DeserializeOwned;

use crate::environment::Environment;

/// Directory containing configuration files relative to application root.
const CONFIGURATION_DIR: &str = "configuration";

/// Base configuration file loaded for all environments.
const BASE_CONFIG_FILE: &str = "base.yaml";

/// Prefix for environment variable configuration overrides.
const ENV_PREFIX: &str = "APP";

/// Separator between environment variable prefix and key segments.
const ENV_PREFIX_SEPARATOR: &str = "_";

/// Separator for nested configuration keys in environment variables.
///
/// Example: `APP_SOURCE__HOST` sets the `source.host` field.
const ENV_SEPARATOR: &str = "__";

/// Loads hierarchical configuration from YAML files and environment variables.
///
/// Loads configuration in this order:
/// 1. Base configuration from `configuration/base.yaml`
/// 2. Environment-specific file from `configuration/{environment}.yaml`
/// 3. Environment variable overrides prefixed with `APP`
///
/// Nested keys use double underscores: `APP_REPLICA__PORT` → `replica.port`.
///
/// # Panics
/// Panics if the current directory cannot be determined or if `APP_ENVIRONMENT`
/// cannot be parsed.
pub fn load_config<T>() -> Result<T, config::ConfigError>
where
    T: DeserializeOwned,
{
    let base_path = std::env::current_dir().expect("Failed to determine the current directory");
    let configuration_directory = base_path.join(CONFIGURATION_DIR);

    // Detect the running environment, defaulting to `prod` if unspecified.
    let environment = Environment::load().expect("Failed to parse APP_ENVIRONMENT.");

    let environment_filename = format!("{environment}.yaml");

    let environment_source = config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator(ENV_PREFIX_SEPARATOR)
        .separator(ENV_SEPARATOR);

    let settings = config::Config::builder()
        // Add in settings from the base configuration file.
        .add_source(config::File::from(
            configuration_directory.join(BASE_CONFIG_FILE),
        ))
        // Add in settings from the environment-specific file.
        .add_source(config::File::from(
            configuration_directory.join(environment_filename),
        ))
        // Add in settings from environment variables (with a prefix of APP and
        // '__' as separator). E.g. `APP_SOURCE__ADMIN__USERNAME=mirror` sets
        // `source.admin.username` to `mirror`.
        .add_source(environment_source)
        .build()?;

    settings.try_deserialize::<T>()
}
