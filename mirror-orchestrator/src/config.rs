use mirror_config::load_config;
use mirror_config::shared::OrchestratorConfig;

/// Loads the [`OrchestratorConfig`] and validates it.
pub fn load_orchestrator_config() -> anyhow::Result<OrchestratorConfig> {
    let config = load_config::<OrchestratorConfig>()?;
    config.validate()?;

    Ok(config)
}
