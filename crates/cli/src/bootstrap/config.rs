use meridian_dns_domain::{CliOverrides, Config};

/// Load and validate the configuration. Logging is not up yet when this
/// runs, so any problem surfaces as the process exit error.
pub fn load_config(
    config_path: Option<&str>,
    cli_overrides: CliOverrides,
) -> anyhow::Result<Config> {
    let config = Config::load(config_path, cli_overrides)?;
    config.validate()?;
    Ok(config)
}
