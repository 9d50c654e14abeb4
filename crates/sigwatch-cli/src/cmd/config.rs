//! Config command

use anyhow::Result;
use sigwatch_core::Config;

/// Print the effective configuration as TOML.
pub fn show(config: &Config) -> Result<()> {
    print!("{}", config.to_toml()?);
    Ok(())
}
