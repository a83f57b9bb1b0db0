pub mod gateway;
pub mod show;
pub mod simulate;
pub mod validate;

use anyhow::Context;
use brain_core::envs::EnvsConfig;
use std::path::Path;

/// Load the promotion document, naming the path in any error.
pub fn load_config(path: &Path) -> anyhow::Result<EnvsConfig> {
    EnvsConfig::load(path).with_context(|| format!("failed to load {}", path.display()))
}

/// Text-mode preamble shared by `show` and `validate`.
pub fn print_versions(config: &EnvsConfig) {
    println!("Config Version: {}", config.schema_version_label());
    println!("App Version: {}", config.app_version_label());
}
