//! Engine configuration loading.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use stepjob_exec::EngineConfig;

/// Loads the engine configuration from a JSON file, or the defaults when no
/// file is given. Program paths are still subject to the `STEPJOB_SCHEDULER`
/// and `STEPJOB_MAIL` overrides at resolution time.
pub fn load_engine_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: EngineConfig = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    tracing::debug!(target: "stepjob::engine", path = %path.display(), "loaded engine config");
    Ok(config)
}
