//! Configuration loading from disk: a single `load_config` at
//! agent start, plus an explicit `reload` the presentation UI can trigger.
//! Config invalidity at load time is one of the few conditions this core
//! treats as fatal, so parse failures here return `AgentError::Config`
//! rather than silently degrading — per-field defaults only kick in for
//! fields that are merely *absent*, not malformed.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{AgentError, Result};

use super::types::Config;

pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("career-pilot")
}

pub fn default_config_path() -> PathBuf {
    config_dir().join("config.yaml")
}

/// Load and validate a config document from `path`. YAML parse errors are
/// fatal at load time; a missing field
/// inside an otherwise-valid document falls back to the field's default
/// via `#[serde(default)]` on `Config`/`GeneralConfig`/`Preset`.
pub fn load_config(path: &Path) -> Result<Config> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AgentError::Config(format!("cannot read {}: {e}", path.display())))?;

    let config: Config = serde_yaml::from_str(&raw)
        .map_err(|e| AgentError::Config(format!("invalid config at {}: {e}", path.display())))?;

    validate(&config)?;
    info!(path = %path.display(), "config loaded");
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if !config.general.scenario_confirmed {
        return Err(AgentError::Config(
            "scenario_confirmed is false; the presentation UI must confirm the active scenario/preset pairing before the core will start".to_string(),
        ));
    }
    if config.active_preset().is_none() {
        return Err(AgentError::Config(format!(
            "no preset registered for active scenario '{}'",
            config.general.scenario
        )));
    }
    Ok(())
}

/// Reload the config from the same path, logging and keeping the prior
/// snapshot on failure rather than tearing down a running career.
pub fn reload_or_keep(path: &Path, previous: &Config) -> Config {
    match load_config(path) {
        Ok(fresh) => fresh,
        Err(error) => {
            warn!(error = %error, "config reload failed, keeping previous snapshot");
            previous.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{contents}").unwrap();
        file
    }

    #[test]
    fn rejects_unconfirmed_scenario() {
        let file = write_temp(
            r#"
general:
  scenario: ura
  scenarioConfirmed: false
scenarios:
  ura:
    presets:
      - name: test
        targetStats: {}
"#,
        );
        let result = load_config(file.path());
        assert!(result.is_err());
    }

    #[test]
    fn accepts_confirmed_scenario_with_a_preset() {
        let file = write_temp(
            r#"
general:
  scenario: ura
  scenarioConfirmed: true
scenarios:
  ura:
    presets:
      - name: test
        targetStats: {}
"#,
        );
        let result = load_config(file.path());
        assert!(result.is_ok());
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let result = load_config(Path::new("/nonexistent/path/config.yaml"));
        assert!(result.is_err());
    }
}
