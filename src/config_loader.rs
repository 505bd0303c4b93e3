use crate::config::ScenarioConfig;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;
use std::fs::File;
use std::path::Path;
use std::time::Duration;

/// Load, parse and validate a scenario from a YAML file
pub fn load_config(config_path: &Path) -> Result<ScenarioConfig> {
    info!("Loading configuration from: {:?}", config_path);

    let file = File::open(config_path)
        .wrap_err_with(|| format!("Failed to open configuration file {:?}", config_path))?;

    let config: ScenarioConfig = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Failed to parse configuration file {:?}", config_path))?;

    config.validate()?;

    Ok(config)
}

/// CLI arguments that override scenario settings
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub node_count: Option<usize>,
    pub stop_time: Option<Duration>,
    /// `Some(false)` suppresses the diagnostics table
    pub diagnostics: Option<bool>,
}

/// Apply CLI overrides to a scenario configuration
pub fn apply_cli_overrides(config: &mut ScenarioConfig, overrides: &CliOverrides) -> Result<()> {
    if let Some(node_count) = overrides.node_count {
        info!("Overriding node count: {} -> {}", config.network.node_count, node_count);
        config.network.node_count = node_count;
    }

    if let Some(stop_time) = overrides.stop_time {
        info!("Overriding stop time: {:?} -> {:?}", config.general.stop_time, stop_time);
        config.general.stop_time = stop_time;
    }

    if let Some(diagnostics) = overrides.diagnostics {
        config.general.diagnostics = diagnostics;
    }

    // Re-validate after applying overrides
    config.validate()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidationError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config() {
        let yaml = r#"
general:
  stop_time: "60s"
network:
  node_count: 9
probes:
  policy: all_pairs
  payload_size: 24
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", yaml).unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.general.stop_time, Duration::from_secs(60));
        assert_eq!(config.network.node_count, 9);
    }

    #[test]
    fn test_load_invalid_config() {
        let yaml = r#"
network:
  node_count: 0
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", yaml).unwrap();

        let err = load_config(temp_file.path()).unwrap_err();
        assert!(err.downcast_ref::<ValidationError>().is_some());
    }

    #[test]
    fn test_load_malformed_config() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "general: [not, a, map]").unwrap();
        assert!(load_config(temp_file.path()).is_err());

        assert!(load_config(Path::new("/nonexistent/scenario.yaml")).is_err());
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = ScenarioConfig::default();
        let overrides = CliOverrides {
            node_count: Some(20),
            stop_time: Some(Duration::from_secs(300)),
            diagnostics: Some(false),
        };

        apply_cli_overrides(&mut config, &overrides).unwrap();
        assert_eq!(config.network.node_count, 20);
        assert_eq!(config.general.stop_time, Duration::from_secs(300));
        assert!(!config.general.diagnostics);
    }

    #[test]
    fn test_overrides_are_revalidated() {
        let mut config = ScenarioConfig::default();
        let overrides = CliOverrides {
            node_count: Some(0),
            ..CliOverrides::default()
        };
        assert!(apply_cli_overrides(&mut config, &overrides).is_err());
    }
}
