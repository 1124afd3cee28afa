// Configuration loader
// Loads settings from ~/.attache/config.toml with environment overrides

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use super::settings::Config;

/// Load configuration from the attache config file, falling back to
/// defaults when no file exists.
pub fn load_config() -> Result<Config> {
    let working_dir = match std::env::var("ATTACHE_WORKDIR") {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => std::env::current_dir().context("Could not determine current directory")?,
    };

    let mut config = Config::new(working_dir);

    if let Some(file) = try_load_config_file()? {
        if let Some(dir) = file.working_dir {
            // Explicit env override still wins over the file
            if std::env::var("ATTACHE_WORKDIR").is_err() {
                config.working_dir = dir;
            }
        }
        if let Some(path) = file.token_path {
            config.token_path = path;
        }
        if let Some(tz) = file.time_zone {
            config.time_zone = tz;
        }
    }

    Ok(config)
}

#[derive(serde::Deserialize)]
struct TomlConfig {
    #[serde(default)]
    working_dir: Option<PathBuf>,
    #[serde(default)]
    token_path: Option<PathBuf>,
    #[serde(default)]
    time_zone: Option<String>,
}

fn try_load_config_file() -> Result<Option<TomlConfig>> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    let config_path = home.join(".attache/config.toml");

    if !config_path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read {}", config_path.display()))?;

    let parsed: TomlConfig = toml::from_str(&contents).context("Failed to parse config.toml")?;
    Ok(Some(parsed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::new(PathBuf::from("/tmp/work"));
        assert_eq!(config.working_dir, PathBuf::from("/tmp/work"));
        assert_eq!(config.time_zone, "America/Los_Angeles");
        assert!(config.token_path.ends_with(".attache/token.json"));
    }

    #[test]
    fn test_toml_parsing() {
        let parsed: TomlConfig = toml::from_str(
            r#"
            working_dir = "/srv/inbox"
            time_zone = "Europe/Berlin"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.working_dir, Some(PathBuf::from("/srv/inbox")));
        assert_eq!(parsed.time_zone.as_deref(), Some("Europe/Berlin"));
        assert!(parsed.token_path.is_none());
    }
}
