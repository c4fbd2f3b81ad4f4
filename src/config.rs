use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ImportConfig {
    #[serde(default = "default_locale")]
    pub default_locale: String,
    #[serde(default = "default_confidence")]
    pub default_confidence: f64,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            default_locale: default_locale(),
            default_confidence: default_confidence(),
            include_globs: default_include_globs(),
            exclude_globs: Vec::new(),
        }
    }
}

fn default_locale() -> String {
    "en-US".to_string()
}
fn default_confidence() -> f64 {
    0.8
}
fn default_include_globs() -> Vec<String> {
    vec!["**/*.json".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
        }
    }
}

fn default_output() -> PathBuf {
    PathBuf::from("data/catalog.json")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ValidationConfig {
    #[serde(default = "default_max_calories")]
    pub max_calories_per_100g: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_calories_per_100g: default_max_calories(),
        }
    }
}

fn default_max_calories() -> f64 {
    1000.0
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    check(&config)?;
    Ok(config)
}

fn check(config: &Config) -> Result<()> {
    if config.import.default_locale.trim().is_empty() {
        anyhow::bail!("import.default_locale must not be empty");
    }

    if !(0.0..=1.0).contains(&config.import.default_confidence) {
        anyhow::bail!("import.default_confidence must be in [0.0, 1.0]");
    }

    if config.validation.max_calories_per_100g <= 0.0 {
        anyhow::bail!("validation.max_calories_per_100g must be > 0");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.import.default_locale, "en-US");
        assert_eq!(config.import.default_confidence, 0.8);
        assert_eq!(config.import.include_globs, vec!["**/*.json".to_string()]);
        assert_eq!(config.catalog.output, PathBuf::from("data/catalog.json"));
        assert_eq!(config.validation.max_calories_per_100g, 1000.0);
        assert!(check(&config).is_ok());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config: Config = toml::from_str(
            r#"
            [import]
            default_locale = "en-GB"

            [validation]
            max_calories_per_100g = 900.0
            "#,
        )
        .unwrap();
        assert_eq!(config.import.default_locale, "en-GB");
        assert_eq!(config.import.default_confidence, 0.8);
        assert_eq!(config.validation.max_calories_per_100g, 900.0);
    }

    #[test]
    fn out_of_range_confidence_rejected() {
        let config: Config = toml::from_str("[import]\ndefault_confidence = 1.5\n").unwrap();
        assert!(check(&config).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = load_config(Path::new("/nonexistent/catalog.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
