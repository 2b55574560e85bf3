use std::path::Path;

use config::{Config, File, FileFormat};
use eyre::{Context, Result};

use crate::config::models::ClientConfig;

/// Load configuration from a file using the config crate
/// Supports multiple formats: YAML, JSON, TOML, etc.
pub async fn load_config(config_path: &str) -> Result<ClientConfig> {
    load_config_sync(config_path)
}

/// Load configuration synchronously
pub fn load_config_sync(config_path: &str) -> Result<ClientConfig> {
    let config_path = Path::new(config_path);

    // Determine file format based on extension
    let format = match config_path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => FileFormat::Yaml,
        Some("json") => FileFormat::Json,
        Some("ini") => FileFormat::Ini,
        _ => FileFormat::Toml, // Default to TOML
    };

    let settings = Config::builder()
        .add_source(File::new(
            config_path
                .to_str()
                .ok_or_else(|| eyre::eyre!("Invalid UTF-8 path: {}", config_path.display()))?,
            format,
        ))
        .build()
        .with_context(|| format!("Failed to build config from {}", config_path.display()))?;

    let client_config: ClientConfig = settings.try_deserialize().with_context(|| {
        format!(
            "Failed to deserialize config from {}",
            config_path.display()
        )
    })?;

    Ok(client_config)
}

/// Load the configuration at `config_path`, or fall back to defaults when no
/// path is given.
pub async fn load_config_or_default(config_path: Option<&str>) -> Result<ClientConfig> {
    match config_path {
        Some(path) => load_config(path).await,
        None => Ok(ClientConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[tokio::test]
    async fn test_load_toml_config() {
        let toml_content = r#"
fail_on_error_status = true

[transport]
timeout = "5s"

[headers]
"x-api-key" = "secret"

[retry]
max_retries = 2

[stubs."http://localhost:8080/health"]
status = 204
"#;

        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        write!(temp_file, "{}", toml_content).unwrap();

        let config = load_config(temp_file.path().to_str().unwrap())
            .await
            .unwrap();
        assert!(config.fail_on_error_status);
        assert_eq!(config.transport.timeout.as_deref(), Some("5s"));
        assert_eq!(config.headers.len(), 1);
        let retry = config.retry.unwrap();
        assert_eq!(retry.max_retries, 2);
        assert_eq!(retry.base_delay_ms, 100);
        assert_eq!(config.stubs["http://localhost:8080/health"].status, 204);
        // Sections left out keep their defaults
        assert!(config.request_id.enabled);
    }

    #[tokio::test]
    async fn test_load_yaml_config() {
        let yaml_content = r#"
request_id:
  enabled: false
timing:
  enabled: false
logging:
  level: "debug"
  json: true
"#;

        let mut temp_file = NamedTempFile::with_suffix(".yaml").unwrap();
        write!(temp_file, "{}", yaml_content).unwrap();

        let config = load_config(temp_file.path().to_str().unwrap())
            .await
            .unwrap();
        assert!(!config.request_id.enabled);
        assert_eq!(config.request_id.header, "x-request-id");
        assert!(!config.timing.enabled);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
    }

    #[tokio::test]
    async fn test_load_json_config() {
        let json_content = r#"
{
  "headers": { "accept": "application/json" },
  "retry": { "max_retries": 1, "retry_on_status": [503] }
}
"#;

        let mut temp_file = NamedTempFile::with_suffix(".json").unwrap();
        write!(temp_file, "{}", json_content).unwrap();

        let config = load_config(temp_file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(config.headers["accept"], "application/json");
        assert_eq!(config.retry.unwrap().retry_on_status, vec![503]);
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        assert!(load_config("/definitely/not/here.toml").await.is_err());
        assert!(load_config_or_default(None).await.is_ok());
    }
}
