//! Configuration management for the house price service

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Default location of the optional configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Environment variable prefix, e.g. `HOUSE_PRICE__SERVER__PORT=9000`
pub const ENV_PREFIX: &str = "HOUSE_PRICE";

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub features: FeatureConfig,
    pub metrics: MetricsConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// Persisted model artifacts produced by the training job
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Serialized trained model (`.json`, or `.onnx` with the `onnx` feature)
    pub model_path: String,
    /// Serialized ordered feature-name list
    pub columns_path: String,
    /// Number of threads for ONNX inference
    pub onnx_threads: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_path: "models/best_model.json".to_string(),
            columns_path: "models/columns.json".to_string(),
            onnx_threads: 1,
        }
    }
}

/// How raw input fields map onto the trained columns
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Categorical field listed by `GET /regioes`
    pub region_field: String,
    /// Categorical fields encoded as `<field>_<value>` columns
    pub one_hot_fields: Vec<String>,
    /// Fields given as sim/não strings
    pub boolean_fields: Vec<String>,
    /// Fields that must hold numbers; numeric text like `"120"` is accepted
    pub numeric_fields: Vec<String>,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            region_field: "regiao".to_string(),
            one_hot_fields: vec!["regiao".to_string()],
            boolean_fields: default_boolean_fields(),
            numeric_fields: default_numeric_fields(),
        }
    }
}

fn default_boolean_fields() -> Vec<String> {
    [
        "mobiliado",
        "elevador",
        "churrasqueira",
        "piscina",
        "area_servico",
        "armarios_embutidos",
        "seguranca_24h",
        "playground",
        "academia",
        "salao_festas",
        "sacada_varanda",
        "quintal",
        "pet_friendly",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_numeric_fields() -> Vec<String> {
    [
        "area_m2",
        "quartos",
        "suites",
        "banheiros",
        "vagas_garagem",
        "ano_construcao",
        "condominio_valor",
        "iptu_mensal",
        "area_privativa_m2",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Periodic metrics summary
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Seconds between summaries, 0 disables the reporter
    pub report_interval_secs: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            report_interval_secs: 300,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default file and environment
    pub fn load() -> Result<Self> {
        Self::load_from_path(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific path, overridden by environment.
    ///
    /// The file is optional; every field has a default.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::build(path, environment())
    }

    fn build<P: AsRef<Path>>(path: P, env: Environment) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(env)
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// `host:port` the HTTP listener binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// `HOUSE_PRICE__<SECTION>__<KEY>` overrides; list keys split on commas
fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("features.one_hot_fields")
        .with_list_parse_key("features.boolean_fields")
        .with_list_parse_key("features.numeric_fields")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.bind_address(), "0.0.0.0:8000");
        assert_eq!(config.model.model_path, "models/best_model.json");
        assert_eq!(config.features.region_field, "regiao");
        assert_eq!(config.features.boolean_fields.len(), 13);
        assert!(config
            .features
            .boolean_fields
            .contains(&"pet_friendly".to_string()));
        assert_eq!(config.features.numeric_fields.len(), 9);
        assert!(config.features.numeric_fields.contains(&"area_m2".to_string()));
    }

    #[test]
    fn test_load_from_file_keeps_defaults_for_missing_keys() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 9100

[model]
columns_path = "artifacts/cols.json"

[features]
one_hot_fields = ["regiao", "bairro"]
"#
        )
        .unwrap();

        let config = AppConfig::load_from_path(file.path()).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.model.columns_path, "artifacts/cols.json");
        assert_eq!(config.model.model_path, "models/best_model.json");
        assert_eq!(config.features.one_hot_fields, vec!["regiao", "bairro"]);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = AppConfig::load_from_path("does/not/exist.toml").unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.metrics.report_interval_secs, 300);
    }

    #[test]
    fn test_environment_overrides_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[server]\nport = 9100").unwrap();

        // Same variables a deployment would export, without touching the process env
        let vars: config::Map<String, String> = [
            ("HOUSE_PRICE__SERVER__PORT", "9123"),
            ("HOUSE_PRICE__FEATURES__ONE_HOT_FIELDS", "regiao,bairro"),
            ("HOUSE_PRICE__LOGGING__FORMAT", "json"),
            ("OTHER__SERVER__PORT", "1"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let config = AppConfig::build(file.path(), environment().source(Some(vars))).unwrap();
        assert_eq!(config.server.port, 9123);
        assert_eq!(config.features.one_hot_fields, vec!["regiao", "bairro"]);
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.features.region_field, "regiao");
    }
}
