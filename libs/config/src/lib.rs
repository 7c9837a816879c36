pub mod interpolate;

use std::{
  fs::read_to_string,
  path::{Path, PathBuf},
};

use apq_common::serde_utils::{JsonSchemaExample, JsonSchemaExampleMetadata, BASE_PATH};
use apq_logger::config::LoggerConfigFormat;
use interpolate::interpolate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Top-level configuration of the persisted query gateway.
///
/// Both YAML (`.yaml`, `.yml`) and JSON (`.json`) files are supported.
///
/// ### Interpolation with environment variables
///
/// - `${VAR_NAME}` inserts the value of an environment variable. Unknown variables are replaced with an empty string and reported as a warning.
/// - `${VAR_NAME:-default}` uses `default` when `VAR_NAME` is unset or empty.
/// - `${VAR_NAME:?message}` fails loading with `message` when `VAR_NAME` is unset or empty.
/// - `$$` is a literal `$`.
///
/// ### File references
///
/// Paths inside the configuration (for example a persisted operations manifest) are relative to the directory of the configuration file.
#[derive(Deserialize, Serialize, Debug, Clone, Default, JsonSchema)]
#[schemars(example = "apq_config_example")]
pub struct ApqConfig {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  /// Logger configuration.
  pub logger: Option<LoggerConfig>,
  /// List of plugins applied to every incoming request, in order.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub plugins: Option<Vec<PluginDefinition>>,
}

fn apq_config_example() -> JsonSchemaExample<ApqConfig> {
  JsonSchemaExample {
    metadata: JsonSchemaExampleMetadata::new(
      "Persisted operations from a manifest",
      Some("Resolves persisted query identifiers using the manifest produced by the client build, and logs in JSON."),
    ),
    wrapper: None,
    example: ApqConfig {
      logger: Some(LoggerConfig {
        format: LoggerConfigFormat::Json,
        ..Default::default()
      }),
      plugins: Some(vec![PluginDefinition::PersistedOperationsPlugin {
        enabled: Default::default(),
        config: Some(persisted_operations_plugin::Config {
          store: Some(persisted_operations_plugin::Store::File {
            file: apq_common::serde_utils::LocalFileReference {
              path: "persisted-query-manifest.json".to_string(),
              contents: "".to_string(),
            },
            format: persisted_operations_plugin::FileFormat::ApolloPersistedQueryManifest,
          }),
        }),
      }]),
    },
  }
}

fn default_plugin_enabled() -> Option<bool> {
  Some(true)
}

#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
#[serde(tag = "type")]
pub enum PluginDefinition {
  #[serde(rename = "persisted_operations")]
  PersistedOperationsPlugin {
    #[serde(
      default = "default_plugin_enabled",
      skip_serializing_if = "Option::is_none"
    )]
    enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    config: Option<persisted_operations_plugin::Config>,
  },
}

#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct LoggerConfig {
  /// `EnvFilter` directives, separated by commas.
  ///
  /// - `info` logs all messages at info level and higher across all modules.
  ///
  /// - `info,persisted_operations_plugin=debug` also logs every resolved and unknown persisted query identifier.
  ///
  /// See [tracing_subscriber::EnvFilter](https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html) for the full syntax.
  #[serde(default = "default_log_filter")]
  pub filter: String,
  /// Output format. By default, `pretty` is used in debug builds; release builds use `compact` in TTY environments and `json` otherwise.
  #[serde(default)]
  pub format: LoggerConfigFormat,
  /// Emits a line with timing information when a gateway execution span closes.
  #[serde(default)]
  pub print_performance_info: bool,
}

impl Default for LoggerConfig {
  fn default() -> Self {
    Self {
      filter: default_log_filter(),
      format: LoggerConfigFormat::default(),
      print_performance_info: false,
    }
  }
}

fn default_log_filter() -> String {
  "info".to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("failed to read config file {path:?}: {source}")]
  ReadError {
    path: String,
    source: std::io::Error,
  },
  #[error("unsupported config file extension: {0:?}")]
  UnsupportedFormat(String),
  #[error("failed to interpolate config file: {}", .0.join(", "))]
  InterpolationError(Vec<String>),
  #[error("failed to parse JSON config file: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("failed to parse YAML config file: {0}")]
  YamlError(#[from] serde_yaml::Error),
}

pub fn load_config(
  file_path: &str,
  get_env_value: impl Fn(&str) -> Option<String>,
) -> Result<ApqConfig, ConfigError> {
  let path = Path::new(file_path);
  let format = ConfigFormat::from_path(path)?;

  let raw_contents = read_to_string(path).map_err(|source| ConfigError::ReadError {
    path: file_path.to_string(),
    source,
  })?;

  let base_path = path.parent().unwrap_or_else(|| Path::new("")).to_path_buf();
  BASE_PATH.with(|bp| {
    *bp.borrow_mut() = base_path;
  });

  let result = parse_config_contents(raw_contents, format, get_env_value);

  BASE_PATH.with(|bp| {
    *bp.borrow_mut() = PathBuf::new();
  });

  result
}

pub fn parse_config_contents(
  contents: String,
  format: ConfigFormat,
  get_env_value: impl Fn(&str) -> Option<String>,
) -> Result<ApqConfig, ConfigError> {
  let (config_string, warnings) =
    interpolate(&contents, get_env_value).map_err(ConfigError::InterpolationError)?;

  for warning in warnings {
    warn!("{}", warning);
  }

  Ok(match format {
    ConfigFormat::Json => serde_json::from_str::<ApqConfig>(&config_string)?,
    ConfigFormat::Yaml => serde_yaml::from_str::<ApqConfig>(&config_string)?,
  })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigFormat {
  Json,
  Yaml,
}

impl ConfigFormat {
  pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
    match path.extension().and_then(|ext| ext.to_str()) {
      Some("json") => Ok(ConfigFormat::Json),
      Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
      other => Err(ConfigError::UnsupportedFormat(
        other.unwrap_or_default().to_string(),
      )),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::{env::temp_dir, fs};

  fn no_env(_: &str) -> Option<String> {
    None
  }

  #[test]
  fn parses_yaml() {
    let config = parse_config_contents(
      r#"
logger:
  filter: debug
  format: compact
plugins:
  - type: persisted_operations
"#
      .to_string(),
      ConfigFormat::Yaml,
      no_env,
    )
    .expect("valid config");

    let logger = config.logger.expect("logger is set");
    assert_eq!(logger.filter, "debug");
    assert_eq!(logger.format, LoggerConfigFormat::Compact);

    let plugins = config.plugins.expect("plugins are set");
    assert!(matches!(
      plugins.as_slice(),
      [PluginDefinition::PersistedOperationsPlugin {
        enabled: Some(true),
        config: None
      }]
    ));
  }

  #[test]
  fn parses_json_with_interpolation() {
    let config = parse_config_contents(
      r#"{ "logger": { "filter": "${LOG_FILTER:-info}" } }"#.to_string(),
      ConfigFormat::Json,
      |key| (key == "LOG_FILTER").then(|| "warn".to_string()),
    )
    .expect("valid config");

    assert_eq!(config.logger.map(|l| l.filter).as_deref(), Some("warn"));
  }

  #[test]
  fn reports_interpolation_errors() {
    let result = parse_config_contents(
      r#"{ "logger": { "filter": "${LOG_FILTER:?is required}" } }"#.to_string(),
      ConfigFormat::Json,
      no_env,
    );

    assert!(matches!(result, Err(ConfigError::InterpolationError(errors)) if errors.len() == 1));
  }

  #[test]
  fn reports_parse_errors() {
    assert!(matches!(
      parse_config_contents("{".to_string(), ConfigFormat::Json, no_env),
      Err(ConfigError::JsonError(_))
    ));
    assert!(matches!(
      parse_config_contents(
        "plugins:\n  - type: unknown_plugin\n".to_string(),
        ConfigFormat::Yaml,
        no_env
      ),
      Err(ConfigError::YamlError(_))
    ));
  }

  #[test]
  fn format_from_extension() {
    assert_eq!(
      ConfigFormat::from_path(Path::new("config.yml")).ok(),
      Some(ConfigFormat::Yaml)
    );
    assert_eq!(
      ConfigFormat::from_path(Path::new("config.json")).ok(),
      Some(ConfigFormat::Json)
    );
    assert!(matches!(
      ConfigFormat::from_path(Path::new("config.toml")),
      Err(ConfigError::UnsupportedFormat(ext)) if ext == "toml"
    ));
    assert!(ConfigFormat::from_path(Path::new("config")).is_err());
  }

  #[test]
  fn loads_manifest_relative_to_config_file() {
    let dir = temp_dir().join("apq_config_loads_manifest");
    fs::create_dir_all(&dir).expect("failed to create temp dir");
    fs::write(
      dir.join("operations.json"),
      r#"{ "Q1": "query Me { me { id } }" }"#,
    )
    .expect("failed to write manifest");
    fs::write(
      dir.join("config.yaml"),
      r#"
plugins:
  - type: persisted_operations
    config:
      store:
        source: file
        path: ${MANIFEST_FILE}
        format: json_key_value
"#,
    )
    .expect("failed to write config");

    let config = load_config(
      dir.join("config.yaml").to_str().expect("utf-8 path"),
      |key| (key == "MANIFEST_FILE").then(|| "operations.json".to_string()),
    )
    .expect("valid config");

    let Some(plugins) = config.plugins else {
      panic!("plugins are set");
    };
    let [PluginDefinition::PersistedOperationsPlugin {
      config: Some(persisted_operations_plugin::Config {
        store: Some(persisted_operations_plugin::Store::File { file, format }),
      }),
      ..
    }] = plugins.as_slice()
    else {
      panic!("unexpected plugins: {:?}", plugins);
    };

    assert_eq!(file.contents, r#"{ "Q1": "query Me { me { id } }" }"#);
    assert_eq!(format, &persisted_operations_plugin::FileFormat::JsonKeyValue);
  }

  #[test]
  fn missing_file_is_an_error() {
    assert!(matches!(
      load_config("/definitely/not/here.yaml", no_env),
      Err(ConfigError::ReadError { .. })
    ));
  }
}
