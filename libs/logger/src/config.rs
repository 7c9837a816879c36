use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone, Copy, JsonSchema, PartialEq)]
/// Output format of the log lines.
pub enum LoggerConfigFormat {
  /// Minimal, single-line output with the message and its fields. Cheap to produce and small on disk.
  #[serde(rename = "compact")]
  #[schemars(title = "compact")]
  Compact,

  /// Multi-line, human-readable output including source locations. Meant for local development.
  #[serde(rename = "pretty")]
  #[schemars(title = "pretty")]
  Pretty,

  /// One JSON object per line, for log aggregators.
  #[serde(rename = "json")]
  #[schemars(title = "json")]
  Json,
}

impl Default for LoggerConfigFormat {
  // In development, we wish to see some more details and code locations.
  #[cfg(debug_assertions)]
  fn default() -> Self {
    LoggerConfigFormat::Pretty
  }

  #[cfg(not(debug_assertions))]
  fn default() -> Self {
    if atty::is(atty::Stream::Stdout) {
      LoggerConfigFormat::Compact
    } else {
      LoggerConfigFormat::Json
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn format_names() {
    assert_eq!(
      serde_json::from_str::<LoggerConfigFormat>("\"compact\"").ok(),
      Some(LoggerConfigFormat::Compact)
    );
    assert_eq!(
      serde_json::from_str::<LoggerConfigFormat>("\"json\"").ok(),
      Some(LoggerConfigFormat::Json)
    );
    assert!(serde_json::from_str::<LoggerConfigFormat>("\"xml\"").is_err());
  }
}
