use crate::config::LoggerConfigFormat;
use tracing_subscriber::{
  fmt::{self, format::FmtSpan, time::UtcTime},
  EnvFilter, Layer, Registry,
};

pub type LoggerLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Builds the formatting layer for the given format and `EnvFilter` directives.
///
/// With `print_performance_info`, a line is also emitted whenever an instrumented span (such as a
/// gateway execution) closes, including its busy and idle time.
pub fn build_logger(
  format: &LoggerConfigFormat,
  filter: &str,
  print_performance_info: bool,
) -> Result<LoggerLayer, tracing_subscriber::filter::ParseError> {
  let timer = UtcTime::rfc_3339();
  let filter = EnvFilter::try_new(filter)?;
  let performance_spans = match print_performance_info {
    true => FmtSpan::CLOSE,
    false => FmtSpan::NONE,
  };

  Ok(match format {
    LoggerConfigFormat::Json => fmt::Layer::<Registry>::default()
      .json()
      .with_timer(timer)
      .with_span_events(performance_spans)
      .with_filter(filter)
      .boxed(),
    LoggerConfigFormat::Pretty => fmt::Layer::<Registry>::default()
      .pretty()
      .with_timer(timer)
      .with_span_events(performance_spans)
      .with_filter(filter)
      .boxed(),
    LoggerConfigFormat::Compact => fmt::Layer::<Registry>::default()
      .compact()
      .with_timer(timer)
      .with_span_events(performance_spans)
      .with_filter(filter)
      .boxed(),
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn builds_every_format() {
    for format in [
      LoggerConfigFormat::Compact,
      LoggerConfigFormat::Pretty,
      LoggerConfigFormat::Json,
    ] {
      assert!(build_logger(&format, "info,persisted_operations_plugin=debug", true).is_ok());
    }
  }

  #[test]
  fn rejects_invalid_filter() {
    assert!(build_logger(&LoggerConfigFormat::Compact, "info,[", false).is_err());
  }
}
