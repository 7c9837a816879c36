use serde::de::Error as DeError;
use serde_json::{from_slice, Error as SerdeError, Map, Value};

pub fn parse_and_extract_json_map_value(value: &[u8]) -> Result<Map<String, Value>, SerdeError> {
  let parsed_json = from_slice::<Value>(value);

  match parsed_json {
    Ok(Value::Object(v)) => Ok(v),
    Ok(_) => Err(DeError::custom("expected object")),
    Err(e) => Err(e),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn extracts_objects_only() {
    assert!(parse_and_extract_json_map_value(b"{\"a\":1}").is_ok());
    assert!(parse_and_extract_json_map_value(b"[]").is_err());
    assert!(parse_and_extract_json_map_value(b"\"query\"").is_err());
    assert!(parse_and_extract_json_map_value(b"{").is_err());
  }
}
