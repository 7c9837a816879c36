//! Wire contract shared by the client link and the server resolver.
//!
//! A persisted request carries its identifier under `extensions.persisted.id`:
//!
//! `POST /graphql {"operationName": "Me", "variables": {}, "extensions": {"persisted": {"id": "Q1"}}}`
//!
//! A server that does not know the identifier answers with a single error whose message is
//! [`PERSISTED_QUERY_NOT_FOUND`], and the client retries once with the full query text.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::graphql::GraphQLResponse;

/// Error message used by the server to signal an unknown persisted query identifier.
/// Both sides compare it byte-for-byte.
pub const PERSISTED_QUERY_NOT_FOUND: &str = "PersistedQueryNotFound";

/// Name of the `extensions` entry holding the persisted query identifier.
pub const PERSISTED_EXTENSION_KEY: &str = "persisted";

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PersistedExtension {
  pub id: String,
}

impl PersistedExtension {
  pub fn new(id: impl Into<String>) -> Self {
    Self { id: id.into() }
  }

  pub fn to_value(&self) -> Value {
    let mut map = Map::new();
    map.insert("id".to_string(), Value::String(self.id.clone()));
    Value::Object(map)
  }
}

#[derive(Deserialize, Debug)]
struct PersistedExtensions {
  persisted: PersistedExtension,
}

/// A request body as seen by the server, before persisted query resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedRequestEnvelope {
  pub query: Option<String>,
  pub operation_name: Option<String>,
  pub variables: Option<Map<String, Value>>,
  pub persisted: Option<PersistedExtension>,
}

impl PersistedRequestEnvelope {
  /// Reads the envelope out of a JSON body object. Fields with an unexpected shape are treated as
  /// absent, so a malformed `extensions.persisted` block yields `persisted: None`.
  pub fn from_body(body: &Map<String, Value>) -> Self {
    Self {
      query: body
        .get("query")
        .and_then(|v| v.as_str())
        .map(|v| v.to_string()),
      operation_name: body
        .get("operationName")
        .and_then(|v| v.as_str())
        .map(|v| v.to_string()),
      variables: body.get("variables").and_then(|v| v.as_object()).cloned(),
      persisted: body
        .get("extensions")
        .and_then(|v| serde_json::from_value::<PersistedExtensions>(v.clone()).ok())
        .map(|extensions| extensions.persisted),
    }
  }

  /// Query text always wins over an identifier.
  pub fn has_query_text(&self) -> bool {
    self.query.as_ref().is_some_and(|q| !q.is_empty())
  }

  /// The identifier to resolve, if this envelope is a persisted request.
  pub fn persisted_id(&self) -> Option<&str> {
    if self.has_query_text() {
      return None;
    }

    self.persisted.as_ref().map(|p| p.id.as_str())
  }
}

pub fn persisted_query_not_found_response() -> GraphQLResponse {
  GraphQLResponse::new_error(PERSISTED_QUERY_NOT_FOUND)
}

impl GraphQLResponse {
  pub fn is_persisted_query_not_found(&self) -> bool {
    self.has_error_message(PERSISTED_QUERY_NOT_FOUND)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn envelope(body: Value) -> PersistedRequestEnvelope {
    PersistedRequestEnvelope::from_body(body.as_object().expect("test body must be an object"))
  }

  #[test]
  fn not_found_response_matches_wire_format() {
    let body: crate::http::Bytes = persisted_query_not_found_response().into();

    assert_eq!(
      body,
      "{\"errors\":[{\"message\":\"PersistedQueryNotFound\"}]}"
    );
  }

  #[test]
  fn reads_persisted_id() {
    let e = envelope(json!({
      "operationName": "Me",
      "variables": { "first": 1 },
      "extensions": { "persisted": { "id": "abc" }, "other": true }
    }));

    assert_eq!(e.persisted_id(), Some("abc"));
    assert_eq!(e.operation_name.as_deref(), Some("Me"));
    assert_eq!(e.variables, json!({ "first": 1 }).as_object().cloned());
  }

  #[test]
  fn query_text_wins_over_id() {
    let e = envelope(json!({
      "query": "{ me { id } }",
      "extensions": { "persisted": { "id": "abc" } }
    }));

    assert!(e.has_query_text());
    assert_eq!(e.persisted_id(), None);
  }

  #[test]
  fn empty_query_does_not_hide_id() {
    let e = envelope(json!({
      "query": "",
      "extensions": { "persisted": { "id": "abc" } }
    }));

    assert_eq!(e.persisted_id(), Some("abc"));
  }

  #[test]
  fn malformed_persisted_block_is_ignored() {
    assert_eq!(
      envelope(json!({ "extensions": { "persisted": { "id": 42 } } })).persisted,
      None
    );
    assert_eq!(
      envelope(json!({ "extensions": { "persisted": "abc" } })).persisted,
      None
    );
    assert_eq!(envelope(json!({ "extensions": null })).persisted, None);
    assert_eq!(envelope(json!({})).persisted, None);
  }

  #[test]
  fn detects_not_found_signal() {
    assert!(persisted_query_not_found_response().is_persisted_query_not_found());
    assert!(!GraphQLResponse::new_error("something else").is_persisted_query_not_found());
  }
}
