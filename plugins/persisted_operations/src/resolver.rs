use apq_common::{
  http::Bytes,
  json::parse_and_extract_json_map_value,
  persisted::PersistedRequestEnvelope,
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::lookup::OperationLookup;

/// What to do with an incoming request body.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
  /// Not a persisted request, or not one we can make sense of. Hand the body on as is.
  PassThrough,
  /// The identifier was found; `body` carries the query text under `query`.
  Rewritten { id: String, body: Bytes },
  /// The identifier is unknown. Answer with the not-found signal.
  NotFound,
}

#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
  #[error("persisted query lookup is not configured")]
  MissingLookup,
  #[error("failed to serialize the rewritten request body: {0}")]
  Serialization(#[from] serde_json::Error),
}

/// Server side of the persisted query handshake.
#[derive(Debug)]
pub struct PersistedOperationsResolver {
  lookup: Option<Box<dyn OperationLookup>>,
}

impl PersistedOperationsResolver {
  pub fn new(lookup: Box<dyn OperationLookup>) -> Self {
    Self {
      lookup: Some(lookup),
    }
  }

  pub fn without_lookup() -> Self {
    Self { lookup: None }
  }

  pub async fn resolve(&self, body: &[u8]) -> Result<Resolution, ResolverError> {
    let mut json_body = match parse_and_extract_json_map_value(body) {
      Ok(v) => v,
      Err(e) => {
        debug!("request body is not a JSON object, skipping: {:?}", e);

        return Ok(Resolution::PassThrough);
      }
    };

    let envelope = PersistedRequestEnvelope::from_body(&json_body);
    let id = match envelope.persisted_id() {
      Some(id) => id.to_string(),
      None => return Ok(Resolution::PassThrough),
    };

    let lookup = self.lookup.as_ref().ok_or(ResolverError::MissingLookup)?;

    match lookup.get_operation(&id).await {
      Some(query) => {
        debug!("resolved persisted id {:?}", id);

        json_body.insert("query".to_string(), Value::String(query));
        let body = serde_json::to_vec(&json_body)?;

        Ok(Resolution::Rewritten {
          id,
          body: body.into(),
        })
      }
      None => {
        warn!("persisted id {:?} not found", id);

        Ok(Resolution::NotFound)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::lookup::function::FnLookup;
  use serde_json::json;

  fn resolver() -> PersistedOperationsResolver {
    PersistedOperationsResolver::new(Box::new(FnLookup::from_fn(|id| {
      (id == "abc").then(|| "{ me { id } }".to_string())
    })))
  }

  async fn resolve(resolver: &PersistedOperationsResolver, body: serde_json::Value) -> Resolution {
    resolver
      .resolve(body.to_string().as_bytes())
      .await
      .expect("resolution should not fail")
  }

  #[tokio::test]
  async fn query_text_passes_through() {
    let resolution = resolve(
      &resolver(),
      json!({ "query": "{ __typename }", "extensions": { "persisted": { "id": "abc" } } }),
    )
    .await;

    assert_eq!(resolution, Resolution::PassThrough);
  }

  #[tokio::test]
  async fn rewrites_known_id() {
    let resolution = resolve(
      &resolver(),
      json!({
        "operationName": "Me",
        "variables": { "first": 1 },
        "extensions": { "persisted": { "id": "abc" } }
      }),
    )
    .await;

    let Resolution::Rewritten { id, body } = resolution else {
      panic!("expected a rewritten body, got {:?}", resolution);
    };
    let body: serde_json::Value = serde_json::from_slice(&body).expect("valid JSON");

    assert_eq!(id, "abc");
    assert_eq!(
      body,
      json!({
        "query": "{ me { id } }",
        "operationName": "Me",
        "variables": { "first": 1 },
        "extensions": { "persisted": { "id": "abc" } }
      })
    );
  }

  #[tokio::test]
  async fn empty_query_is_resolved_by_id() {
    let resolution = resolve(
      &resolver(),
      json!({ "query": "", "extensions": { "persisted": { "id": "abc" } } }),
    )
    .await;

    assert!(matches!(resolution, Resolution::Rewritten { .. }));
  }

  #[tokio::test]
  async fn unknown_id_is_not_found() {
    let resolution = resolve(
      &resolver(),
      json!({ "extensions": { "persisted": { "id": "xyz" } } }),
    )
    .await;

    assert_eq!(resolution, Resolution::NotFound);
  }

  #[tokio::test]
  async fn malformed_envelopes_pass_through() {
    let resolver = resolver();

    for body in [
      json!({ "extensions": { "persisted": { "id": 42 } } }),
      json!({ "extensions": { "persisted": "abc" } }),
      json!({ "extensions": "abc" }),
      json!([1, 2, 3]),
    ] {
      assert_eq!(resolve(&resolver, body).await, Resolution::PassThrough);
    }

    assert_eq!(
      resolver.resolve(b"{").await.expect("not an error"),
      Resolution::PassThrough
    );
  }

  #[tokio::test]
  async fn missing_lookup_is_an_error() {
    let resolver = PersistedOperationsResolver::without_lookup();

    assert!(matches!(
      resolver
        .resolve(json!({ "extensions": { "persisted": { "id": "abc" } } }).to_string().as_bytes())
        .await,
      Err(ResolverError::MissingLookup)
    ));

    // requests that are not persisted never need a lookup
    assert_eq!(
      resolve(&resolver, json!({ "query": "{ __typename }" })).await,
      Resolution::PassThrough
    );
  }
}
