use std::rc::Rc;

use apq_common::{
  execute::RequestExecutionContext,
  graphql::{GraphQLRequest, GraphQLResponse},
  http::{GraphQLHttpRequest, GraphQLHttpResponse, Method, StatusCode},
  plugin::PluginError,
};
use apq_config::ApqConfig;
use persisted_operations_plugin::PERSISTED_OPERATION_ID_CONTEXT_KEY;
use tracing::{debug, error};

use crate::{plugin_manager::PluginManager, source::runtime::SourceRuntime};

/// Runs an incoming HTTP request through the plugins, then through the source.
#[derive(Debug)]
pub struct Gateway {
  plugin_manager: PluginManager,
  source: Rc<dyn SourceRuntime>,
}

impl Gateway {
  pub fn new(plugin_manager: PluginManager, source: Rc<dyn SourceRuntime>) -> Self {
    Self {
      plugin_manager,
      source,
    }
  }

  pub async fn new_from_config(
    config: &ApqConfig,
    source: Rc<dyn SourceRuntime>,
  ) -> Result<Self, PluginError> {
    let plugin_manager = PluginManager::new(&config.plugins).await?;

    Ok(Self::new(plugin_manager, source))
  }

  #[tracing::instrument(skip(self, request), name = "Gateway::execute")]
  pub async fn execute(&self, request: GraphQLHttpRequest) -> GraphQLHttpResponse {
    let mut request_ctx = RequestExecutionContext::new(request);

    // Step 1: Trigger "on_downstream_http_request" on all plugins
    self
      .plugin_manager
      .on_downstream_http_request(&mut request_ctx)
      .await;

    // Step 1.5: In case of short circuit, return the response right now.
    if let Some(sc_response) = request_ctx.short_circuit_response.take() {
      return sc_response;
    }

    // Step 2: Extract the GraphQL request from the (possibly rewritten) body.
    if request_ctx.downstream_http_request.method != Method::POST {
      return GraphQLResponse::new_error("only POST requests are supported")
        .into_with_status_code(StatusCode::METHOD_NOT_ALLOWED);
    }

    let (_, accept, result) = GraphQLRequest::new_from_http_post(&request_ctx.downstream_http_request);
    let gql_request = match result {
      Ok(gql_request) => gql_request,
      Err(e) => {
        error!(
          "error while trying to extract GraphQL request from POST request: {:?}",
          e
        );

        return e.into_response(accept);
      }
    };

    if let Some(id) = request_ctx.ctx_get(PERSISTED_OPERATION_ID_CONTEXT_KEY) {
      debug!("executing persisted operation {}", id);
    }

    // Step 3: Execute the request.
    let upstream_response = self.source.execute(gql_request, &mut request_ctx).await;

    match upstream_response {
      Ok(response) => response.into(),
      Err(e) => {
        error!("source failed to execute request: {}", e);

        GraphQLResponse::from(e).into()
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::source::mock_source::MockedSourceRuntime;
  use apq_common::http::Bytes;
  use persisted_operations_plugin::FnLookup;
  use serde_json::{json, Value};
  use tokio::test;

  fn post(body: Value) -> GraphQLHttpRequest {
    GraphQLHttpRequest {
      body: Bytes::from(body.to_string()),
      ..Default::default()
    }
  }

  fn gateway(plugins: PluginManager) -> (Gateway, Rc<MockedSourceRuntime>) {
    let source = Rc::new(MockedSourceRuntime::new_from_json(
      r#"{"data":{"me":{"id":"1"}}}"#,
    ));

    (Gateway::new(plugins, source.clone()), source)
  }

  fn persisted_operations() -> PluginManager {
    let mut plugins = PluginManager::default();
    plugins.register_plugin(persisted_operations_plugin::Plugin::new(Box::new(
      FnLookup::from_fn(|id| (id == "abc").then(|| "{ me { id } }".to_string())),
    )));

    plugins
  }

  #[test]
  async fn executes_full_requests() {
    let (gateway, source) = gateway(PluginManager::default());

    let response = gateway.execute(post(json!({ "query": "{ me { id } }" }))).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
      response.json_body::<Value>().ok(),
      Some(json!({ "data": { "me": { "id": "1" } } }))
    );
    assert_eq!(source.executed_requests().len(), 1);
  }

  #[test]
  async fn executes_resolved_persisted_requests() {
    let (gateway, source) = gateway(persisted_operations());

    let response = gateway
      .execute(post(json!({
        "operationName": "Me",
        "extensions": { "persisted": { "id": "abc" } }
      })))
      .await;

    assert_eq!(response.status, StatusCode::OK);
    let executed = source.executed_requests();
    assert_eq!(executed.len(), 1);
    assert_eq!(executed[0].operation.as_deref(), Some("{ me { id } }"));
    assert_eq!(executed[0].operation_name.as_deref(), Some("Me"));
  }

  #[test]
  async fn unknown_id_never_reaches_the_source() {
    let (gateway, source) = gateway(persisted_operations());

    let response = gateway
      .execute(post(json!({ "extensions": { "persisted": { "id": "xyz" } } })))
      .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
      response.json_body::<Value>().ok(),
      Some(json!({ "errors": [{ "message": "PersistedQueryNotFound" }] }))
    );
    assert!(source.executed_requests().is_empty());
  }

  #[test]
  async fn malformed_envelope_is_rejected_by_extraction() {
    let (gateway, source) = gateway(persisted_operations());

    let response = gateway
      .execute(post(json!({ "extensions": { "persisted": { "id": 42 } } })))
      .await;

    assert_eq!(
      response.json_body::<Value>().ok(),
      Some(json!({ "errors": [{ "message": "failed to locate any GraphQL operation in request" }] }))
    );
    assert!(source.executed_requests().is_empty());
  }

  #[test]
  async fn missing_lookup_is_a_server_error() {
    let (gateway, source) = gateway(
      PluginManager::new(&Some(vec![
        apq_config::PluginDefinition::PersistedOperationsPlugin {
          enabled: Some(true),
          config: None,
        },
      ]))
      .await
      .expect("valid plugins"),
    );

    let response = gateway
      .execute(post(json!({ "extensions": { "persisted": { "id": "abc" } } })))
      .await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(source.executed_requests().is_empty());
  }

  #[test]
  async fn source_errors_become_graphql_errors() {
    let gateway = Gateway::new(
      PluginManager::default(),
      Rc::new(MockedSourceRuntime::failing("connection refused")),
    );

    let response = gateway.execute(post(json!({ "query": "{ me { id } }" }))).await;

    assert_eq!(
      response.json_body::<Value>().ok(),
      Some(json!({ "errors": [{ "message": "network error: connection refused" }] }))
    );
  }

  #[test]
  async fn rejects_other_methods() {
    let (gateway, _) = gateway(PluginManager::default());

    let response = gateway
      .execute(GraphQLHttpRequest {
        method: Method::GET,
        ..Default::default()
      })
      .await;

    assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
  }
}
