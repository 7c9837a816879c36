use std::{cell::RefCell, collections::HashMap, rc::Rc, sync::Once};

use apq_common::{
  graphql::{GraphQLRequest, GraphQLResponse},
  http::{Bytes, GraphQLHttpRequest, GraphQLHttpResponse, HttpHeadersMap, CONTENT_TYPE},
  plugin::{Plugin, PluginError},
};
use apq_config::{ApqConfig, LoggerConfig};
use apq_engine::{
  gateway::Gateway, plugin_manager::PluginManager, source::mock_source::MockedSourceRuntime,
};
use apq_link::{LinkError, NextLink, Operation, ResponseStream};
use futures::{stream, StreamExt};
use serde_json::{json, Value};
use tracing_subscriber::layer::SubscriberExt;

static LOGGER: Once = Once::new();

/// Installs the global logger once per test binary. Uses `APQ_TEST_LOG` as the filter when set.
pub fn init_logger() {
  LOGGER.call_once(|| {
    let config = LoggerConfig {
      filter: std::env::var("APQ_TEST_LOG").unwrap_or_else(|_| "warn".to_string()),
      ..Default::default()
    };

    if let Ok(layer) = apq_logger::logger_layer::build_logger(
      &config.format,
      &config.filter,
      config.print_performance_info,
    ) {
      let _ = tracing::subscriber::set_global_default(tracing_subscriber::registry().with(layer));
    }
  });
}

pub fn me_response() -> GraphQLResponse {
  let mut response = GraphQLResponse::default();
  response.data = Some(json!({ "me": { "id": "1" } }));
  response
}

pub struct TestSuite {
  pub plugins: Vec<Box<dyn Plugin>>,
  pub source_response: GraphQLResponse,
}

impl Default for TestSuite {
  fn default() -> Self {
    Self {
      plugins: vec![],
      source_response: me_response(),
    }
  }
}

impl TestSuite {
  /// A suite whose gateway resolves persisted queries from the given id to query pairs.
  pub fn with_operations(operations: &[(&str, &str)]) -> Self {
    let known: HashMap<String, String> = operations
      .iter()
      .map(|(id, query)| (id.to_string(), query.to_string()))
      .collect();
    let lookup = persisted_operations_plugin::FnLookup::from_fn(move |id| known.get(id).cloned());

    Self {
      plugins: vec![Box::new(persisted_operations_plugin::Plugin::new(Box::new(
        lookup,
      )))],
      ..Default::default()
    }
  }

  pub fn start(self) -> TestGateway {
    init_logger();

    let source = Rc::new(MockedSourceRuntime::new(self.source_response));
    let gateway = Gateway::new(PluginManager::new_from_vec(self.plugins), source.clone());

    TestGateway::new(gateway, source)
  }
}

/// A running in-process gateway, reachable from client links through [`TestGateway::transport`].
pub struct TestGateway {
  gateway: Rc<Gateway>,
  source: Rc<MockedSourceRuntime>,
  sent: Rc<RefCell<Vec<Value>>>,
}

impl TestGateway {
  fn new(gateway: Gateway, source: Rc<MockedSourceRuntime>) -> Self {
    Self {
      gateway: Rc::new(gateway),
      source,
      sent: Default::default(),
    }
  }

  /// Builds the gateway plugins from a parsed configuration file.
  pub async fn from_config(config: &ApqConfig) -> Result<Self, PluginError> {
    init_logger();

    let source = Rc::new(MockedSourceRuntime::new(me_response()));
    let gateway = Gateway::new_from_config(config, source.clone()).await?;

    Ok(Self::new(gateway, source))
  }

  pub async fn run_http_request(&self, request: GraphQLHttpRequest) -> GraphQLHttpResponse {
    self.gateway.execute(request).await
  }

  pub fn transport(&self) -> Rc<dyn NextLink> {
    Rc::new(GatewayTransport {
      gateway: self.gateway.clone(),
      sent: self.sent.clone(),
    })
  }

  /// Every JSON body the transport sent to the gateway, in order.
  pub fn sent_bodies(&self) -> Vec<Value> {
    self.sent.borrow().clone()
  }

  /// Every request that made it through the plugins to the source.
  pub fn executed_requests(&self) -> Vec<GraphQLRequest> {
    self.source.executed_requests()
  }
}

pub fn graphql_post(body: Value) -> GraphQLHttpRequest {
  let mut headers = HttpHeadersMap::new();
  headers.append(CONTENT_TYPE, "application/json".parse().unwrap());

  GraphQLHttpRequest {
    headers,
    body: Bytes::from(body.to_string()),
    ..Default::default()
  }
}

/// Terminating link that serializes operations the way an HTTP transport would, and hands them to
/// the gateway.
struct GatewayTransport {
  gateway: Rc<Gateway>,
  sent: Rc<RefCell<Vec<Value>>>,
}

impl NextLink for GatewayTransport {
  fn forward(&self, operation: Operation) -> ResponseStream {
    let body = serde_json::to_value(operation.to_graphql_request()).unwrap();
    self.sent.borrow_mut().push(body.clone());

    let gateway = self.gateway.clone();

    stream::once(async move {
      let response = gateway.execute(graphql_post(body)).await;

      response
        .json_body::<GraphQLResponse>()
        .map_err(|e| LinkError::Network { source: e.into() })
    })
    .boxed_local()
  }
}
