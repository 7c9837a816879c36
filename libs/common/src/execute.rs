use serde_json::{Map, Value};

use crate::http::{GraphQLHttpRequest, GraphQLHttpResponse};

type Context = Map<String, Value>;

#[derive(Debug)]
pub struct RequestExecutionContext {
  pub downstream_http_request: GraphQLHttpRequest,
  pub short_circuit_response: Option<GraphQLHttpResponse>,
  context: Context,
}

impl RequestExecutionContext {
  pub fn new(downstream_http_request: GraphQLHttpRequest) -> Self {
    RequestExecutionContext {
      downstream_http_request,
      short_circuit_response: None,
      context: Context::new(),
    }
  }

  pub fn short_circuit(&mut self, response: GraphQLHttpResponse) {
    self.short_circuit_response = Some(response);
  }

  pub fn is_short_circuit(&self) -> bool {
    self.short_circuit_response.is_some()
  }

  pub fn ctx_insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
    self.context.insert(key.into(), value.into())
  }

  pub fn ctx_get(&self, key: impl Into<String>) -> Option<&Value> {
    self.context.get(&key.into())
  }
}
