use apq_common::{
  graphql::GraphQLRequest,
  persisted::{PersistedExtension, PERSISTED_EXTENSION_KEY},
};
use serde_json::{Map, Value};

/// The query of an operation: its source text, plus the identifier a build step may have
/// computed for it.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDocument {
  pub source: String,
  pub id: Option<String>,
}

impl QueryDocument {
  pub fn new(source: impl Into<String>) -> Self {
    Self {
      source: source.into(),
      id: None,
    }
  }

  pub fn with_id(source: impl Into<String>, id: impl Into<String>) -> Self {
    Self {
      source: source.into(),
      id: Some(id.into()),
    }
  }
}

/// Transport hint: which parts of the operation the HTTP layer puts on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpOptions {
  pub include_query: bool,
  pub include_extensions: bool,
}

impl Default for HttpOptions {
  fn default() -> Self {
    Self {
      include_query: true,
      include_extensions: false,
    }
  }
}

impl HttpOptions {
  pub fn persisted() -> Self {
    Self {
      include_query: false,
      include_extensions: true,
    }
  }

  pub fn full_query() -> Self {
    Self {
      include_query: true,
      include_extensions: false,
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationContext {
  pub http: HttpOptions,
}

/// A single GraphQL request issued by a caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
  pub query: QueryDocument,
  pub operation_name: Option<String>,
  pub variables: Map<String, Value>,
  pub extensions: Map<String, Value>,
  pub context: OperationContext,
}

impl Operation {
  pub fn new(query: QueryDocument) -> Self {
    Self {
      query,
      operation_name: None,
      variables: Map::new(),
      extensions: Map::new(),
      context: OperationContext::default(),
    }
  }

  pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
    self.operation_name = Some(name.into());
    self
  }

  pub fn with_variables(mut self, variables: Map<String, Value>) -> Self {
    self.variables = variables;
    self
  }

  pub fn persisted_id(&self) -> Option<&str> {
    self
      .extensions
      .get(PERSISTED_EXTENSION_KEY)
      .and_then(|v| v.get("id"))
      .and_then(|v| v.as_str())
  }

  pub fn set_persisted_id(&mut self, id: &str) {
    self.extensions.insert(
      PERSISTED_EXTENSION_KEY.to_string(),
      PersistedExtension::new(id).to_value(),
    );
  }

  pub fn clear_persisted_id(&mut self) {
    self.extensions.remove(PERSISTED_EXTENSION_KEY);
  }

  /// Renders the operation as a request body, honoring the transport hint.
  pub fn to_graphql_request(&self) -> GraphQLRequest {
    let http = &self.context.http;

    GraphQLRequest {
      operation: http.include_query.then(|| self.query.source.clone()),
      operation_name: self.operation_name.clone(),
      variables: Some(self.variables.clone()),
      extensions: (http.include_extensions && !self.extensions.is_empty())
        .then(|| self.extensions.clone()),
    }
  }
}
