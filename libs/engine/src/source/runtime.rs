use std::{fmt::Debug, future::Future, pin::Pin};

use apq_common::{
  execute::RequestExecutionContext,
  graphql::{GraphQLRequest, GraphQLResponse},
};

/// The stage that executes a GraphQL request once plugins are done with it.
pub trait SourceRuntime: Debug + 'static {
  fn execute<'a>(
    &'a self,
    request: GraphQLRequest,
    request_context: &'a mut RequestExecutionContext,
  ) -> Pin<Box<(dyn Future<Output = Result<GraphQLResponse, SourceError>> + 'a)>>;
}

#[derive(thiserror::Error, Debug)]
pub enum SourceError {
  #[error("network error: {0}")]
  NetworkError(anyhow::Error),
}

impl From<SourceError> for GraphQLResponse {
  fn from(error: SourceError) -> Self {
    GraphQLResponse::new_error(&error.to_string())
  }
}
