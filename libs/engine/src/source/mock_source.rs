use std::{cell::RefCell, future::Future, pin::Pin};

use apq_common::{
  execute::RequestExecutionContext,
  graphql::{GraphQLRequest, GraphQLResponse},
};

use super::runtime::{SourceError, SourceRuntime};

/// Answers every request with the same response, and keeps the requests it was given.
#[derive(Debug)]
pub struct MockedSourceRuntime {
  response: Result<GraphQLResponse, String>,
  executed: RefCell<Vec<GraphQLRequest>>,
}

impl MockedSourceRuntime {
  pub fn new(response: GraphQLResponse) -> Self {
    Self {
      response: Ok(response),
      executed: Default::default(),
    }
  }

  pub fn new_from_json(contents: &str) -> Self {
    Self::new(
      serde_json::from_str::<GraphQLResponse>(contents)
        .unwrap_or_else(|e| GraphQLResponse::new_error(&e.to_string())),
    )
  }

  /// A source whose upstream is unreachable.
  pub fn failing(message: &str) -> Self {
    Self {
      response: Err(message.to_string()),
      executed: Default::default(),
    }
  }

  pub fn executed_requests(&self) -> Vec<GraphQLRequest> {
    self.executed.borrow().clone()
  }
}

impl SourceRuntime for MockedSourceRuntime {
  fn execute<'a>(
    &'a self,
    request: GraphQLRequest,
    _request_context: &'a mut RequestExecutionContext,
  ) -> Pin<Box<(dyn Future<Output = Result<GraphQLResponse, SourceError>> + 'a)>> {
    Box::pin(async move {
      self.executed.borrow_mut().push(request);

      match &self.response {
        Ok(response) => Ok(response.clone()),
        Err(message) => Err(SourceError::NetworkError(anyhow::anyhow!(message.clone()))),
      }
    })
  }
}
