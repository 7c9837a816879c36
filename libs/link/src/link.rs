use std::rc::Rc;

use apq_common::graphql::GraphQLResponse;
use futures::{
  future,
  stream::{self, LocalBoxStream},
  StreamExt,
};

use crate::operation::Operation;

/// Responses produced for a single operation. Dropping the stream cancels the request.
pub type ResponseStream = LocalBoxStream<'static, Result<GraphQLResponse, LinkError>>;

#[derive(Debug, thiserror::Error)]
pub enum LinkError {
  #[error("persisted link can't be a terminating link")]
  TerminatingLink,
  #[error("network error: {source}")]
  Network { source: anyhow::Error },
}

/// The capability to hand an operation to the rest of the pipeline.
pub trait NextLink {
  fn forward(&self, operation: Operation) -> ResponseStream;
}

impl<F> NextLink for F
where
  F: Fn(Operation) -> ResponseStream,
{
  fn forward(&self, operation: Operation) -> ResponseStream {
    self(operation)
  }
}

/// A stage of the client pipeline. Non-terminating links receive `forward` and must fail when it
/// is missing.
pub trait Link {
  fn request(
    &self,
    operation: Operation,
    forward: Option<Rc<dyn NextLink>>,
  ) -> Result<ResponseStream, LinkError>;

  fn chain(self, next: Rc<dyn NextLink>) -> LinkChain
  where
    Self: Sized + 'static,
  {
    LinkChain {
      link: Rc::new(self),
      next,
    }
  }
}

/// A link composed with its downstream, usable as a [`NextLink`] by an earlier stage.
pub struct LinkChain {
  link: Rc<dyn Link>,
  next: Rc<dyn NextLink>,
}

impl NextLink for LinkChain {
  fn forward(&self, operation: Operation) -> ResponseStream {
    match self.link.request(operation, Some(self.next.clone())) {
      Ok(stream) => stream,
      Err(e) => stream::once(future::ready(Err(e))).boxed_local(),
    }
  }
}
