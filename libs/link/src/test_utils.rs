use std::{
  cell::{Cell, RefCell},
  collections::VecDeque,
  pin::Pin,
  rc::Rc,
  task::{Context, Poll},
};

use apq_common::{graphql::GraphQLResponse, persisted::persisted_query_not_found_response};
use futures::{stream, Stream, StreamExt};
use serde_json::json;

use crate::{LinkError, NextLink, Operation, ResponseStream};

/// What the mocked downstream answers to one forwarded operation.
pub enum MockReply {
  Respond(Vec<GraphQLResponse>),
  NotFound,
  Pending,
  NetworkError(String),
}

pub fn data_response() -> GraphQLResponse {
  let mut response = GraphQLResponse::default();
  response.data = Some(json!({ "me": { "id": "1" } }));
  response
}

/// A downstream link that records every forwarded operation and replays scripted replies.
/// Once the script runs out it answers with [`data_response`].
#[derive(Default)]
pub struct MockLink {
  replies: RefCell<VecDeque<MockReply>>,
  forwarded: RefCell<Vec<Operation>>,
  dropped: Rc<Cell<usize>>,
}

impl MockLink {
  pub fn new(replies: Vec<MockReply>) -> Rc<Self> {
    Rc::new(Self {
      replies: RefCell::new(replies.into()),
      ..Default::default()
    })
  }

  pub fn forwarded(&self) -> Vec<Operation> {
    self.forwarded.borrow().clone()
  }

  pub fn forward_count(&self) -> usize {
    self.forwarded.borrow().len()
  }

  pub fn dropped_streams(&self) -> usize {
    self.dropped.get()
  }
}

impl NextLink for MockLink {
  fn forward(&self, operation: Operation) -> ResponseStream {
    self.forwarded.borrow_mut().push(operation);

    let inner = match self.replies.borrow_mut().pop_front() {
      Some(MockReply::Respond(responses)) => stream::iter(responses.into_iter().map(Ok)).boxed_local(),
      Some(MockReply::NotFound) => stream::iter([Ok(persisted_query_not_found_response())]).boxed_local(),
      Some(MockReply::Pending) => stream::pending().boxed_local(),
      Some(MockReply::NetworkError(message)) => stream::iter([Err(LinkError::Network {
        source: anyhow::anyhow!(message),
      })])
      .boxed_local(),
      None => stream::iter([Ok(data_response())]).boxed_local(),
    };

    Box::pin(TrackedStream {
      inner,
      dropped: self.dropped.clone(),
    })
  }
}

struct TrackedStream {
  inner: ResponseStream,
  dropped: Rc<Cell<usize>>,
}

impl Stream for TrackedStream {
  type Item = Result<GraphQLResponse, LinkError>;

  fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
    self.inner.poll_next_unpin(cx)
  }
}

impl Drop for TrackedStream {
  fn drop(&mut self) {
    self.dropped.set(self.dropped.get() + 1);
  }
}
