use std::{
  cell::RefCell,
  collections::HashSet,
  fmt::{Debug, Formatter},
  pin::Pin,
  rc::Rc,
  task::{Context, Poll},
};

use apq_common::graphql::GraphQLResponse;
use futures::{ready, Stream, StreamExt};
use tracing::{debug, info};

use crate::{
  link::{Link, LinkError, NextLink, ResponseStream},
  operation::{HttpOptions, Operation},
};

pub type IdFromOperation = Rc<dyn Fn(&Operation) -> Option<String>>;

/// Reads the identifier a build step attached to the query document.
pub fn default_id_from_operation(operation: &Operation) -> Option<String> {
  operation.query.id.clone()
}

#[derive(Clone)]
pub struct PersistedLinkOptions {
  pub id_from_operation: IdFromOperation,
}

impl Default for PersistedLinkOptions {
  fn default() -> Self {
    Self {
      id_from_operation: Rc::new(default_id_from_operation),
    }
  }
}

impl Debug for PersistedLinkOptions {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("PersistedLinkOptions").finish_non_exhaustive()
  }
}

/// Identifiers the server answered with the not-found signal. Only grows.
type UnrecognizedIds = Rc<RefCell<HashSet<String>>>;

/// Client side of the persisted query handshake.
///
/// Operations with an identifier are first sent without their query text. When the server does not
/// know the identifier, the operation is sent once more with the full text, and the identifier is
/// remembered so later operations skip straight to the full request.
#[derive(Debug, Default)]
pub struct PersistedLink {
  options: PersistedLinkOptions,
  unrecognized_ids: UnrecognizedIds,
}

impl PersistedLink {
  pub fn new(options: PersistedLinkOptions) -> Self {
    Self {
      options,
      unrecognized_ids: Default::default(),
    }
  }

  pub fn is_unrecognized(&self, id: &str) -> bool {
    self.unrecognized_ids.borrow().contains(id)
  }
}

impl Link for PersistedLink {
  fn request(
    &self,
    mut operation: Operation,
    forward: Option<Rc<dyn NextLink>>,
  ) -> Result<ResponseStream, LinkError> {
    let forward = forward.ok_or(LinkError::TerminatingLink)?;

    let id = match (self.options.id_from_operation)(&operation) {
      Some(id) => id,
      None => {
        debug!("operation has no persisted id, forwarding as is");

        return Ok(forward.forward(operation));
      }
    };

    if self.is_unrecognized(&id) {
      debug!(
        "persisted id {:?} is known to be unrecognized, sending the full query",
        id
      );

      operation.context.http.include_query = true;
      let inner = forward.forward(operation);

      return Ok(Box::pin(PersistedResponseStream {
        forward,
        unrecognized_ids: self.unrecognized_ids.clone(),
        phase: Phase::Direct(inner),
      }));
    }

    debug!("sending persisted id {:?} without the query text", id);

    operation.set_persisted_id(&id);
    operation.context.http = HttpOptions::persisted();
    let inner = forward.forward(operation.clone());

    Ok(Box::pin(PersistedResponseStream {
      forward,
      unrecognized_ids: self.unrecognized_ids.clone(),
      phase: Phase::Optimistic {
        id,
        operation,
        inner,
      },
    }))
  }
}

enum Phase {
  /// Sent with the full query from the start; responses pass through.
  Direct(ResponseStream),
  /// Sent with the identifier only; a not-found response triggers the retry.
  Optimistic {
    id: String,
    operation: Operation,
    inner: ResponseStream,
  },
  /// The single retry with the full query; responses pass through, including a second not-found.
  Retrying(ResponseStream),
  /// Transient state while the optimistic request is torn down.
  Switching,
}

struct PersistedResponseStream {
  forward: Rc<dyn NextLink>,
  unrecognized_ids: UnrecognizedIds,
  phase: Phase,
}

impl PersistedResponseStream {
  fn retry(&mut self) {
    let Phase::Optimistic { id, mut operation, .. } =
      std::mem::replace(&mut self.phase, Phase::Switching)
    else {
      return;
    };
    // The optimistic stream was dropped by the replace above, before the retry is forwarded.

    info!(
      "server does not recognize persisted id {:?}, retrying with the full query",
      id
    );
    self.unrecognized_ids.borrow_mut().insert(id);

    operation.clear_persisted_id();
    operation.context.http = HttpOptions::full_query();
    self.phase = Phase::Retrying(self.forward.forward(operation));
  }
}

impl Stream for PersistedResponseStream {
  type Item = Result<GraphQLResponse, LinkError>;

  fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
    let this = &mut *self;

    loop {
      match &mut this.phase {
        Phase::Direct(inner) | Phase::Retrying(inner) => return inner.poll_next_unpin(cx),
        Phase::Optimistic { inner, .. } => match ready!(inner.poll_next_unpin(cx)) {
          Some(Ok(response)) if response.is_persisted_query_not_found() => this.retry(),
          other => return Poll::Ready(other),
        },
        Phase::Switching => return Poll::Ready(None),
      }
    }
  }
}
