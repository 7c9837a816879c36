use std::{
  fmt::{Debug, Formatter},
  future::Future,
};

use futures::{
  future::{self, LocalBoxFuture},
  FutureExt,
};

use super::OperationLookup;

type LookupFn = Box<dyn Fn(&str) -> LocalBoxFuture<'static, Option<String>>>;

/// A lookup backed by a caller-supplied closure.
pub struct FnLookup {
  f: LookupFn,
}

impl FnLookup {
  pub fn from_fn<F>(f: F) -> Self
  where
    F: Fn(&str) -> Option<String> + 'static,
  {
    Self {
      f: Box::new(move |id| future::ready(f(id)).boxed_local()),
    }
  }

  pub fn from_async_fn<F, Fut>(f: F) -> Self
  where
    F: Fn(String) -> Fut + 'static,
    Fut: Future<Output = Option<String>> + 'static,
  {
    Self {
      f: Box::new(move |id| f(id.to_string()).boxed_local()),
    }
  }
}

impl Debug for FnLookup {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "FnLookup")
  }
}

#[async_trait::async_trait(?Send)]
impl OperationLookup for FnLookup {
  async fn get_operation(&self, id: &str) -> Option<String> {
    (self.f)(id).await
  }
}
