use std::fmt::Debug;

pub mod function;
pub mod manifest;

/// Resolves a persisted query identifier to its query text.
#[async_trait::async_trait(?Send)]
pub trait OperationLookup: Debug {
  async fn get_operation(&self, id: &str) -> Option<String>;
}
