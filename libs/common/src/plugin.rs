use std::fmt::Debug;

use crate::execute::RequestExecutionContext;

#[derive(Debug, thiserror::Error)]
pub enum PluginError {
  #[error("Plugin init error: {source}")]
  InitError { source: anyhow::Error },
}

#[async_trait::async_trait(?Send)]
pub trait CreatablePlugin: Plugin {
  type Config;

  async fn create(config: Self::Config) -> Result<Box<dyn Plugin>, PluginError>;
}

#[async_trait::async_trait(?Send)]
pub trait Plugin: Debug {
  // An HTTP request sent from the client, before a GraphQL operation is extracted from it.
  // Plugins may rewrite the request body, or short-circuit the execution with a response.
  async fn on_downstream_http_request(&self, _ctx: &mut RequestExecutionContext) {}
}
