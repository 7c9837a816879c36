use apq_common::{
  execute::RequestExecutionContext,
  graphql::GraphQLResponse,
  http::StatusCode,
  persisted::persisted_query_not_found_response,
  plugin::{CreatablePlugin, Plugin, PluginError},
};
use tracing::{debug, error};

use crate::{
  config::{PersistedOperationsPluginConfig, PersistedOperationsStoreConfig},
  lookup::{manifest::ManifestLookup, OperationLookup},
  resolver::{PersistedOperationsResolver, Resolution},
};

/// Context key holding the identifier of the operation that was resolved for this request.
pub const PERSISTED_OPERATION_ID_CONTEXT_KEY: &str = "persisted_operation_id";

#[derive(Debug)]
pub struct PersistedOperationsPlugin {
  resolver: PersistedOperationsResolver,
}

#[derive(Debug, thiserror::Error)]
pub enum PersistedOperationsPluginError {
  #[error("failed to load persisted operations: {0}")]
  LookupCreationError(String),
}

impl PersistedOperationsPlugin {
  pub fn new(lookup: Box<dyn OperationLookup>) -> Self {
    Self {
      resolver: PersistedOperationsResolver::new(lookup),
    }
  }
}

#[async_trait::async_trait(?Send)]
impl CreatablePlugin for PersistedOperationsPlugin {
  type Config = PersistedOperationsPluginConfig;

  async fn create(config: Self::Config) -> Result<Box<dyn Plugin>, PluginError> {
    debug!("creating persisted operations plugin");

    let resolver = match &config.store {
      Some(PersistedOperationsStoreConfig::File { file, format }) => {
        let lookup = ManifestLookup::new_from_file_contents(&file.contents, format).map_err(|e| {
          PluginError::InitError {
            source: PersistedOperationsPluginError::LookupCreationError(e.to_string()).into(),
          }
        })?;

        PersistedOperationsResolver::new(Box::new(lookup))
      }
      None => PersistedOperationsResolver::without_lookup(),
    };

    Ok(Box::new(Self { resolver }))
  }
}

#[async_trait::async_trait(?Send)]
impl Plugin for PersistedOperationsPlugin {
  async fn on_downstream_http_request(&self, ctx: &mut RequestExecutionContext) {
    match self
      .resolver
      .resolve(&ctx.downstream_http_request.body)
      .await
    {
      Ok(Resolution::PassThrough) => {}
      Ok(Resolution::Rewritten { id, body }) => {
        debug!("request body rewritten for persisted id {:?}", id);

        ctx.downstream_http_request.body = body;
        ctx.ctx_insert(PERSISTED_OPERATION_ID_CONTEXT_KEY, id);
      }
      Ok(Resolution::NotFound) => {
        ctx.short_circuit(persisted_query_not_found_response().into());
      }
      Err(e) => {
        error!("failed to resolve persisted operation: {}", e);

        ctx.short_circuit(
          GraphQLResponse::new_error(&e.to_string())
            .into_with_status_code(StatusCode::INTERNAL_SERVER_ERROR),
        );
      }
    }
  }
}
