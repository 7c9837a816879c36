use apq_common::{
  execute::RequestExecutionContext,
  plugin::{CreatablePlugin, Plugin, PluginError},
};
use apq_config::PluginDefinition;
use tracing::debug;

#[derive(Debug, Default)]
pub struct PluginManager {
  plugins: Vec<Box<dyn Plugin>>,
}

impl PluginManager {
  pub fn new_from_vec(plugins: Vec<Box<dyn Plugin>>) -> Self {
    Self { plugins }
  }

  pub async fn create_plugin<T: CreatablePlugin>(
    config: T::Config,
  ) -> Result<Box<dyn Plugin>, PluginError> {
    T::create(config).await
  }

  pub async fn new(plugins_config: &Option<Vec<PluginDefinition>>) -> Result<Self, PluginError> {
    let mut instance = PluginManager::default();

    if let Some(config_defs) = plugins_config {
      for plugin_def in config_defs.iter() {
        let plugin = match plugin_def {
          PluginDefinition::PersistedOperationsPlugin {
            enabled: Some(true),
            config,
          } => {
            Self::create_plugin::<persisted_operations_plugin::Plugin>(
              config.clone().unwrap_or_default(),
            )
            .await?
          }
          // In case plugin is not enabled, we are skipping it.
          _ => continue,
        };

        instance.register_boxed_plugin(plugin)
      }
    };

    debug!("plugin manager created with {} plugins", instance.plugins.len());

    Ok(instance)
  }

  pub fn register_boxed_plugin(&mut self, plugin: Box<dyn Plugin>) {
    self.plugins.push(plugin);
  }

  pub fn register_plugin(&mut self, plugin: impl Plugin + 'static) {
    self.plugins.push(Box::new(plugin));
  }

  #[tracing::instrument(level = "debug", skip(self, context))]
  pub async fn on_downstream_http_request(&self, context: &mut RequestExecutionContext) {
    for plugin in self.plugins.iter() {
      plugin.on_downstream_http_request(context).await;

      if context.is_short_circuit() {
        return;
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use apq_common::{graphql::GraphQLResponse, http::GraphQLHttpRequest};
  use std::{cell::Cell, rc::Rc};
  use tokio::test;

  #[derive(Debug)]
  struct CountingPlugin {
    calls: Rc<Cell<usize>>,
    short_circuit: bool,
  }

  #[async_trait::async_trait(?Send)]
  impl Plugin for CountingPlugin {
    async fn on_downstream_http_request(&self, ctx: &mut RequestExecutionContext) {
      self.calls.set(self.calls.get() + 1);

      if self.short_circuit {
        ctx.short_circuit(GraphQLResponse::new_error("stop").into());
      }
    }
  }

  #[test]
  async fn stops_after_short_circuit() {
    let calls = Rc::new(Cell::new(0));
    let mut manager = PluginManager::default();
    manager.register_plugin(CountingPlugin {
      calls: calls.clone(),
      short_circuit: true,
    });
    manager.register_plugin(CountingPlugin {
      calls: calls.clone(),
      short_circuit: false,
    });

    let mut ctx = RequestExecutionContext::new(GraphQLHttpRequest::default());
    manager.on_downstream_http_request(&mut ctx).await;

    assert!(ctx.is_short_circuit());
    assert_eq!(calls.get(), 1);
  }

  #[test]
  async fn skips_disabled_plugins() {
    let manager = PluginManager::new(&Some(vec![PluginDefinition::PersistedOperationsPlugin {
      enabled: Some(false),
      config: None,
    }]))
    .await
    .expect("valid plugins");

    assert!(manager.plugins.is_empty());
  }

  #[test]
  async fn creates_configured_plugins() {
    let manager = PluginManager::new(&Some(vec![PluginDefinition::PersistedOperationsPlugin {
      enabled: Some(true),
      config: None,
    }]))
    .await
    .expect("valid plugins");

    assert_eq!(manager.plugins.len(), 1);
  }
}
