mod config;
mod lookup;
mod plugin;
mod resolver;

pub use config::PersistedOperationsFileFormat as FileFormat;
pub use config::PersistedOperationsPluginConfig as Config;
pub use config::PersistedOperationsStoreConfig as Store;
pub use lookup::{function::FnLookup, manifest::ManifestLookup, OperationLookup};
pub use plugin::{
  PersistedOperationsPlugin as Plugin, PersistedOperationsPluginError, PERSISTED_OPERATION_ID_CONTEXT_KEY,
};
pub use resolver::{PersistedOperationsResolver as Resolver, Resolution, ResolverError};
