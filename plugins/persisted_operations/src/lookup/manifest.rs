use std::collections::HashMap;

use tracing::{debug, info};

use super::OperationLookup;
use crate::config::{ApolloPersistedQueryManifest, PersistedOperationsFileFormat};

/// An in-memory map of identifiers to query text, loaded once from a manifest file.
#[derive(Debug)]
pub struct ManifestLookup {
  known_operations: HashMap<String, String>,
}

#[async_trait::async_trait(?Send)]
impl OperationLookup for ManifestLookup {
  async fn get_operation(&self, id: &str) -> Option<String> {
    self.known_operations.get(id).cloned()
  }
}

impl ManifestLookup {
  pub fn new_from_file_contents(
    contents: &str,
    file_format: &PersistedOperationsFileFormat,
  ) -> Result<Self, serde_json::Error> {
    debug!(
      "creating persisted operations lookup from a local FS file, the expected file format is: {:?}",
      file_format
    );

    let result = match file_format {
      PersistedOperationsFileFormat::ApolloPersistedQueryManifest => {
        let parsed = serde_json::from_str::<ApolloPersistedQueryManifest>(contents)?;

        Self {
          known_operations: parsed
            .operations
            .into_iter()
            .map(|record| (record.id, record.body))
            .collect(),
        }
      }
      PersistedOperationsFileFormat::JsonKeyValue => Self {
        known_operations: serde_json::from_str(contents)?,
      },
    };

    info!(
      "loaded persisted operations from file, total records: {:?}",
      result.known_operations.len()
    );

    Ok(result)
  }

  pub fn len(&self) -> usize {
    self.known_operations.len()
  }

  pub fn is_empty(&self) -> bool {
    self.known_operations.is_empty()
  }
}
