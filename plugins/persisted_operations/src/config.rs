use apq_common::serde_utils::{
  JsonSchemaExample, JsonSchemaExampleMetadata, JsonSchemaExampleWrapperType, LocalFileReference,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Debug, Clone)]
pub struct ApolloPersistedQueryManifest {
  pub format: String,
  pub version: i32,
  pub operations: Vec<ApolloPersistedQueryManifestRecord>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ApolloPersistedQueryManifestRecord {
  pub id: String,
  pub body: String,
  pub name: String,
  #[serde(rename = "type")]
  pub operation_type: String,
}

/// The `persisted_operations` plugin resolves automatic persisted queries: requests that carry an
/// identifier under `extensions.persisted.id` instead of the query text.
///
/// When the identifier is known, the request body is rewritten with the matching query text and
/// executed as usual. When it is not, the plugin answers with:
///
/// `{"errors": [{"message": "PersistedQueryNotFound"}]}`
///
/// and compatible clients retry the same operation with the full query text.
///
/// Requests that already contain a `query` are never modified.
#[derive(Deserialize, Serialize, Debug, Clone, Default, JsonSchema)]
#[schemars(example = "persisted_operations_example_1")]
pub struct PersistedOperationsPluginConfig {
  /// The store used to look up query text by identifier, usually the manifest emitted by the client build.
  ///
  /// When no store is configured, a lookup must be provided programmatically, otherwise every persisted request fails with a configuration error.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub store: Option<PersistedOperationsStoreConfig>,
}

fn persisted_operations_example_1() -> JsonSchemaExample<PersistedOperationsPluginConfig> {
  JsonSchemaExample {
    metadata: JsonSchemaExampleMetadata::new(
      "Local Manifest",
      Some("This example resolves persisted query identifiers from a local file called `operations.json`, using the Key->Value map format."),
    ),
    wrapper: Some(JsonSchemaExampleWrapperType::Plugin {
      name: "persisted_operations".to_string(),
    }),
    example: PersistedOperationsPluginConfig {
      store: Some(PersistedOperationsStoreConfig::File {
        file: LocalFileReference {
          path: "operations.json".to_string(),
          contents: "".to_string(),
        },
        format: PersistedOperationsFileFormat::JsonKeyValue,
      }),
    },
  }
}

#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
#[serde(tag = "source")]
pub enum PersistedOperationsStoreConfig {
  #[serde(rename = "file")]
  #[schemars(title = "file")]
  /// File-based manifest. The path specified is relative to the location of the root configuration file.
  /// The file contents are loaded into memory on startup and are not reloaded.
  File {
    #[serde(rename = "path")]
    /// A path to a local file on the file-system. Relative to the location of the root configuration file.
    file: LocalFileReference,
    /// The format and the expected structure of the loaded manifest file.
    format: PersistedOperationsFileFormat,
  },
}

#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema, PartialEq)]
pub enum PersistedOperationsFileFormat {
  #[serde(rename = "apollo_persisted_query_manifest")]
  #[schemars(title = "apollo_persisted_query_manifest")]
  /// JSON file formated based on [Apollo Persisted Query Manifest](https://www.apollographql.com/docs/kotlin/advanced/persisted-queries/#1-generate-operation-manifest).
  ApolloPersistedQueryManifest,
  #[serde(rename = "json_key_value")]
  #[schemars(title = "json_key_value")]
  /// A simple JSON map of key-value pairs.
  ///
  /// Example:
  /// `{"Q1": "query Me { me { id } }"}`
  JsonKeyValue,
}
