use std::fmt::{Display, Formatter};

use bytes::Bytes;
use mime::{Mime, APPLICATION_JSON};
use serde::{Deserialize, Serialize};
use serde_json::{Error as SerdeError, Map, Value};

use crate::http::{
  extract_accept, extract_content_type, GraphQLHttpRequest, GraphQLHttpResponse, HeaderValue,
  HttpHeadersMap, StatusCode, CONTENT_TYPE,
};

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct GraphQLRequest {
  // The GraphQL operation, as string. Persisted requests omit it.
  #[serde(rename = "query", default, skip_serializing_if = "Option::is_none")]
  pub operation: Option<String>,
  // The operation name, if specified
  #[serde(rename = "operationName", default)]
  #[serde(skip_serializing_if = "Option::is_none")]
  pub operation_name: Option<String>,
  // GraphQL operation variables, in JSON format
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub variables: Option<Map<String, Value>>,
  // GraphQL execution extensions, in JSON format
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub extensions: Option<Map<String, Value>>,
}

impl Display for GraphQLRequest {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(
      f,
      "{}",
      serde_json::to_string(self)
        .unwrap_or_else(|e| ExtractGraphQLOperationError::SerializationError(e).to_string())
    )
  }
}

#[derive(thiserror::Error, Debug)]
pub enum ExtractGraphQLOperationError {
  #[error("invalid content-type header")]
  InvalidContentTypeHeader,
  #[error("invalid body json format")]
  InvalidBodyJsonFormat(SerdeError),
  #[error("failed to locate any GraphQL operation in request")]
  EmptyExtraction,
  #[error("serialization error")]
  SerializationError(SerdeError),
}

impl ExtractGraphQLOperationError {
  pub fn into_response(&self, accept: Option<Mime>) -> GraphQLHttpResponse {
    let status = match (self, accept) {
      (_, None) => StatusCode::OK,
      (ExtractGraphQLOperationError::EmptyExtraction, Some(accept_header))
        if accept_header == APPLICATION_JSON =>
      {
        StatusCode::OK
      }
      _ => StatusCode::BAD_REQUEST,
    };

    GraphQLResponse::new_error(self.to_string().as_str()).into_with_status_code(status)
  }
}

impl GraphQLRequest {
  pub fn new_from_http_post(
    http_request: &GraphQLHttpRequest,
  ) -> (
    Option<Mime>,
    Option<Mime>,
    Result<GraphQLRequest, ExtractGraphQLOperationError>,
  ) {
    // Extract the content-type and default to application/json when it's not set
    // see https://graphql.github.io/graphql-over-http/draft/#sec-POST
    let content_type = extract_content_type(&http_request.headers).unwrap_or(APPLICATION_JSON);
    let accept = extract_accept(&http_request.headers);

    if content_type.type_() != mime::APPLICATION_JSON.type_() {
      return (
        Some(content_type),
        accept,
        Err(ExtractGraphQLOperationError::InvalidContentTypeHeader),
      );
    }

    match http_request.json_body::<GraphQLRequest>() {
      Ok(body) if body.has_operation() => (Some(content_type), accept, Ok(body)),
      Ok(_) => (
        Some(content_type),
        accept,
        Err(ExtractGraphQLOperationError::EmptyExtraction),
      ),
      Err(e) => (
        Some(content_type),
        accept,
        Err(ExtractGraphQLOperationError::InvalidBodyJsonFormat(e)),
      ),
    }
  }

  pub fn has_operation(&self) -> bool {
    self.operation.as_ref().is_some_and(|op| !op.is_empty())
  }
}

impl From<&GraphQLRequest> for Bytes {
  fn from(request: &GraphQLRequest) -> Self {
    serde_json::to_vec(&request)
      .unwrap_or_else(|e| {
        ExtractGraphQLOperationError::SerializationError(e)
          .to_string()
          .into_bytes()
      })
      .into()
  }
}

impl From<GraphQLRequest> for Bytes {
  fn from(value: GraphQLRequest) -> Self {
    (&value).into()
  }
}

/// An error with a message and optional extensions.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct GraphQLError {
  /// The error message.
  pub message: String,
  /// Extensions to the error.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub extensions: Option<Map<String, Value>>,
}

impl std::fmt::Display for GraphQLError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.message)
  }
}

impl GraphQLError {
  pub fn new(message: &str) -> Self {
    GraphQLError {
      message: message.to_string(),
      extensions: None,
    }
  }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct GraphQLResponse {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub data: Option<Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub errors: Option<Vec<GraphQLError>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub extensions: Option<Value>,

  #[serde(skip)]
  downstream_http_code: Option<StatusCode>,
}

impl GraphQLResponse {
  pub fn new_error(error: &str) -> Self {
    GraphQLResponse {
      data: None,
      errors: Some(vec![GraphQLError::new(error)]),
      extensions: None,
      downstream_http_code: None,
    }
  }

  pub fn new_error_with_code(error: &str, status_code: StatusCode) -> Self {
    GraphQLResponse {
      data: None,
      errors: Some(vec![GraphQLError::new(error)]),
      extensions: None,
      downstream_http_code: Some(status_code),
    }
  }

  /// Returns `true` when any error in the response carries exactly `message`.
  pub fn has_error_message(&self, message: &str) -> bool {
    self
      .errors
      .as_ref()
      .is_some_and(|errors| errors.iter().any(|e| e.message == message))
  }

  pub fn into_with_status_code(self, code: StatusCode) -> GraphQLHttpResponse {
    let mut headers = HttpHeadersMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    GraphQLHttpResponse {
      body: self.into(),
      status: code,
      headers,
    }
  }
}

impl From<GraphQLResponse> for Bytes {
  fn from(response: GraphQLResponse) -> Self {
    serde_json::to_vec(&response)
      .unwrap_or_else(|e| {
        ExtractGraphQLOperationError::SerializationError(e)
          .to_string()
          .into_bytes()
      })
      .into()
  }
}

impl From<GraphQLResponse> for GraphQLHttpResponse {
  fn from(response: GraphQLResponse) -> Self {
    let status = response.downstream_http_code.unwrap_or(StatusCode::OK);

    response.into_with_status_code(status)
  }
}
