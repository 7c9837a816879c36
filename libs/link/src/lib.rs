mod link;
mod operation;
mod persisted_link;
#[cfg(feature = "test_utils")]
pub mod test_utils;

pub use link::{Link, LinkChain, LinkError, NextLink, ResponseStream};
pub use operation::{HttpOptions, Operation, OperationContext, QueryDocument};
pub use persisted_link::{
  default_id_from_operation, IdFromOperation, PersistedLink, PersistedLinkOptions,
};
