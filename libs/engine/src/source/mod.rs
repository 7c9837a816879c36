pub mod mock_source;
pub mod runtime;
