//! Core crate for Manifold — types, error taxonomy, and model catalog
//! shared by the provider layer and its callers.

pub mod catalog;
pub mod error;
pub mod types;

pub use catalog::{Catalog, ModelEntry};
pub use error::{mapped_message, ProviderError, UpstreamKind};
pub use types::{ChatMessage, GroundedRequest, GroundedSearchResult, Role, TokenMetrics};
