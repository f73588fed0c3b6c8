//! LLM provider abstraction layer for Manifold.
//!
//! A registry of interchangeable LLM backends behind one capability
//! contract, plus grounded-search normalization that reconciles three
//! different web-search-augmented wire protocols into one result shape.
//!
//! # Architecture
//!
//! - [`traits::LlmProvider`] — the contract every backend implements
//! - [`registry::Registry`] — registration table, descriptors, resolution
//! - [`openai_compat::OpenAiCompat`] — shared OpenAI-shape completion
//!   strategy composed into four of the five adapters
//! - [`providers`] — the concrete backend adapters
//!
//! # Example
//!
//! ```no_run
//! use manifold_providers::{LlmProvider, ProviderOptions, Registry};
//!
//! # async fn run() -> Result<(), manifold_core::ProviderError> {
//! let registry = Registry::new();
//! let mut provider = registry.instance(
//!     Some("openai"),
//!     None,
//!     ProviderOptions::with_api_key("sk-…").model("gpt-4o"),
//! )?;
//! provider.settings_mut().set_temperature(0.7)?;
//! let reply = provider.chat_completion("Hello!", false).await?;
//! # let _ = reply;
//! # Ok(())
//! # }
//! ```

pub mod openai_compat;
pub mod providers;
pub mod registry;
pub mod settings;
pub mod traits;

pub use openai_compat::OpenAiCompat;
pub use registry::{Descriptor, Registration, Registry};
pub use settings::{ProviderOptions, ProviderSettings};
pub use traits::{ConfigSchema, LlmProvider, ParamType, BASE_CONFIG_SCHEMA};
