//! Provider registry — startup-time registration table, descriptor
//! harvest, and instance resolution.
//!
//! Every adapter module contributes a [`Registration`] to the table in
//! [`crate::providers`]. At registry construction each registered adapter
//! is instantiated once with placeholder credentials purely to read back
//! its static metadata; that throwaway probe performs no I/O and is
//! discarded immediately. Resolution always constructs a fresh adapter —
//! the probe is never handed out, and instances are never shared between
//! callers.

use tracing::debug;

use manifold_core::{Catalog, ProviderError};

use crate::providers;
use crate::settings::ProviderOptions;
use crate::traits::{ConfigSchema, LlmProvider};

/// Constructor for a fresh adapter instance. Must not perform I/O.
pub type AdapterCtor = fn(Vec<String>, ProviderOptions) -> Box<dyn LlmProvider>;

/// One adapter's entry in the registration table.
pub struct Registration {
    /// Key under which the model catalog lists this provider.
    pub catalog_key: &'static str,
    /// Fresh-instance constructor.
    pub ctor: AdapterCtor,
}

/// Static, provider-level metadata gathered once at registry build.
#[derive(Clone, Debug)]
pub struct Descriptor {
    /// Stable lowercase provider name.
    pub name: String,
    /// Ordered model identifiers.
    pub models: Vec<String>,
    /// Configuration parameter table.
    pub config: ConfigSchema,
    /// The adapter's default endpoint.
    pub default_endpoint: String,
}

struct Entry {
    descriptor: Descriptor,
    ctor: AdapterCtor,
}

/// The provider registry.
///
/// The descriptor table is built exactly once per registry lifetime and
/// is read-only afterwards, so a `Registry` can be shared freely across
/// threads.
pub struct Registry {
    entries: Vec<Entry>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Build the registry over the builtin model catalog.
    pub fn new() -> Self {
        Self::with_catalog(&Catalog::builtin())
    }

    /// Build the registry over an injected model catalog.
    pub fn with_catalog(catalog: &Catalog) -> Self {
        Self::from_registrations(providers::registrations(), catalog)
    }

    /// Build a registry from an explicit registration list — the builtin
    /// table plus any additional backends the caller registers.
    pub fn from_registrations(registrations: Vec<Registration>, catalog: &Catalog) -> Self {
        let entries = registrations
            .into_iter()
            .map(|registration| {
                let models = catalog.model_ids(registration.catalog_key);
                let probe = (registration.ctor)(models, ProviderOptions::discovery());
                let descriptor = Descriptor {
                    name: probe.provider_name().to_string(),
                    models: probe.models().to_vec(),
                    config: probe.config_schema(),
                    default_endpoint: probe.base_url().to_string(),
                };
                debug!(
                    provider = %descriptor.name,
                    models = descriptor.models.len(),
                    endpoint = %descriptor.default_endpoint,
                    "registered provider"
                );
                Entry {
                    descriptor,
                    ctor: registration.ctor,
                }
            })
            .collect();

        Registry { entries }
    }

    /// All provider descriptors, in registration order.
    pub fn descriptors(&self) -> impl Iterator<Item = &Descriptor> {
        self.entries.iter().map(|entry| &entry.descriptor)
    }

    /// All registered provider names.
    pub fn provider_names(&self) -> Vec<String> {
        self.descriptors().map(|d| d.name.clone()).collect()
    }

    /// Ordered model identifiers for a provider.
    pub fn models_for(&self, name: &str) -> Result<&[String], ProviderError> {
        self.find(name).map(|d| d.models.as_slice())
    }

    /// Configuration parameter table for a provider.
    pub fn config_for(&self, name: &str) -> Result<ConfigSchema, ProviderError> {
        self.find(name).map(|d| d.config)
    }

    fn find(&self, name: &str) -> Result<&Descriptor, ProviderError> {
        self.descriptors()
            .find(|d| d.name == name)
            .ok_or_else(|| ProviderError::ProviderNotFound {
                query: name.to_string(),
            })
    }

    /// Resolve a fresh adapter instance.
    ///
    /// An `endpoint` selects the first descriptor whose default endpoint
    /// matches exactly; otherwise `name` selects case-insensitively. The
    /// returned instance is constructed from the caller's options and
    /// owned exclusively by the caller.
    pub fn instance(
        &self,
        name: Option<&str>,
        endpoint: Option<&str>,
        options: ProviderOptions,
    ) -> Result<Box<dyn LlmProvider>, ProviderError> {
        let entry = endpoint
            .and_then(|url| {
                self.entries
                    .iter()
                    .find(|e| e.descriptor.default_endpoint == url)
            })
            .or_else(|| {
                name.and_then(|n| {
                    self.entries
                        .iter()
                        .find(|e| e.descriptor.name.eq_ignore_ascii_case(n))
                })
            });

        match entry {
            Some(entry) => Ok((entry.ctor)(entry.descriptor.models.clone(), options)),
            None => Err(ProviderError::ProviderNotFound {
                query: name
                    .or(endpoint)
                    .unwrap_or("no name or endpoint given")
                    .to_string(),
            }),
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
