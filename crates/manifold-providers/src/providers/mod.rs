//! Concrete backend adapters.
//!
//! Four adapters compose the shared [`OpenAiCompat`] strategy for plain
//! completion; `claude` speaks its own wire protocol end to end.
//!
//! [`OpenAiCompat`]: crate::openai_compat::OpenAiCompat

pub mod claude;
pub mod gemini;
pub mod ollama;
pub mod openai;
pub mod perplexity;

use crate::registry::Registration;

/// The registration table. Adding a backend means writing its module and
/// listing it here — the registry itself never changes.
pub(crate) fn registrations() -> Vec<Registration> {
    vec![
        openai::registration(),
        claude::registration(),
        gemini::registration(),
        ollama::registration(),
        perplexity::registration(),
    ]
}
