//! Word generation: generator backends, candidate selection and the
//! bounded-round orchestrator.

pub mod forbidden;
#[cfg(feature = "openai")]
pub mod openai;
pub mod orchestrator;
pub mod parse;
pub mod prompt;
pub mod select;

use crate::error::GeneratorError;
use crate::types::Tier;

pub use forbidden::ForbiddenSet;
pub use orchestrator::run_generation;
pub use select::{select, select_with_rules};

/// External word generation capability.
///
/// Implementations may return fewer than `count` words, lines with leftover
/// numbering, or an error; the orchestrator copes with all three.
pub trait WordGenerator: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &str;

    fn generate(
        &self,
        topic: &str,
        count: usize,
        tier: Tier,
        forbidden: &[String],
    ) -> Result<Vec<String>, GeneratorError>;
}

/// Replays a fixed block of generator-style text on every call.
///
/// Used for offline runs against a saved model response.
pub struct ReplayGenerator {
    candidates: Vec<String>,
}

impl ReplayGenerator {
    pub fn from_text(text: &str) -> Self {
        Self {
            candidates: parse::parse_candidates(text),
        }
    }
}

impl WordGenerator for ReplayGenerator {
    fn name(&self) -> &str {
        "replay"
    }

    fn generate(
        &self,
        _topic: &str,
        _count: usize,
        _tier: Tier,
        _forbidden: &[String],
    ) -> Result<Vec<String>, GeneratorError> {
        Ok(self.candidates.clone())
    }
}

/// Pick a generator backend by name.
///
/// `model` overrides the configured model of network backends.
pub fn get_generator(
    name: &str,
    replay_text: Option<&str>,
    model: Option<&str>,
) -> anyhow::Result<Box<dyn WordGenerator>> {
    match name {
        "replay" => {
            let text = replay_text
                .ok_or_else(|| anyhow::anyhow!("The replay generator needs a response file"))?;
            Ok(Box::new(ReplayGenerator::from_text(text)))
        }
        #[cfg(feature = "openai")]
        "openai" => {
            let mut config = openai::OpenAiConfig::from_env();
            if let Some(m) = model {
                config.model = m.to_string();
            }
            Ok(Box::new(openai::OpenAiGenerator::new(config)?))
        }
        other => anyhow::bail!("Unknown generator backend: {}", other),
    }
}
