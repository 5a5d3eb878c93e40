use thiserror::Error;

use crate::types::Tier;

/// Failure of a single generator call. Recoverable: the round yields no
/// candidates and the next round proceeds.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[cfg(feature = "openai")]
    #[error("generator request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("generator returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed generator response: {0}")]
    Malformed(String),
    #[error("no API key configured (set OPENAI_API_KEY)")]
    MissingApiKey,
}

/// Terminal outcome of a generation request that produced nothing to insert.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("limit of {cap} exercises already reached for tier {tier} ({existing} existing)")]
    QuotaExceeded { tier: Tier, cap: usize, existing: usize },
    #[error("could not generate suitable words without repeats after {rounds} round(s)")]
    Exhausted { rounds: usize },
    #[error("store operation failed: {0:#}")]
    Store(anyhow::Error),
}

impl GenerationError {
    /// HTTP status a transport layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            GenerationError::QuotaExceeded { .. } => 409,
            GenerationError::Exhausted { .. } => 422,
            GenerationError::Store(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_are_distinct() {
        let quota = GenerationError::QuotaExceeded { tier: Tier::One, cap: 10, existing: 10 };
        let exhausted = GenerationError::Exhausted { rounds: 3 };
        let store = GenerationError::Store(anyhow::anyhow!("connection reset"));
        assert_eq!(quota.status_code(), 409);
        assert_eq!(exhausted.status_code(), 422);
        assert_eq!(store.status_code(), 500);
    }

    #[test]
    fn test_messages() {
        let quota = GenerationError::QuotaExceeded { tier: Tier::Two, cap: 10, existing: 12 };
        assert_eq!(
            quota.to_string(),
            "limit of 10 exercises already reached for tier 2 (12 existing)"
        );
        let store = GenerationError::Store(anyhow::anyhow!("disk full").context("bulk insert"));
        assert_eq!(store.to_string(), "store operation failed: bulk insert: disk full");
    }
}
