//! Word-level heuristics: normalization, syllables, difficulty and tiers.

pub mod classify;
pub mod normalize;
pub mod phonetics;

pub use classify::{fits_tier, fits_tier_relaxed, Policy, TierRules};
pub use normalize::normalize;
pub use phonetics::{analyze, difficulty_score, syllable_count, WordFeatures};
