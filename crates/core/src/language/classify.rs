//! Tier classification under strict and relaxed policies.
//!
//! Strict rules keep tiers phonetically clean. Relaxed rules only backfill a
//! request the strict pass could not fill, so each relaxed rule must admit
//! everything its strict counterpart admits.

use serde::{Deserialize, Serialize};

use crate::types::Tier;

use super::phonetics::{analyze, WordFeatures};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Policy {
    Strict,
    Relaxed,
}

/// Inclusive bounds on word measurements. `None` leaves a side open.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TierBounds {
    #[serde(default)]
    pub min_length: Option<usize>,
    #[serde(default)]
    pub max_length: Option<usize>,
    #[serde(default)]
    pub min_syllables: Option<usize>,
    #[serde(default)]
    pub max_syllables: Option<usize>,
    #[serde(default)]
    pub min_score: Option<u32>,
    #[serde(default)]
    pub max_score: Option<u32>,
    /// Reject words with a written accent
    #[serde(default)]
    pub forbid_accents: bool,
}

fn within<T: PartialOrd>(value: T, min: Option<T>, max: Option<T>) -> bool {
    min.map_or(true, |m| value >= m) && max.map_or(true, |m| value <= m)
}

/// `outer` leaves open or widens whatever `inner` bounds.
fn range_covers<T: PartialOrd + Copy>(
    outer: (Option<T>, Option<T>),
    inner: (Option<T>, Option<T>),
) -> bool {
    let min_ok = match (outer.0, inner.0) {
        (None, _) => true,
        (Some(o), Some(i)) => o <= i,
        (Some(_), None) => false,
    };
    let max_ok = match (outer.1, inner.1) {
        (None, _) => true,
        (Some(o), Some(i)) => o >= i,
        (Some(_), None) => false,
    };
    min_ok && max_ok
}

impl TierBounds {
    pub fn admits(&self, f: &WordFeatures) -> bool {
        within(f.length, self.min_length, self.max_length)
            && within(f.syllables, self.min_syllables, self.max_syllables)
            && within(f.score, self.min_score, self.max_score)
            && !(self.forbid_accents && f.has_accent)
    }

    /// True when every word admitted by `other` is also admitted by `self`.
    pub fn covers(&self, other: &TierBounds) -> bool {
        range_covers((self.min_length, self.max_length), (other.min_length, other.max_length))
            && range_covers(
                (self.min_syllables, self.max_syllables),
                (other.min_syllables, other.max_syllables),
            )
            && range_covers((self.min_score, self.max_score), (other.min_score, other.max_score))
            && (!self.forbid_accents || other.forbid_accents)
    }
}

/// Strict and relaxed bounds for one tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierRule {
    pub strict: TierBounds,
    pub relaxed: TierBounds,
}

/// Classification thresholds for all three tiers.
///
/// The defaults are empirically tuned values, kept configurable rather than
/// derived. A tier missing from a config file keeps its default rule; a tier
/// that is present must give both `strict` and `relaxed` in full, since an
/// omitted bound means "open".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierRules {
    pub one: TierRule,
    pub two: TierRule,
    pub three: TierRule,
}

impl Default for TierRules {
    fn default() -> Self {
        Self {
            one: TierRule {
                strict: TierBounds {
                    max_length: Some(6),
                    max_syllables: Some(2),
                    max_score: Some(1),
                    forbid_accents: true,
                    ..Default::default()
                },
                relaxed: TierBounds {
                    max_length: Some(7),
                    max_syllables: Some(2),
                    max_score: Some(2),
                    ..Default::default()
                },
            },
            two: TierRule {
                strict: TierBounds {
                    min_length: Some(5),
                    max_length: Some(9),
                    min_syllables: Some(2),
                    max_syllables: Some(3),
                    min_score: Some(1),
                    max_score: Some(3),
                    forbid_accents: false,
                },
                relaxed: TierBounds {
                    min_score: Some(1),
                    max_score: Some(4),
                    ..Default::default()
                },
            },
            three: TierRule {
                strict: TierBounds {
                    min_length: Some(8),
                    max_length: Some(12),
                    min_syllables: Some(3),
                    min_score: Some(3),
                    ..Default::default()
                },
                relaxed: TierBounds {
                    min_score: Some(2),
                    ..Default::default()
                },
            },
        }
    }
}

impl TierRules {
    /// Check that each relaxed rule admits everything its strict rule does.
    pub fn validate(&self) -> anyhow::Result<()> {
        for tier in Tier::ALL {
            let rule = self.rule(tier);
            if !rule.relaxed.covers(&rule.strict) {
                anyhow::bail!("Relaxed rule for tier {} is narrower than its strict rule", tier);
            }
        }
        Ok(())
    }

    pub fn rule(&self, tier: Tier) -> &TierRule {
        match tier {
            Tier::One => &self.one,
            Tier::Two => &self.two,
            Tier::Three => &self.three,
        }
    }

    pub fn bounds(&self, tier: Tier, policy: Policy) -> &TierBounds {
        let rule = self.rule(tier);
        match policy {
            Policy::Strict => &rule.strict,
            Policy::Relaxed => &rule.relaxed,
        }
    }

    pub fn fits(&self, word: &str, tier: Tier, policy: Policy) -> bool {
        self.fits_features(&analyze(word), tier, policy)
    }

    pub fn fits_features(&self, features: &WordFeatures, tier: Tier, policy: Policy) -> bool {
        self.bounds(tier, policy).admits(features)
    }
}

/// Strict tier check with the default thresholds.
pub fn fits_tier(word: &str, tier: Tier) -> bool {
    TierRules::default().fits(word, tier, Policy::Strict)
}

/// Relaxed tier check with the default thresholds.
pub fn fits_tier_relaxed(word: &str, tier: Tier) -> bool {
    TierRules::default().fits(word, tier, Policy::Relaxed)
}
