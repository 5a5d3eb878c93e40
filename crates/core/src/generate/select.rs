//! Filter, dedupe and rank raw candidates for a tier.

use std::collections::HashSet;

use crate::language::classify::{Policy, TierRules};
use crate::language::normalize::normalize;
use crate::types::Tier;

use super::forbidden::ForbiddenSet;

/// Pick up to `needed` words for `tier` with the default thresholds.
pub fn select<S: AsRef<str>>(
    candidates: &[S],
    tier: Tier,
    needed: usize,
    already_used: &ForbiddenSet,
) -> Vec<String> {
    select_with_rules(candidates, tier, needed, already_used, &TierRules::default())
}

/// Pick up to `needed` words for `tier`.
///
/// A strict pass over the candidates runs first, in order; if it leaves the
/// request short, a relaxed pass over the same order backfills. Candidates
/// with an empty key, a key in `already_used`, or a key accepted earlier in
/// this call are skipped. `already_used` is not modified.
pub fn select_with_rules<S: AsRef<str>>(
    candidates: &[S],
    tier: Tier,
    needed: usize,
    already_used: &ForbiddenSet,
    rules: &TierRules,
) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut accepted = Vec::new();

    for policy in [Policy::Strict, Policy::Relaxed] {
        for raw in candidates {
            if accepted.len() >= needed {
                return accepted;
            }
            let word = raw.as_ref().trim();
            let key = normalize(word);
            if key.is_empty() || already_used.contains_key(&key) || seen.contains(&key) {
                continue;
            }
            if rules.fits(word, tier, policy) {
                seen.insert(key);
                accepted.push(word.to_string());
            } else {
                log::debug!("{:?} rejected for tier {} ({:?})", word, tier, policy);
            }
        }
    }

    accepted
}
