//! Bounded-round generation loop.
//!
//! One call handles one request: check the tier quota, read the section's
//! used words, then ask the generator for padded batches until the quota is
//! met or the round budget runs out. Accepted words go to the store in a
//! single bulk insert.

use crate::config::GenerationConfig;
use crate::error::GenerationError;
use crate::store::ExerciseStore;
use crate::types::{
    GenerationRequest, GenerationResult, GenerationStatus, NewExercise, RoundOutcome,
    RoundReport,
};

use super::forbidden::ForbiddenSet;
use super::parse::parse_candidates;
use super::select::select_with_rules;
use super::WordGenerator;

/// Truncate to at most `max` characters.
fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Run one generation request to completion.
///
/// Fails with `QuotaExceeded` before calling the generator when the tier is
/// full, with `Exhausted` when no round produced an acceptable word, and with
/// `Store` when any storage call fails. Generator failures only empty their
/// round.
pub fn run_generation(
    request: &GenerationRequest,
    generator: &dyn WordGenerator,
    store: &mut dyn ExerciseStore,
    config: &GenerationConfig,
) -> Result<GenerationResult, GenerationError> {
    let tier = request.tier;
    let cap = config.hard_cap;

    // Quota
    let existing = store
        .count_existing(request.tenant_id, request.section_id, tier)
        .map_err(GenerationError::Store)?;
    let remaining = cap.saturating_sub(existing);
    if remaining == 0 {
        log::warn!(
            "Tier {} of section {} already holds {} item(s) (cap {})",
            tier,
            request.section_id,
            existing,
            cap
        );
        return Err(GenerationError::QuotaExceeded { tier, cap, existing });
    }
    let requested = request.requested_count.clamp(1, cap.max(1));
    let to_generate = requested.min(remaining);

    // Words used anywhere in the section, every tier
    let prior = store
        .list_forbidden(request.tenant_id, request.section_id)
        .map_err(GenerationError::Store)?;
    let mut used = ForbiddenSet::from_raw(&prior);

    log::info!(
        "Generating {} word(s) for tier {} on {:?} ({} existing, {} forbidden, backend {})",
        to_generate,
        tier,
        request.topic,
        existing,
        used.len(),
        generator.name()
    );

    let mut accepted: Vec<String> = Vec::new();
    let mut rounds = Vec::new();

    for round in 1..=config.max_rounds {
        if accepted.len() >= to_generate {
            break;
        }
        let needed = to_generate - accepted.len();
        let ask = needed + config.surplus;
        let hint = used.recent(config.forbidden_hint_limit).to_vec();

        let (candidates, outcome) = match generator.generate(&request.topic, ask, tier, &hint) {
            Ok(raw) => {
                let cleaned: Vec<String> = raw.iter().flat_map(|r| parse_candidates(r)).collect();
                (cleaned, RoundOutcome::Ok)
            }
            Err(e) => {
                log::warn!("Round {}: {}", round, e);
                (Vec::new(), RoundOutcome::GeneratorUnavailable(e.to_string()))
            }
        };

        let picked = select_with_rules(candidates.as_slice(), tier, needed, &used, &config.rules);
        for word in &picked {
            used.insert(word);
        }
        log::info!(
            "Round {}: asked {}, got {} candidate(s), accepted {}",
            round,
            ask,
            candidates.len(),
            picked.len()
        );

        rounds.push(RoundReport {
            round,
            requested: ask,
            candidates: candidates.len(),
            accepted: picked.len(),
            outcome,
        });
        accepted.extend(picked);
    }

    if accepted.is_empty() {
        log::warn!("No acceptable words after {} round(s)", rounds.len());
        return Err(GenerationError::Exhausted { rounds: rounds.len() });
    }

    let kind = request
        .kind
        .clone()
        .filter(|k| !k.trim().is_empty())
        .unwrap_or_else(|| config.default_kind.clone());
    let accepted: Vec<String> = accepted
        .iter()
        .map(|w| truncate_chars(w, config.max_content_chars))
        .collect();
    let items: Vec<NewExercise> = accepted
        .iter()
        .map(|w| NewExercise {
            content: w.clone(),
            kind: kind.clone(),
            enabled: true,
        })
        .collect();

    let insert_report = store
        .bulk_insert(&items, tier, request.section_id, request.actor_id, request.tenant_id)
        .map_err(GenerationError::Store)?;

    if insert_report.inserted < accepted.len() {
        log::warn!(
            "Store inserted {} of {} accepted word(s)",
            insert_report.inserted,
            accepted.len()
        );
    }

    let shortfall = accepted.len() < to_generate;
    let status = if shortfall {
        log::warn!("Generated {} of {} requested word(s)", accepted.len(), to_generate);
        GenerationStatus::PartialSuccess
    } else {
        GenerationStatus::Success
    };

    Ok(GenerationResult {
        status,
        tier,
        accepted_words: accepted,
        inserted_count: insert_report.inserted,
        to_generate,
        shortfall,
        hard_cap: cap,
        rounds,
        insert_report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use crate::error::GeneratorError;
    use crate::store::MemoryStore;
    use crate::types::{BulkInsertReport, Tier};

    type Reply = Result<Vec<&'static str>, &'static str>;

    /// Replays one scripted reply per call; repeats the last when exhausted.
    struct ScriptedGenerator {
        replies: Mutex<VecDeque<Reply>>,
        last: Mutex<Option<Reply>>,
        calls: Mutex<Vec<(usize, Vec<String>)>>,
    }

    impl ScriptedGenerator {
        fn new(replies: Vec<Reply>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                last: Mutex::new(None),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn counts(&self) -> Vec<usize> {
            self.calls.lock().unwrap().iter().map(|(c, _)| *c).collect()
        }
    }

    impl WordGenerator for ScriptedGenerator {
        fn name(&self) -> &str {
            "scripted"
        }

        fn generate(
            &self,
            _topic: &str,
            count: usize,
            _tier: Tier,
            forbidden: &[String],
        ) -> Result<Vec<String>, GeneratorError> {
            self.calls.lock().unwrap().push((count, forbidden.to_vec()));
            let reply = match self.replies.lock().unwrap().pop_front() {
                Some(r) => {
                    *self.last.lock().unwrap() = Some(r.clone());
                    r
                }
                None => self.last.lock().unwrap().clone().unwrap_or(Ok(vec![])),
            };
            reply
                .map(|words| words.into_iter().map(String::from).collect())
                .map_err(|e| GeneratorError::Status { status: 503, body: e.to_string() })
        }
    }

    /// Store double that records inserts and can under-report or fail.
    struct RecordingStore {
        existing: usize,
        forbidden: Vec<String>,
        inserted: Vec<NewExercise>,
        insert_limit: Option<usize>,
        fail_insert: bool,
    }

    impl RecordingStore {
        fn new(existing: usize, forbidden: &[&str]) -> Self {
            Self {
                existing,
                forbidden: forbidden.iter().map(|s| s.to_string()).collect(),
                inserted: Vec::new(),
                insert_limit: None,
                fail_insert: false,
            }
        }
    }

    impl ExerciseStore for RecordingStore {
        fn count_existing(&self, _: u32, _: u32, _: Tier) -> anyhow::Result<usize> {
            Ok(self.existing)
        }

        fn list_forbidden(&self, _: u32, _: u32) -> anyhow::Result<Vec<String>> {
            Ok(self.forbidden.clone())
        }

        fn bulk_insert(
            &mut self,
            items: &[NewExercise],
            _: Tier,
            _: u32,
            _: u32,
            _: u32,
        ) -> anyhow::Result<BulkInsertReport> {
            if self.fail_insert {
                anyhow::bail!("insert rejected");
            }
            self.inserted.extend_from_slice(items);
            let inserted = self.insert_limit.map_or(items.len(), |l| l.min(items.len()));
            Ok(BulkInsertReport {
                inserted,
                ids: vec![],
                skipped: items.len() - inserted,
            })
        }
    }

    fn request(tier: Tier, count: usize) -> GenerationRequest {
        GenerationRequest {
            topic: "animales".to_string(),
            requested_count: count,
            tier,
            tenant_id: 1,
            section_id: 5,
            actor_id: 9,
            kind: None,
        }
    }

    #[test]
    fn test_quota_reached_skips_generator() {
        let generator = ScriptedGenerator::new(vec![Ok(vec!["caballo"])]);
        let mut store = RecordingStore::new(10, &[]);
        let err = run_generation(&request(Tier::Two, 3), &generator, &mut store, &GenerationConfig::default())
            .unwrap_err();
        assert!(matches!(err, GenerationError::QuotaExceeded { cap: 10, existing: 10, .. }));
        assert_eq!(err.status_code(), 409);
        assert_eq!(generator.call_count(), 0);
        assert!(store.inserted.is_empty());
    }

    #[test]
    fn test_quota_limits_batch_and_keeps_candidate_order() {
        let generator = ScriptedGenerator::new(vec![Ok(vec![
            "sol", "caballo", "mesa", "ventana", "luz", "tomate", "pan",
        ])]);
        let mut store = RecordingStore::new(7, &[]);
        let result = run_generation(&request(Tier::Two, 5), &generator, &mut store, &GenerationConfig::default())
            .unwrap();

        assert_eq!(result.status, GenerationStatus::Success);
        assert_eq!(result.to_generate, 3);
        assert_eq!(result.accepted_words, vec!["caballo", "ventana", "tomate"]);
        assert!(!result.shortfall);
        assert_eq!(result.inserted_count, 3);
        assert_eq!(generator.counts(), vec![7]);
        let contents: Vec<&str> = store.inserted.iter().map(|i| i.content.as_str()).collect();
        assert_eq!(contents, vec!["caballo", "ventana", "tomate"]);
        assert!(store.inserted.iter().all(|i| i.kind == "texto" && i.enabled));
    }

    #[test]
    fn test_saturated_forbidden_set_exhausts_after_three_rounds() {
        let generator = ScriptedGenerator::new(vec![Ok(vec!["Gato", "PERRO", " gato ", "pérro"])]);
        let mut store = RecordingStore::new(0, &["gato", "perro"]);
        let err = run_generation(&request(Tier::One, 2), &generator, &mut store, &GenerationConfig::default())
            .unwrap_err();
        assert!(matches!(err, GenerationError::Exhausted { rounds: 3 }));
        assert_eq!(err.status_code(), 422);
        assert_eq!(generator.call_count(), 3);
        assert!(store.inserted.is_empty());
    }

    #[test]
    fn test_generator_failures_are_per_round() {
        let generator = ScriptedGenerator::new(vec![
            Err("timeout"),
            Ok(vec!["mesa", "gato"]),
            Err("rate limited"),
        ]);
        let mut store = RecordingStore::new(0, &[]);
        let result = run_generation(&request(Tier::One, 3), &generator, &mut store, &GenerationConfig::default())
            .unwrap();

        assert_eq!(result.status, GenerationStatus::PartialSuccess);
        assert!(result.shortfall);
        assert_eq!(result.accepted_words, vec!["mesa", "gato"]);
        assert_eq!(result.rounds.len(), 3);
        assert_eq!(result.rounds[0].outcome, RoundOutcome::GeneratorUnavailable("generator returned HTTP 503: timeout".into()));
        assert_eq!(result.rounds[1].outcome, RoundOutcome::Ok);
        assert_eq!(result.rounds[1].accepted, 2);
        // third round only asks for the missing word plus padding
        assert_eq!(generator.counts(), vec![7, 7, 5]);
    }

    #[test]
    fn test_persistent_generator_failure_is_exhausted() {
        let generator = ScriptedGenerator::new(vec![Err("down")]);
        let mut store = RecordingStore::new(0, &[]);
        let err = run_generation(&request(Tier::Three, 2), &generator, &mut store, &GenerationConfig::default())
            .unwrap_err();
        assert!(matches!(err, GenerationError::Exhausted { rounds: 3 }));
        assert_eq!(generator.call_count(), 3);
    }

    #[test]
    fn test_relaxed_words_fill_tier_one() {
        // none of these pass strict tier 1, all pass relaxed
        let generator = ScriptedGenerator::new(vec![Ok(vec!["trenza", "brazo", "café"])]);
        let mut store = RecordingStore::new(0, &[]);
        let result = run_generation(&request(Tier::One, 3), &generator, &mut store, &GenerationConfig::default())
            .unwrap();
        assert_eq!(result.status, GenerationStatus::Success);
        assert_eq!(result.accepted_words, vec!["trenza", "brazo", "café"]);
        assert_eq!(generator.call_count(), 1);
    }

    #[test]
    fn test_relaxed_words_reported_as_partial() {
        let generator = ScriptedGenerator::new(vec![Ok(vec!["trenza", "brazo", "café"])]);
        let mut store = RecordingStore::new(0, &[]);
        let result = run_generation(&request(Tier::One, 5), &generator, &mut store, &GenerationConfig::default())
            .unwrap();
        assert_eq!(result.status, GenerationStatus::PartialSuccess);
        assert_eq!(result.accepted_words.len(), 3);
        assert_eq!(store.inserted.len(), 3);
        // later rounds repeat the same words and add nothing
        assert_eq!(generator.call_count(), 3);
        assert_eq!(result.rounds[1].accepted, 0);
    }

    #[test]
    fn test_cross_tier_words_are_forbidden() {
        let generator = ScriptedGenerator::new(vec![Ok(vec!["Mariposa", "murciélago"])]);
        let mut memory = MemoryStore::new(10);
        memory
            .bulk_insert(
                &[NewExercise { content: "mariposa".into(), kind: "texto".into(), enabled: true }],
                Tier::One,
                5,
                9,
                1,
            )
            .unwrap();

        let result = run_generation(&request(Tier::Three, 2), &generator, &mut memory, &GenerationConfig::default())
            .unwrap();
        assert_eq!(result.accepted_words, vec!["murciélago"]);
        assert_eq!(memory.count_existing(1, 5, Tier::Three).unwrap(), 1);
        // the generator was told about the tier-1 word
        let calls = generator.calls.lock().unwrap();
        assert!(calls[0].1.contains(&"mariposa".to_string()));
    }

    #[test]
    fn test_accepted_words_join_the_hint_list() {
        let generator = ScriptedGenerator::new(vec![Ok(vec!["caballo"]), Ok(vec!["ventana"])]);
        let mut store = RecordingStore::new(0, &["sol"]);
        run_generation(&request(Tier::Two, 2), &generator, &mut store, &GenerationConfig::default()).unwrap();
        let calls = generator.calls.lock().unwrap();
        assert_eq!(calls[0].1, vec!["sol"]);
        assert_eq!(calls[1].1, vec!["sol", "caballo"]);
    }

    #[test]
    fn test_hint_list_is_truncated_to_recent() {
        let prior: Vec<String> = (0..250).map(|i| format!("palabra{}", i)).collect();
        let prior_refs: Vec<&str> = prior.iter().map(String::as_str).collect();
        let generator = ScriptedGenerator::new(vec![Ok(vec!["caballo"])]);
        let mut store = RecordingStore::new(0, &prior_refs);
        run_generation(&request(Tier::Two, 1), &generator, &mut store, &GenerationConfig::default()).unwrap();
        let calls = generator.calls.lock().unwrap();
        assert_eq!(calls[0].1.len(), 200);
        assert_eq!(calls[0].1[0], "palabra50");
    }

    #[test]
    fn test_numbered_generator_lines_are_cleaned() {
        let generator = ScriptedGenerator::new(vec![Ok(vec!["1. caballo", "- ventana", "3) tomate\n4) pelota"])]);
        let mut store = RecordingStore::new(0, &[]);
        let result = run_generation(&request(Tier::Two, 4), &generator, &mut store, &GenerationConfig::default())
            .unwrap();
        assert_eq!(result.accepted_words, vec!["caballo", "ventana", "tomate", "pelota"]);
    }

    #[test]
    fn test_inserted_count_comes_from_store() {
        let generator = ScriptedGenerator::new(vec![Ok(vec!["caballo", "ventana", "tomate"])]);
        let mut store = RecordingStore::new(0, &[]);
        store.insert_limit = Some(1);
        let result = run_generation(&request(Tier::Two, 3), &generator, &mut store, &GenerationConfig::default())
            .unwrap();
        assert_eq!(result.accepted_words.len(), 3);
        assert_eq!(result.inserted_count, 1);
        assert_eq!(result.status, GenerationStatus::Success);
        assert!(result.message().starts_with("Se generaron 1 ejercicio(s)"));
    }

    #[test]
    fn test_insert_failure_propagates() {
        let generator = ScriptedGenerator::new(vec![Ok(vec!["caballo"])]);
        let mut store = RecordingStore::new(0, &[]);
        store.fail_insert = true;
        let err = run_generation(&request(Tier::Two, 1), &generator, &mut store, &GenerationConfig::default())
            .unwrap_err();
        assert!(matches!(err, GenerationError::Store(_)));
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_requested_count_is_clamped() {
        let generator = ScriptedGenerator::new(vec![Ok(vec!["caballo", "ventana"])]);
        let mut store = RecordingStore::new(0, &[]);
        let result = run_generation(&request(Tier::Two, 0), &generator, &mut store, &GenerationConfig::default())
            .unwrap();
        assert_eq!(result.to_generate, 1);
        assert_eq!(result.accepted_words, vec!["caballo"]);

        let generator = ScriptedGenerator::new(vec![Ok(vec!["caballo"])]);
        let mut store = RecordingStore::new(0, &[]);
        let result = run_generation(&request(Tier::Two, 50), &generator, &mut store, &GenerationConfig::default())
            .unwrap();
        assert_eq!(result.to_generate, 10);
        assert_eq!(generator.counts()[0], 14);
    }

    #[test]
    fn test_content_truncated_and_kind_applied() {
        let long = "a".repeat(300);
        let long: &'static str = Box::leak(long.into_boxed_str());
        let generator = ScriptedGenerator::new(vec![Ok(vec![long])]);
        let mut store = RecordingStore::new(0, &[]);
        let mut config = GenerationConfig::default();
        config.rules.three.relaxed = Default::default();
        let mut req = request(Tier::Three, 1);
        req.kind = Some("imagen".into());
        let result = run_generation(&req, &generator, &mut store, &config).unwrap();
        assert_eq!(store.inserted[0].content.chars().count(), 255);
        assert_eq!(result.accepted_words, vec![store.inserted[0].content.clone()]);
        assert_eq!(store.inserted[0].kind, "imagen");
    }

    #[test]
    fn test_custom_round_budget() {
        let generator = ScriptedGenerator::new(vec![Ok(vec![])]);
        let mut store = RecordingStore::new(0, &[]);
        let config = GenerationConfig { max_rounds: 5, ..Default::default() };
        let err = run_generation(&request(Tier::Two, 1), &generator, &mut store, &config).unwrap_err();
        assert!(matches!(err, GenerationError::Exhausted { rounds: 5 }));
        assert_eq!(generator.call_count(), 5);
    }
}
