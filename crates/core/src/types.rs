use std::fmt;

use serde::{Deserialize, Serialize};

pub type TenantId = u32;
pub type SectionId = u32;
pub type ActorId = u32;

/// Ordinal difficulty level a generated word must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Tier {
    One = 1,
    Two = 2,
    Three = 3,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::One, Tier::Two, Tier::Three];

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Tier {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Tier::One),
            2 => Ok(Tier::Two),
            3 => Ok(Tier::Three),
            other => Err(format!("tier must be 1, 2 or 3 (got {})", other)),
        }
    }
}

impl From<Tier> for u8 {
    fn from(tier: Tier) -> u8 {
        tier.as_u8()
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// One bulk generation call for a (tenant, section, tier).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub topic: String,
    pub requested_count: usize,
    pub tier: Tier,
    pub tenant_id: TenantId,
    pub section_id: SectionId,
    /// User recorded as the creator of inserted items
    pub actor_id: ActorId,
    /// Exercise kind; falls back to the configured default when absent
    #[serde(default)]
    pub kind: Option<String>,
}

/// Item handed to the bulk insert boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewExercise {
    pub content: String,
    pub kind: String,
    pub enabled: bool,
}

/// What the store reports back from a bulk insert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkInsertReport {
    pub inserted: usize,
    #[serde(default)]
    pub ids: Vec<uuid::Uuid>,
    /// Items the store declined (duplicates, cap reached by a concurrent writer)
    #[serde(default)]
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenerationStatus {
    Success,
    PartialSuccess,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundOutcome {
    Ok,
    /// The generator call failed; the round contributed no candidates.
    GeneratorUnavailable(String),
}

/// Bookkeeping for one generation round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundReport {
    pub round: usize,
    pub requested: usize,
    pub candidates: usize,
    pub accepted: usize,
    pub outcome: RoundOutcome,
}

/// Output of a successful (possibly partial) generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResult {
    pub status: GenerationStatus,
    pub tier: Tier,
    pub accepted_words: Vec<String>,
    /// Authoritative count from the store, may be lower than `accepted_words.len()`
    pub inserted_count: usize,
    pub to_generate: usize,
    pub shortfall: bool,
    pub hard_cap: usize,
    pub rounds: Vec<RoundReport>,
    pub insert_report: BulkInsertReport,
}

impl GenerationResult {
    pub fn status_code(&self) -> u16 {
        201
    }

    pub fn message(&self) -> String {
        format!(
            "Se generaron {} ejercicio(s) adecuados (máx {} por nivel).",
            self.inserted_count, self.hard_cap
        )
    }
}
