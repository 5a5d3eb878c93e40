//! Persistence boundary for exercises.
//!
//! The generator only needs three operations from storage: count items for a
//! tier, list every word used in a section, and insert a batch. Two adapters
//! are provided: an in-process store and a JSON file wrapping it.

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::language::normalize::normalize;
use crate::types::{ActorId, BulkInsertReport, NewExercise, SectionId, TenantId, Tier};

/// Storage operations the generator depends on.
pub trait ExerciseStore {
    /// Number of items stored for (tenant, section, tier).
    fn count_existing(&self, tenant: TenantId, section: SectionId, tier: Tier) -> Result<usize>;

    /// Raw contents of every item in the section, all tiers, oldest first.
    fn list_forbidden(&self, tenant: TenantId, section: SectionId) -> Result<Vec<String>>;

    /// Insert a batch. The returned count is authoritative.
    fn bulk_insert(
        &mut self,
        items: &[NewExercise],
        tier: Tier,
        section: SectionId,
        actor: ActorId,
        tenant: TenantId,
    ) -> Result<BulkInsertReport>;
}

/// A stored exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseRecord {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub section_id: SectionId,
    pub tier: Tier,
    pub content: String,
    pub kind: String,
    pub enabled: bool,
    pub created_by: ActorId,
}

/// In-process store.
///
/// Bulk inserts skip items whose normalized content already exists in the
/// section and stop at `hard_cap` items per tier, the same guarantees the
/// database procedures give.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    records: Vec<ExerciseRecord>,
    hard_cap: usize,
}

impl MemoryStore {
    pub fn new(hard_cap: usize) -> Self {
        Self::with_records(Vec::new(), hard_cap)
    }

    pub fn with_records(records: Vec<ExerciseRecord>, hard_cap: usize) -> Self {
        Self { records, hard_cap }
    }

    pub fn records(&self) -> &[ExerciseRecord] {
        &self.records
    }

    /// Items of a section, optionally narrowed to one tier.
    pub fn list(&self, tenant: TenantId, section: SectionId, tier: Option<Tier>) -> Vec<&ExerciseRecord> {
        self.records
            .iter()
            .filter(|r| r.tenant_id == tenant && r.section_id == section)
            .filter(|r| tier.map_or(true, |t| r.tier == t))
            .collect()
    }
}

impl ExerciseStore for MemoryStore {
    fn count_existing(&self, tenant: TenantId, section: SectionId, tier: Tier) -> Result<usize> {
        Ok(self.list(tenant, section, Some(tier)).len())
    }

    fn list_forbidden(&self, tenant: TenantId, section: SectionId) -> Result<Vec<String>> {
        Ok(self
            .list(tenant, section, None)
            .into_iter()
            .map(|r| r.content.clone())
            .collect())
    }

    fn bulk_insert(
        &mut self,
        items: &[NewExercise],
        tier: Tier,
        section: SectionId,
        actor: ActorId,
        tenant: TenantId,
    ) -> Result<BulkInsertReport> {
        let mut used: HashSet<String> = self
            .list(tenant, section, None)
            .into_iter()
            .map(|r| normalize(&r.content))
            .collect();
        let mut count = self.count_existing(tenant, section, tier)?;
        let mut report = BulkInsertReport::default();

        for item in items {
            let key = normalize(&item.content);
            if count >= self.hard_cap || key.is_empty() || !used.insert(key) {
                report.skipped += 1;
                continue;
            }
            let id = Uuid::new_v4();
            self.records.push(ExerciseRecord {
                id,
                tenant_id: tenant,
                section_id: section,
                tier,
                content: item.content.clone(),
                kind: item.kind.clone(),
                enabled: item.enabled,
                created_by: actor,
            });
            report.ids.push(id);
            report.inserted += 1;
            count += 1;
        }

        Ok(report)
    }
}

/// [`MemoryStore`] persisted to a JSON file after every insert.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    inner: MemoryStore,
}

impl JsonFileStore {
    /// Open a store file. A missing file is an empty store.
    pub fn open(path: &Path, hard_cap: usize) -> Result<Self> {
        let records: Vec<ExerciseRecord> = if path.exists() {
            let data = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read store: {}", path.display()))?;
            serde_json::from_str(&data)
                .with_context(|| format!("Corrupt store file: {}", path.display()))?
        } else {
            Vec::new()
        };
        Ok(Self {
            path: path.to_path_buf(),
            inner: MemoryStore::with_records(records, hard_cap),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(self.inner.records())?;
        atomic_write(&self.path, json.as_bytes())
            .with_context(|| format!("Failed to write store: {}", self.path.display()))
    }
}

/// Write via a temp file in the target directory, then rename over the target.
fn atomic_write(target: &Path, data: &[u8]) -> Result<()> {
    let dir = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
    tmp.write_all(data)?;
    tmp.persist(target)
        .map_err(|e| anyhow::anyhow!("Failed to persist {}: {}", target.display(), e))?;
    Ok(())
}

impl ExerciseStore for JsonFileStore {
    fn count_existing(&self, tenant: TenantId, section: SectionId, tier: Tier) -> Result<usize> {
        self.inner.count_existing(tenant, section, tier)
    }

    fn list_forbidden(&self, tenant: TenantId, section: SectionId) -> Result<Vec<String>> {
        self.inner.list_forbidden(tenant, section)
    }

    fn bulk_insert(
        &mut self,
        items: &[NewExercise],
        tier: Tier,
        section: SectionId,
        actor: ActorId,
        tenant: TenantId,
    ) -> Result<BulkInsertReport> {
        let snapshot = self.inner.clone();
        let report = self.inner.bulk_insert(items, tier, section, actor, tenant)?;
        if report.inserted > 0 {
            if let Err(e) = self.save() {
                self.inner = snapshot;
                return Err(e);
            }
            log::info!("Stored {} exercise(s) in {}", report.inserted, self.path.display());
        }
        Ok(report)
    }
}
