//! Machine-readable report files and their human-readable summaries.

use std::fmt::Write as _;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::questdb::errors::QuestDbError;
use crate::questdb::repair::{ApplySummary, ProposedFix};
use crate::questdb::simulate::{Availability, AvailableQuest, LockedQuest, QuestSummary};
use crate::questdb::storage::write_json;
use crate::questdb::suspects::{SuspectReason, SuspiciousQuest};
use crate::questdb::types::Dataset;
use crate::questdb::validate::{
    BlockedQuest, ErrorFinding, OrphanQuest, ValidationOutcome, WarningFinding,
};

/// Per-NPC counts shown at the bottom of the validation summary.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NpcSummary {
    pub npc_id: String,
    pub npc: String,
    pub quests: usize,
    pub errors: usize,
    pub warnings: usize,
    pub blocked: usize,
    pub available: usize,
    pub locked: usize,
}

/// The validation report file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<ErrorFinding>,
    pub warnings: Vec<WarningFinding>,
    pub circular_dependencies: Vec<Vec<String>>,
    pub orphan_quests: Vec<OrphanQuest>,
    pub blocked_quests: Vec<BlockedQuest>,
    pub available_quests: Vec<AvailableQuest>,
    pub blocked_by_missing: Vec<LockedQuest>,
    pub npc_summary: Vec<NpcSummary>,
}

impl ValidationReport {
    pub fn emit(dataset: &Dataset, outcome: &ValidationOutcome) -> Self {
        let mut npc_summary: Vec<NpcSummary> = dataset
            .npcs
            .iter()
            .map(|(npc_id, npc)| NpcSummary {
                npc_id: npc_id.to_string(),
                npc: dataset.npc_name(npc_id).to_string(),
                quests: npc.quests.len(),
                ..NpcSummary::default()
            })
            .collect();

        let mut bump = |npc_id: &str, apply: fn(&mut NpcSummary)| {
            if let Some(row) = npc_summary.iter_mut().find(|row| row.npc_id == npc_id) {
                apply(row);
            }
        };
        for error in &outcome.errors {
            for npc_id in error.npc_ids() {
                bump(npc_id, |row| row.errors += 1);
            }
        }
        for warning in &outcome.warnings {
            for npc_id in warning.npc_ids() {
                bump(npc_id, |row| row.warnings += 1);
            }
        }
        for quest in &outcome.blocked {
            bump(&quest.npc_id, |row| row.blocked += 1);
        }
        for quest in &outcome.start_state.available {
            bump(&quest.npc_id, |row| row.available += 1);
        }
        for quest in &outcome.start_state.locked {
            bump(&quest.npc_id, |row| row.locked += 1);
        }

        Self {
            errors: outcome.errors.clone(),
            warnings: outcome.warnings.clone(),
            circular_dependencies: outcome.cycles.clone(),
            orphan_quests: outcome.orphans.clone(),
            blocked_quests: outcome.blocked.clone(),
            available_quests: outcome.start_state.available.clone(),
            blocked_by_missing: outcome.start_state.locked.clone(),
            npc_summary,
        }
    }

    /// Errors and cycles fail the run; warnings do not.
    pub fn has_blocking_errors(&self) -> bool {
        !self.errors.is_empty() || !self.circular_dependencies.is_empty()
    }
}

/// One NPC's share of a bucket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NpcGroup<T> {
    pub npc_id: String,
    pub npc: String,
    pub quests: Vec<T>,
}

fn group_by_npc<T: Clone>(dataset: &Dataset, items: &[T], npc_of: impl Fn(&T) -> &str) -> Vec<NpcGroup<T>> {
    dataset
        .npcs
        .ids()
        .filter_map(|npc_id| {
            let quests: Vec<T> = items.iter().filter(|&item| npc_of(item) == npc_id).cloned().collect();
            (!quests.is_empty()).then(|| NpcGroup {
                npc_id: npc_id.to_string(),
                npc: dataset.npc_name(npc_id).to_string(),
                quests,
            })
        })
        .collect()
}

/// The availability report file: simulation buckets grouped per NPC.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AvailabilityReport {
    pub completed: Vec<String>,
    pub available_quests: Vec<NpcGroup<AvailableQuest>>,
    pub locked_quests: Vec<NpcGroup<LockedQuest>>,
    pub completed_quests: Vec<NpcGroup<QuestSummary>>,
}

impl AvailabilityReport {
    pub fn emit(dataset: &Dataset, completed: &[String], availability: &Availability) -> Self {
        Self {
            completed: completed.to_vec(),
            available_quests: group_by_npc(dataset, &availability.available, |q| q.npc_id.as_str()),
            locked_quests: group_by_npc(dataset, &availability.locked, |q| q.npc_id.as_str()),
            completed_quests: group_by_npc(dataset, &availability.completed, |q| q.npc_id.as_str()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SuspectReport {
    pub suspicious_quests: Vec<SuspiciousQuest>,
}

/// The fix report file, written before anything is applied.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FixReport {
    pub dry_run: bool,
    pub proposed: Vec<ProposedFix>,
    pub applied: usize,
    pub skipped: usize,
    pub unchanged: usize,
}

impl FixReport {
    pub fn new(proposed: Vec<ProposedFix>, summary: Option<ApplySummary>) -> Self {
        let summary = summary.unwrap_or_default();
        Self {
            dry_run: false,
            proposed,
            applied: summary.applied,
            skipped: summary.skipped,
            unchanged: summary.unchanged,
        }
    }

    pub fn dry_run(proposed: Vec<ProposedFix>) -> Self {
        Self {
            dry_run: true,
            ..Self::new(proposed, None)
        }
    }
}

/// Write any report as pretty JSON.
pub fn write_report<T: Serialize>(path: &Path, report: &T) -> Result<(), QuestDbError> {
    write_json(path, report)
}

fn heading(out: &mut String, title: &str, count: usize) {
    let _ = writeln!(out, "\n{} ({})", title, count);
}

pub fn render_validation_summary(report: &ValidationReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Quest prerequisite validation");

    heading(&mut out, "Errors", report.errors.len());
    for error in &report.errors {
        match error {
            ErrorFinding::MissingPrerequisite(f) => {
                let _ = writeln!(
                    out,
                    "  [{}] {}: {} '{}' does not exist",
                    f.npc, f.quest_name, f.field, f.prerequisite_id
                );
            }
            ErrorFinding::DuplicateQuestId(f) => {
                let owners: Vec<&str> = f.locations.iter().map(|l| l.npc.as_str()).collect();
                let _ = writeln!(out, "  duplicate id '{}' in {}", f.quest_id, owners.join(", "));
            }
        }
    }

    heading(&mut out, "Warnings", report.warnings.len());
    for warning in &report.warnings {
        match warning {
            WarningFinding::WrongPrerequisiteType(f) => {
                let _ = writeln!(
                    out,
                    "  [{}] {}: '{}' ({}) belongs in {}",
                    f.npc, f.quest_name, f.prerequisite_id, f.prerequisite_npc, f.suggested_field
                );
            }
            WarningFinding::TierOutOfOrder(f) => {
                let _ = writeln!(
                    out,
                    "  [{}] {}: tier {} listed after '{}' (tier {})",
                    f.npc, f.quest_name, f.tier, f.preceded_by, f.preceding_tier
                );
            }
            WarningFinding::DuplicateQuestId(f) => {
                let owners: Vec<&str> = f.locations.iter().map(|l| l.npc.as_str()).collect();
                let _ = writeln!(out, "  duplicate id '{}' in {}", f.quest_id, owners.join(", "));
            }
        }
    }

    heading(&mut out, "Circular dependencies", report.circular_dependencies.len());
    for cycle in &report.circular_dependencies {
        let _ = writeln!(out, "  {}", cycle.join(" -> "));
    }

    heading(&mut out, "Orphan quests", report.orphan_quests.len());
    for quest in &report.orphan_quests {
        let _ = writeln!(
            out,
            "  [{}] {}: only invalid prerequisites ({})",
            quest.npc,
            quest.quest_name,
            quest.invalid_prerequisites.join(", ")
        );
    }

    heading(&mut out, "Blocked quests", report.blocked_quests.len());
    for quest in &report.blocked_quests {
        let _ = writeln!(
            out,
            "  [{}] {}: missing {}",
            quest.npc,
            quest.quest_name,
            quest.invalid_prerequisites.join(", ")
        );
    }

    let _ = writeln!(
        out,
        "\nAvailable at start: {}, locked: {}",
        report.available_quests.len(),
        report.blocked_by_missing.len()
    );

    let _ = writeln!(
        out,
        "\n{:<20} {:>6} {:>6} {:>8} {:>7} {:>9} {:>6}",
        "NPC", "quests", "errors", "warnings", "blocked", "available", "locked"
    );
    for row in &report.npc_summary {
        let _ = writeln!(
            out,
            "{:<20} {:>6} {:>6} {:>8} {:>7} {:>9} {:>6}",
            row.npc, row.quests, row.errors, row.warnings, row.blocked, row.available, row.locked
        );
    }

    let verdict = if report.has_blocking_errors() {
        "FAILED"
    } else if report.warnings.is_empty() {
        "OK"
    } else {
        "OK (with warnings)"
    };
    let _ = writeln!(out, "\nResult: {}", verdict);
    out
}

pub fn render_availability(report: &AvailabilityReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Completed: {}", report.completed.len());

    let available: usize = report.available_quests.iter().map(|g| g.quests.len()).sum();
    heading(&mut out, "Available", available);
    for group in &report.available_quests {
        let _ = writeln!(out, "  {}", group.npc);
        for quest in &group.quests {
            let _ = writeln!(out, "    {}", quest.quest_name);
        }
    }

    let locked: usize = report.locked_quests.iter().map(|g| g.quests.len()).sum();
    heading(&mut out, "Locked", locked);
    for group in &report.locked_quests {
        let _ = writeln!(out, "  {}", group.npc);
        for quest in &group.quests {
            let missing: Vec<String> = quest
                .missing_prerequisites
                .iter()
                .map(|m| match &m.name {
                    Some(name) => format!("{} ({})", name, m.id),
                    None => format!("{} (unknown)", m.id),
                })
                .collect();
            let _ = writeln!(out, "    {} <- {}", quest.quest_name, missing.join(", "));
        }
    }
    out
}

pub fn render_suspects(report: &SuspectReport) -> String {
    let mut out = String::new();
    heading(&mut out, "Suspicious quests", report.suspicious_quests.len());
    for quest in &report.suspicious_quests {
        let why = match quest.reason {
            SuspectReason::UnlinkedChainPart => "chain part without a prior part".to_string(),
            SuspectReason::ReferencedWithoutPrerequisites => {
                let by: Vec<String> = quest
                    .referenced_by
                    .iter()
                    .map(|r| format!("{} ({})", r.quest_name, r.npc))
                    .collect();
                format!("required by {}", by.join(", "))
            }
        };
        let _ = writeln!(out, "  [{}] {}: {}", quest.npc, quest.quest_name, why);
    }
    out
}

pub fn render_fixes(report: &FixReport) -> String {
    let mut out = String::new();
    heading(&mut out, "Proposed fixes", report.proposed.len());
    for fix in &report.proposed {
        let _ = writeln!(
            out,
            "  [{}] {} += {} ({}) in {}",
            fix.npc, fix.quest_name, fix.prerequisite_name, fix.add_prerequisite, fix.field
        );
    }
    if report.dry_run {
        let _ = writeln!(out, "\nDry run: nothing applied");
    } else {
        let _ = writeln!(
            out,
            "\nApplied: {}, skipped: {}, unchanged: {}",
            report.applied, report.skipped, report.unchanged
        );
    }
    out
}
