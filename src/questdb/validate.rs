//! Structural checks over the prerequisite graph.
//!
//! Every check is a pure function of the dataset and its index and returns its
//! findings in dataset order (NPCs as listed, then each NPC's quest list), so two
//! runs over the same input produce identical reports.
//!
//! Edges run from a quest to each of its prerequisites, across both
//! `prerequisites` and `prerequisitesExternal`.

use std::collections::HashSet;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::questdb::index::QuestIndex;
use crate::questdb::simulate::{simulate_start, Availability};
use crate::questdb::types::{Dataset, PrereqField};

/// A prerequisite id that does not resolve to any quest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MissingReference {
    pub npc_id: String,
    pub npc: String,
    pub quest_id: String,
    pub quest_name: String,
    pub prerequisite_id: String,
    pub field: PrereqField,
}

/// A resolved prerequisite stored in the list that does not match its owner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WrongField {
    pub npc_id: String,
    pub npc: String,
    pub quest_id: String,
    pub quest_name: String,
    pub prerequisite_id: String,
    /// Id of the NPC that owns the prerequisite.
    pub prerequisite_npc: String,
    pub field: PrereqField,
    pub suggested_field: PrereqField,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestLocation {
    pub npc_id: String,
    pub npc: String,
    pub quest_name: String,
}

/// A quest id carried by more than one record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DuplicateQuestId {
    pub quest_id: String,
    pub locations: Vec<QuestLocation>,
}

/// A quest listed after one with a higher tier in the same NPC.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TierOutOfOrder {
    pub npc_id: String,
    pub npc: String,
    pub quest_id: String,
    pub quest_name: String,
    pub tier: u32,
    pub preceded_by: String,
    pub preceding_tier: u32,
}

/// A quest that lists prerequisites, none of which exist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrphanQuest {
    pub npc_id: String,
    pub npc: String,
    pub quest_id: String,
    pub quest_name: String,
    pub invalid_prerequisites: Vec<String>,
}

/// A quest with at least one prerequisite that does not exist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlockedQuest {
    pub npc_id: String,
    pub npc: String,
    pub quest_id: String,
    pub quest_name: String,
    pub invalid_prerequisites: Vec<String>,
    pub all_prerequisites: Vec<String>,
}

/// Findings that fail a validation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ErrorFinding {
    MissingPrerequisite(MissingReference),
    DuplicateQuestId(DuplicateQuestId),
}

/// Findings reported without failing the run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WarningFinding {
    WrongPrerequisiteType(WrongField),
    TierOutOfOrder(TierOutOfOrder),
    DuplicateQuestId(DuplicateQuestId),
}

fn duplicate_npc_ids(dup: &DuplicateQuestId) -> Vec<&str> {
    let mut ids: Vec<&str> = Vec::new();
    for location in &dup.locations {
        if !ids.contains(&location.npc_id.as_str()) {
            ids.push(&location.npc_id);
        }
    }
    ids
}

impl ErrorFinding {
    /// NPCs this finding counts against in per-NPC summaries.
    pub fn npc_ids(&self) -> Vec<&str> {
        match self {
            ErrorFinding::MissingPrerequisite(f) => vec![f.npc_id.as_str()],
            ErrorFinding::DuplicateQuestId(f) => duplicate_npc_ids(f),
        }
    }
}

impl WarningFinding {
    pub fn npc_ids(&self) -> Vec<&str> {
        match self {
            WarningFinding::WrongPrerequisiteType(f) => vec![f.npc_id.as_str()],
            WarningFinding::TierOutOfOrder(f) => vec![f.npc_id.as_str()],
            WarningFinding::DuplicateQuestId(f) => duplicate_npc_ids(f),
        }
    }
}

/// Every `(quest, id)` pair whose id does not resolve, once per pair.
pub fn check_references(dataset: &Dataset, index: &QuestIndex<'_>) -> Vec<MissingReference> {
    let mut findings = Vec::new();
    for (npc_id, _, quest) in dataset.quests() {
        let mut seen: HashSet<&str> = HashSet::new();
        for (field, prereq_id) in quest.prerequisite_entries() {
            if index.contains(prereq_id) || !seen.insert(prereq_id) {
                continue;
            }
            findings.push(MissingReference {
                npc_id: npc_id.to_string(),
                npc: dataset.npc_name(npc_id).to_string(),
                quest_id: quest.id.clone(),
                quest_name: quest.name.clone(),
                prerequisite_id: prereq_id.to_string(),
                field,
            });
        }
    }
    findings
}

/// Resolved prerequisites stored in the wrong list for their owner.
pub fn check_locations(dataset: &Dataset, index: &QuestIndex<'_>) -> Vec<WrongField> {
    let mut findings = Vec::new();
    for (npc_id, _, quest) in dataset.quests() {
        let mut seen: HashSet<(&str, PrereqField)> = HashSet::new();
        for (field, prereq_id) in quest.prerequisite_entries() {
            let Some(owner) = index.owner_of(prereq_id) else {
                continue;
            };
            let expected = PrereqField::for_owners(npc_id, owner);
            if expected == field || !seen.insert((prereq_id, field)) {
                continue;
            }
            findings.push(WrongField {
                npc_id: npc_id.to_string(),
                npc: dataset.npc_name(npc_id).to_string(),
                quest_id: quest.id.clone(),
                quest_name: quest.name.clone(),
                prerequisite_id: prereq_id.to_string(),
                prerequisite_npc: owner.to_string(),
                field,
                suggested_field: expected,
            });
        }
    }
    findings
}

struct Frame<'a> {
    node: &'a str,
    edges: Vec<&'a str>,
    cursor: usize,
}

/// Depth-first search for circular dependencies.
///
/// Each back-edge to a node still on the DFS stack yields one cycle, listed from
/// that node along the path and back to it: `[a, b, c, a]`. Dangling ids are not
/// traversed. Every node is expanded at most once across all roots.
pub fn detect_cycles(index: &QuestIndex<'_>) -> Vec<Vec<String>> {
    let mut cycles = Vec::new();
    let mut visited: HashSet<&str> = HashSet::new();
    let mut on_stack: HashSet<&str> = HashSet::new();

    for root in index.ids() {
        if !visited.insert(root) {
            continue;
        }
        on_stack.insert(root);
        let mut path = vec![Frame {
            node: root,
            edges: index.resolved_prerequisites(root),
            cursor: 0,
        }];

        while let Some(frame) = path.last_mut() {
            let Some(&next) = frame.edges.get(frame.cursor) else {
                on_stack.remove(frame.node);
                path.pop();
                continue;
            };
            frame.cursor += 1;

            if on_stack.contains(next) {
                let start = path.iter().position(|f| f.node == next).unwrap_or(0);
                let mut cycle: Vec<String> = path[start..].iter().map(|f| f.node.to_string()).collect();
                cycle.push(next.to_string());
                debug!("cycle: {}", cycle.join(" -> "));
                cycles.push(cycle);
            } else if visited.insert(next) {
                on_stack.insert(next);
                path.push(Frame {
                    node: next,
                    edges: index.resolved_prerequisites(next),
                    cursor: 0,
                });
            }
        }
    }

    cycles
}

fn invalid_prerequisites(quest_prereqs: &[String], index: &QuestIndex<'_>) -> Vec<String> {
    let mut invalid: Vec<String> = Vec::new();
    for id in quest_prereqs {
        if !index.contains(id) && !invalid.contains(id) {
            invalid.push(id.clone());
        }
    }
    invalid
}

/// Quests that look gated but whose every prerequisite is a dangling id.
///
/// Such a quest has no real prerequisite, yet can never become available.
pub fn find_orphans(dataset: &Dataset, index: &QuestIndex<'_>) -> Vec<OrphanQuest> {
    let mut orphans = Vec::new();
    for (npc_id, _, quest) in dataset.quests() {
        if quest.has_no_prerequisites() {
            continue;
        }
        let all = quest.all_prerequisites();
        if all.iter().any(|id| index.contains(id)) {
            continue;
        }
        orphans.push(OrphanQuest {
            npc_id: npc_id.to_string(),
            npc: dataset.npc_name(npc_id).to_string(),
            quest_id: quest.id.clone(),
            quest_name: quest.name.clone(),
            invalid_prerequisites: invalid_prerequisites(&all, index),
        });
    }
    orphans
}

/// Quests held back by at least one dangling prerequisite.
pub fn find_blocked(dataset: &Dataset, index: &QuestIndex<'_>) -> Vec<BlockedQuest> {
    let mut blocked = Vec::new();
    for (npc_id, _, quest) in dataset.quests() {
        let all = quest.all_prerequisites();
        let invalid = invalid_prerequisites(&all, index);
        if invalid.is_empty() {
            continue;
        }
        blocked.push(BlockedQuest {
            npc_id: npc_id.to_string(),
            npc: dataset.npc_name(npc_id).to_string(),
            quest_id: quest.id.clone(),
            quest_name: quest.name.clone(),
            invalid_prerequisites: invalid,
            all_prerequisites: all,
        });
    }
    blocked
}

/// Ids shared by several quest records. Lookups keep only the last one.
pub fn check_duplicate_ids(dataset: &Dataset, index: &QuestIndex<'_>) -> Vec<DuplicateQuestId> {
    index
        .duplicates()
        .iter()
        .map(|dup| DuplicateQuestId {
            quest_id: dup.quest_id.to_string(),
            locations: dup
                .locations
                .iter()
                .map(|entry| QuestLocation {
                    npc_id: entry.npc_id.to_string(),
                    npc: dataset.npc_name(entry.npc_id).to_string(),
                    quest_name: entry.quest.name.clone(),
                })
                .collect(),
        })
        .collect()
}

/// Quests placed after a higher-tier quest of the same NPC. Quests without a tier are ignored.
pub fn check_tier_order(dataset: &Dataset) -> Vec<TierOutOfOrder> {
    let mut findings = Vec::new();
    for (npc_id, npc) in dataset.npcs.iter() {
        let mut highest: Option<(&str, u32)> = None;
        for quest in &npc.quests {
            let Some(tier) = quest.tier else {
                continue;
            };
            match highest {
                Some((prev_id, prev_tier)) if tier < prev_tier => {
                    findings.push(TierOutOfOrder {
                        npc_id: npc_id.to_string(),
                        npc: dataset.npc_name(npc_id).to_string(),
                        quest_id: quest.id.clone(),
                        quest_name: quest.name.clone(),
                        tier,
                        preceded_by: prev_id.to_string(),
                        preceding_tier: prev_tier,
                    });
                }
                _ => highest = Some((quest.id.as_str(), tier)),
            }
        }
    }
    findings
}

/// Switches for the optional parts of a validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationOptions {
    pub duplicate_ids_are_errors: bool,
    pub check_tier_order: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            duplicate_ids_are_errors: true,
            check_tier_order: true,
        }
    }
}

/// Everything one validation run found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub errors: Vec<ErrorFinding>,
    pub warnings: Vec<WarningFinding>,
    pub cycles: Vec<Vec<String>>,
    pub orphans: Vec<OrphanQuest>,
    pub blocked: Vec<BlockedQuest>,
    /// Availability with nothing completed.
    pub start_state: Availability,
    pub quest_count: usize,
    pub npc_count: usize,
}

impl ValidationOutcome {
    /// Errors and cycles fail the run; warnings never do.
    pub fn has_blocking_errors(&self) -> bool {
        !self.errors.is_empty() || !self.cycles.is_empty()
    }
}

/// Runs the full suite of checks.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    options: ValidationOptions,
}

impl Validator {
    pub fn new(options: ValidationOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> ValidationOptions {
        self.options
    }

    pub fn run(&self, dataset: &Dataset) -> ValidationOutcome {
        let index = QuestIndex::build(dataset);
        self.run_with_index(dataset, &index)
    }

    pub fn run_with_index(&self, dataset: &Dataset, index: &QuestIndex<'_>) -> ValidationOutcome {
        let mut errors: Vec<ErrorFinding> = check_references(dataset, index)
            .into_iter()
            .map(ErrorFinding::MissingPrerequisite)
            .collect();
        let mut warnings: Vec<WarningFinding> = check_locations(dataset, index)
            .into_iter()
            .map(WarningFinding::WrongPrerequisiteType)
            .collect();

        if self.options.check_tier_order {
            warnings.extend(
                check_tier_order(dataset)
                    .into_iter()
                    .map(WarningFinding::TierOutOfOrder),
            );
        }

        let duplicates = check_duplicate_ids(dataset, index);
        if self.options.duplicate_ids_are_errors {
            errors.extend(duplicates.into_iter().map(ErrorFinding::DuplicateQuestId));
        } else {
            warnings.extend(duplicates.into_iter().map(WarningFinding::DuplicateQuestId));
        }

        let outcome = ValidationOutcome {
            errors,
            warnings,
            cycles: detect_cycles(index),
            orphans: find_orphans(dataset, index),
            blocked: find_blocked(dataset, index),
            start_state: simulate_start(dataset, index),
            quest_count: dataset.quest_count(),
            npc_count: dataset.npcs.len(),
        };

        debug!(
            "validation: {} errors, {} warnings, {} cycles, {} orphans, {} blocked",
            outcome.errors.len(),
            outcome.warnings.len(),
            outcome.cycles.len(),
            outcome.orphans.len(),
            outcome.blocked.len()
        );
        outcome
    }
}
