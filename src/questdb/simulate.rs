//! Quest availability simulation.
//!
//! Given the ids a player has already completed, sorts every quest into one of
//! three buckets: completed, available (all prerequisites done) or locked.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::questdb::index::QuestIndex;
use crate::questdb::types::Dataset;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityReason {
    NoPrerequisites,
    PrerequisitesCompleted,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestSummary {
    pub npc_id: String,
    pub npc: String,
    pub quest_id: String,
    pub quest_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AvailableQuest {
    pub npc_id: String,
    pub npc: String,
    pub quest_id: String,
    pub quest_name: String,
    pub reason: AvailabilityReason,
}

/// A prerequisite standing between a locked quest and availability.
/// `npc` and `name` are `None` when the id does not resolve.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MissingPrerequisite {
    pub id: String,
    pub npc: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LockedQuest {
    pub npc_id: String,
    pub npc: String,
    pub quest_id: String,
    pub quest_name: String,
    pub missing_prerequisites: Vec<MissingPrerequisite>,
}

/// Result of one simulation run; every bucket is in dataset order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Availability {
    pub available: Vec<AvailableQuest>,
    pub locked: Vec<LockedQuest>,
    pub completed: Vec<QuestSummary>,
}

impl Availability {
    pub fn is_available(&self, quest_id: &str) -> bool {
        self.available.iter().any(|q| q.quest_id == quest_id)
    }

    pub fn is_locked(&self, quest_id: &str) -> bool {
        self.locked.iter().any(|q| q.quest_id == quest_id)
    }

    pub fn locked_quest(&self, quest_id: &str) -> Option<&LockedQuest> {
        self.locked.iter().find(|q| q.quest_id == quest_id)
    }
}

/// Partition all quests against the `completed` set.
///
/// A prerequisite id that does not resolve can never be satisfied, so a quest
/// listing one stays locked whatever the completed set contains.
pub fn simulate(dataset: &Dataset, index: &QuestIndex<'_>, completed: &HashSet<String>) -> Availability {
    let mut result = Availability::default();

    for (npc_id, _, quest) in dataset.quests() {
        let npc_name = dataset.npc_name(npc_id).to_string();

        if completed.contains(&quest.id) {
            result.completed.push(QuestSummary {
                npc_id: npc_id.to_string(),
                npc: npc_name,
                quest_id: quest.id.clone(),
                quest_name: quest.name.clone(),
            });
            continue;
        }

        if quest.has_no_prerequisites() {
            result.available.push(AvailableQuest {
                npc_id: npc_id.to_string(),
                npc: npc_name,
                quest_id: quest.id.clone(),
                quest_name: quest.name.clone(),
                reason: AvailabilityReason::NoPrerequisites,
            });
            continue;
        }

        let mut missing: Vec<MissingPrerequisite> = Vec::new();
        for (_, prereq_id) in quest.prerequisite_entries() {
            if missing.iter().any(|m| m.id == prereq_id) {
                continue;
            }
            match index.get(prereq_id) {
                Some(_) if completed.contains(prereq_id) => {}
                Some(entry) => missing.push(MissingPrerequisite {
                    id: prereq_id.to_string(),
                    npc: Some(entry.npc_id.to_string()),
                    name: Some(entry.quest.name.clone()),
                }),
                None => missing.push(MissingPrerequisite {
                    id: prereq_id.to_string(),
                    npc: None,
                    name: None,
                }),
            }
        }

        if missing.is_empty() {
            result.available.push(AvailableQuest {
                npc_id: npc_id.to_string(),
                npc: npc_name,
                quest_id: quest.id.clone(),
                quest_name: quest.name.clone(),
                reason: AvailabilityReason::PrerequisitesCompleted,
            });
        } else {
            result.locked.push(LockedQuest {
                npc_id: npc_id.to_string(),
                npc: npc_name,
                quest_id: quest.id.clone(),
                quest_name: quest.name.clone(),
                missing_prerequisites: missing,
            });
        }
    }

    result
}

/// Simulation from a fresh profile (nothing completed).
pub fn simulate_start(dataset: &Dataset, index: &QuestIndex<'_>) -> Availability {
    simulate(dataset, index, &HashSet::new())
}
