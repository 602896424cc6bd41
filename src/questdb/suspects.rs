//! Quests that have no prerequisites but probably should.

use serde::{Deserialize, Serialize};

use crate::questdb::chain::parse_part;
use crate::questdb::index::QuestIndex;
use crate::questdb::types::Dataset;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SuspectReason {
    /// Named as part N (N > 1) of a chain, yet gated on nothing.
    UnlinkedChainPart,
    /// Other quests depend on it, yet it is gated on nothing.
    ReferencedWithoutPrerequisites,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Referrer {
    pub npc: String,
    pub quest_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SuspiciousQuest {
    pub npc_id: String,
    pub npc: String,
    pub quest_id: String,
    pub quest_name: String,
    pub reason: SuspectReason,
    pub referenced_by: Vec<Referrer>,
}

pub fn find_suspicious_quests(dataset: &Dataset, index: &QuestIndex<'_>) -> Vec<SuspiciousQuest> {
    let mut found = Vec::new();
    for (npc_id, _, quest) in dataset.quests() {
        if !quest.has_no_prerequisites() {
            continue;
        }
        let referrers = index.referenced_by(&quest.id);
        let reason = match parse_part(&quest.name) {
            Some(chain) if chain.part > 1 => SuspectReason::UnlinkedChainPart,
            _ if !referrers.is_empty() => SuspectReason::ReferencedWithoutPrerequisites,
            _ => continue,
        };
        found.push(SuspiciousQuest {
            npc_id: npc_id.to_string(),
            npc: dataset.npc_name(npc_id).to_string(),
            quest_id: quest.id.clone(),
            quest_name: quest.name.clone(),
            reason,
            referenced_by: referrers
                .iter()
                .map(|r| Referrer {
                    npc: r.npc_name().to_string(),
                    quest_name: r.quest.name.clone(),
                })
                .collect(),
        });
    }
    found
}
