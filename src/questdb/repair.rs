//! Proposes and applies missing chain edges.
//!
//! Proposal and application are separate steps: proposals can be reviewed (or
//! written out in a dry run) before [`apply_fixes`] produces the updated dataset.

use std::collections::HashSet;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::logutil::quest_label;
use crate::questdb::chain::{ChainInference, NameChainInference};
use crate::questdb::index::QuestIndex;
use crate::questdb::types::{Dataset, PrereqField};

/// One prerequisite edge to add.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProposedFix {
    pub npc_id: String,
    pub npc: String,
    pub quest_id: String,
    pub quest_name: String,
    pub add_prerequisite: String,
    pub prerequisite_name: String,
    pub prerequisite_npc: String,
    pub field: PrereqField,
    pub reason: String,
}

/// Counts from one [`apply_fixes`] call.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApplySummary {
    pub applied: usize,
    /// The NPC or quest named by the fix no longer exists.
    pub skipped: usize,
    /// The prerequisite was already present.
    pub unchanged: usize,
}

/// Chain-part edges the dataset is missing, in dataset order.
pub fn propose_fixes<I: ChainInference + ?Sized>(dataset: &Dataset, inference: &I) -> Vec<ProposedFix> {
    let mut fixes = Vec::new();
    for (npc_id, _, quest) in dataset.quests() {
        let Some(prior) = inference.infer_prior_part(&quest.name) else {
            continue;
        };
        if prior.quest_id == quest.id || quest.has_prerequisite(&prior.quest_id) {
            continue;
        }
        fixes.push(ProposedFix {
            npc_id: npc_id.to_string(),
            npc: dataset.npc_name(npc_id).to_string(),
            quest_id: quest.id.clone(),
            quest_name: quest.name.clone(),
            add_prerequisite: prior.quest_id.clone(),
            prerequisite_name: prior.quest_name.clone(),
            prerequisite_npc: prior.npc_id.clone(),
            field: PrereqField::for_owners(npc_id, &prior.npc_id),
            reason: format!("{} follows {}", quest.name, prior.quest_name),
        });
    }
    fixes
}

/// Keep the first proposal for each `(quest, prerequisite)` pair.
pub fn dedup_fixes(fixes: &[ProposedFix]) -> Vec<ProposedFix> {
    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    fixes
        .iter()
        .filter(|fix| seen.insert((fix.quest_id.as_str(), fix.add_prerequisite.as_str())))
        .cloned()
        .collect()
}

/// Apply `fixes` to `dataset` and return the updated dataset.
///
/// Fixes are deduplicated first. A fix whose NPC or quest cannot be found is
/// skipped; one whose prerequisite is already listed leaves the quest unchanged.
pub fn apply_fixes(mut dataset: Dataset, fixes: &[ProposedFix]) -> (Dataset, ApplySummary) {
    let mut summary = ApplySummary::default();

    for fix in dedup_fixes(fixes) {
        let Some(npc) = dataset.npcs.get_mut(&fix.npc_id) else {
            warn!(
                "NPC {} not found, skipping fix for {}",
                fix.npc_id,
                quest_label(&fix.quest_name, &fix.quest_id)
            );
            summary.skipped += 1;
            continue;
        };
        let Some(quest) = npc.quest_mut(&fix.quest_id) else {
            warn!("quest {} not found under {}, skipping", fix.quest_id, fix.npc_id);
            summary.skipped += 1;
            continue;
        };
        if quest.has_prerequisite(&fix.add_prerequisite) {
            summary.unchanged += 1;
            continue;
        }
        quest.field_mut(fix.field).push(fix.add_prerequisite.clone());
        debug!(
            "{}: + {} ({})",
            quest_label(&fix.quest_name, &fix.quest_id),
            fix.add_prerequisite,
            fix.field
        );
        summary.applied += 1;
    }

    (dataset, summary)
}

/// Propose fixes using name-based chain inference.
pub fn plan_repairs(dataset: &Dataset) -> Vec<ProposedFix> {
    let index = QuestIndex::build(dataset);
    let inference = NameChainInference::new(&index);
    dedup_fixes(&propose_fixes(dataset, &inference))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::questdb::types::{NpcRecord, QuestRecord, QuestRef};

    struct Fixed(Option<QuestRef>);

    impl ChainInference for Fixed {
        fn infer_prior_part(&self, _name: &str) -> Option<QuestRef> {
            self.0.clone()
        }
    }

    fn widget_chain() -> Dataset {
        Dataset::new("1.0.0")
            .with_npc(
                "mechanic",
                NpcRecord::new("Mechanic")
                    .with_quest(QuestRecord::new("w1", "Widget - Part 1"))
                    .with_quest(QuestRecord::new("w2", "Widget - Part 2")),
            )
            .with_npc(
                "skier",
                NpcRecord::new("Skier").with_quest(QuestRecord::new("w3", "Widget - Part 3")),
            )
    }

    #[test]
    fn cross_npc_parts_go_to_external() {
        let fixes = plan_repairs(&widget_chain());
        assert_eq!(fixes.len(), 2);
        assert_eq!(fixes[0].field, PrereqField::Internal);
        assert_eq!(fixes[1].quest_id, "w3");
        assert_eq!(fixes[1].add_prerequisite, "w2");
        assert_eq!(fixes[1].field, PrereqField::External);
    }

    #[test]
    fn self_match_is_ignored() {
        let dataset = widget_chain();
        let inference = Fixed(Some(QuestRef {
            npc_id: "mechanic".to_string(),
            quest_id: "w1".to_string(),
            quest_name: "Widget - Part 1".to_string(),
        }));
        let fixes = propose_fixes(&dataset, &inference);
        assert!(fixes.iter().all(|f| f.quest_id != "w1"));
        assert_eq!(fixes.len(), 2);
    }

    #[test]
    fn apply_counts_skipped_and_unchanged() {
        let dataset = widget_chain();
        let mut fixes = plan_repairs(&dataset);
        let mut stale = fixes[0].clone();
        stale.npc_id = "fence".to_string();
        stale.add_prerequisite = "w0".to_string();
        fixes.push(stale);
        let mut gone = fixes[0].clone();
        gone.quest_id = "w9".to_string();
        fixes.push(gone);

        let (updated, summary) = apply_fixes(dataset, &fixes);
        assert_eq!(summary.applied, 2);
        assert_eq!(summary.skipped, 2);

        let (_, again) = apply_fixes(updated, &fixes[..2]);
        assert_eq!(again.applied, 0);
        assert_eq!(again.unchanged, 2);
    }

    #[test]
    fn duplicate_proposals_collapse() {
        let fixes = plan_repairs(&widget_chain());
        let doubled: Vec<ProposedFix> = fixes.iter().chain(fixes.iter()).cloned().collect();
        assert_eq!(dedup_fixes(&doubled), fixes);
    }
}
