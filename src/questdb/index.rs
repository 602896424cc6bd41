//! Lookup structures over a loaded dataset.
//!
//! The index borrows the dataset it was built from; build a fresh one after mutating.

use std::collections::HashMap;

use crate::questdb::types::{Dataset, NpcRecord, QuestRecord, QuestRef};

/// Normalized form used for name lookups: trimmed and lower-cased.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// A quest together with the NPC that owns it.
#[derive(Debug, Clone, Copy)]
pub struct IndexedQuest<'a> {
    pub npc_id: &'a str,
    pub npc: &'a NpcRecord,
    pub quest: &'a QuestRecord,
}

impl<'a> IndexedQuest<'a> {
    pub fn id(&self) -> &'a str {
        &self.quest.id
    }

    /// NPC display name, or its id when the name is blank.
    pub fn npc_name(&self) -> &'a str {
        if self.npc.name.is_empty() {
            self.npc_id
        } else {
            &self.npc.name
        }
    }

    pub fn to_ref(&self) -> QuestRef {
        QuestRef {
            npc_id: self.npc_id.to_string(),
            quest_id: self.quest.id.clone(),
            quest_name: self.quest.name.clone(),
        }
    }
}

/// A quest id used by more than one quest record.
#[derive(Debug, Clone)]
pub struct DuplicateId<'a> {
    pub quest_id: &'a str,
    /// Every record carrying the id, in dataset order.
    pub locations: Vec<IndexedQuest<'a>>,
}

/// id, name and reverse-reference lookups over a dataset.
#[derive(Debug, Clone)]
pub struct QuestIndex<'a> {
    by_id: HashMap<&'a str, IndexedQuest<'a>>,
    by_name: HashMap<String, IndexedQuest<'a>>,
    referenced_by: HashMap<&'a str, Vec<IndexedQuest<'a>>>,
    /// Distinct ids in first-seen order.
    order: Vec<&'a str>,
    duplicates: Vec<DuplicateId<'a>>,
}

impl<'a> QuestIndex<'a> {
    /// Index every quest with a non-empty id. Later records win on id and name collisions.
    pub fn build(dataset: &'a Dataset) -> Self {
        let mut by_id: HashMap<&'a str, IndexedQuest<'a>> = HashMap::new();
        let mut by_name = HashMap::new();
        let mut referenced_by: HashMap<&'a str, Vec<IndexedQuest<'a>>> = HashMap::new();
        let mut occurrences: HashMap<&'a str, Vec<IndexedQuest<'a>>> = HashMap::new();
        let mut order = Vec::new();

        for (npc_id, npc, quest) in dataset.quests() {
            if quest.id.is_empty() {
                continue;
            }
            let entry = IndexedQuest { npc_id, npc, quest };

            let seen = occurrences.entry(quest.id.as_str()).or_default();
            if seen.is_empty() {
                order.push(quest.id.as_str());
            }
            seen.push(entry);

            by_id.insert(quest.id.as_str(), entry);
            by_name.insert(normalize_name(&quest.name), entry);

            let mut listed: Vec<&str> = Vec::new();
            for (_, prereq_id) in quest.prerequisite_entries() {
                if listed.contains(&prereq_id) {
                    continue;
                }
                listed.push(prereq_id);
                referenced_by.entry(prereq_id).or_default().push(entry);
            }
        }

        let duplicates = order
            .iter()
            .filter_map(|&id| {
                let locations = occurrences.remove(id)?;
                (locations.len() > 1).then_some(DuplicateId {
                    quest_id: id,
                    locations,
                })
            })
            .collect();

        Self {
            by_id,
            by_name,
            referenced_by,
            order,
            duplicates,
        }
    }

    pub fn get(&self, quest_id: &str) -> Option<&IndexedQuest<'a>> {
        self.by_id.get(quest_id)
    }

    pub fn contains(&self, quest_id: &str) -> bool {
        self.by_id.contains_key(quest_id)
    }

    /// Id of the NPC owning `quest_id`, if it resolves.
    pub fn owner_of(&self, quest_id: &str) -> Option<&'a str> {
        self.by_id.get(quest_id).map(|entry| entry.npc_id)
    }

    /// Exact lookup on an already-normalized key.
    pub fn by_normalized_name(&self, key: &str) -> Option<&IndexedQuest<'a>> {
        self.by_name.get(key)
    }

    /// Every normalized name key, in no particular order.
    pub fn normalized_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.by_name.keys().map(String::as_str)
    }

    /// Lookup by display name; the name is normalized first.
    pub fn find_by_name(&self, name: &str) -> Option<&IndexedQuest<'a>> {
        self.by_name.get(&normalize_name(name))
    }

    /// Quests listing `quest_id` as a prerequisite, in dataset order.
    pub fn referenced_by(&self, quest_id: &str) -> &[IndexedQuest<'a>] {
        self.referenced_by
            .get(quest_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Prerequisite ids of `quest_id` that resolve, in field order, without repeats.
    pub fn resolved_prerequisites(&self, quest_id: &str) -> Vec<&'a str> {
        let Some(entry) = self.by_id.get(quest_id) else {
            return Vec::new();
        };
        let mut edges: Vec<&'a str> = Vec::new();
        for (_, prereq_id) in entry.quest.prerequisite_entries() {
            if self.by_id.contains_key(prereq_id) && !edges.contains(&prereq_id) {
                edges.push(prereq_id);
            }
        }
        edges
    }

    pub fn duplicates(&self) -> &[DuplicateId<'a>] {
        &self.duplicates
    }

    /// Distinct quest ids in first-seen dataset order.
    pub fn ids(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.order.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::questdb::types::{NpcRecord, QuestRecord};

    fn sample() -> Dataset {
        Dataset::new("1.0.0")
            .with_npc(
                "prapor",
                NpcRecord::new("Prapor")
                    .with_quest(QuestRecord::new("debut", "Debut"))
                    .with_quest(
                        QuestRecord::new("checking", "Checking")
                            .with_prerequisite("debut")
                            .with_prerequisite("debut"),
                    ),
            )
            .with_npc(
                "skier",
                NpcRecord::new("Skier").with_quest(
                    QuestRecord::new("supplier", "  Supplier ")
                        .with_external_prerequisite("debut")
                        .with_external_prerequisite("ghost"),
                ),
            )
    }

    #[test]
    fn indexes_owner_and_names() {
        let dataset = sample();
        let index = QuestIndex::build(&dataset);
        assert_eq!(index.len(), 3);
        assert_eq!(index.owner_of("supplier"), Some("skier"));
        assert_eq!(index.find_by_name("SUPPLIER").map(|q| q.id()), Some("supplier"));
        assert!(index.by_normalized_name("  supplier ").is_none());
        assert!(!index.contains("ghost"));
    }

    #[test]
    fn referenced_by_lists_each_referrer_once() {
        let dataset = sample();
        let index = QuestIndex::build(&dataset);
        let referrers: Vec<&str> = index.referenced_by("debut").iter().map(|q| q.id()).collect();
        assert_eq!(referrers, vec!["checking", "supplier"]);
        assert_eq!(index.referenced_by("ghost").len(), 1);
        assert!(index.referenced_by("supplier").is_empty());
    }

    #[test]
    fn duplicate_ids_last_write_wins_and_are_recorded() {
        let dataset = sample().with_npc(
            "therapist",
            NpcRecord::new("Therapist").with_quest(QuestRecord::new("debut", "Debut (copy)")),
        );
        let index = QuestIndex::build(&dataset);
        assert_eq!(index.owner_of("debut"), Some("therapist"));
        assert_eq!(index.duplicates().len(), 1);
        let dup = &index.duplicates()[0];
        assert_eq!(dup.quest_id, "debut");
        let owners: Vec<&str> = dup.locations.iter().map(|q| q.npc_id).collect();
        assert_eq!(owners, vec!["prapor", "therapist"]);
    }

    #[test]
    fn resolved_prerequisites_skip_dangling_and_repeats() {
        let dataset = sample();
        let index = QuestIndex::build(&dataset);
        assert_eq!(index.resolved_prerequisites("checking"), vec!["debut"]);
        assert_eq!(index.resolved_prerequisites("supplier"), vec!["debut"]);
    }
}
