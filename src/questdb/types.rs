use std::fmt;

use chrono::{SecondsFormat, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Version tag written into freshly created datasets.
pub const DATASET_VERSION: &str = "1.0.0";

/// Which prerequisite list an id is stored in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PrereqField {
    /// `prerequisites`: the prerequisite belongs to the same NPC.
    #[serde(rename = "prerequisites")]
    Internal,
    /// `prerequisitesExternal`: the prerequisite belongs to another NPC.
    #[serde(rename = "prerequisitesExternal")]
    External,
}

impl PrereqField {
    pub const ALL: [PrereqField; 2] = [PrereqField::Internal, PrereqField::External];

    /// JSON key of the list this variant stands for.
    pub fn key(self) -> &'static str {
        match self {
            PrereqField::Internal => "prerequisites",
            PrereqField::External => "prerequisitesExternal",
        }
    }

    /// The field a prerequisite owned by `prereq_npc` belongs in, for a quest owned by `quest_npc`.
    pub fn for_owners(quest_npc: &str, prereq_npc: &str) -> Self {
        if quest_npc == prereq_npc {
            PrereqField::Internal
        } else {
            PrereqField::External
        }
    }
}

impl fmt::Display for PrereqField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A single quest as stored in the dataset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuestRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tier: Option<u32>,
    #[serde(default)]
    pub prerequisites: Vec<String>, // same NPC
    #[serde(default)]
    pub prerequisites_external: Vec<String>, // other NPCs
    #[serde(default)]
    pub wiki_url: String,
    #[serde(default)]
    pub kappa_required: bool,
    /// Keys this tool does not interpret (objectives, images, ...). Written back untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl QuestRecord {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            tier: None,
            prerequisites: Vec::new(),
            prerequisites_external: Vec::new(),
            wiki_url: String::new(),
            kappa_required: false,
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_tier(mut self, tier: u32) -> Self {
        self.tier = Some(tier);
        self
    }

    pub fn with_prerequisite(mut self, quest_id: &str) -> Self {
        self.prerequisites.push(quest_id.to_string());
        self
    }

    pub fn with_external_prerequisite(mut self, quest_id: &str) -> Self {
        self.prerequisites_external.push(quest_id.to_string());
        self
    }

    pub fn with_wiki_url(mut self, url: &str) -> Self {
        self.wiki_url = url.to_string();
        self
    }

    pub fn with_kappa_required(mut self, required: bool) -> Self {
        self.kappa_required = required;
        self
    }

    pub fn field(&self, field: PrereqField) -> &[String] {
        match field {
            PrereqField::Internal => &self.prerequisites,
            PrereqField::External => &self.prerequisites_external,
        }
    }

    pub fn field_mut(&mut self, field: PrereqField) -> &mut Vec<String> {
        match field {
            PrereqField::Internal => &mut self.prerequisites,
            PrereqField::External => &mut self.prerequisites_external,
        }
    }

    /// Every prerequisite entry, `prerequisites` first, tagged with the list it came from.
    pub fn prerequisite_entries(&self) -> impl Iterator<Item = (PrereqField, &str)> + '_ {
        PrereqField::ALL
            .into_iter()
            .flat_map(move |field| self.field(field).iter().map(move |id| (field, id.as_str())))
    }

    /// Both lists concatenated, duplicates kept.
    pub fn all_prerequisites(&self) -> Vec<String> {
        self.prerequisite_entries()
            .map(|(_, id)| id.to_string())
            .collect()
    }

    pub fn has_prerequisite(&self, quest_id: &str) -> bool {
        self.prerequisite_entries().any(|(_, id)| id == quest_id)
    }

    pub fn has_no_prerequisites(&self) -> bool {
        self.prerequisites.is_empty() && self.prerequisites_external.is_empty()
    }
}

/// An NPC and the ordered list of quests it gives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NpcRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub quests: Vec<QuestRecord>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl NpcRecord {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            quests: Vec::new(),
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_quest(mut self, quest: QuestRecord) -> Self {
        self.quests.push(quest);
        self
    }

    pub fn quest(&self, quest_id: &str) -> Option<&QuestRecord> {
        self.quests.iter().find(|q| q.id == quest_id)
    }

    pub fn quest_mut(&mut self, quest_id: &str) -> Option<&mut QuestRecord> {
        self.quests.iter_mut().find(|q| q.id == quest_id)
    }
}

/// NPC id → NPC map that keeps the order the document listed them in.
///
/// Every report follows this order, so it must survive a load/save cycle.
/// Inserting an id that is already present replaces the value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NpcTable {
    entries: Vec<(String, NpcRecord)>,
}

impl NpcTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, npc_id: &str, npc: NpcRecord) {
        match self.entries.iter_mut().find(|(id, _)| id == npc_id) {
            Some((_, existing)) => *existing = npc,
            None => self.entries.push((npc_id.to_string(), npc)),
        }
    }

    pub fn get(&self, npc_id: &str) -> Option<&NpcRecord> {
        self.entries
            .iter()
            .find(|(id, _)| id == npc_id)
            .map(|(_, npc)| npc)
    }

    pub fn get_mut(&mut self, npc_id: &str) -> Option<&mut NpcRecord> {
        self.entries
            .iter_mut()
            .find(|(id, _)| id == npc_id)
            .map(|(_, npc)| npc)
    }

    pub fn contains(&self, npc_id: &str) -> bool {
        self.get(npc_id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NpcRecord)> {
        self.entries.iter().map(|(id, npc)| (id.as_str(), npc))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut NpcRecord)> {
        self.entries.iter_mut().map(|(id, npc)| (id.as_str(), npc))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(id, _)| id.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for NpcTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, npc) in &self.entries {
            map.serialize_entry(id, npc)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for NpcTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct NpcTableVisitor;

        impl<'de> Visitor<'de> for NpcTableVisitor {
            type Value = NpcTable;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of NPC id to NPC record")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<NpcTable, A::Error> {
                let mut table = NpcTable::new();
                while let Some((id, npc)) = access.next_entry::<String, NpcRecord>()? {
                    table.insert(&id, npc);
                }
                Ok(table)
            }
        }

        deserializer.deserialize_map(NpcTableVisitor)
    }
}

/// The whole persisted quest database.
///
/// Equality compares content only; `trailing_newline` is file layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub version: String,
    #[serde(default, alias = "lastUpdated")]
    pub last_updated: String,
    #[serde(default)]
    pub npcs: NpcTable,
    /// Whether the rendered document ends with `'\n'`. Set from the source text on load.
    #[serde(skip)]
    pub trailing_newline: bool,
}

impl PartialEq for Dataset {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
            && self.last_updated == other.last_updated
            && self.npcs == other.npcs
    }
}

impl Dataset {
    pub fn new(version: &str) -> Self {
        Self {
            version: version.to_string(),
            last_updated: String::new(),
            npcs: NpcTable::new(),
            trailing_newline: false,
        }
    }

    pub fn with_npc(mut self, npc_id: &str, npc: NpcRecord) -> Self {
        self.npcs.insert(npc_id, npc);
        self
    }

    /// Stamp `last_updated` with the current UTC time.
    pub fn touch(&mut self) {
        self.last_updated = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    }

    /// Every quest in dataset order: NPCs as listed, then each NPC's quest list.
    pub fn quests(&self) -> impl Iterator<Item = (&str, &NpcRecord, &QuestRecord)> {
        self.npcs
            .iter()
            .flat_map(|(npc_id, npc)| npc.quests.iter().map(move |quest| (npc_id, npc, quest)))
    }

    pub fn quest_count(&self) -> usize {
        self.npcs.iter().map(|(_, npc)| npc.quests.len()).sum()
    }

    /// Display name of an NPC, falling back to its id.
    pub fn npc_name<'a>(&'a self, npc_id: &'a str) -> &'a str {
        match self.npcs.get(npc_id) {
            Some(npc) if !npc.name.is_empty() => &npc.name,
            _ => npc_id,
        }
    }
}

/// Owned pointer to a quest: who gives it, its id and its display name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct QuestRef {
    pub npc_id: String,
    pub quest_id: String,
    pub quest_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn npc_table_keeps_document_order() {
        let json = r#"{"zeta":{"name":"Zeta","quests":[]},"alpha":{"name":"Alpha","quests":[]}}"#;
        let table: NpcTable = serde_json::from_str(json).unwrap();
        let ids: Vec<&str> = table.ids().collect();
        assert_eq!(ids, vec!["zeta", "alpha"]);
        assert_eq!(serde_json::to_string(&table).unwrap(), json);
    }

    #[test]
    fn npc_table_insert_replaces_in_place() {
        let mut table = NpcTable::new();
        table.insert("a", NpcRecord::new("First"));
        table.insert("b", NpcRecord::new("B"));
        table.insert("a", NpcRecord::new("Second"));
        assert_eq!(table.len(), 2);
        assert_eq!(table.ids().next(), Some("a"));
        assert_eq!(table.get("a").unwrap().name, "Second");
    }

    #[test]
    fn quest_defaults_missing_fields() {
        let quest: QuestRecord = serde_json::from_str(r#"{"id":"q1","name":"Debut"}"#).unwrap();
        assert!(quest.has_no_prerequisites());
        assert_eq!(quest.tier, None);
        assert!(!quest.kappa_required);
        assert!(quest.extra.is_empty());
    }

    #[test]
    fn prereq_field_uses_json_keys() {
        assert_eq!(
            serde_json::to_string(&PrereqField::External).unwrap(),
            "\"prerequisitesExternal\""
        );
        assert_eq!(PrereqField::for_owners("prapor", "prapor"), PrereqField::Internal);
        assert_eq!(PrereqField::for_owners("prapor", "skier"), PrereqField::External);
    }

    #[test]
    fn prerequisite_entries_lists_internal_first() {
        let quest = QuestRecord::new("q", "Q")
            .with_external_prerequisite("x")
            .with_prerequisite("a");
        let entries: Vec<_> = quest.prerequisite_entries().collect();
        assert_eq!(
            entries,
            vec![(PrereqField::Internal, "a"), (PrereqField::External, "x")]
        );
    }
}
