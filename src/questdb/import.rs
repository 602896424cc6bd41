//! Conversion of raw task exports into a dataset.
//!
//! The input is the task list returned by the external quest API, either as a
//! bare JSON array or wrapped in the GraphQL envelope `{"data": {"tasks": [...]}}`.
//! Fetching it is someone else's job.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::{info, warn};
use serde::Deserialize;

use crate::logutil::escape_log;
use crate::questdb::errors::QuestDbError;
use crate::questdb::types::{Dataset, NpcRecord, PrereqField, QuestRecord};

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RawTrader {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RawTaskRef {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RawRequirement {
    pub task: RawTaskRef,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawTask {
    pub id: String,
    pub name: String,
    pub trader: RawTrader,
    #[serde(default)]
    pub task_requirements: Vec<RawRequirement>,
    #[serde(default)]
    pub wiki_link: Option<String>,
    #[serde(default)]
    pub kappa_required: Option<bool>,
}

#[derive(Deserialize)]
struct TaskData {
    tasks: Vec<RawTask>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawExport {
    Tasks(Vec<RawTask>),
    Envelope { data: TaskData },
}

/// Parse a raw task export in either accepted shape.
pub fn parse_raw_tasks(contents: &str) -> Result<Vec<RawTask>, QuestDbError> {
    let export: RawExport = serde_json::from_str(contents).map_err(|e| {
        QuestDbError::InvalidInput(format!(
            "expected a task array or {{\"data\": {{\"tasks\": [...]}}}}: {}",
            e
        ))
    })?;
    Ok(match export {
        RawExport::Tasks(tasks) => tasks,
        RawExport::Envelope { data } => data.tasks,
    })
}

/// Readable id derived from a display name: "Gunsmith - Part 1" becomes `gunsmith_part_1`.
pub fn generate_quest_id(name: &str) -> String {
    let lowered = name
        .to_lowercase()
        .replace(" - ", "_")
        .replace(' ', "_")
        .replace('\'', "")
        .replace('-', "_")
        .replace([':', ','], "");

    let mut id = String::with_capacity(lowered.len());
    for c in lowered.chars() {
        if !(c.is_alphanumeric() || c == '_') {
            continue;
        }
        if c == '_' && id.ends_with('_') {
            continue;
        }
        id.push(c);
    }
    id.trim_matches('_').to_string()
}

/// Build a dataset from raw tasks: one NPC per trader, quests in input order.
///
/// Requirements pointing at tasks outside the input are dropped.
pub fn convert_tasks(tasks: &[RawTask], version: &str) -> Dataset {
    let mut ids: HashMap<&str, (String, String)> = HashMap::new();
    for task in tasks {
        let quest_id = generate_quest_id(&task.name);
        if task.id.is_empty() || quest_id.is_empty() {
            continue;
        }
        ids.insert(task.id.as_str(), (quest_id, generate_quest_id(&task.trader.name)));
    }

    let mut dataset = Dataset::new(version);
    for task in tasks {
        let Some((quest_id, npc_id)) = ids.get(task.id.as_str()) else {
            warn!("Skipping task '{}': no usable id", escape_log(&task.name));
            continue;
        };

        let mut quest = QuestRecord::new(quest_id, &task.name)
            .with_wiki_url(task.wiki_link.as_deref().unwrap_or_default())
            .with_kappa_required(task.kappa_required.unwrap_or(false));

        for requirement in &task.task_requirements {
            let Some((prereq_id, prereq_npc)) = ids.get(requirement.task.id.as_str()) else {
                warn!(
                    "{}: requirement {} is not in the export, dropped",
                    quest_id,
                    escape_log(&requirement.task.id)
                );
                continue;
            };
            let field = quest.field_mut(PrereqField::for_owners(npc_id, prereq_npc));
            if !field.contains(prereq_id) {
                field.push(prereq_id.clone());
            }
        }

        if !dataset.npcs.contains(npc_id) {
            dataset.npcs.insert(npc_id, NpcRecord::new(&task.trader.name));
        }
        if let Some(npc) = dataset.npcs.get_mut(npc_id) {
            npc.quests.push(quest);
        }
    }
    dataset
}

/// Read a raw export from disk and convert it.
pub fn import_file(path: &Path, version: &str) -> Result<Dataset, QuestDbError> {
    let contents = fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => QuestDbError::NotFound {
            path: path.to_path_buf(),
        },
        _ => QuestDbError::Io(e),
    })?;
    let tasks = parse_raw_tasks(&contents)?;
    let dataset = convert_tasks(&tasks, version);
    info!(
        "Imported {} tasks from {} into {} NPCs",
        dataset.quest_count(),
        path.display(),
        dataset.npcs.len()
    );
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quest_ids_from_names() {
        assert_eq!(generate_quest_id("Gunsmith - Part 1"), "gunsmith_part_1");
        assert_eq!(generate_quest_id("The Punisher - Part 6"), "the_punisher_part_6");
        assert_eq!(generate_quest_id("Shooter Born in Heaven"), "shooter_born_in_heaven");
        assert_eq!(generate_quest_id("What's on the Flash Drive?"), "whats_on_the_flash_drive");
        assert_eq!(generate_quest_id("  Hot Delivery: Express, Fast "), "hot_delivery_express_fast");
        assert_eq!(generate_quest_id(""), "");
    }

    #[test]
    fn accepts_graphql_envelope() {
        let json = r#"{"data":{"tasks":[{"id":"t1","name":"Debut","trader":{"name":"Prapor"}}]}}"#;
        let tasks = parse_raw_tasks(json).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].trader.name, "Prapor");
    }

    #[test]
    fn rejects_unexpected_shape() {
        assert!(matches!(
            parse_raw_tasks(r#"{"tasks": 3}"#),
            Err(QuestDbError::InvalidInput(_))
        ));
    }
}
