//! Test utilities & fixtures.
//! The static dataset lives under `tests/test-data-int`.

use std::path::{Path, PathBuf};

use questgraph::questdb::{Dataset, NpcRecord, QuestRecord};

/// Path to the static fixture dataset. Copy it to a temp dir before mutating.
pub fn fixture_dataset() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("test-data-int")
        .join("quests-database.json")
}

/// A temp dir holding a writable copy of the fixture dataset, and the copy's path.
#[allow(dead_code)]
pub fn writable_fixture() -> (tempfile::TempDir, PathBuf) {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path = tmp.path().join("quests-database.json");
    std::fs::copy(fixture_dataset(), &path).expect("copy fixture");
    (tmp, path)
}

/// One NPC giving `quests`, in order.
#[allow(dead_code)]
pub fn single_npc(npc_id: &str, name: &str, quests: Vec<QuestRecord>) -> Dataset {
    let npc = quests
        .into_iter()
        .fold(NpcRecord::new(name), |npc, quest| npc.with_quest(quest));
    Dataset::new("1.0.0").with_npc(npc_id, npc)
}
