mod common;

use questgraph::questdb::{
    apply_fixes, dedup_fixes, find_suspicious_quests, plan_repairs, propose_fixes, ChainInference,
    Dataset, NameChainInference, NpcRecord, PrereqField, QuestIndex, QuestRecord, QuestStore,
    SuspectReason, Validator,
};

use common::single_npc;

fn widget_npc() -> Dataset {
    single_npc(
        "mechanic",
        "Mechanic",
        vec![
            QuestRecord::new("a", "Gunsmith"),
            QuestRecord::new("b", "Widget - Part 2"),
            QuestRecord::new("c", "Widget - Part 1"),
        ],
    )
}

#[test]
fn part_two_gets_part_one() {
    let dataset = widget_npc();
    let fixes = plan_repairs(&dataset);
    assert_eq!(fixes.len(), 1);
    assert_eq!(fixes[0].quest_id, "b");
    assert_eq!(fixes[0].add_prerequisite, "c");
    assert_eq!(fixes[0].field, PrereqField::Internal);

    let (repaired, summary) = apply_fixes(dataset, &fixes);
    assert_eq!(summary.applied, 1);
    let b = repaired.npcs.get("mechanic").unwrap().quest("b").unwrap();
    assert_eq!(b.prerequisites, vec!["c".to_string()]);
    assert!(b.prerequisites_external.is_empty());
}

#[test]
fn apply_leaves_input_untouched_elsewhere() {
    let dataset = widget_npc();
    let fixes = plan_repairs(&dataset);
    let (repaired, _) = apply_fixes(dataset.clone(), &fixes);

    let before = dataset.npcs.get("mechanic").unwrap();
    let after = repaired.npcs.get("mechanic").unwrap();
    assert_eq!(before.quests[0], after.quests[0]);
    assert_eq!(before.quests[2], after.quests[2]);
    assert!(before.quests[1].prerequisites.is_empty());
}

#[test]
fn proposals_are_deterministic_and_repair_is_idempotent() {
    let dataset = QuestStore::new(common::fixture_dataset()).load().unwrap();
    let first = plan_repairs(&dataset);
    assert_eq!(first, plan_repairs(&dataset));
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].quest_id, "the_punisher_part_2");

    let (once, summary) = apply_fixes(dataset, &first);
    assert_eq!(summary.applied, 1);
    assert!(plan_repairs(&once).is_empty());

    let (twice, again) = apply_fixes(once.clone(), &first);
    assert_eq!(again.applied, 0);
    assert_eq!(again.unchanged, 1);
    assert_eq!(once, twice);
}

#[test]
fn repeated_candidates_yield_one_edit() {
    let dataset = widget_npc();
    let index = QuestIndex::build(&dataset);
    let inference = NameChainInference::new(&index);
    let proposed = propose_fixes(&dataset, &inference);
    let doubled: Vec<_> = proposed.iter().chain(proposed.iter()).cloned().collect();
    assert_eq!(dedup_fixes(&doubled).len(), 1);

    let (repaired, summary) = apply_fixes(dataset, &doubled);
    assert_eq!(summary.applied, 1);
    assert_eq!(summary.unchanged, 0);
    let b = repaired.npcs.get("mechanic").unwrap().quest("b").unwrap();
    assert_eq!(b.prerequisites.len(), 1);
}

#[test]
fn fix_for_vanished_npc_is_skipped() {
    let dataset = widget_npc();
    let fixes = plan_repairs(&dataset);
    let changed = Dataset::new("1.0.0").with_npc("fence", NpcRecord::new("Fence"));

    let (after, summary) = apply_fixes(changed.clone(), &fixes);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.applied, 0);
    assert_eq!(after, changed);
}

#[test]
fn spaced_and_unspaced_names_link() {
    let dataset = single_npc(
        "jaeger",
        "Jaeger",
        vec![
            QuestRecord::new("tarkov_shooter_1", "The Tarkov Shooter Part 1"),
            QuestRecord::new("tarkov_shooter_2", "The Tarkov Shooter - Part 2"),
        ],
    );
    let index = QuestIndex::build(&dataset);
    let prior = NameChainInference::new(&index)
        .infer_prior_part("The Tarkov Shooter - Part 2")
        .unwrap();
    assert_eq!(prior.quest_id, "tarkov_shooter_1");
}

#[test]
fn repair_clears_chain_suspects() {
    let dataset = QuestStore::new(common::fixture_dataset()).load().unwrap();
    let index = QuestIndex::build(&dataset);
    let suspects = find_suspicious_quests(&dataset, &index);
    let found: Vec<(&str, SuspectReason)> = suspects
        .iter()
        .map(|s| (s.quest_id.as_str(), s.reason))
        .collect();
    assert_eq!(
        found,
        vec![
            ("debut", SuspectReason::ReferencedWithoutPrerequisites),
            ("the_punisher_part_2", SuspectReason::UnlinkedChainPart),
        ]
    );
    assert_eq!(suspects[0].referenced_by.len(), 2);

    let fixes = plan_repairs(&dataset);
    let (repaired, _) = apply_fixes(dataset, &fixes);
    let index = QuestIndex::build(&repaired);
    let remaining = find_suspicious_quests(&repaired, &index);
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].quest_id, "debut");
    assert!(!Validator::default().run(&repaired).has_blocking_errors());
}

#[test]
fn huge_part_number_plans_promptly() {
    let dataset = single_npc(
        "mechanic",
        "Mechanic",
        vec![
            QuestRecord::new("w1", "Widget - Part 1"),
            QuestRecord::new("wbig", "Widget - Part 4000000000"),
            QuestRecord::new("lone", "Lonely - Part 3000000000"),
        ],
    );
    let fixes = plan_repairs(&dataset);
    assert_eq!(fixes.len(), 1);
    assert_eq!(fixes[0].quest_id, "wbig");
    assert_eq!(fixes[0].add_prerequisite, "w1");
}
