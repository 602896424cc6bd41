//! Quest prerequisite database.
//! Loads the NPC/quest dataset, indexes it, checks the prerequisite graph for
//! structural defects, simulates availability and repairs multi-part chains.

pub mod chain;
pub mod errors;
pub mod import;
pub mod index;
pub mod repair;
pub mod report;
pub mod simulate;
pub mod storage;
pub mod suspects;
pub mod types;
pub mod validate;

pub use chain::{candidate_names, parse_part, ChainInference, ChainPart, NameChainInference};
pub use errors::QuestDbError;
pub use import::{convert_tasks, generate_quest_id, import_file, parse_raw_tasks, RawTask};
pub use index::{normalize_name, IndexedQuest, QuestIndex};
pub use repair::{apply_fixes, dedup_fixes, plan_repairs, propose_fixes, ApplySummary, ProposedFix};
pub use report::{
    render_availability, render_fixes, render_suspects, render_validation_summary, write_report,
    AvailabilityReport, FixReport, NpcSummary, SuspectReport, ValidationReport,
};
pub use simulate::{simulate, simulate_start, Availability, AvailabilityReason, MissingPrerequisite};
pub use storage::QuestStore;
pub use suspects::{find_suspicious_quests, SuspectReason, SuspiciousQuest};
pub use types::*;
pub use validate::{
    detect_cycles, ErrorFinding, ValidationOptions, ValidationOutcome, Validator, WarningFinding,
};
