//! # questgraph - quest prerequisite graph checker
//!
//! `questgraph` maintains a dataset of game quests grouped by the NPC that
//! gives them. Each quest lists the quests that must be completed first. The
//! crate loads that dataset, checks the prerequisite graph for structural
//! defects and repairs the gaps it can infer.
//!
//! ## Features
//!
//! - **Validation**: dangling references, misfiled internal/external edges,
//!   circular dependencies, orphaned and blocked quests, duplicate ids and tier order.
//! - **Availability simulation**: which quests open up for a given set of completed quests.
//! - **Chain repair**: "Part N" quests gated on the closest earlier part, applied as a pure transform.
//! - **Reports**: stable JSON report files plus human-readable summaries.
//! - **Import**: conversion of raw task exports from the external quest API.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use questgraph::questdb::{QuestStore, ValidationReport, Validator};
//!
//! fn main() -> anyhow::Result<()> {
//!     let store = QuestStore::new("quests-database.json");
//!     let dataset = store.load()?;
//!
//!     let outcome = Validator::default().run(&dataset);
//!     let report = ValidationReport::emit(&dataset, &outcome);
//!     println!("{}", questgraph::questdb::render_validation_summary(&report));
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`questdb`] - dataset model, storage, graph checks, simulation and repair
//! - [`config`] - TOML configuration
//! - [`logutil`] - logger setup and single-line log helpers

pub mod config;
pub mod logutil;
pub mod questdb;
