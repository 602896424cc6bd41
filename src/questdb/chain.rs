//! Multi-part quest chain inference from names.
//!
//! "Widget - Part 3" is assumed to follow the closest lower part of the same
//! chain that exists in the dataset. This is a naming heuristic only; callers go
//! through [`ChainInference`] so it can be swapped for explicit chain metadata.

use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

use regex::Regex;

use crate::questdb::index::{normalize_name, IndexedQuest, QuestIndex};
use crate::questdb::types::QuestRef;

fn part_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)part\s+(\d+)").expect("valid part pattern"))
}

fn part_tail_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)[\s-]*part\s+\d+.*$").expect("valid tail pattern"))
}

/// A quest name split into its chain base and part number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainPart {
    /// Lower-cased name with the "part N" tail removed.
    pub base: String,
    pub part: u32,
}

/// Parse "Base - Part N" style names. Returns `None` when no part number is present.
pub fn parse_part(name: &str) -> Option<ChainPart> {
    let caps = part_pattern().captures(name)?;
    let part = caps.get(1)?.as_str().parse().ok()?;
    let lowered = name.to_lowercase();
    let base = part_tail_pattern().replace(&lowered, "").trim().to_string();
    Some(ChainPart { base, part })
}

/// Normalized names a chain's part `k` may be listed under.
pub fn candidate_names(base: &str, k: u32) -> [String; 3] {
    [
        format!("{} part {}", base, k),
        format!("{} - part {}", base, k),
        format!("{}part {}", base, k),
    ]
}

/// Finds the quest a chain part directly follows.
pub trait ChainInference {
    fn infer_prior_part(&self, name: &str) -> Option<QuestRef>;
}

/// [`ChainInference`] over the normalized-name index.
///
/// The part numbers present for each chain base are collected once up front, so a
/// lookup costs a range query however large the part number is.
pub struct NameChainInference<'i, 'a> {
    index: &'i QuestIndex<'a>,
    parts: HashMap<String, BTreeSet<u32>>,
}

impl<'i, 'a> NameChainInference<'i, 'a> {
    pub fn new(index: &'i QuestIndex<'a>) -> Self {
        let mut parts: HashMap<String, BTreeSet<u32>> = HashMap::new();
        for key in index.normalized_names() {
            let Some(chain) = parse_part(key) else {
                continue;
            };
            // Only names reachable through a candidate form count as a part.
            if lookup_part(index, &chain.base, chain.part).is_some() {
                parts.entry(chain.base).or_default().insert(chain.part);
            }
        }
        Self { index, parts }
    }
}

fn lookup_part<'i, 'a>(
    index: &'i QuestIndex<'a>,
    base: &str,
    k: u32,
) -> Option<&'i IndexedQuest<'a>> {
    candidate_names(base, k)
        .iter()
        .find_map(|candidate| index.by_normalized_name(&normalize_name(candidate)))
}

impl ChainInference for NameChainInference<'_, '_> {
    /// Closest lower part wins: the largest existing part below `N`.
    fn infer_prior_part(&self, name: &str) -> Option<QuestRef> {
        let chain = parse_part(name)?;
        if chain.part < 2 {
            return None;
        }
        let prior = *self.parts.get(&chain.base)?.range(..chain.part).next_back()?;
        lookup_part(self.index, &chain.base, prior).map(IndexedQuest::to_ref)
    }
}
