//! Dedup planner. Assigns each named symbol to a single owning target in
//! insertion order, lowest lexicographic symbol first within a target.
//! Ownership is total: no symbol is ever dropped silently, it is either
//! kept by its first owner or recorded in a `SkippedNamedImport`.

use crate::usage::{UsageEntry, UsageMap};
use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedNamedImport {
    pub symbol: String,
    pub skipped_source: PathBuf,
    pub kept_source: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedEntry {
    pub target: PathBuf,
    pub needs_default: bool,
    pub needs_namespace: bool,
    pub side_effect_only: bool,
    pub named: BTreeSet<String>,
}

#[derive(Debug, Default)]
pub struct PlannedUsageMap {
    pub entries: Vec<PlannedEntry>,
    pub skipped: Vec<SkippedNamedImport>,
}

impl PlannedUsageMap {
    pub fn get(&self, target: &std::path::Path) -> Option<&PlannedEntry> {
        self.entries.iter().find(|e| e.target == target)
    }
}

/// Walks `usage` in its insertion order, handing out ownership of each
/// symbol to the first target that claims it.
pub fn plan(usage: &UsageMap) -> PlannedUsageMap {
    let mut owned: HashSet<String> = HashSet::new();
    let mut owner_of: std::collections::HashMap<String, PathBuf> = std::collections::HashMap::new();
    let mut entries = Vec::new();
    let mut skipped = Vec::new();

    for (target, usage_entry) in usage.iter() {
        let UsageEntry {
            needs_default,
            needs_namespace,
            side_effect_only,
            named,
        } = usage_entry;

        let mut planned_named = BTreeSet::new();
        for symbol in named {
            if owned.insert(symbol.clone()) {
                owner_of.insert(symbol.clone(), target.clone());
                planned_named.insert(symbol.clone());
            } else {
                skipped.push(SkippedNamedImport {
                    symbol: symbol.clone(),
                    skipped_source: target.clone(),
                    kept_source: owner_of[symbol].clone(),
                });
            }
        }

        entries.push(PlannedEntry {
            target: target.clone(),
            needs_default: *needs_default,
            needs_namespace: *needs_namespace,
            side_effect_only: *side_effect_only,
            named: planned_named,
        });
    }

    PlannedUsageMap { entries, skipped }
}
