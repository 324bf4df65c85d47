//! Symbol-usage aggregator. Per-target usage classification over the
//! selected entries' *direct* imports only, not the full transitive closure.

use crate::parse::{parse_imports, ImportRecord};
use crate::resolve::resolve;
use squeeze_err::{IoContext, Result};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UsageEntry {
    pub needs_default: bool,
    pub needs_namespace: bool,
    pub side_effect_only: bool,
    pub named: BTreeSet<String>,
}

/// Ordered aggregator output: insertion order is the order targets are first
/// encountered while scanning `entries` in caller order, then import
/// statements left-to-right within each file — the ordering the dedup
/// planner and the manifest serializer both depend on.
#[derive(Debug, Default)]
pub struct UsageMap {
    order: Vec<PathBuf>,
    entries: std::collections::HashMap<PathBuf, UsageEntry>,
}

impl UsageMap {
    pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, &UsageEntry)> {
        self.order.iter().map(move |p| (p, &self.entries[p]))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, target: &Path) -> Option<&UsageEntry> {
        self.entries.get(target)
    }

    fn entry_mut(&mut self, target: PathBuf) -> &mut UsageEntry {
        if !self.entries.contains_key(&target) {
            self.order.push(target.clone());
            self.entries.insert(target.clone(), UsageEntry::default());
        }
        self.entries.get_mut(&target).unwrap()
    }
}

/// Per-selected-file import records, resolved against `root_dir`, feeding the
/// aggregator. Kept alongside the raw records so the orchestrator can also
/// build the `importRegistry` traceability data without reparsing.
pub struct FileImports {
    pub file: PathBuf,
    pub records: Vec<ImportRecord>,
}

pub fn parse_selected_files(selected: &[PathBuf]) -> Result<Vec<FileImports>> {
    let mut out = Vec::with_capacity(selected.len());
    for file in selected {
        let source = fs::read_to_string(file).io_context(file.clone())?;
        out.push(FileImports {
            file: file.clone(),
            records: parse_imports(&source),
        });
    }
    Ok(out)
}

/// Builds the aggregator: for each selected file's import records, resolve
/// the specifier and fold the record's shape into that target's `UsageEntry`.
/// A target appears only if at least one record referenced it. Non-code
/// resolve targets (e.g. `./config.json`, which `resolve()` happily probes)
/// are excluded here — the CodeFile invariant says non-code files never
/// appear as aggregator/bundler/dependency-graph entries, only as copied
/// payload assets.
pub fn aggregate(selected_imports: &[FileImports], root_dir: &Path) -> UsageMap {
    let mut map = UsageMap::default();
    for file_imports in selected_imports {
        for record in &file_imports.records {
            let Some(target) = resolve(&file_imports.file, &record.specifier, root_dir) else {
                continue;
            };
            if !path_utils::is_code_file(&target) {
                continue;
            }
            let entry = map.entry_mut(target);
            if record.default_import.is_some() {
                entry.needs_default = true;
            }
            if record.namespace_import.is_some() {
                entry.needs_namespace = true;
            }
            for named in &record.named_imports {
                entry.named.insert(named.imported.clone());
            }
            let is_bare = record.default_import.is_none()
                && record.namespace_import.is_none()
                && record.named_imports.is_empty();
            if is_bare {
                entry.side_effect_only = true;
            }
        }
    }
    map
}
