//! Manifest data model. `Manifest` serializes to the bit-exact
//! `extract-manifest.json` shape; every nested struct mirrors one JSON
//! object in that wire format.

use crate::planner::PlannedUsageMap;
use crate::usage::FileImports;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitSnapshot {
    pub head: Option<String>,
    #[serde(rename = "headShort")]
    pub head_short: Option<String>,
    pub branch: Option<String>,
    #[serde(rename = "remoteUrl")]
    pub remote_url: Option<String>,
    pub dirty: bool,
}

impl Default for GitSnapshot {
    fn default() -> Self {
        Self {
            head: None,
            head_short: None,
            branch: None,
            remote_url: None,
            dirty: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MinimizeMode {
    None,
    Dependencies,
    Everything,
}

impl Default for MinimizeMode {
    fn default() -> Self {
        MinimizeMode::None
    }
}

impl MinimizeMode {
    pub fn from_str_or_default(value: Option<&str>) -> MinimizeMode {
        match value {
            Some("dependencies") => MinimizeMode::Dependencies,
            Some("everything") => MinimizeMode::Everything,
            _ => MinimizeMode::None,
        }
    }

    pub fn minifies_dependencies(&self) -> bool {
        matches!(self, MinimizeMode::Dependencies | MinimizeMode::Everything)
    }

    pub fn minifies_selected(&self) -> bool {
        matches!(self, MinimizeMode::Everything)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind")]
pub enum ManifestEntry {
    #[serde(rename = "bundle")]
    Bundle { output: String, sources: Vec<String> },
    #[serde(rename = "dependency")]
    Dependency { source: String, output: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportFlags {
    pub default: bool,
    pub namespace: bool,
    #[serde(rename = "sideEffectOnly")]
    pub side_effect_only: bool,
    pub named: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceImports {
    pub source: String,
    pub imports: ImportFlags,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportRegistryEntry {
    pub source: String,
    pub default: bool,
    pub namespace: bool,
    #[serde(rename = "sideEffectOnly")]
    pub side_effect_only: bool,
    pub named: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileImportRegistry {
    pub file: String,
    pub imports: Vec<ImportRegistryEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MethodOwner {
    pub symbol: String,
    pub source: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportRegistry {
    pub files: Vec<FileImportRegistry>,
    #[serde(rename = "methodOwners")]
    pub method_owners: Vec<MethodOwner>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedDuplicateNamedImport {
    pub symbol: String,
    #[serde(rename = "skippedSource")]
    pub skipped_source: String,
    #[serde(rename = "keptSource")]
    pub kept_source: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BundledDependencies {
    pub kind: &'static str,
    pub output: String,
    pub sources: Vec<String>,
    pub imports: Vec<SourceImports>,
    #[serde(rename = "importRegistry")]
    pub import_registry: ImportRegistry,
    #[serde(rename = "skippedDuplicateNamedImports")]
    pub skipped_duplicate_named_imports: Vec<SkippedDuplicateNamedImport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutputFile {
    pub path: String,
    pub bytes: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "rootDir")]
    pub root_dir: String,
    pub git: GitSnapshot,
    #[serde(rename = "selectedFiles")]
    pub selected_files: Vec<String>,
    #[serde(rename = "includeDependencies")]
    pub include_dependencies: bool,
    #[serde(rename = "bundleDependencies")]
    pub bundle_dependencies: bool,
    #[serde(rename = "fileCount")]
    pub file_count: usize,
    #[serde(rename = "sourceHashes")]
    pub source_hashes: BTreeMap<String, String>,
    pub entries: Vec<ManifestEntry>,
    #[serde(rename = "bundledDependencies")]
    pub bundled_dependencies: Vec<BundledDependencies>,
    #[serde(rename = "outputFiles")]
    pub output_files: Vec<OutputFile>,
    #[serde(rename = "expectedExportBytes")]
    pub expected_export_bytes: u64,
    #[serde(rename = "outputZipBytes")]
    pub output_zip_bytes: Option<u64>,
}

/// Builds the `bundledDependencies[0].imports` / `importRegistry` slices out
/// of the planner and aggregator outputs, resolving every absolute path to a
/// root-relative, forward-slash string for the wire format.
pub fn build_bundled_dependencies(
    planned: &PlannedUsageMap,
    per_file: &[FileImports],
    root_dir: &std::path::Path,
    bundle_output_rel: String,
) -> BundledDependencies {
    use path_utils::to_relative;

    let target_rel = |target: &std::path::Path| {
        to_relative(target.strip_prefix(root_dir).unwrap_or(target))
            .map(|r| r.into_string())
            .unwrap_or_else(|_| target.display().to_string())
    };

    // `sources[i]` must line up with the dep_<i+1> identifiers dep_bundle.rs
    // assigned from this same insertion order, so it is captured before the
    // `imports` list below gets sorted by source for display purposes.
    let sources: Vec<String> = planned.entries.iter().map(|e| target_rel(&e.target)).collect();

    let mut imports: Vec<SourceImports> = planned
        .entries
        .iter()
        .map(|e| SourceImports {
            source: target_rel(&e.target),
            imports: ImportFlags {
                default: e.needs_default,
                namespace: e.needs_namespace,
                side_effect_only: e.side_effect_only,
                named: e.named.iter().cloned().collect(),
            },
        })
        .collect();
    imports.sort_by(|a, b| a.source.cmp(&b.source));

    let mut files: Vec<FileImportRegistry> = per_file
        .iter()
        .map(|fi| {
            let mut entries: Vec<ImportRegistryEntry> = fi
                .records
                .iter()
                .filter_map(|r| {
                    let target = crate::resolve::resolve(&fi.file, &r.specifier, root_dir)?;
                    let rel = to_relative(target.strip_prefix(root_dir).unwrap_or(&target))
                        .map(|p| p.into_string())
                        .unwrap_or_else(|_| target.display().to_string());
                    Some(ImportRegistryEntry {
                        source: rel,
                        default: r.default_import.is_some(),
                        namespace: r.namespace_import.is_some(),
                        side_effect_only: r.side_effect_only,
                        named: r.named_imports.iter().map(|n| n.imported.clone()).collect(),
                    })
                })
                .collect();
            entries.sort_by(|a, b| a.source.cmp(&b.source));
            FileImportRegistry {
                file: to_relative(fi.file.strip_prefix(root_dir).unwrap_or(&fi.file))
                    .map(|p| p.into_string())
                    .unwrap_or_else(|_| fi.file.display().to_string()),
                imports: entries,
            }
        })
        .collect();
    files.sort_by(|a, b| a.file.cmp(&b.file));

    let mut method_owners: Vec<MethodOwner> = planned
        .entries
        .iter()
        .flat_map(|e| {
            let source = to_relative(e.target.strip_prefix(root_dir).unwrap_or(&e.target))
                .map(|p| p.into_string())
                .unwrap_or_else(|_| e.target.display().to_string());
            e.named
                .iter()
                .map(move |symbol| MethodOwner {
                    symbol: symbol.clone(),
                    source: source.clone(),
                })
                .collect::<Vec<_>>()
        })
        .collect();
    method_owners.sort_by(|a, b| (a.symbol.clone(), a.source.clone()).cmp(&(b.symbol.clone(), b.source.clone())));

    let skipped = planned
        .skipped
        .iter()
        .map(|s| SkippedDuplicateNamedImport {
            symbol: s.symbol.clone(),
            skipped_source: to_relative(s.skipped_source.strip_prefix(root_dir).unwrap_or(&s.skipped_source))
                .map(|p| p.into_string())
                .unwrap_or_else(|_| s.skipped_source.display().to_string()),
            kept_source: to_relative(s.kept_source.strip_prefix(root_dir).unwrap_or(&s.kept_source))
                .map(|p| p.into_string())
                .unwrap_or_else(|_| s.kept_source.display().to_string()),
        })
        .collect();

    BundledDependencies {
        kind: "dependency-bundle",
        output: bundle_output_rel,
        sources,
        imports,
        import_registry: ImportRegistry { files, method_owners },
        skipped_duplicate_named_imports: skipped,
    }
}
