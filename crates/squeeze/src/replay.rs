//! Manifest replayer. Re-runs the extraction pipeline against a (possibly
//! updated) checkout using the inputs recorded in a prior manifest.

use crate::config::ExtractOptions;
use crate::orchestrator::extract;
use anyhow::{Context, Result};
use logger::Logger;
use serde_json::Value;
use squeeze_core::manifest::MinimizeMode;
use std::path::{Path, PathBuf};

/// Extracts `selectedRelativePaths` from a manifest: preferring the
/// `entries[].kind == "bundle"` source list, falling back to a top-level
/// `selectedRelativePaths` array for manifests written by other tooling.
fn selected_relative_paths(manifest: &Value) -> Vec<String> {
    let from_bundle_entry = manifest["entries"]
        .as_array()
        .into_iter()
        .flatten()
        .find(|entry| entry["kind"] == "bundle")
        .and_then(|entry| entry["sources"].as_array())
        .map(|sources| {
            sources
                .iter()
                .filter_map(|s| s.as_str().map(str::to_string))
                .collect::<Vec<_>>()
        });

    from_bundle_entry.unwrap_or_else(|| {
        manifest["selectedRelativePaths"]
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|s| s.as_str().map(str::to_string))
            .collect()
    })
}

/// Reads `manifest_path`, builds `ExtractOptions` against `root_dir` (the
/// checkout to re-extract, which may have drifted since the manifest was
/// written), and re-runs extraction, writing the new ZIP to `output_zip_path`.
pub fn replay(
    manifest_path: &Path,
    root_dir: &Path,
    output_zip_path: PathBuf,
    bundler_program: String,
    logger: impl Logger,
) -> Result<PathBuf> {
    let text = std::fs::read_to_string(manifest_path)
        .with_context(|| format!("reading manifest {manifest_path:?}"))?;
    let manifest: Value = serde_json::from_str(&text)
        .with_context(|| format!("parsing manifest {manifest_path:?} as JSON"))?;

    let selected_relative = selected_relative_paths(&manifest);
    let root_dir = std::fs::canonicalize(root_dir)
        .with_context(|| format!("rootDir {root_dir:?} is not a directory"))?;
    let selected: Vec<PathBuf> = selected_relative.iter().map(|rel| root_dir.join(rel)).collect();

    let include_dependencies = manifest["includeDependencies"].as_bool().unwrap_or(true);
    let bundle_dependencies = manifest["bundleDependencies"].as_bool().unwrap_or(false);
    let minimize_mode = MinimizeMode::from_str_or_default(manifest["minimizeMode"].as_str());

    let opts = ExtractOptions {
        root_dir,
        selected,
        include_dependencies,
        bundle_dependencies,
        minimize_mode,
        output_zip_path,
        bundler_program,
    };

    extract(&opts, logger)
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn prefers_bundle_entry_sources_over_top_level_fallback() {
        let manifest = json!({
            "entries": [
                { "kind": "bundle", "output": "juiced.mjs", "sources": ["a.mjs", "b.mjs"] }
            ],
            "selectedRelativePaths": ["ignored.mjs"]
        });
        assert_eq!(
            selected_relative_paths(&manifest),
            vec!["a.mjs".to_string(), "b.mjs".to_string()]
        );
    }

    #[test]
    fn falls_back_to_top_level_array_when_no_bundle_entry() {
        let manifest = json!({
            "entries": [],
            "selectedRelativePaths": ["a.mjs"]
        });
        assert_eq!(selected_relative_paths(&manifest), vec!["a.mjs".to_string()]);
    }
}
