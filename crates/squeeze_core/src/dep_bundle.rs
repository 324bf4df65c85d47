//! Dependency-bundle builder. Synthesizes an aggregator entry module that
//! re-exports exactly the symbols the selected files need, invokes the
//! bundler adapter on it, and reports the result as a `DependencyBundle`.

use crate::bundler::{BundleRequest, BundlerAdapter};
use crate::planner::PlannedUsageMap;
use path_slash::PathExt;
use squeeze_err::{IoContext, Result};
use std::path::{Path, PathBuf};

pub const PULP_FILE_NAME: &str = "pulp.mjs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyBundle {
    pub output: PathBuf,
    pub sources: Vec<PathBuf>,
}

fn absolute_specifier(path: &Path) -> String {
    path.to_slash_lossy().to_string()
}

fn render_aggregator_entry(planned: &PlannedUsageMap) -> String {
    let mut body = String::new();
    for (i, entry) in planned.entries.iter().enumerate() {
        let index = i + 1;
        let spec = absolute_specifier(&entry.target);

        let is_pure_side_effect =
            entry.side_effect_only && !entry.needs_default && !entry.needs_namespace && entry.named.is_empty();

        if is_pure_side_effect {
            body.push_str(&format!("import \"{spec}\";\n"));
            continue;
        }

        body.push_str(&format!("import * as dep_{index}_ns from \"{spec}\";\n"));
        if entry.needs_namespace {
            body.push_str(&format!(
                "export const dep_{index}_namespace = dep_{index}_ns;\n"
            ));
        }
        if entry.needs_default {
            body.push_str(&format!(
                "export const dep_{index}_default_export = dep_{index}_ns.default;\n"
            ));
        }
        for symbol in &entry.named {
            body.push_str(&format!(
                "export const {symbol} = dep_{index}_ns.{symbol};\n"
            ));
        }
    }
    body
}

/// Builds `payload/pulp.mjs` from `planned`, invoking `bundler` once. The
/// aggregator entry itself lives in a scope-owned temp directory that is
/// removed on every exit path, success or failure.
pub fn build(
    planned: &PlannedUsageMap,
    root_dir: &Path,
    payload_dir: &Path,
    minify: bool,
    bundler: &dyn BundlerAdapter,
) -> Result<DependencyBundle> {
    let staging = tempfile::tempdir().io_context(root_dir.to_path_buf())?;
    let entry_path = staging.path().join("__pulp-entry__.mjs");
    let entry_source = render_aggregator_entry(planned);
    std::fs::write(&entry_path, &entry_source).io_context(entry_path.clone())?;

    let output = payload_dir.join(PULP_FILE_NAME);
    let request = BundleRequest {
        entry: &entry_path,
        output: &output,
        cwd: root_dir,
        externals: &[],
        minify,
    };
    bundler.bundle(&request)?;

    Ok(DependencyBundle {
        output,
        sources: planned.entries.iter().map(|e| e.target.clone()).collect(),
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::bundler::TestConcatBundler;
    use crate::planner::PlannedEntry;
    use crate::usage::{aggregate, parse_selected_files};
    use crate::planner::plan;
    use std::collections::BTreeSet;
    use test_tmpdir::TmpDir;

    #[test]
    fn aggregator_entry_covers_default_namespace_and_named() {
        let content = test_tmpdir::map! {
            "a.mjs" => "import D, * as ns from './lib/u.mjs'; import { x } from './lib/u.mjs';",
            "lib/u.mjs" => ""
        };
        let tmp = TmpDir::new_with_content(&content);
        let imports = parse_selected_files(&[tmp.root_join("a.mjs")]).unwrap();
        let usage = aggregate(&imports, tmp.root());
        let planned = plan(&usage);

        let source = render_aggregator_entry(&planned);
        assert!(source.contains("import * as dep_1_ns from"));
        assert!(source.contains("export const dep_1_namespace = dep_1_ns;"));
        assert!(source.contains("export const dep_1_default_export = dep_1_ns.default;"));
        assert!(source.contains("export const x = dep_1_ns.x;"));
    }

    #[test]
    fn pure_side_effect_entry_emits_bare_import() {
        let planned = PlannedUsageMap {
            entries: vec![PlannedEntry {
                target: PathBuf::from("/root/init.mjs"),
                needs_default: false,
                needs_namespace: false,
                side_effect_only: true,
                named: BTreeSet::new(),
            }],
            skipped: vec![],
        };
        let source = render_aggregator_entry(&planned);
        assert_eq!(source.trim(), "import \"/root/init.mjs\";");
    }

    #[test]
    fn build_writes_pulp_mjs_via_bundler() {
        let content = test_tmpdir::map! {
            "a.mjs" => "import { x } from './lib/u.mjs';",
            "lib/u.mjs" => "export const x = 1;"
        };
        let tmp = TmpDir::new_with_content(&content);
        let imports = parse_selected_files(&[tmp.root_join("a.mjs")]).unwrap();
        let usage = aggregate(&imports, tmp.root());
        let planned = plan(&usage);

        let payload = tmp.root_join("payload");
        std::fs::create_dir_all(&payload).unwrap();
        let bundle = build(&planned, tmp.root(), &payload, false, &TestConcatBundler).unwrap();

        assert_eq!(bundle.output, payload.join(PULP_FILE_NAME));
        assert!(bundle.output.is_file());
        assert_eq!(bundle.sources, vec![tmp.root_join("lib/u.mjs")]);
    }
}
