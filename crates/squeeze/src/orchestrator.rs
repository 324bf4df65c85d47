//! Extraction orchestrator. Composes the core passes, stages a payload
//! tree, hashes sources, and packages the result.

use crate::config::ExtractOptions;
use crate::git;
use anyhow::{Context, Result};
use chrono::Utc;
use logger::Logger;
use rayon::prelude::*;
use squeeze_core::bundler::{BundleRequest, BundlerAdapter, CommandBundler};
use squeeze_core::dep_bundle;
use squeeze_core::graph::transitive_closure;
use squeeze_core::manifest::{
    build_bundled_dependencies, BundledDependencies, Manifest, ManifestEntry, OutputFile,
};
use squeeze_core::parse::parse_imports;
use squeeze_core::planner::{self, PlannedUsageMap};
use squeeze_core::resolve::resolve;
use squeeze_core::rewrite::rewrite_file;
use squeeze_core::usage::{self, FileImports};
use squeeze_err::SqueezeError;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

const JUICED_FILE_NAME: &str = "juiced.mjs";

/// Runs the extraction pipeline and returns the path of the ZIP it wrote.
pub fn extract(opts: &ExtractOptions, logger: impl Logger) -> Result<PathBuf> {
    for selected in &opts.selected {
        if !selected.is_file() || !abspath::is_descendant(&opts.root_dir, selected) {
            return Err(SqueezeError::SelectionMissing(selected.clone()).into());
        }
    }
    logger.log(format!("validated {} selected file(s)", opts.selected.len()));

    let closure = transitive_closure(&opts.selected, &opts.root_dir)?;
    logger.log(format!("transitive closure: {} file(s)", closure.len()));

    let staging = tempfile::tempdir().context("creating staging root")?;
    let payload_dir = staging.path().join("payload");
    fs::create_dir_all(&payload_dir).context("creating payload/ subtree")?;
    let rewrite_root = staging.path().join("rewritten");
    fs::create_dir_all(&rewrite_root).context("creating rewrite workspace")?;

    let bundler = CommandBundler::new(opts.bundler_program.clone());

    let selected_set: BTreeSet<PathBuf> = opts.selected.iter().cloned().collect();

    let (planned, bundled_deps_manifest, pulp_output): (
        Option<PlannedUsageMap>,
        Vec<BundledDependencies>,
        Option<PathBuf>,
    ) = if opts.bundle_dependencies {
        let per_file: Vec<FileImports> = usage::parse_selected_files(&opts.selected)?;
        let usage_map = usage::aggregate(&per_file, &opts.root_dir);
        let planned = planner::plan(&usage_map);
        logger.log(format!(
            "dependency plan: {} target(s), {} skipped symbol(s)",
            planned.entries.len(),
            planned.skipped.len()
        ));
        let minify_deps = opts.minimize_mode.minifies_dependencies();
        let bundle = dep_bundle::build(&planned, &opts.root_dir, &payload_dir, minify_deps, &bundler)?;
        let manifest_entry =
            build_bundled_dependencies(&planned, &per_file, &opts.root_dir, dep_bundle::PULP_FILE_NAME.to_string());
        (Some(planned), vec![manifest_entry], Some(bundle.output))
    } else {
        (None, vec![], None)
    };

    let mut staged_selected: Vec<PathBuf> = Vec::with_capacity(opts.selected.len());
    let mut external_specifiers: BTreeSet<String> = BTreeSet::new();
    if let Some(pulp) = &pulp_output {
        let pulp_name = pulp
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| dep_bundle::PULP_FILE_NAME.to_string());
        // rewrite.rs always emits "./<name>" regardless of the selected
        // file's nesting, but stages selected files at their original
        // relative paths, so the bare name never actually matches; both
        // forms are marked external so esbuild doesn't try to resolve
        // either one from the (pulp.mjs-less) rewrite staging tree.
        external_specifiers.insert(format!("./{pulp_name}"));
        external_specifiers.insert(pulp_name);
    }

    for selected in &opts.selected {
        let rel = selected
            .strip_prefix(&opts.root_dir)
            .unwrap_or(selected)
            .to_path_buf();
        let staged_path = rewrite_root.join(&rel);
        if let Some(parent) = staged_path.parent() {
            fs::create_dir_all(parent).context("creating staged directory")?;
        }

        let text = if let (Some(planned), Some(pulp_output)) = (&planned, &pulp_output) {
            rewrite_file(selected, &opts.root_dir, planned, pulp_output)?
        } else {
            let source = fs::read_to_string(selected)
                .with_context(|| format!("reading selected file {selected:?}"))?;
            if !opts.include_dependencies {
                source
            } else {
                // Dependencies are copied separately (juice/); any specifier
                // resolving outside the selected set must stay external so
                // the bundler doesn't try to inline it from the staged tree.
                for record in parse_imports(&source) {
                    if let Some(target) = resolve(selected, &record.specifier, &opts.root_dir) {
                        if !selected_set.contains(&target) {
                            external_specifiers.insert(record.specifier.clone());
                        }
                    }
                }
                source
            }
        };
        fs::write(&staged_path, text).with_context(|| format!("staging rewritten copy of {selected:?}"))?;
        staged_selected.push(staged_path);
    }

    let juiced_output = payload_dir.join(JUICED_FILE_NAME);
    let externals: Vec<String> = external_specifiers.into_iter().collect();
    let minify_selected = opts.minimize_mode.minifies_selected();

    if staged_selected.len() == 1 {
        let request = BundleRequest {
            entry: &staged_selected[0],
            output: &juiced_output,
            cwd: &opts.root_dir,
            externals: &externals,
            minify: minify_selected,
        };
        bundler.bundle(&request)?;
    } else {
        let aggregator_entry = rewrite_root.join("__juiced-entry__.mjs");
        let mut body = String::new();
        for (i, staged) in staged_selected.iter().enumerate() {
            let index = i + 1;
            let rel = pathdiff::diff_paths(staged, rewrite_root.as_path())
                .unwrap_or_else(|| staged.clone());
            let spec = format!("./{}", path_slash::PathExt::to_slash_lossy(rel.as_path()));
            body.push_str(&format!("import * as sel_{index} from \"{spec}\";\n"));
            body.push_str(&format!("export {{ sel_{index} }};\n"));
        }
        fs::write(&aggregator_entry, body).context("writing juiced aggregator entry")?;
        let request = BundleRequest {
            entry: &aggregator_entry,
            output: &juiced_output,
            cwd: &opts.root_dir,
            externals: &externals,
            minify: minify_selected,
        };
        bundler.bundle(&request)?;
    }
    logger.log("juiced.mjs bundled".to_string());

    let mut manifest_entries = vec![ManifestEntry::Bundle {
        output: JUICED_FILE_NAME.to_string(),
        sources: opts
            .selected
            .iter()
            .map(|p| relative_string(p, &opts.root_dir))
            .collect(),
    }];

    if opts.include_dependencies && !opts.bundle_dependencies {
        for file in &closure {
            if selected_set.contains(file) {
                continue;
            }
            let rel = relative_string(file, &opts.root_dir);
            let dest = payload_dir.join("juice").join(&rel);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).context("creating juice/ destination directory")?;
            }
            if opts.minimize_mode.minifies_dependencies() && path_utils::is_code_file(file) {
                let request = BundleRequest {
                    entry: file,
                    output: &dest,
                    cwd: &opts.root_dir,
                    externals: &[],
                    minify: true,
                };
                bundler.bundle(&request)?;
            } else {
                fs::copy(file, &dest).with_context(|| format!("copying dependency {file:?}"))?;
            }
            manifest_entries.push(ManifestEntry::Dependency {
                source: rel.clone(),
                output: format!("juice/{rel}"),
            });
        }
    }

    // Hashing is pure I/O plus SHA-256 per file with no cross-file dependency,
    // so the closure is fanned out across rayon's global pool; order doesn't
    // matter since the results land in a BTreeMap.
    let hashed: Vec<(String, String)> = closure
        .par_iter()
        .map(|file| -> Result<(String, String)> {
            let rel = relative_string(file, &opts.root_dir);
            let digest = path_utils::hash_file(file).with_context(|| format!("hashing {file:?}"))?;
            Ok((rel, digest))
        })
        .collect::<Result<Vec<_>>>()?;
    let source_hashes: BTreeMap<String, String> = hashed.into_iter().collect();
    logger.log(format!("hashed {} source file(s)", source_hashes.len()));

    let mut output_files: Vec<OutputFile> = Vec::new();
    for file in path_utils::walk(&payload_dir)? {
        let rel = relative_string(&file, &payload_dir);
        let bytes = fs::metadata(&file)
            .with_context(|| format!("statting output file {file:?}"))?
            .len();
        output_files.push(OutputFile { path: rel, bytes });
    }
    output_files.sort_by(|a, b| a.path.cmp(&b.path));
    let expected_export_bytes = output_files.iter().map(|f| f.bytes).sum();

    let manifest = Manifest {
        created_at: Utc::now().to_rfc3339(),
        root_dir: opts.root_dir.to_string_lossy().to_string(),
        git: git::read_snapshot(&opts.root_dir),
        selected_files: vec![JUICED_FILE_NAME.to_string()],
        include_dependencies: opts.include_dependencies,
        bundle_dependencies: opts.bundle_dependencies,
        file_count: closure.len(),
        source_hashes,
        entries: manifest_entries,
        bundled_dependencies: bundled_deps_manifest,
        output_files,
        expected_export_bytes,
        output_zip_bytes: None,
    };

    let manifest_path = payload_dir.join("extract-manifest.json");
    let manifest_json = serde_json::to_string_pretty(&manifest).context("serializing manifest")?;
    fs::write(&manifest_path, &manifest_json).context("writing extract-manifest.json")?;

    let output_zip_bytes = write_zip(&payload_dir, &opts.output_zip_path)?;
    logger.log(format!(
        "wrote {} ({} bytes)",
        opts.output_zip_path.display(),
        output_zip_bytes
    ));

    Ok(opts.output_zip_path.clone())
}

fn relative_string(path: &Path, root: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    path_utils::to_relative(rel)
        .map(|r| r.into_string())
        .unwrap_or_else(|_| rel.to_string_lossy().to_string())
}

fn write_zip(payload_dir: &Path, output_zip_path: &Path) -> Result<u64> {
    if let Some(parent) = output_zip_path.parent() {
        fs::create_dir_all(parent).context("creating output zip's parent directory")?;
    }
    let file = fs::File::create(output_zip_path).context("creating output zip file")?;
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for entry in path_utils::walk(payload_dir)? {
        let rel = relative_string(&entry, payload_dir);
        zip.start_file(&rel, options).context("starting zip entry")?;
        let bytes = fs::read(&entry).with_context(|| format!("reading {entry:?} into zip"))?;
        std::io::Write::write_all(&mut zip, &bytes).context("writing zip entry body")?;
    }
    zip.finish().context("finalizing zip")?;

    Ok(fs::metadata(output_zip_path)?.len())
}

#[cfg(test)]
mod test {
    use super::*;
    use logger::VecLogger;
    use squeeze_core::manifest::MinimizeMode;
    use test_tmpdir::TmpDir;

    fn fake_bundler_script(tmp: &TmpDir) -> String {
        // A bundler-shaped program is not available in this test environment;
        // orchestrator tests instead exercise the no-dependency-bundle path
        // with a single selected file using the CommandBundler against a
        // shell-based stand-in, matching how the rest of this crate's tests
        // avoid depending on a real ES-module bundler on PATH.
        let _ = tmp;
        "true".to_string()
    }

    #[test]
    fn rejects_selection_outside_root() {
        let tmp = TmpDir::new_with_content(&test_tmpdir::map! { "a.mjs" => "" });
        let outside = TmpDir::new_with_content(&test_tmpdir::map! { "b.mjs" => "" });
        let opts = ExtractOptions {
            root_dir: tmp.root().to_path_buf(),
            selected: vec![outside.root_join("b.mjs")],
            include_dependencies: true,
            bundle_dependencies: false,
            minimize_mode: MinimizeMode::None,
            output_zip_path: tmp.root_join("out.zip"),
            bundler_program: fake_bundler_script(&tmp),
        };
        let err = extract(&opts, &VecLogger::new()).unwrap_err();
        assert!(err.downcast_ref::<SqueezeError>().is_some());
    }
}
