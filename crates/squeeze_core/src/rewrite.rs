//! Selected-file rewriter. Redirects a selected source's imports that
//! resolve into the planned dependency set at the bundle, leaving every
//! other statement untouched.
//!
//! Aliases on named imports are preserved in the rewritten statement
//! (`import { a as c }` stays `import { a as c }`) rather than collapsing to
//! the bare imported name, because dropping them silently breaks call-site
//! references to the alias.

use crate::parse::{parse_imports, strip_comments};
use crate::planner::PlannedUsageMap;
use crate::resolve::resolve;
use regex::Regex;
use squeeze_err::{IoContext, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

/// Every rewritten import lands at the payload root alongside `bundle_output`
/// regardless of where the selected file sits in the original tree — the
/// staged source is only ever consumed by the bundler for its *content*, its
/// position in the rewrite workspace has no bearing on where the bundled
/// output or the dependency bundle end up. So the specifier is always the
/// bundle's bare file name relative to that shared root, never a path
/// computed against the selected file's own directory.
fn bundle_relative_specifier(bundle_output: &Path) -> String {
    let name = bundle_output
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| bundle_output.to_string_lossy().to_string());
    format!("./{name}")
}

/// Rewrites one import occurrence against its planned target. Returns `None`
/// when the statement should be left exactly as written (unresolved,
/// external, or not in the planned set).
fn rewrite_statement(
    specifier: &str,
    record: &crate::parse::ImportRecord,
    base_file: &Path,
    root_dir: &Path,
    planned: &PlannedUsageMap,
    bundle_rel: &str,
) -> Option<String> {
    let target = resolve(base_file, specifier, root_dir)?;
    let index = planned.entries.iter().position(|e| e.target == target)? + 1;

    if record.side_effect_only {
        return Some(format!("import \"{bundle_rel}\";"));
    }

    let mut named_parts = Vec::new();
    if let Some(default) = &record.default_import {
        named_parts.push(format!("dep_{index}_default_export as {default}"));
    }
    if let Some(namespace) = &record.namespace_import {
        named_parts.push(format!("dep_{index}_namespace as {namespace}"));
    }
    for named in &record.named_imports {
        if named.local == named.imported {
            named_parts.push(named.imported.clone());
        } else {
            named_parts.push(format!("{} as {}", named.imported, named.local));
        }
    }

    Some(format!(
        "import {{ {} }} from \"{bundle_rel}\";",
        named_parts.join(", ")
    ))
}

/// Rewrites the whole source text of `file`, leaving any statement that
/// doesn't resolve into `planned` untouched. Returns the rewritten text.
pub fn rewrite_file(
    file: &Path,
    root_dir: &Path,
    planned: &PlannedUsageMap,
    bundle_output: &Path,
) -> Result<String> {
    let source = std::fs::read_to_string(file).io_context(file.to_path_buf())?;
    let masked = strip_comments(&source);
    let bundle_rel = bundle_relative_specifier(bundle_output);
    let mut rewritten = source.clone();

    // Two import statements can share the same specifier (`import { a }
    // from './lib'; import { b } from './lib';`); this tracks, per
    // specifier, the byte offset past the last occurrence already matched
    // so each record is paired with its own statement instead of every
    // record re-matching the first one.
    let mut next_search_from: HashMap<String, usize> = HashMap::new();

    for record in parse_imports(&source) {
        if let Some(replacement) =
            rewrite_statement(&record.specifier, &record, file, root_dir, planned, &bundle_rel)
        {
            let search_from = *next_search_from.get(&record.specifier).unwrap_or(&0);
            if let Some((original, end)) =
                find_original_statement(&source, &masked, &record.specifier, search_from)
            {
                rewritten = rewritten.replacen(&original, &replacement, 1);
                next_search_from.insert(record.specifier.clone(), end);
            }
        }
    }

    Ok(rewritten)
}

fn statement_keyword_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(?:import|export|require)\b").expect("static regex is valid"))
}

/// Re-locates the literal substring of the original statement carrying
/// `specifier`, anchored on the quoted specifier itself, starting the search
/// no earlier than `search_from` so a specifier repeated across several
/// statements is matched one occurrence at a time instead of always
/// re-finding the first. Returns the statement text (sliced from the
/// unmasked `source`, so any real comments inside it are preserved) plus the
/// byte offset just past it, for the caller to advance its search cursor.
///
/// Matching itself runs against `masked` (comments blanked out, string and
/// template literals untouched) rather than `source`, so neither the quoted
/// specifier nor the anchoring keyword can be found inside a comment —
/// `// import order note` ahead of a real multi-line import no longer fools
/// the anchor into starting mid-comment.
///
/// The statement start is the closest preceding `import`/`export`/`require`
/// keyword, not the closest newline or semicolon — a multi-line clause like
/// `import {\n  a,\n  b\n} from "./lib";` has no newline or `;` anywhere
/// between its keyword and its `from` clause, so anchoring on those would
/// truncate the match to a fragment of the real statement.
fn find_original_statement(
    source: &str,
    masked: &str,
    specifier: &str,
    search_from: usize,
) -> Option<(String, usize)> {
    for quote in ['"', '\''] {
        let needle = format!("{quote}{specifier}{quote}");
        if let Some(rel_pos) = masked.get(search_from..).and_then(|tail| tail.find(&needle)) {
            let pos = search_from + rel_pos;
            let stmt_start = statement_keyword_regex()
                .find_iter(&masked[..pos])
                .last()
                .map(|m| m.start())
                .unwrap_or(0);
            let after = pos + needle.len();
            let stmt_end = masked[after..]
                .find(';')
                .map(|i| after + i + 1)
                .unwrap_or(source.len());
            return Some((source[stmt_start..stmt_end].trim().to_string(), stmt_end));
        }
    }
    None
}
