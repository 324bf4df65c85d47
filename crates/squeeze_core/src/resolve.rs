//! Module resolver. Relative-specifier resolution with extension/index
//! probing. Bare specifiers and anything escaping `root_dir` are rejected by
//! returning `None`; resolution failure is never fatal, just unresolved.

use std::path::{Path, PathBuf};

const PROBE_EXTENSIONS: &[&str] = &["mjs", "js", "cjs", "ts", "mts", "cts", "json"];

fn starts_with_relative_prefix(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../") || specifier.starts_with('/')
}

/// Resolves `specifier` as written in `base_file` against `root_dir`.
///
/// Returns `None` when the specifier isn't relative/rooted, when nothing on
/// disk matches any probe, or when the resolved path would escape `root_dir`.
pub fn resolve(base_file: &Path, specifier: &str, root_dir: &Path) -> Option<PathBuf> {
    if !starts_with_relative_prefix(specifier) {
        return None;
    }

    let base_dir = if specifier.starts_with('/') {
        root_dir
    } else {
        base_file.parent().unwrap_or(root_dir)
    };

    let joined = abspath::join_abspath(base_dir, specifier.trim_start_matches('/')).ok()?;
    let resolved = probe(&joined)?;

    if abspath::is_descendant(root_dir, &resolved) {
        Some(resolved)
    } else {
        None
    }
}

fn probe(joined: &Path) -> Option<PathBuf> {
    // (a) exact path as file
    if joined.is_file() {
        return Some(joined.to_path_buf());
    }

    // (b) base + each extension
    for ext in PROBE_EXTENSIONS {
        let candidate = append_extension(joined, ext);
        if candidate.is_file() {
            return Some(candidate);
        }
    }

    // (c) base + "/index" + each extension
    let index_base = joined.join("index");
    for ext in PROBE_EXTENSIONS {
        let candidate = append_extension(&index_base, ext);
        if candidate.is_file() {
            return Some(candidate);
        }
    }

    None
}

fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut s = path.as_os_str().to_os_string();
    s.push(".");
    s.push(ext);
    PathBuf::from(s)
}

#[cfg(test)]
mod test {
    use super::*;
    use test_tmpdir::TmpDir;

    #[test]
    fn rejects_bare_specifier() {
        let tmp = TmpDir::new();
        let base = tmp.root_join("a.mjs");
        assert_eq!(resolve(&base, "node:fs", tmp.root()), None);
        assert_eq!(resolve(&base, "lodash", tmp.root()), None);
    }

    #[test]
    fn resolves_exact_relative_path() {
        let content = test_tmpdir::map! {
            "a.mjs" => "",
            "lib/u.mjs" => ""
        };
        let tmp = TmpDir::new_with_content(&content);
        let base = tmp.root_join("a.mjs");
        let resolved = resolve(&base, "./lib/u.mjs", tmp.root()).unwrap();
        assert_eq!(resolved, tmp.root_join("lib/u.mjs"));
    }

    #[test]
    fn resolves_with_extension_probing() {
        let content = test_tmpdir::map! {
            "a.mjs" => "",
            "lib/u.mjs" => ""
        };
        let tmp = TmpDir::new_with_content(&content);
        let base = tmp.root_join("a.mjs");
        let resolved = resolve(&base, "./lib/u", tmp.root()).unwrap();
        assert_eq!(resolved, tmp.root_join("lib/u.mjs"));
    }

    #[test]
    fn resolves_directory_index() {
        let content = test_tmpdir::map! {
            "a.mjs" => "",
            "lib/index.ts" => ""
        };
        let tmp = TmpDir::new_with_content(&content);
        let base = tmp.root_join("a.mjs");
        let resolved = resolve(&base, "./lib", tmp.root()).unwrap();
        assert_eq!(resolved, tmp.root_join("lib/index.ts"));
    }

    #[test]
    fn unresolved_relative_specifier_is_none() {
        let content = test_tmpdir::map! { "a.mjs" => "" };
        let tmp = TmpDir::new_with_content(&content);
        let base = tmp.root_join("a.mjs");
        assert_eq!(resolve(&base, "./missing.mjs", tmp.root()), None);
    }

    #[test]
    fn rejects_paths_escaping_root() {
        let content = test_tmpdir::map! {
            "project/a.mjs" => "",
            "outside.mjs" => ""
        };
        let tmp = TmpDir::new_with_content(&content);
        let base = tmp.root_join("project/a.mjs");
        let root = tmp.root_join("project");
        assert_eq!(resolve(&base, "../../outside.mjs", &root), None);
    }

    #[test]
    fn root_rooted_specifier_resolves_against_root_dir() {
        let content = test_tmpdir::map! {
            "nested/a.mjs" => "",
            "lib/u.mjs" => ""
        };
        let tmp = TmpDir::new_with_content(&content);
        let base = tmp.root_join("nested/a.mjs");
        let resolved = resolve(&base, "/lib/u.mjs", tmp.root()).unwrap();
        assert_eq!(resolved, tmp.root_join("lib/u.mjs"));
    }
}
