use anyhow::{Context, Result};
use jwalk::WalkDirGeneric;
use path_slash::PathExt;
use relative_path::RelativePathBuf;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Extensions that make a file eligible as a module graph node. Anything else
/// is payload-only: it can be copied into a dependency bundle but never parsed,
/// resolved, or rewritten.
pub const CODE_EXTENSIONS: &[&str] = &["js", "mjs", "cjs", "ts", "mts", "cts"];

pub fn is_code_file<P: AsRef<Path>>(path: P) -> bool {
    match path.as_ref().extension().and_then(|e| e.to_str()) {
        Some(ext) => CODE_EXTENSIONS.iter().any(|c| c.eq_ignore_ascii_case(ext)),
        None => false,
    }
}

pub fn to_relative<P: AsRef<Path>>(p: P) -> Result<RelativePathBuf> {
    let pref = p.as_ref();
    let relative_path: RelativePathBuf = RelativePathBuf::from_path(pref).with_context(|| {
        let pref_str = pref.to_string_lossy();
        format!("failed to convert path to relative-path: \"{pref_str}\"")
    })?;
    let slashed_pbuf = PathBuf::from(relative_path.as_str())
        .to_slash()
        .map(|s| s.to_string())
        .with_context(|| {
            let rel_str = relative_path.as_str();
            format!("failed to convert relative-path to a slashed path: \"{rel_str}\"")
        })?;
    Ok(RelativePathBuf::from(slashed_pbuf))
}

fn is_pruned_dir(name: &str) -> bool {
    name == ".git" || name == "node_modules"
}

/// Depth-first walk of `root`, descending into directories sorted ascending by
/// filename and skipping `.git`/`node_modules` at any depth. The sort happens at
/// every level so the returned sequence is reproducible across platforms.
pub fn walk<P: AsRef<Path>>(root: P) -> Result<Vec<PathBuf>> {
    let root = root.as_ref();
    let walker = WalkDirGeneric::<((), ())>::new(root)
        .sort(true)
        .process_read_dir(|_depth, _parent, _state, children| {
            children.retain(|entry| match entry {
                Ok(entry) => !(entry.file_type.is_dir()
                    && is_pruned_dir(&entry.file_name.to_string_lossy())),
                Err(_) => true,
            });
        });

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.with_context(|| format!("walking directory tree under {root:?}"))?;
        if entry.file_type.is_file() {
            files.push(entry.path());
        }
    }
    Ok(files)
}

/// SHA-256 over the raw bytes of `path`, rendered lowercase hex.
pub fn hash_file<P: AsRef<Path>>(path: P) -> io::Result<String> {
    let mut file = File::open(&path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod test {
    use super::*;
    use test_tmpdir::TmpDir;

    #[test]
    fn code_file_classification() {
        assert!(is_code_file("foo.js"));
        assert!(is_code_file("foo.MJS"));
        assert!(is_code_file("foo/bar.ts"));
        assert!(!is_code_file("foo.json"));
        assert!(!is_code_file("foo.css"));
        assert!(!is_code_file("foo"));
    }

    #[test]
    fn walk_sorts_and_prunes() {
        let tmp = test_tmpdir::map! {
            "b.js" => "",
            "a.js" => "",
            "node_modules/dep/index.js" => "",
            ".git/HEAD" => "",
            "lib/c.js" => ""
        };
        let dir = TmpDir::new_with_content(&tmp);
        let found = walk(dir.root()).unwrap();
        let relative: Vec<String> = found
            .iter()
            .map(|p| to_relative(p).unwrap().into_string())
            .collect();
        assert_eq!(relative, vec!["a.js", "b.js", "lib/c.js"]);
    }

    #[test]
    fn hash_file_is_stable_sha256() {
        let tmp = test_tmpdir::map! {
            "x.js" => "hello"
        };
        let dir = TmpDir::new_with_content(&tmp);
        let digest = hash_file(dir.root_join("x.js")).unwrap();
        assert_eq!(
            digest,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }
}
