use path_clean::PathClean;
use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Base path is not absolute")]
    BasePathNotAbsolute,
}

pub fn join_abspath(base: impl AsRef<Path>, path: impl AsRef<Path>) -> Result<PathBuf, Error> {
    let base = base.as_ref();
    let path = path.as_ref();
    if !base.is_absolute() {
        return Err(Error::BasePathNotAbsolute);
    }

    let absolute_path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path).to_path_buf()
    }
    .clean();

    Ok(absolute_path)
}

/// True iff `candidate` is `root` itself or nested somewhere beneath it, comparing
/// cleaned paths rather than touching the filesystem (the candidate may not exist yet).
pub fn is_descendant(root: impl AsRef<Path>, candidate: impl AsRef<Path>) -> bool {
    let root = root.as_ref().clean();
    let candidate = candidate.as_ref().clean();
    candidate.starts_with(&root)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn join_relative() {
        let joined = join_abspath("/root/project", "src/lib.rs").unwrap();
        assert_eq!(joined, PathBuf::from("/root/project/src/lib.rs"));
    }

    #[test]
    fn join_rejects_relative_base() {
        let err = join_abspath("relative/base", "foo");
        assert!(err.is_err());
    }

    #[test]
    fn join_cleans_dot_dot_segments() {
        let joined = join_abspath("/root/project/src", "../lib/util.rs").unwrap();
        assert_eq!(joined, PathBuf::from("/root/project/lib/util.rs"));
    }

    #[test]
    fn descendant_true_for_nested_path() {
        assert!(is_descendant("/root/project", "/root/project/src/lib.rs"));
    }

    #[test]
    fn descendant_true_for_root_itself() {
        assert!(is_descendant("/root/project", "/root/project"));
    }

    #[test]
    fn descendant_false_when_escaping_root() {
        assert!(!is_descendant("/root/project", "/root/other/lib.rs"));
    }

    #[test]
    fn descendant_false_for_sibling_prefix() {
        // "/root/project-extra" starts with the same bytes as "/root/project" but isn't nested
        assert!(!is_descendant("/root/project", "/root/project-extra/lib.rs"));
    }
}
