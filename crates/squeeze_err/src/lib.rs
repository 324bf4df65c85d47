use std::path::PathBuf;

/// The three fatal error kinds the extraction pipeline can raise.
///
/// An unresolved specifier or an unrecognized import statement is not one of
/// them: both are non-fatal by contract (the specifier is treated as
/// external, the statement yields no record), so they are represented as
/// `Option::None` / omitted records at their call sites rather than as error
/// variants here.
#[derive(thiserror::Error, Debug)]
pub enum SqueezeError {
    #[error("selected path does not exist or is not under the checkout root: {0}")]
    SelectionMissing(PathBuf),

    #[error("bundler failed on entry {entry:?} (cwd {cwd:?}): {diagnostic}")]
    BundlerFailure {
        entry: PathBuf,
        cwd: PathBuf,
        diagnostic: String,
    },

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, SqueezeError>;

/// Caps a bundler's diagnostic text to the first `limit` lines, so a runaway
/// bundler stderr dump can't blow up `BundlerFailure`'s error message.
pub fn bounded_preview(text: &str, limit: usize) -> String {
    let mut out: Vec<&str> = text.lines().take(limit).collect();
    if text.lines().count() > limit {
        out.push("... (truncated)");
    }
    out.join("\n")
}

pub trait IoContext<T> {
    fn io_context(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn io_context(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|source| SqueezeError::Io {
            path: path.into(),
            source,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn preview_passes_through_short_text() {
        let text = "line 1\nline 2";
        assert_eq!(bounded_preview(text, 50), text);
    }

    #[test]
    fn preview_truncates_long_text() {
        let text = (0..60)
            .map(|i| format!("line {i}"))
            .collect::<Vec<_>>()
            .join("\n");
        let preview = bounded_preview(&text, 50);
        assert_eq!(preview.lines().count(), 51);
        assert!(preview.ends_with("(truncated)"));
    }

    #[test]
    fn io_context_wraps_error_with_path() {
        let io_err: std::io::Result<()> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "nope"));
        let wrapped = io_err.io_context("/tmp/missing.js");
        match wrapped {
            Err(SqueezeError::Io { path, .. }) => assert_eq!(path, PathBuf::from("/tmp/missing.js")),
            _ => panic!("expected Io error"),
        }
    }
}
