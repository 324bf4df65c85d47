//! Bundler adapter. The engine never embeds a bundler; it only composes one
//! through this trait. `CommandBundler` shells out to a configured
//! executable; `TestConcatBundler` is an in-process stand-in used by this
//! crate's own tests and by callers exercising downstream stages without a
//! real ES-module bundler on `PATH`.

use squeeze_err::{bounded_preview, SqueezeError};
use std::path::{Path, PathBuf};
use std::process::Command;

/// One bundler invocation's parameters: an entry file, an output path, a
/// working directory, a set of specifiers to leave unresolved, and whether
/// to minify the result.
pub struct BundleRequest<'a> {
    pub entry: &'a Path,
    pub output: &'a Path,
    pub cwd: &'a Path,
    pub externals: &'a [String],
    pub minify: bool,
}

pub trait BundlerAdapter {
    fn bundle(&self, request: &BundleRequest) -> squeeze_err::Result<()>;
}

/// Invokes an external bundler executable as a subprocess. The executable
/// name and the flag vocabulary are configurable so this can target esbuild,
/// rollup, or an in-house wrapper without a recompile.
pub struct CommandBundler {
    pub program: String,
}

impl CommandBundler {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl BundlerAdapter for CommandBundler {
    fn bundle(&self, request: &BundleRequest) -> squeeze_err::Result<()> {
        let mut cmd = Command::new(&self.program);
        cmd.current_dir(request.cwd)
            .arg(request.entry)
            .arg("--bundle")
            .arg("--format=esm")
            .arg("--platform=neutral")
            .arg("--tree-shaking=true")
            .arg(format!("--outfile={}", request.output.display()));

        if request.minify {
            cmd.arg("--minify").arg("--legal-comments=none");
        }
        for external in request.externals {
            cmd.arg(format!("--external:{external}"));
        }

        let output = cmd.output().map_err(|err| SqueezeError::BundlerFailure {
            entry: request.entry.to_path_buf(),
            cwd: request.cwd.to_path_buf(),
            diagnostic: bounded_preview(&err.to_string(), 50),
        })?;

        if output.status.success() {
            Ok(())
        } else {
            let diagnostic = String::from_utf8_lossy(&output.stderr);
            Err(SqueezeError::BundlerFailure {
                entry: request.entry.to_path_buf(),
                cwd: request.cwd.to_path_buf(),
                diagnostic: bounded_preview(&diagnostic, 50),
            })
        }
    }
}

/// Test/offline stand-in: concatenates the entry file's own text into the
/// output path verbatim. It does not resolve the entry's own imports — it
/// exists only to exercise downstream orchestration and file-placement
/// logic without requiring a real bundler binary.
pub struct TestConcatBundler;

impl BundlerAdapter for TestConcatBundler {
    fn bundle(&self, request: &BundleRequest) -> squeeze_err::Result<()> {
        let content = std::fs::read_to_string(request.entry).map_err(|source| SqueezeError::Io {
            path: request.entry.to_path_buf(),
            source,
        })?;
        if let Some(parent) = request.output.parent() {
            std::fs::create_dir_all(parent).map_err(|source| SqueezeError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(request.output, content).map_err(|source| SqueezeError::Io {
            path: request.output.to_path_buf(),
            source,
        })
    }
}

pub fn output_path(payload_dir: &Path, file_name: &str) -> PathBuf {
    payload_dir.join(file_name)
}

#[cfg(test)]
mod test {
    use super::*;
    use test_tmpdir::TmpDir;

    #[test]
    fn test_concat_bundler_copies_entry_content() {
        let content = test_tmpdir::map! { "entry.mjs" => "export const x = 1;" };
        let tmp = TmpDir::new_with_content(&content);
        let entry = tmp.root_join("entry.mjs");
        let output = tmp.root_join("out/bundle.mjs");
        let request = BundleRequest {
            entry: &entry,
            output: &output,
            cwd: tmp.root(),
            externals: &[],
            minify: false,
        };
        TestConcatBundler.bundle(&request).unwrap();
        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            "export const x = 1;"
        );
    }

    #[test]
    fn command_bundler_with_missing_executable_is_bundler_failure() {
        let content = test_tmpdir::map! { "entry.mjs" => "" };
        let tmp = TmpDir::new_with_content(&content);
        let entry = tmp.root_join("entry.mjs");
        let output = tmp.root_join("out.mjs");
        let request = BundleRequest {
            entry: &entry,
            output: &output,
            cwd: tmp.root(),
            externals: &[],
            minify: false,
        };
        let bundler = CommandBundler::new("squeeze-nonexistent-bundler-binary");
        let err = bundler.bundle(&request).unwrap_err();
        assert!(matches!(err, SqueezeError::BundlerFailure { .. }));
    }
}
