//! Extraction configuration: a JSON wire struct validated into an in-memory
//! `ExtractOptions`, mirroring the unused-finder config crate's
//! `*JSONConfig` → `TryFrom` → validated-config shape.

use serde::Deserialize;
use squeeze_core::manifest::MinimizeMode;
use std::path::PathBuf;

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractJSONConfig {
    pub root_dir: String,
    pub selected_relative_paths: Vec<String>,
    #[serde(default = "default_true")]
    pub include_dependencies: bool,
    #[serde(default)]
    pub bundle_dependencies: bool,
    #[serde(default)]
    pub minimize_mode: Option<String>,
    pub output_zip_path: String,
    #[serde(default = "default_bundler_program")]
    pub bundler_program: String,
}

fn default_true() -> bool {
    true
}

fn default_bundler_program() -> String {
    "esbuild".to_string()
}

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub root_dir: PathBuf,
    pub selected: Vec<PathBuf>,
    pub include_dependencies: bool,
    pub bundle_dependencies: bool,
    pub minimize_mode: MinimizeMode,
    pub output_zip_path: PathBuf,
    pub bundler_program: String,
}

impl TryFrom<ExtractJSONConfig> for ExtractOptions {
    type Error = anyhow::Error;

    fn try_from(value: ExtractJSONConfig) -> Result<Self, Self::Error> {
        let root_dir = std::fs::canonicalize(&value.root_dir)
            .map_err(|err| anyhow::anyhow!("rootDir {:?} is not a directory: {err}", value.root_dir))?;
        let selected = value
            .selected_relative_paths
            .iter()
            .map(|rel| root_dir.join(rel))
            .collect();

        Ok(ExtractOptions {
            root_dir,
            selected,
            include_dependencies: value.include_dependencies,
            bundle_dependencies: value.bundle_dependencies,
            minimize_mode: MinimizeMode::from_str_or_default(value.minimize_mode.as_deref()),
            output_zip_path: PathBuf::from(value.output_zip_path),
            bundler_program: value.bundler_program,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use test_tmpdir::TmpDir;

    #[test]
    fn defaults_include_dependencies_true_and_bundle_dependencies_false() {
        let tmp = TmpDir::new();
        let json = ExtractJSONConfig {
            root_dir: tmp.root().to_string_lossy().to_string(),
            selected_relative_paths: vec!["a.mjs".to_string()],
            output_zip_path: "out.zip".to_string(),
            ..Default::default()
        };
        let opts = ExtractOptions::try_from(json).unwrap();
        assert!(opts.include_dependencies);
        assert!(!opts.bundle_dependencies);
        assert_eq!(opts.minimize_mode, MinimizeMode::None);
    }

    #[test]
    fn rejects_nonexistent_root_dir() {
        let json = ExtractJSONConfig {
            root_dir: "/definitely/does/not/exist/squeeze".to_string(),
            selected_relative_paths: vec![],
            output_zip_path: "out.zip".to_string(),
            ..Default::default()
        };
        assert!(ExtractOptions::try_from(json).is_err());
    }
}
