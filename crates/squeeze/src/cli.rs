use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "squeeze", about = "Extracts a subset of a JS checkout into a self-contained bundle")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract a fresh set of selected files from a checkout.
    Extract {
        /// Root of the git checkout the selected files live under.
        #[arg(long)]
        root_dir: PathBuf,

        /// Relative paths (from --root-dir) of the files to extract.
        #[arg(long = "select", required = true)]
        selected_relative_paths: Vec<String>,

        /// When false, transitive dependencies are ignored entirely.
        /// Takes an explicit true/false (a `default_value_t` on a bool field
        /// opts it out of clap's no-value SetTrue toggle inference).
        #[arg(long, default_value_t = true)]
        include_dependencies: bool,

        /// Emit pulp.mjs and rewrite imports against it instead of copying deps raw.
        #[arg(long, default_value_t = false)]
        bundle_dependencies: bool,

        /// none | dependencies | everything
        #[arg(long, default_value = "none")]
        minimize_mode: String,

        /// Path the output ZIP is written to.
        #[arg(long)]
        output: PathBuf,

        /// Bundler executable invoked to produce the output bundle(s).
        #[arg(long, default_value = "esbuild")]
        bundler: String,
    },

    /// Re-run an extraction from a prior manifest against a (possibly updated) checkout.
    Replay {
        /// Path to a previously written extract-manifest.json.
        #[arg(long)]
        manifest: PathBuf,

        /// Checkout to re-extract against.
        #[arg(long)]
        root_dir: PathBuf,

        /// Path the output ZIP is written to.
        #[arg(long)]
        output: PathBuf,

        /// Bundler executable invoked to produce the output bundle(s).
        #[arg(long, default_value = "esbuild")]
        bundler: String,
    },
}
