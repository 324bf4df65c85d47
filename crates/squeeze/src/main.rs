use clap::Parser;
use logger::StdioLogger;
use squeeze::cli::{Cli, Command};
use squeeze::config::ExtractOptions;
use squeeze::orchestrator::extract;
use squeeze::replay::replay;
use squeeze_core::manifest::MinimizeMode;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let logger = StdioLogger::new();

    let result = match cli.command {
        Command::Extract {
            root_dir,
            selected_relative_paths,
            include_dependencies,
            bundle_dependencies,
            minimize_mode,
            output,
            bundler,
        } => run_extract(
            root_dir,
            selected_relative_paths,
            include_dependencies,
            bundle_dependencies,
            minimize_mode,
            output,
            bundler,
            &logger,
        ),
        Command::Replay {
            manifest,
            root_dir,
            output,
            bundler,
        } => replay(&manifest, &root_dir, output, bundler, &logger),
    };

    match result {
        Ok(path) => {
            (&logger).log(format!("done: {}", path.display()));
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("squeeze: {err:#}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run_extract(
    root_dir: PathBuf,
    selected_relative_paths: Vec<String>,
    include_dependencies: bool,
    bundle_dependencies: bool,
    minimize_mode: String,
    output: PathBuf,
    bundler: String,
    logger: &StdioLogger,
) -> anyhow::Result<PathBuf> {
    let root_dir = std::fs::canonicalize(&root_dir)?;
    let selected = selected_relative_paths
        .iter()
        .map(|rel| root_dir.join(rel))
        .collect();

    let opts = ExtractOptions {
        root_dir,
        selected,
        include_dependencies,
        bundle_dependencies,
        minimize_mode: MinimizeMode::from_str_or_default(Some(&minimize_mode)),
        output_zip_path: output,
        bundler_program: bundler,
    };

    extract(&opts, logger)
}
