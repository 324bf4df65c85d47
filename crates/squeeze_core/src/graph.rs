//! Graph walker. Breadth-first transitive closure over resolved relative
//! imports. Bare and out-of-root specifiers are silently ignored;
//! termination is guaranteed by the visited set.

use crate::parse::parse_imports;
use crate::resolve::resolve;
use squeeze_err::{IoContext, Result};
use std::collections::{HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

/// Computes the set of files transitively reachable from `seeds` via
/// resolvable relative imports, including the seeds themselves.
pub fn transitive_closure(seeds: &[PathBuf], root_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut visited: HashSet<PathBuf> = HashSet::new();
    let mut order: Vec<PathBuf> = Vec::new();
    let mut frontier: VecDeque<PathBuf> = VecDeque::new();

    for seed in seeds {
        if visited.insert(seed.clone()) {
            order.push(seed.clone());
            frontier.push_back(seed.clone());
        }
    }

    while let Some(file) = frontier.pop_front() {
        if !path_utils::is_code_file(&file) {
            continue;
        }
        let source = fs::read_to_string(&file).io_context(file.clone())?;
        for record in parse_imports(&source) {
            if let Some(target) = resolve(&file, &record.specifier, root_dir) {
                if visited.insert(target.clone()) {
                    order.push(target.clone());
                    frontier.push_back(target);
                }
            }
        }
    }

    Ok(order)
}
