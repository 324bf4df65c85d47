//! Read-only git snapshot for the manifest's `git` block. Never mutates the
//! checkout — no clone/fetch/pull, those are assumed to run as an external
//! subprocess before extraction.

use squeeze_core::manifest::GitSnapshot;
use std::path::Path;

/// Reads HEAD, the current branch name, the first remote's URL, and the
/// dirty-worktree flag. Returns an all-`None`/`false` snapshot (not an
/// error) when `root_dir` isn't a git repository at all, matching the
/// manifest's `string|null` fields.
pub fn read_snapshot(root_dir: &Path) -> GitSnapshot {
    let repo = match git2::Repository::discover(root_dir) {
        Ok(repo) => repo,
        Err(_) => return GitSnapshot::default(),
    };

    let head = repo.head().ok();
    let head_oid = head.as_ref().and_then(|h| h.target());
    let head_str = head_oid.map(|oid| oid.to_string());
    let head_short = head_oid.map(|oid| oid.to_string()[..7.min(oid.to_string().len())].to_string());
    let branch = head
        .as_ref()
        .and_then(|h| h.shorthand())
        .filter(|name| *name != "HEAD")
        .map(str::to_string);

    let remote_url = repo
        .find_remote("origin")
        .ok()
        .and_then(|remote| remote.url().map(str::to_string));

    let dirty = repo
        .statuses(None)
        .map(|statuses| !statuses.is_empty())
        .unwrap_or(false);

    GitSnapshot {
        head: head_str,
        head_short,
        branch,
        remote_url,
        dirty,
    }
}
