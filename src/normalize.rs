// src/normalize.rs

//! Deterministic normalization of checked-out trees
//!
//! A fresh checkout is full of fetch-history artifacts: reflogs, the
//! index, FETCH_HEAD, remote-tracking branches, hook samples, pack files
//! whose layout depends on thread scheduling. Hashing such a tree would
//! tie the content address to *how* the content was fetched rather than
//! to the content itself.
//!
//! Two modes:
//! - metadata kept: every `.git` directory in the tree (submodules
//!   included) is rewritten into a reproducible form and repacked
//!   single-threaded.
//! - metadata dropped: every `.git` directory is removed outright.
//!
//! Both modes are fixed points: running them twice changes nothing the
//! second time.

use crate::error::Result;
use crate::git::Vcs;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Files under `.git` that carry timestamps or local fetch state
const EPHEMERAL_METADATA: &[&str] = &[
    "logs",
    "hooks",
    "index",
    "FETCH_HEAD",
    "ORIG_HEAD",
    "refs/remotes/origin/HEAD",
    "config",
];

/// Normalize `tree` for content addressing
///
/// With `keep_vcs_metadata` the `.git` directories are sanitized in
/// place; otherwise they are removed entirely.
pub fn normalize_tree<V: Vcs>(vcs: &V, tree: &Path, keep_vcs_metadata: bool) -> Result<()> {
    if keep_vcs_metadata {
        make_deterministic(vcs, tree)
    } else {
        strip_metadata(tree)
    }
}

/// Remove every `.git` entry (directory, or the file form a linked
/// worktree leaves behind) anywhere under `tree`
pub fn strip_metadata(tree: &Path) -> Result<()> {
    for git_dir in find_metadata_dirs(tree)? {
        info!("Removing VCS metadata at {}", git_dir.display());
        if git_dir.is_dir() {
            fs::remove_dir_all(&git_dir)?;
        } else {
            fs::remove_file(&git_dir)?;
        }
    }
    Ok(())
}

/// Rewrite every repository under `tree` into a reproducible form
pub fn make_deterministic<V: Vcs>(vcs: &V, tree: &Path) -> Result<()> {
    for git_dir in find_metadata_dirs(tree)? {
        if !git_dir.is_dir() {
            continue;
        }
        let Some(repo) = git_dir.parent() else {
            continue;
        };
        info!("Normalizing repository at {}", repo.display());
        sanitize_repository(vcs, repo, &git_dir)?;
    }
    Ok(())
}

fn sanitize_repository<V: Vcs>(vcs: &V, repo: &Path, git_dir: &Path) -> Result<()> {
    // Drop timestamp-bearing and fetch-local files first.
    for name in EPHEMERAL_METADATA {
        remove_any(&git_dir.join(name))?;
    }

    // Remote-tracking branches record where the content came from, not
    // what it is.
    for branch in vcs.remote_branches(repo)? {
        debug!("Deleting remote branch {}", branch);
        vcs.delete_remote_branch(repo, &branch)?;
    }

    // Keep at most one tag, and only if it points exactly at the checked
    // out commit. First match in listing order wins, same tie-break as
    // ref resolution.
    let keep = vcs.tags_pointing_at(repo, "HEAD")?.into_iter().next();
    for tag in vcs.tags_containing(repo, "HEAD")? {
        if Some(&tag) != keep.as_ref() {
            debug!("Deleting tag {}", tag);
            vcs.delete_tag(repo, &tag)?;
        }
    }

    // Single-threaded full repack; pack layout from a multi-threaded
    // repack is not bit-reproducible across runs. The local config is
    // needed during the repack and deleted right after.
    vcs.repack(repo)?;
    remove_any(&git_dir.join("config"))?;

    // Prune everything the surviving refs no longer reach.
    vcs.gc(repo)?;
    Ok(())
}

/// Collect every `.git` entry under `tree`, outermost first
///
/// A plain finite walk; collected up front so deletions do not race the
/// traversal.
fn find_metadata_dirs(tree: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    let mut walker = WalkDir::new(tree).sort_by_file_name().into_iter();
    while let Some(entry) = walker.next() {
        let entry = entry.map_err(std::io::Error::from)?;
        if entry.file_name() == ".git" {
            if entry.file_type().is_dir() {
                // Nothing inside .git can be another working tree.
                walker.skip_current_dir();
            }
            dirs.push(entry.into_path());
        }
    }
    Ok(dirs)
}

fn remove_any(path: &Path) -> Result<()> {
    if path.is_dir() {
        fs::remove_dir_all(path)?;
    } else if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}
