// src/git.rs

//! Version-control collaborator
//!
//! The fetch protocol never implements a git client; it drives one through
//! the [`Vcs`] primitives, each taking an explicit working directory. No
//! current-directory juggling: recursive submodule fetches run against
//! isolated paths and never see ambient state.
//!
//! [`Git`] is the process-backed implementation. [`GitRemote`] serves the
//! [`RefLister`] seam with `git ls-remote`, preserving listing order.

use crate::error::{Error, Result};
use crate::exec;
use std::fs;
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// One entry of a remote's ref listing, in the order the remote sent it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRef {
    /// Commit hash the ref points at
    pub hash: String,
    /// Fully qualified ref name (e.g. `refs/heads/main`)
    pub name: String,
}

/// Remote ref listing collaborator
pub trait RefLister {
    /// List `(hash, ref)` pairs as the remote returns them, unsorted
    fn list_refs(&self, remote_url: &str) -> Result<Vec<RemoteRef>>;
}

/// One submodule as reported by `submodule status`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmoduleStatus {
    /// Pinned commit hash
    pub commit: String,
    /// Path relative to the containing working tree
    pub path: String,
}

/// One declared submodule from `.gitmodules`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmoduleEntry {
    /// Configuration name (`submodule.<name>.*`)
    pub name: String,
    /// Declared path
    pub path: String,
    /// Declared remote URL, possibly relative to the parent remote
    pub url: String,
}

/// Version-control execution primitives
///
/// Maps 1:1 onto the git commands the protocol needs. Every method takes
/// the working directory explicitly; a non-success exit surfaces as
/// [`Error::ExternalCommandFailed`].
pub trait Vcs {
    fn init(&self, dir: &Path) -> Result<()>;
    fn add_remote(&self, dir: &Path, name: &str, url: &str) -> Result<()>;
    /// Fetch one refspec at the given depth, or everything from the remote
    /// when `refspec` is `None`
    fn fetch(&self, dir: &Path, refspec: Option<&str>, depth: Option<u32>) -> Result<()>;
    /// Create `branch` at `rev` and check it out
    fn checkout(&self, dir: &Path, branch: &str, rev: &str) -> Result<()>;
    /// Resolve `rev` to a full commit hash
    fn rev_parse(&self, dir: &Path, rev: &str) -> Result<String>;
    fn submodule_init(&self, dir: &Path) -> Result<()>;
    fn submodule_status(&self, dir: &Path) -> Result<Vec<SubmoduleStatus>>;
    /// Declared submodules from `.gitmodules`; empty when none are declared
    fn submodule_config(&self, dir: &Path) -> Result<Vec<SubmoduleEntry>>;
    fn remote_branches(&self, dir: &Path) -> Result<Vec<String>>;
    fn delete_remote_branch(&self, dir: &Path, branch: &str) -> Result<()>;
    fn tags_pointing_at(&self, dir: &Path, rev: &str) -> Result<Vec<String>>;
    fn tags_containing(&self, dir: &Path, rev: &str) -> Result<Vec<String>>;
    fn delete_tag(&self, dir: &Path, tag: &str) -> Result<()>;
    /// Full repack, forced single-threaded: multi-threaded pack output is
    /// not bit-reproducible across runs
    fn repack(&self, dir: &Path) -> Result<()>;
    /// Prune all unreferenced objects
    fn gc(&self, dir: &Path) -> Result<()>;
}

/// Process-backed git execution
#[derive(Debug, Clone)]
pub struct Git {
    program: String,
}

impl Git {
    pub fn new() -> Self {
        Self {
            program: "git".to_string(),
        }
    }

    /// Use a specific `git` executable
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, dir: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        // Background gc would race with our own cleanup of the tree.
        cmd.arg("-c").arg("gc.autodetach=false").current_dir(dir);
        cmd
    }

    fn run(&self, dir: &Path, args: &[&str]) -> Result<String> {
        exec::run(self.command(dir).args(args))
    }
}

impl Default for Git {
    fn default() -> Self {
        Self::new()
    }
}

impl Vcs for Git {
    fn init(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        self.run(dir, &["init"])?;
        Ok(())
    }

    fn add_remote(&self, dir: &Path, name: &str, url: &str) -> Result<()> {
        self.run(dir, &["remote", "add", name, url])?;
        Ok(())
    }

    fn fetch(&self, dir: &Path, refspec: Option<&str>, depth: Option<u32>) -> Result<()> {
        let mut cmd = self.command(dir);
        cmd.arg("fetch");
        if let Some(depth) = depth {
            cmd.arg("--depth").arg(depth.to_string());
        }
        cmd.arg("origin");
        if let Some(refspec) = refspec {
            cmd.arg(format!("+{refspec}"));
        }
        exec::run(&mut cmd)?;
        Ok(())
    }

    fn checkout(&self, dir: &Path, branch: &str, rev: &str) -> Result<()> {
        self.run(dir, &["checkout", "-b", branch, rev])?;
        Ok(())
    }

    fn rev_parse(&self, dir: &Path, rev: &str) -> Result<String> {
        let out = self.run(dir, &["rev-parse", rev])?;
        // rev-parse may echo the input spec before the hash; the hash is
        // the last line.
        Ok(out.lines().last().unwrap_or_default().to_string())
    }

    fn submodule_init(&self, dir: &Path) -> Result<()> {
        self.run(dir, &["submodule", "init"])?;
        Ok(())
    }

    fn submodule_status(&self, dir: &Path) -> Result<Vec<SubmoduleStatus>> {
        let out = self.run(dir, &["submodule", "status"])?;
        Ok(parse_submodule_status(&out))
    }

    fn submodule_config(&self, dir: &Path) -> Result<Vec<SubmoduleEntry>> {
        if !dir.join(".gitmodules").exists() {
            return Ok(Vec::new());
        }
        let paths = self.run(
            dir,
            &["config", "-f", ".gitmodules", "--get-regexp", r"submodule\..*\.path"],
        )?;
        let mut entries = Vec::new();
        for line in paths.lines() {
            // Format: "submodule.<name>.path <path>"
            let Some((key, path)) = line.split_once(' ') else {
                continue;
            };
            let Some(name) = key
                .strip_prefix("submodule.")
                .and_then(|k| k.strip_suffix(".path"))
            else {
                continue;
            };
            let url = self.run(
                dir,
                &["config", "-f", ".gitmodules", "--get", &format!("submodule.{name}.url")],
            )?;
            entries.push(SubmoduleEntry {
                name: name.to_string(),
                path: path.to_string(),
                url,
            });
        }
        debug!("Found {} declared submodule(s) in {}", entries.len(), dir.display());
        Ok(entries)
    }

    fn remote_branches(&self, dir: &Path) -> Result<Vec<String>> {
        let out = self.run(dir, &["branch", "-r"])?;
        Ok(out
            .lines()
            .map(str::trim)
            // Skip the symbolic "origin/HEAD -> origin/main" entry.
            .filter(|line| !line.is_empty() && !line.contains("->"))
            .map(str::to_string)
            .collect())
    }

    fn delete_remote_branch(&self, dir: &Path, branch: &str) -> Result<()> {
        self.run(dir, &["branch", "-rD", branch])?;
        Ok(())
    }

    fn tags_pointing_at(&self, dir: &Path, rev: &str) -> Result<Vec<String>> {
        let out = self.run(dir, &["tag", "--points-at", rev])?;
        Ok(out.lines().map(str::to_string).filter(|t| !t.is_empty()).collect())
    }

    fn tags_containing(&self, dir: &Path, rev: &str) -> Result<Vec<String>> {
        let out = self.run(dir, &["tag", "--contains", rev])?;
        Ok(out.lines().map(str::to_string).filter(|t| !t.is_empty()).collect())
    }

    fn delete_tag(&self, dir: &Path, tag: &str) -> Result<()> {
        self.run(dir, &["tag", "-d", tag])?;
        Ok(())
    }

    fn repack(&self, dir: &Path) -> Result<()> {
        self.run(dir, &["config", "pack.threads", "1"])?;
        self.run(dir, &["repack", "-A", "-d", "-f"])?;
        Ok(())
    }

    fn gc(&self, dir: &Path) -> Result<()> {
        self.run(dir, &["gc", "--prune=all"])?;
        Ok(())
    }
}

/// Ref listing via `git ls-remote`
#[derive(Debug, Clone)]
pub struct GitRemote {
    program: String,
}

impl GitRemote {
    pub fn new() -> Self {
        Self {
            program: "git".to_string(),
        }
    }

    /// Use a specific `git` executable
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for GitRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl RefLister for GitRemote {
    fn list_refs(&self, remote_url: &str) -> Result<Vec<RemoteRef>> {
        let out = exec::run(Command::new(&self.program).arg("ls-remote").arg(remote_url))?;
        let refs = parse_ls_remote(&out);
        debug!("Remote {} listed {} ref(s)", remote_url, refs.len());
        Ok(refs)
    }
}

/// Parse `git submodule status` output
///
/// Each line is `"<state-char><hash> <path> (<describe>)"` where the
/// leading character is `-`, `+`, `U` or a space.
fn parse_submodule_status(out: &str) -> Vec<SubmoduleStatus> {
    let mut subs = Vec::new();
    for line in out.lines() {
        let line = line.trim_start_matches(['-', '+', 'U', ' ']);
        let mut fields = line.split_whitespace();
        if let (Some(commit), Some(path)) = (fields.next(), fields.next()) {
            subs.push(SubmoduleStatus {
                commit: commit.to_string(),
                path: path.to_string(),
            });
        }
    }
    subs
}

/// Parse `git ls-remote` output, preserving the remote's line order
fn parse_ls_remote(out: &str) -> Vec<RemoteRef> {
    let mut refs = Vec::new();
    for line in out.lines() {
        if let Some((hash, name)) = line.split_once('\t') {
            refs.push(RemoteRef {
                hash: hash.trim().to_string(),
                name: name.trim().to_string(),
            });
        }
    }
    refs
}
