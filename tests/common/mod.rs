// tests/common/mod.rs

//! Scripted collaborator fakes for protocol-level tests
//!
//! The fetch protocol is exercised end to end without git, a store daemon
//! or the network: the fakes materialize fixed file trees, serve fixed
//! ref listings, and hash trees with a deterministic (non-cryptographic)
//! digest so identical trees always produce identical addresses.

#![allow(dead_code)]

use quarry::digest::{Digest, HashKind};
use quarry::git::{RefLister, RemoteRef, SubmoduleEntry, SubmoduleStatus, Vcs};
use quarry::{Error, Result};
use quarry::store::{StoreClient, TreeHasher};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One scripted submodule: what `submodule status` reports and what
/// `.gitmodules` declares (or doesn't)
#[derive(Clone)]
pub struct FakeSubmodule {
    pub status: SubmoduleStatus,
    pub declared: Option<SubmoduleEntry>,
}

/// Per-repository ref state consumed by the normalization primitives
#[derive(Default, Clone)]
pub struct RepoState {
    pub remote_branches: Vec<String>,
    pub tags_at_head: Vec<String>,
    pub tags_containing_head: Vec<String>,
}

/// Scripted version-control engine
///
/// `checkout` materializes `files` plus a `.git` skeleton full of the
/// ephemeral metadata normalization must remove. Submodules are reported
/// only for the top-level working tree.
pub struct FakeVcs {
    pub log: RefCell<Vec<String>>,
    pub commit: String,
    pub files: Vec<(String, String)>,
    pub submodules: Vec<FakeSubmodule>,
    pub repos: RefCell<HashMap<PathBuf, RepoState>>,
}

impl FakeVcs {
    pub fn new(commit: &str) -> Self {
        Self {
            log: RefCell::new(Vec::new()),
            commit: commit.to_string(),
            files: vec![("README".to_string(), "content\n".to_string())],
            submodules: Vec::new(),
            repos: RefCell::new(HashMap::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.log.borrow().clone()
    }

    fn record(&self, call: String) {
        self.log.borrow_mut().push(call);
    }

    fn is_submodule_dir(&self, dir: &Path) -> bool {
        self.submodules.iter().any(|s| dir.ends_with(&s.status.path))
    }

    fn state(&self, dir: &Path) -> RepoState {
        self.repos.borrow().get(dir).cloned().unwrap_or_default()
    }
}

impl Vcs for FakeVcs {
    fn init(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        self.record(format!("init {}", dir.display()));
        Ok(())
    }

    fn add_remote(&self, _dir: &Path, name: &str, url: &str) -> Result<()> {
        self.record(format!("add_remote {name} {url}"));
        Ok(())
    }

    fn fetch(&self, _dir: &Path, refspec: Option<&str>, depth: Option<u32>) -> Result<()> {
        self.record(format!(
            "fetch {} depth={}",
            refspec.unwrap_or("<all>"),
            depth.map_or("full".to_string(), |d| d.to_string())
        ));
        Ok(())
    }

    fn checkout(&self, dir: &Path, branch: &str, rev: &str) -> Result<()> {
        self.record(format!("checkout {branch} {rev}"));
        for (rel, content) in &self.files {
            let path = dir.join(rel);
            fs::create_dir_all(path.parent().unwrap())?;
            fs::write(path, content)?;
        }
        // Ephemeral metadata a real checkout leaves behind.
        let git = dir.join(".git");
        for rel in [
            "HEAD",
            "config",
            "index",
            "FETCH_HEAD",
            "ORIG_HEAD",
            "logs/HEAD",
            "hooks/post-checkout.sample",
            "refs/remotes/origin/HEAD",
        ] {
            let path = git.join(rel);
            fs::create_dir_all(path.parent().unwrap())?;
            fs::write(path, rev)?;
        }
        Ok(())
    }

    fn rev_parse(&self, _dir: &Path, rev: &str) -> Result<String> {
        self.record(format!("rev_parse {rev}"));
        Ok(self.commit.clone())
    }

    fn submodule_init(&self, _dir: &Path) -> Result<()> {
        self.record("submodule_init".to_string());
        Ok(())
    }

    fn submodule_status(&self, dir: &Path) -> Result<Vec<SubmoduleStatus>> {
        self.record("submodule_status".to_string());
        if self.is_submodule_dir(dir) {
            return Ok(Vec::new());
        }
        Ok(self.submodules.iter().map(|s| s.status.clone()).collect())
    }

    fn submodule_config(&self, dir: &Path) -> Result<Vec<SubmoduleEntry>> {
        self.record("submodule_config".to_string());
        if self.is_submodule_dir(dir) {
            return Ok(Vec::new());
        }
        Ok(self.submodules.iter().filter_map(|s| s.declared.clone()).collect())
    }

    fn remote_branches(&self, dir: &Path) -> Result<Vec<String>> {
        Ok(self.state(dir).remote_branches)
    }

    fn delete_remote_branch(&self, dir: &Path, branch: &str) -> Result<()> {
        self.record(format!("delete_remote_branch {branch}"));
        if let Some(state) = self.repos.borrow_mut().get_mut(dir) {
            state.remote_branches.retain(|b| b != branch);
        }
        Ok(())
    }

    fn tags_pointing_at(&self, dir: &Path, _rev: &str) -> Result<Vec<String>> {
        Ok(self.state(dir).tags_at_head)
    }

    fn tags_containing(&self, dir: &Path, _rev: &str) -> Result<Vec<String>> {
        Ok(self.state(dir).tags_containing_head)
    }

    fn delete_tag(&self, dir: &Path, tag: &str) -> Result<()> {
        self.record(format!("delete_tag {tag}"));
        if let Some(state) = self.repos.borrow_mut().get_mut(dir) {
            state.tags_at_head.retain(|t| t != tag);
            state.tags_containing_head.retain(|t| t != tag);
        }
        Ok(())
    }

    fn repack(&self, dir: &Path) -> Result<()> {
        self.record("repack".to_string());
        // A real repack needs (and therefore recreates) the local config.
        let config = dir.join(".git/config");
        if let Some(parent) = config.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(config, "pack.threads=1\n")?;
        Ok(())
    }

    fn gc(&self, _dir: &Path) -> Result<()> {
        self.record("gc".to_string());
        Ok(())
    }
}

/// Ref listings keyed by remote URL; unknown URLs fail the way a dead
/// remote would
pub struct FakeLister {
    pub listings: HashMap<String, Vec<RemoteRef>>,
    pub calls: RefCell<usize>,
}

impl FakeLister {
    pub fn new() -> Self {
        Self {
            listings: HashMap::new(),
            calls: RefCell::new(0),
        }
    }

    pub fn with_listing(mut self, url: &str, refs: Vec<(&str, &str)>) -> Self {
        self.listings.insert(
            url.to_string(),
            refs.into_iter()
                .map(|(hash, name)| RemoteRef {
                    hash: hash.to_string(),
                    name: name.to_string(),
                })
                .collect(),
        );
        self
    }
}

impl RefLister for FakeLister {
    fn list_refs(&self, remote_url: &str) -> Result<Vec<RemoteRef>> {
        *self.calls.borrow_mut() += 1;
        self.listings
            .get(remote_url)
            .cloned()
            .ok_or_else(|| Error::ExternalCommandFailed {
                command: format!("git ls-remote {remote_url}"),
                status: 128,
            })
    }
}

/// In-memory store
pub struct FakeStore {
    pub valid: RefCell<HashSet<String>>,
    pub registered: RefCell<Vec<String>>,
    pub queries: RefCell<usize>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self {
            valid: RefCell::new(HashSet::new()),
            registered: RefCell::new(Vec::new()),
            queries: RefCell::new(0),
        }
    }

    pub fn mark_valid(&self, path: &str) {
        self.valid.borrow_mut().insert(path.to_string());
    }

    pub fn register_count(&self) -> usize {
        self.registered.borrow().len()
    }
}

impl StoreClient for FakeStore {
    fn is_valid(&self, store_path: &str) -> Result<bool> {
        *self.queries.borrow_mut() += 1;
        Ok(self.valid.borrow().contains(store_path))
    }

    fn register(&self, digest: &Digest, source: &Path, _recursive: bool) -> Result<String> {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let path = fixed_path(digest, &name);
        self.registered.borrow_mut().push(path.clone());
        self.valid.borrow_mut().insert(path.clone());
        Ok(path)
    }

    fn render_fixed_path(&self, digest: &Digest, name: &str, _recursive: bool) -> Result<String> {
        Ok(fixed_path(digest, name))
    }
}

pub fn fixed_path(digest: &Digest, name: &str) -> String {
    format!("/store/{}-{}", digest.to_base32(), name)
}

/// Deterministic non-cryptographic tree hasher
///
/// Streams sorted relative paths and file contents through FNV-1a and
/// widens the state to the digest length, so equal trees hash equal and
/// any content or layout change shows up in the digest.
pub struct FakeHasher;

impl TreeHasher for FakeHasher {
    fn hash_tree(&self, kind: HashKind, path: &Path, _recursive: bool) -> Result<Digest> {
        let mut state: u64 = 0xcbf29ce484222325;
        let mut fold = |bytes: &[u8]| {
            for &b in bytes {
                state ^= u64::from(b);
                state = state.wrapping_mul(0x100000001b3);
            }
        };

        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            let rel = entry.path().strip_prefix(path).unwrap_or(entry.path());
            fold(rel.to_string_lossy().as_bytes());
            if entry.file_type().is_file() {
                fold(&fs::read(entry.path())?);
            }
        }

        let mut bytes = Vec::with_capacity(kind.digest_len());
        let mut widen = state;
        while bytes.len() < kind.digest_len() {
            widen = widen.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            bytes.extend_from_slice(&widen.to_le_bytes());
        }
        bytes.truncate(kind.digest_len());
        Digest::from_bytes(kind, bytes)
    }
}

/// Hash a tree with the fake hasher, for comparing snapshots in tests
pub fn tree_digest(path: &Path) -> Digest {
    FakeHasher.hash_tree(HashKind::Sha256, path, true).unwrap()
}
