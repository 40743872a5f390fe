// src/fetch.rs

//! The fetch orchestrator
//!
//! Drives one fetch from specifier to registered store path:
//!
//! ```text
//! CacheCheck -> Resolving -> Cloning/Checkout -> Submodules (recursive)
//!            -> Normalizing -> Hashing -> Registering
//! ```
//!
//! The steps are strictly sequential per repository. The cache check is
//! the only skip: when the caller supplied an expected digest and the
//! store already holds the derived address, the fetch returns without any
//! network activity. Every other failure aborts the whole fetch; no
//! partial tree is ever registered.
//!
//! [`Fetcher`] is generic over its collaborators, so the protocol runs
//! identically against real `git`/store processes and against the scripted
//! fakes in the integration tests.

use crate::address::StoreAddress;
use crate::digest::{Digest, HashKind};
use crate::error::{Error, Result};
use crate::git::{RefLister, Vcs};
use crate::normalize;
use crate::revision::RevisionSpec;
use crate::store::{StoreClient, TreeHasher};
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use tracing::{debug, info};
use url::Url;

/// Branch name created for the checkout, and the `rev-parse` fallback
/// when the original specifier does not resolve (detached FETCH_HEAD)
pub const CHECKOUT_BRANCH: &str = "fetchgit";

/// Per-fetch configuration; a plain value, not shared state
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Symbolic store name for the result
    pub name: String,
    /// Digest the caller expects; enables the cache short-circuit and
    /// mismatch enforcement
    pub expected_digest: Option<Digest>,
    /// Keep (normalized) `.git` directories instead of removing them
    pub keep_vcs_metadata: bool,
    /// Prefer a depth-1 single-ref fetch when a ref is known
    pub shallow_when_possible: bool,
    /// Recurse into declared submodules
    pub fetch_submodules: bool,
    /// Digest kind for the content address
    pub hash_kind: HashKind,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            name: "git-export".to_string(),
            expected_digest: None,
            keep_vcs_metadata: false,
            shallow_when_possible: true,
            fetch_submodules: true,
            hash_kind: HashKind::Sha256,
        }
    }
}

/// Terminal output of one successful fetch
///
/// The working tree is a temporary resource owned by this value: it stays
/// on disk until the result is dropped. A cache hit has no working tree,
/// and knows the commit only if the caller specified one.
#[derive(Debug)]
pub struct FetchResult {
    /// The content address the fetch resolved to
    pub address: StoreAddress,
    /// Full hash of the checked-out commit; `None` on a cache hit for a
    /// by-ref specifier
    pub resolved_commit: Option<String>,
    /// Store path the address renders to
    pub store_path: String,
    workdir: Option<TempDir>,
}

impl FetchResult {
    /// The materialized working tree, if this fetch produced one
    pub fn working_tree(&self) -> Option<&Path> {
        self.workdir.as_ref().map(|w| w.path())
    }
}

/// Orchestrates fetches against a set of collaborators
pub struct Fetcher<'a, V, L, S, H> {
    vcs: &'a V,
    refs: &'a L,
    store: &'a S,
    hasher: &'a H,
}

impl<'a, V, L, S, H> Fetcher<'a, V, L, S, H>
where
    V: Vcs,
    L: RefLister,
    S: StoreClient,
    H: TreeHasher,
{
    pub fn new(vcs: &'a V, refs: &'a L, store: &'a S, hasher: &'a H) -> Self {
        Self {
            vcs,
            refs,
            store,
            hasher,
        }
    }

    /// Fetch `rev` from `url` and register it in the store
    pub fn fetch(&self, url: &str, rev: &RevisionSpec, options: &FetchOptions) -> Result<FetchResult> {
        // Cache check: the dominant fast path for repeatedly-built
        // configurations. A hit means identical content is already
        // registered, so the network is never touched.
        if let Some(expected) = &options.expected_digest {
            let address = StoreAddress::compute(expected.clone(), &options.name, true);
            let store_path = address.render(self.store)?;
            if self.store.is_valid(&store_path)? {
                info!("Store already holds {}; skipping fetch", store_path);
                return Ok(FetchResult {
                    address,
                    resolved_commit: rev.commit_hash().map(String::from),
                    store_path,
                    workdir: None,
                });
            }
        }

        let workdir = tempfile::tempdir()?;
        let tree = workdir.path().join(&options.name);
        fs::create_dir_all(&tree)?;

        let commit = self.materialize(&tree, url, rev, options)?;

        normalize::normalize_tree(self.vcs, &tree, options.keep_vcs_metadata)?;

        let digest = self.hasher.hash_tree(options.hash_kind, &tree, true)?;
        if let Some(expected) = &options.expected_digest {
            if expected != &digest {
                return Err(Error::HashMismatch {
                    expected: expected.to_prefixed_string(),
                    computed: digest.to_prefixed_string(),
                });
            }
        }

        let address = StoreAddress::compute(digest.clone(), &options.name, true);
        let store_path = self.store.register(&digest, &tree, true)?;
        info!("Registered {} at {}", address, store_path);

        Ok(FetchResult {
            address,
            resolved_commit: Some(commit),
            store_path,
            workdir: Some(workdir),
        })
    }

    /// Materialize one repository at `dir`, then its submodules
    ///
    /// Returns the full hash of the checked-out commit.
    fn materialize(
        &self,
        dir: &Path,
        url: &str,
        rev: &RevisionSpec,
        options: &FetchOptions,
    ) -> Result<String> {
        let resolved = rev.resolve(self.refs, url)?;

        self.vcs.init(dir)?;
        self.vcs.add_remote(dir, "origin", url)?;

        // Shallow-by-ref transfers minimal history, but only a known ref
        // can be fetched shallowly: an arbitrary historical commit may
        // not be reachable through a shallow fetch of current refs.
        match resolved.reference() {
            Some(reference) if options.shallow_when_possible => {
                debug!("Shallow fetch of {} from {}", reference, url);
                self.vcs.fetch(dir, Some(reference), Some(1))?;
                self.vcs.checkout(dir, CHECKOUT_BRANCH, "FETCH_HEAD")?;
            }
            _ => {
                let hash = resolved.commit_hash().ok_or(Error::MissingRevision)?;
                debug!("Full fetch from {} for commit {}", url, hash);
                self.vcs.fetch(dir, None, None)?;
                self.vcs.checkout(dir, CHECKOUT_BRANCH, hash)?;
            }
        }

        let probe = resolved
            .commit_hash()
            .or(resolved.reference())
            .ok_or(Error::MissingRevision)?;
        let commit = self
            .vcs
            .rev_parse(dir, probe)
            .or_else(|_| self.vcs.rev_parse(dir, &format!("refs/heads/{CHECKOUT_BRANCH}")))?;

        if options.fetch_submodules {
            self.materialize_submodules(dir, url, options)?;
        }

        Ok(commit)
    }

    /// Recursively materialize every submodule the checkout declares
    fn materialize_submodules(&self, dir: &Path, parent_url: &str, options: &FetchOptions) -> Result<()> {
        self.vcs.submodule_init(dir)?;
        let status = self.vcs.submodule_status(dir)?;
        if status.is_empty() {
            return Ok(());
        }

        let config = self.vcs.submodule_config(dir)?;
        for sub in status {
            let entry = config
                .iter()
                .find(|e| e.path == sub.path)
                .ok_or_else(|| Error::in_submodule(&sub.path, Error::UndeclaredSubmodule))?;

            let sub_url = resolve_submodule_url(parent_url, &entry.url);
            let subdir = dir.join(&sub.path);
            let spec = RevisionSpec::from_hash(&sub.commit);
            info!("Fetching submodule {} from {}", sub.path, sub_url);
            self.materialize(&subdir, &sub_url, &spec, options)
                .map_err(|e| Error::in_submodule(&sub.path, e))?;
        }
        Ok(())
    }
}

/// Resolve a declared submodule URL against the parent remote
///
/// Git treats `./` and `../` URLs as relative to the superproject's
/// remote. Remotes that do not parse as URLs (scp-style, plain paths)
/// fall back to textual joining.
fn resolve_submodule_url(parent: &str, declared: &str) -> String {
    if !(declared.starts_with("./") || declared.starts_with("../")) {
        return declared.to_string();
    }

    let base = format!("{}/", parent.trim_end_matches('/'));
    if let Ok(base) = Url::parse(&base) {
        if let Ok(joined) = base.join(declared) {
            return joined.to_string();
        }
    }

    let mut base = parent.trim_end_matches('/').to_string();
    let mut rel = declared;
    loop {
        if let Some(rest) = rel.strip_prefix("./") {
            rel = rest;
        } else if let Some(rest) = rel.strip_prefix("../") {
            rel = rest;
            if let Some(idx) = base.rfind('/') {
                base.truncate(idx);
            }
        } else {
            break;
        }
    }
    format!("{base}/{rel}")
}
