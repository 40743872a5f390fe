// src/commands.rs

//! Command handlers for the quarry CLI

use anyhow::Result;
use quarry::fetch::{FetchOptions, Fetcher};
use quarry::git::{Git, GitRemote};
use quarry::revision::RevisionSpec;
use quarry::store::{NixHasher, NixStore};
use quarry::{Digest, HashKind};
use tracing::info;

/// Options collected from the `fetch` subcommand
pub struct FetchArgs {
    pub url: String,
    pub rev: String,
    pub name: String,
    pub expected_hash: Option<String>,
    pub hash_type: String,
    pub leave_dot_git: bool,
    pub deep_clone: bool,
    pub no_submodules: bool,
}

/// Fetch a revision and print the resolved commit, digest and store path
pub fn fetch(args: FetchArgs) -> Result<()> {
    let hash_kind: HashKind = args.hash_type.parse()?;
    let expected_digest = args
        .expected_hash
        .as_deref()
        .map(|s| Digest::parse_prefixed(s, hash_kind))
        .transpose()?;

    let spec = RevisionSpec::classify(&args.rev)?;
    let options = FetchOptions {
        name: args.name,
        expected_digest,
        keep_vcs_metadata: args.leave_dot_git,
        shallow_when_possible: !args.deep_clone,
        fetch_submodules: !args.no_submodules,
        hash_kind,
    };

    let vcs = Git::new();
    let refs = GitRemote::new();
    let store = NixStore::new();
    let hasher = NixHasher::new();
    let fetcher = Fetcher::new(&vcs, &refs, &store, &hasher);

    info!("Fetching {} from {}", args.rev, args.url);
    let result = fetcher.fetch(&args.url, &spec, &options)?;

    match result.resolved_commit.as_deref() {
        Some(commit) => println!("rev: {commit}"),
        None => println!("rev: (cached)"),
    }
    println!("hash: {}", result.address.digest().to_prefixed_string());
    println!("path: {}", result.store_path);
    Ok(())
}
