// src/store.rs

//! Store backend collaborators
//!
//! The core never touches the store's on-disk database. It talks to the
//! backend through two narrow seams:
//!
//! - [`StoreClient`]: validity queries, fixed-path rendering, and
//!   fixed-digest registration of a local tree.
//! - [`TreeHasher`]: cryptographic hashing of a filesystem tree. The
//!   digest codec only encodes and decodes the fixed-size result; it never
//!   hashes bytes itself.
//!
//! [`NixStore`] and [`NixHasher`] are the thin process-backed
//! implementations shelling out to `nix-store` and `nix-hash`.

use crate::digest::{Digest, HashKind};
use crate::error::Result;
use crate::exec;
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Query/insert primitives of the external content-addressed store
pub trait StoreClient {
    /// Whether `store_path` is already valid (registered) in the store
    fn is_valid(&self, store_path: &str) -> Result<bool>;

    /// Register the tree at `source` under a fixed digest; returns the
    /// resulting store path. Must be idempotent: concurrent registrations
    /// of the same content are deduplicated by the store, not by us.
    fn register(&self, digest: &Digest, source: &Path, recursive: bool) -> Result<String>;

    /// Render the store path a fixed-output registration of `digest`
    /// under `name` would produce, without registering anything
    fn render_fixed_path(&self, digest: &Digest, name: &str, recursive: bool) -> Result<String>;
}

/// Hashing of a filesystem tree, delegated to the store's own hasher so
/// the result matches what the store would compute at registration time
pub trait TreeHasher {
    fn hash_tree(&self, kind: HashKind, path: &Path, recursive: bool) -> Result<Digest>;
}

/// Store client backed by the `nix-store` command-line tool
#[derive(Debug, Clone)]
pub struct NixStore {
    program: String,
}

impl NixStore {
    pub fn new() -> Self {
        Self {
            program: "nix-store".to_string(),
        }
    }

    /// Use a specific `nix-store` executable
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for NixStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreClient for NixStore {
    fn is_valid(&self, store_path: &str) -> Result<bool> {
        // On success, stdout lists the invalid subset of the queried
        // paths; an empty listing means the path is valid.
        let out = exec::run(
            Command::new(&self.program)
                .arg("--check-validity")
                .arg("--print-invalid")
                .arg(store_path),
        )?;
        let valid = !out.lines().any(|line| line.trim() == store_path);
        debug!("Store path {} is {}", store_path, if valid { "valid" } else { "not registered" });
        Ok(valid)
    }

    fn register(&self, digest: &Digest, source: &Path, recursive: bool) -> Result<String> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--add-fixed");
        if recursive {
            cmd.arg("--recursive");
        }
        cmd.arg(digest.kind().name()).arg(source);
        exec::run(&mut cmd)
    }

    fn render_fixed_path(&self, digest: &Digest, name: &str, recursive: bool) -> Result<String> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--print-fixed-path");
        if recursive {
            cmd.arg("--recursive");
        }
        cmd.arg(digest.kind().name())
            .arg(digest.to_base32())
            .arg(name);
        exec::run(&mut cmd)
    }
}

/// Tree hasher backed by the `nix-hash` command-line tool
#[derive(Debug, Clone)]
pub struct NixHasher {
    program: String,
}

impl NixHasher {
    pub fn new() -> Self {
        Self {
            program: "nix-hash".to_string(),
        }
    }

    /// Use a specific `nix-hash` executable
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for NixHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeHasher for NixHasher {
    fn hash_tree(&self, kind: HashKind, path: &Path, recursive: bool) -> Result<Digest> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--type").arg(kind.name());
        if !recursive {
            cmd.arg("--flat");
        }
        cmd.arg("--base32").arg(path);
        let out = exec::run(&mut cmd)?;
        Digest::from_base32(kind, out.trim())
    }
}
