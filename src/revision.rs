// src/revision.rs

//! Revision specifiers and their resolution against a remote
//!
//! A [`RevisionSpec`] starts out with exactly one of {commit hash, ref}
//! and resolution fills in the other from the remote's ref listing. After
//! resolution the spec is treated as immutable.

use crate::error::{Error, Result};
use crate::git::RefLister;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static FULL_HEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-f]+$").unwrap());

/// A partially or fully specified revision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionSpec {
    commit_hash: Option<String>,
    reference: Option<String>,
}

impl RevisionSpec {
    /// Specify a revision by commit hash
    pub fn from_hash(hash: impl Into<String>) -> Self {
        Self {
            commit_hash: Some(hash.into()),
            reference: None,
        }
    }

    /// Specify a revision by fully qualified ref
    pub fn from_ref(reference: impl Into<String>) -> Self {
        Self {
            commit_hash: None,
            reference: Some(reference.into()),
        }
    }

    /// Classify a raw user-supplied revision string
    ///
    /// `refs/...` is a ref; a full lowercase-hex string is a commit hash;
    /// anything else is rejected.
    pub fn classify(input: &str) -> Result<Self> {
        if input.starts_with("refs/") {
            Ok(Self::from_ref(input))
        } else if FULL_HEX.is_match(input) {
            Ok(Self::from_hash(input))
        } else {
            Err(Error::MissingRevision)
        }
    }

    /// The commit hash, if known
    #[inline]
    pub fn commit_hash(&self) -> Option<&str> {
        self.commit_hash.as_deref()
    }

    /// The ref, if known
    #[inline]
    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    /// Resolve the missing half of the spec against `remote_url`'s ref
    /// listing
    ///
    /// - ref only: the matching listing entry supplies the hash; no match
    ///   is [`Error::UnknownRef`].
    /// - hash only: the matching entry supplies the ref; no match leaves
    ///   the ref empty (not every commit has a symbolic ref), and a by-ref
    ///   checkout strategy must not be chosen downstream.
    /// - both or neither present is rejected before any network activity.
    ///
    /// When several refs point at the same commit, the first entry in
    /// listing order wins. That choice is deterministic but arbitrary.
    pub fn resolve(&self, lister: &dyn RefLister, remote_url: &str) -> Result<RevisionSpec> {
        match (&self.commit_hash, &self.reference) {
            (Some(_), Some(_)) => Err(Error::AmbiguousRevision),
            (None, None) => Err(Error::MissingRevision),
            (None, Some(reference)) => {
                let refs = lister.list_refs(remote_url)?;
                let hash = refs
                    .iter()
                    .find(|r| &r.name == reference)
                    .map(|r| r.hash.clone())
                    .ok_or_else(|| Error::UnknownRef(reference.clone()))?;
                debug!("Resolved ref {} to {}", reference, hash);
                Ok(Self {
                    commit_hash: Some(hash),
                    reference: Some(reference.clone()),
                })
            }
            (Some(hash), None) => {
                let refs = lister.list_refs(remote_url)?;
                let reference = refs.iter().find(|r| &r.hash == hash).map(|r| r.name.clone());
                match &reference {
                    Some(name) => debug!("Commit {} is reachable as {}", hash, name),
                    None => debug!("Commit {} has no symbolic ref on the remote", hash),
                }
                Ok(Self {
                    commit_hash: Some(hash.clone()),
                    reference,
                })
            }
        }
    }
}
