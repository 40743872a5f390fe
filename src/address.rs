// src/address.rs

//! Content addresses derived from a digest and a symbolic name
//!
//! A [`StoreAddress`] pins down one location in the external store:
//! identical content always derives the identical address, no matter when
//! or how it was fetched. Addresses are computed here and only here;
//! callers never assemble one by hand.

use crate::digest::{Digest, HashKind};
use crate::error::{Error, Result};
use crate::store::StoreClient;
use std::fmt;
use std::str::FromStr;

/// A content address: digest + symbolic name + flat/recursive mode
///
/// Two addresses are equal iff all three fields are equal. The on-disk
/// store path grammar belongs to the store backend; rendering a real path
/// goes through [`StoreClient::render_fixed_path`]. The textual form
/// produced by [`Display`](fmt::Display) is quarry's own
/// `mode:kind:base32:name` spelling and round-trips through [`FromStr`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreAddress {
    digest: Digest,
    name: String,
    recursive: bool,
}

impl StoreAddress {
    /// Derive the address for `digest` registered under `name`
    pub fn compute(digest: Digest, name: impl Into<String>, recursive: bool) -> Self {
        Self {
            digest,
            name: name.into(),
            recursive,
        }
    }

    /// The content digest
    #[inline]
    pub fn digest(&self) -> &Digest {
        &self.digest
    }

    /// The symbolic store name
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the address covers a whole tree (recursive) or one file
    #[inline]
    pub fn recursive(&self) -> bool {
        self.recursive
    }

    /// Render the store path for this address via the store backend
    ///
    /// Possibly a slow external call, not a local string format.
    pub fn render(&self, store: &dyn StoreClient) -> Result<String> {
        store.render_fixed_path(&self.digest, &self.name, self.recursive)
    }

    /// Ask the store whether this address is already registered
    pub fn is_registered(&self, store: &dyn StoreClient) -> Result<bool> {
        let path = self.render(store)?;
        store.is_valid(&path)
    }
}

impl fmt::Display for StoreAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            if self.recursive { "r" } else { "flat" },
            self.digest.kind(),
            self.digest.to_base32(),
            self.name
        )
    }
}

impl FromStr for StoreAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.splitn(4, ':');
        let (mode, kind, value, name) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(mode), Some(kind), Some(value), Some(name)) => (mode, kind, value, name),
            _ => {
                return Err(Error::MalformedDigest(format!(
                    "store address must have four `:`-separated fields: {s}"
                )));
            }
        };
        let recursive = match mode {
            "r" => true,
            "flat" => false,
            _ => {
                return Err(Error::MalformedDigest(format!(
                    "store address mode must be `r` or `flat`: {s}"
                )));
            }
        };
        let kind: HashKind = kind.parse()?;
        let digest = Digest::from_base32(kind, value)?;
        Ok(Self::compute(digest, name, recursive))
    }
}
