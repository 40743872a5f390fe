// src/lib.rs

//! Quarry
//!
//! Fetches the contents of a remote git revision and registers them under
//! a content-derived address in an immutable, deduplicated store, so two
//! fetches of identical content always resolve to the same store location.
//!
//! # Architecture
//!
//! - Digest codec: the store backend's reversed-order base-32 encoding,
//!   bit-exact with already-registered content
//! - Fetch protocol: hash-or-ref resolution, shallow-or-full checkout,
//!   recursive submodules, deterministic normalization, cache
//!   short-circuit
//! - Collaborators behind narrow seams: git, the store, and the store's
//!   tree hasher are driven as external processes and never reimplemented

pub mod address;
pub mod digest;
mod error;
mod exec;
pub mod fetch;
pub mod git;
pub mod normalize;
pub mod revision;
pub mod store;

pub use address::StoreAddress;
pub use digest::{Digest, HashKind, BASE32_ALPHABET};
pub use error::{Error, Result};
pub use fetch::{FetchOptions, FetchResult, Fetcher};
pub use revision::RevisionSpec;
